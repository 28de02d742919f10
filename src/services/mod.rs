// Services module - external API clients

pub mod imdb;
pub mod tmdb;
