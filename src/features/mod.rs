pub mod auth;
pub mod authors;
pub mod categories;
pub mod feeds;
pub mod sources;
pub mod videos;
