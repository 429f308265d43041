mod connection;
mod documents;
mod migrations;

pub mod helpers;
pub mod models;
pub mod repositories;
pub mod store;

pub use connection::Database;
