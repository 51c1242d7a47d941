pub mod catalog;
pub mod chat;
pub mod errors;
pub mod events;
pub mod models;
pub mod selection;
pub mod summary;
