pub mod api;
pub mod builder;
pub mod config;
pub mod error;
pub mod feed;
pub mod http;
pub mod message;
pub mod models;
pub mod presenter;
pub mod profile;
pub mod session;
pub mod token_store;

#[cfg(test)]
pub mod mock;
