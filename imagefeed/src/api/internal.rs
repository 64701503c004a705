pub mod oauth;
pub mod photo;
pub mod user;
