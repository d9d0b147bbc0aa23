pub mod config;
pub mod ring;
pub mod route;
pub mod token;
