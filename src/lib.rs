pub mod config;
pub mod errors;
pub mod layout;
pub mod models;
pub mod rendering;
pub mod services;
pub mod sources;
pub mod utils;
