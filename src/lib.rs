pub mod cli;
pub mod client;
pub mod config;
pub mod encoder;
pub mod error;
pub mod scanner;
pub mod server;
