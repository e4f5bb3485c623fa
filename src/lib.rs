pub mod config;
pub mod robot;
