// src/lib.rs
pub mod config;
pub mod connection;
pub mod server;
