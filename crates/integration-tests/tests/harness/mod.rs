#![allow(dead_code)]

pub mod app;
pub mod config;
pub mod mock_downstream;
pub mod server;
