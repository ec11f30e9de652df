pub mod board;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod logging;
pub mod web;
