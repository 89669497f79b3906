pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod exit;
pub mod logs;
pub mod probe;
pub mod transport;
pub mod ui;
