pub mod app;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod control;
pub mod daemon;
pub mod history;
pub mod mcp;
pub mod settings;
pub mod storage;
pub mod utils;
pub mod watcher;
