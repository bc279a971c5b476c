pub mod buffer;
pub mod cli;
pub mod config;
pub mod engine;
pub mod grep;
pub mod matcher;
pub mod projector;
pub mod recent;
pub mod session;
pub mod storage;
pub mod theme;
pub mod tui;
