pub mod bridge;
pub mod clean;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod reader;
pub mod sink;
pub mod storage;
pub mod types;
