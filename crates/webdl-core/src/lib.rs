pub mod config;
pub mod logging;

pub mod checkpoint;
pub mod control;
pub mod engine;
pub mod error;
pub mod merge;
pub mod plan;
pub mod probe;
pub mod progress;
pub mod retry;
pub mod single;
pub mod url_model;
pub mod worker;
