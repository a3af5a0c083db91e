pub mod address;
pub mod cli;
pub mod config;
pub mod prompt;
pub mod readers;
pub mod supervisor;
pub mod transport;
