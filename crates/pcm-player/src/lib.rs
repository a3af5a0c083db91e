pub mod config;
pub mod device;
pub mod sink;
pub mod stream;
