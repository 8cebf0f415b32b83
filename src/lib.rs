pub mod config;
pub mod error;
pub mod identity;
pub mod policy;
pub mod server;
pub mod storage;
pub mod todos;
