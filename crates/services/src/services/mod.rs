pub mod auth;
pub mod config;
pub mod dispatch;
pub mod storage;
pub mod upload;
pub mod watch;
