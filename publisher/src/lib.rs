//! UrbanCode Deploy publisher library
//!
//! Publishes build artifacts as component versions and drives application
//! deployments from CI.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod http;
pub mod logs;
pub mod storage;
pub mod upload;
pub mod utils;
pub mod version;
