//! REST client for the deployment server

pub mod api;
pub mod applications;
pub mod client;
pub mod components;
pub mod properties;
pub mod site;
pub mod versions;
