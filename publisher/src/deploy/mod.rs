//! Deployment request submission and status tracking

pub mod fsm;
pub mod poller;
pub mod process;
pub mod request;
pub mod versions;
