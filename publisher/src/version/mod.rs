//! Component version publication and property reconciliation

pub mod component;
pub mod properties;
pub mod publish;
