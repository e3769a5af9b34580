//! Artifact selection and transfer

pub mod fileset;
pub mod patterns;
pub mod vfs;
