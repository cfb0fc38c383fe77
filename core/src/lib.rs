//! MML Core Types
//!
//! This crate provides the foundational types used throughout the MML system:
//! - Identity types (NodeId)
//! - Node kinds and the container-class tag used by shared parameters
//! - Well-known class names and reserved attribute names
//! - Common error types

mod classes;
mod error;
mod id;
mod kind;

pub use classes::*;
pub use error::*;
pub use id::*;
pub use kind::*;
