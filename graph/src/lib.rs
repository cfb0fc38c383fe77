//! MML Graph Storage
//!
//! This crate provides the arena-backed model store the mutation engine works on:
//! - Node storage with containment (children own, containers are back-references)
//! - Name lookup: child by name, dotted relative paths, full names
//! - Port/relation links
//! - Class deferral: instantiation by cloning, `deferred_from` fan-out lists
//! - Structural snapshots for comparing model states

mod deferral;
mod graph;
mod names;
mod node;
mod snapshot;

pub use graph::*;
pub use node::*;
pub use snapshot::*;
