//! MML Parser
//!
//! This crate turns MML text into graph mutations:
//! - Event reading on top of quick-xml
//! - The streaming filter chain (per-parse filter state, process-wide registry)
//! - A pluggable error handler deciding skip/cancel/rethrow per element
//! - The graph builder, which records the inverse of every element it applies
//! - The MML writer used for deletion inverses and document export

mod builder;
mod error;
mod event;
mod filter;
mod handler;
mod parser;
mod writer;

pub use error::*;
pub use filter::{
    clear_filters, register_filter, registered_filters, EndElementContext, FilterChain,
    FilterContext, FilterPass, MomlFilter,
};
pub use handler::{ErrorAction, ErrorHandler, RethrowHandler, SkippingHandler};
pub use parser::{MomlParser, ParseOutcome, ParserConfig};
pub use writer::{empty_element, export_document, export_moml, wrap_element};
