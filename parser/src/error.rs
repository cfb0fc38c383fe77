//! Parser and filter error types.

use mml_core::GraphError;
use thiserror::Error;

/// Errors raised while reading MML or applying it to a graph.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    #[error("utf8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("element <{element}> requires attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    #[error("unknown element <{element}>")]
    UnknownElement { element: String },

    #[error("<{element}>: no object named '{name}'")]
    NotFound { element: String, name: String },

    #[error("unexpected structure: {0}")]
    Structure(String),
}

impl ParseError {
    pub fn missing_attribute(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    pub fn unknown_element(element: impl Into<String>) -> Self {
        Self::UnknownElement {
            element: element.into(),
        }
    }

    pub fn not_found(element: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            element: element.into(),
            name: name.into(),
        }
    }

    pub fn structure(message: impl Into<String>) -> Self {
        Self::Structure(message.into())
    }
}

/// Errors raised by stream filters.
#[derive(Debug, Error)]
pub enum FilterError {
    /// A filter's synthesized MML failed to parse.
    #[error("filter could not inject into <{element}>: {source}")]
    Injection {
        element: String,
        source: Box<ParseError>,
    },

    /// A filter was misconfigured or saw input it cannot handle.
    #[error("filter error: {0}")]
    Invalid(String),
}

impl FilterError {
    pub fn injection(element: impl Into<String>, source: ParseError) -> Self {
        Self::Injection {
            element: element.into(),
            source: Box::new(source),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;
