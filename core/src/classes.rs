//! Well-known class names and reserved attribute names.
//!
//! These constants keep the builder, the filters and the shared-parameter
//! machinery agreeing on the same spelling.

/// Class given to entities created without a `class` attribute.
pub const DEFAULT_ENTITY_CLASS: &str = "mml.Entity";

/// Class given to class definitions created without `extends`.
pub const DEFAULT_CLASS_CLASS: &str = "mml.CompositeEntity";

/// Class given to properties created without a `class` attribute.
pub const DEFAULT_ATTRIBUTE_CLASS: &str = "mml.Attribute";

/// Plain parameter class.
pub const PARAMETER_CLASS: &str = "mml.Parameter";

/// Parameter class whose value is shared with same-named parameters.
pub const SHARED_PARAMETER_CLASS: &str = "mml.SharedParameter";

/// Class given to ports created without a `class` attribute.
pub const DEFAULT_PORT_CLASS: &str = "mml.Port";

/// Class given to relations created without a `class` attribute.
pub const DEFAULT_RELATION_CLASS: &str = "mml.Relation";

/// Name of the attribute that marks a subtree as a component library.
pub const LIBRARY_MARKER_NAME: &str = "_libraryMarker";

/// Class of the library marker attribute.
pub const LIBRARY_MARKER_CLASS: &str = "mml.LibraryMarker";

/// Name of the attribute that hides an object's name in renditions.
pub const HIDE_NAME_ATTRIBUTE: &str = "_hideName";

/// Class of marker attributes carrying no value.
pub const SINGLETON_ATTRIBUTE_CLASS: &str = "mml.SingletonAttribute";
