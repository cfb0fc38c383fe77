//! Filter tables: the data the compatibility filters act on.
//!
//! Tables load from JSON; any section left out keeps its built-in default.
//!
//! ```json
//! {
//!   "class_changes": { "mml.lib.OldRamp": "mml.lib.Ramp" },
//!   "removed_classes": ["mml.gui.Plotter"],
//!   "graphical_class_patterns": ["^mml\\.vergil\\."],
//!   "port_name_changes": { "mml.lib.Scale": { "in": "input" } },
//!   "annotation_classes": ["mml.TextAttribute"]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use mml_parser::MomlFilter;
use serde::Deserialize;
use thiserror::Error;

use crate::class_changes::ClassChanges;
use crate::hide_names::HideAnnotationNames;
use crate::port_names::PortNameChanges;
use crate::remove::{RemoveClasses, RemoveGraphicalClasses};

/// Errors loading filter tables.
#[derive(Debug, Error)]
pub enum TablesError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid filter tables: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid class pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: regex_lite::Error,
    },
}

/// Result type for table loading.
pub type TablesResult<T> = Result<T, TablesError>;

/// Everything the standard filters are configured with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterTables {
    /// Old class name to new class name.
    pub class_changes: BTreeMap<String, String>,
    /// Classes whose elements are dropped.
    pub removed_classes: BTreeSet<String>,
    /// Regular expressions over class names of rendition-only attributes.
    pub graphical_class_patterns: Vec<String>,
    /// Per class: old port name to new port name.
    pub port_name_changes: BTreeMap<String, BTreeMap<String, String>>,
    /// Attribute classes that get a `_hideName` marker.
    pub annotation_classes: BTreeSet<String>,
}

impl Default for FilterTables {
    fn default() -> Self {
        let class_changes = [
            ("mml.lib.OldRamp", "mml.lib.Ramp"),
            ("mml.lib.Delay", "mml.lib.TimedDelay"),
            ("mml.data.StringParameter", "mml.StringParameter"),
        ];
        let port_name_changes = [(
            "mml.lib.Scale",
            [("in", "input"), ("out", "output")],
        )];
        Self {
            class_changes: class_changes
                .iter()
                .map(|(old, new)| (old.to_string(), new.to_string()))
                .collect(),
            removed_classes: ["mml.gui.Plotter", "mml.gui.TextDisplay"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            graphical_class_patterns: vec![
                r"^mml\.vergil\.".to_string(),
                r"^mml\.(Location|Icon|VertexEditor)$".to_string(),
            ],
            port_name_changes: port_name_changes
                .iter()
                .map(|(class, renames)| {
                    let renames = renames
                        .iter()
                        .map(|(old, new)| (old.to_string(), new.to_string()))
                        .collect();
                    (class.to_string(), renames)
                })
                .collect(),
            annotation_classes: ["mml.TextAttribute"].iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl FilterTables {
    /// Tables with every section empty.
    pub fn empty() -> Self {
        Self {
            class_changes: BTreeMap::new(),
            removed_classes: BTreeSet::new(),
            graphical_class_patterns: Vec::new(),
            port_name_changes: BTreeMap::new(),
            annotation_classes: BTreeSet::new(),
        }
    }

    pub fn from_json(text: &str) -> TablesResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> TablesResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Build the standard filter set over these tables, in application order.
    pub fn filters(&self) -> TablesResult<Vec<Arc<dyn MomlFilter>>> {
        Ok(vec![
            Arc::new(ClassChanges::new(self.class_changes.clone())),
            Arc::new(RemoveClasses::new(self.removed_classes.clone())),
            Arc::new(RemoveGraphicalClasses::new(&self.graphical_class_patterns)?),
            Arc::new(PortNameChanges::new(self.port_name_changes.clone())),
            Arc::new(HideAnnotationNames::new(self.annotation_classes.clone())),
        ])
    }
}
