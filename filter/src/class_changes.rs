//! Renames retired class names.

use std::collections::BTreeMap;
use std::sync::Arc;

use mml_parser::{FilterContext, FilterPass, FilterResult, MomlFilter};
use tracing::trace;

/// Rewrites `class` and `extends` values found in its table.
#[derive(Debug, Clone)]
pub struct ClassChanges {
    changes: Arc<BTreeMap<String, String>>,
}

impl ClassChanges {
    pub fn new(changes: BTreeMap<String, String>) -> Self {
        Self {
            changes: Arc::new(changes),
        }
    }
}

impl MomlFilter for ClassChanges {
    fn name(&self) -> &str {
        "class-changes"
    }

    fn new_pass(&self) -> Box<dyn FilterPass> {
        Box::new(ClassChangesPass {
            changes: Arc::clone(&self.changes),
        })
    }
}

struct ClassChangesPass {
    changes: Arc<BTreeMap<String, String>>,
}

impl FilterPass for ClassChangesPass {
    fn filter_attribute_value(
        &mut self,
        context: &FilterContext<'_>,
        element: &str,
        attribute: &str,
        value: Option<&str>,
    ) -> FilterResult<Option<String>> {
        let Some(value) = value else {
            return Ok(None);
        };
        if attribute == "class" || attribute == "extends" {
            if let Some(replacement) = self.changes.get(value) {
                trace!(
                    element,
                    container = %context.container_name(),
                    from = value,
                    to = %replacement,
                    "class renamed"
                );
                return Ok(Some(replacement.clone()));
            }
        }
        Ok(Some(value.to_string()))
    }
}
