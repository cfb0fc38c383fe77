//! Marks annotation attributes so their names are not displayed.

use std::collections::BTreeSet;
use std::sync::Arc;

use mml_core::{HIDE_NAME_ATTRIBUTE, SINGLETON_ATTRIBUTE_CLASS};
use mml_parser::{empty_element, EndElementContext, FilterContext, FilterPass, FilterResult, MomlFilter};
use tracing::{debug, trace};

use crate::path::is_unrelated;

/// Injects a `_hideName` marker into every `<property>` of an annotation
/// class when its element closes.
#[derive(Debug, Clone)]
pub struct HideAnnotationNames {
    classes: Arc<BTreeSet<String>>,
}

impl HideAnnotationNames {
    pub fn new(classes: BTreeSet<String>) -> Self {
        Self {
            classes: Arc::new(classes),
        }
    }
}

impl MomlFilter for HideAnnotationNames {
    fn name(&self) -> &str {
        "hide-annotation-names"
    }

    fn new_pass(&self) -> Box<dyn FilterPass> {
        Box::new(HideNamesPass {
            classes: Arc::clone(&self.classes),
            last_name: None,
            tracked: None,
        })
    }
}

struct HideNamesPass {
    classes: Arc<BTreeSet<String>>,
    last_name: Option<String>,
    /// Full name of the annotation awaiting its end element.
    tracked: Option<String>,
}

impl FilterPass for HideNamesPass {
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
        if element == "property" {
            match attribute {
                "name" => self.last_name = Some(value.to_string()),
                "class" if self.classes.contains(value) => {
                    if let Some(name) = &self.last_name {
                        let full_name = format!("{}.{}", context.container_name(), name);
                        trace!(annotation = %full_name, "tracking annotation");
                        self.tracked = Some(full_name);
                    }
                }
                _ => {}
            }
        }
        Ok(Some(value.to_string()))
    }

    fn filter_end_element(
        &mut self,
        context: &mut EndElementContext<'_>,
        element: &str,
    ) -> FilterResult<Option<String>> {
        if element != "property" {
            return Ok(Some(element.to_string()));
        }
        let container = context.container_name();
        let Some(tracked) = self.tracked.as_deref() else {
            return Ok(Some(element.to_string()));
        };
        if tracked == container {
            debug!(annotation = %container, "hiding annotation name");
            let marker = empty_element(
                "property",
                &[
                    ("name", HIDE_NAME_ATTRIBUTE),
                    ("class", SINGLETON_ATTRIBUTE_CLASS),
                ],
            );
            self.tracked = None;
            context.inject(&marker)?;
        } else if is_unrelated(tracked, &container) {
            // The candidate was dropped or failed before it closed.
            trace!(annotation = %tracked, closed = %container, "annotation tracking abandoned");
            self.tracked = None;
        }
        Ok(Some(element.to_string()))
    }
}
