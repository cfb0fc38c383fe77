//! Renames ports of classes whose port names changed, and rewrites links
//! that refer to the old names.
//!
//! Per parse the pass moves through three states:
//!
//! - idle: waiting for an entity whose class has renamed ports;
//! - tracking: inside that entity, renaming `<port>` elements and
//!   remembering each rename by full name;
//! - done: the entity closed; back to idle, keeping the renames so later
//!   `<link port="...">` references can be rewritten.
//!
//! Tracking is abandoned when the parse moves to a container that is
//! neither inside nor above the tracked entity.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use mml_parser::{EndElementContext, FilterContext, FilterPass, FilterResult, MomlFilter};
use tracing::{debug, trace};

use crate::path::is_unrelated;

type PortTable = BTreeMap<String, BTreeMap<String, String>>;

/// Per-class port renames.
#[derive(Debug, Clone)]
pub struct PortNameChanges {
    changes: Arc<PortTable>,
}

impl PortNameChanges {
    pub fn new(changes: PortTable) -> Self {
        Self {
            changes: Arc::new(changes),
        }
    }
}

impl MomlFilter for PortNameChanges {
    fn name(&self) -> &str {
        "port-name-changes"
    }

    fn new_pass(&self) -> Box<dyn FilterPass> {
        Box::new(PortNamePass {
            changes: Arc::clone(&self.changes),
            last_name: None,
            tracked: None,
            renamed: HashMap::new(),
        })
    }
}

#[derive(Debug)]
struct Tracked {
    /// Full name of the entity whose ports are renamed.
    full_name: String,
    class: String,
}

struct PortNamePass {
    changes: Arc<PortTable>,
    last_name: Option<String>,
    tracked: Option<Tracked>,
    /// Old full port name to new full port name.
    renamed: HashMap<String, String>,
}

fn join(container: &str, name: &str) -> String {
    format!("{}.{}", container, name)
}

impl PortNamePass {
    fn check_abandoned(&mut self, container: &str) {
        let abandoned = self
            .tracked
            .as_ref()
            .is_some_and(|t| is_unrelated(&t.full_name, container));
        if abandoned {
            trace!(container, tracked = ?self.tracked, "port rename tracking abandoned");
            self.tracked = None;
        }
    }

    fn rename_port(&mut self, container: &str, name: &str) -> Option<String> {
        let tracked = self.tracked.as_ref()?;
        if tracked.full_name != container {
            return None;
        }
        let new_name = self.changes.get(&tracked.class)?.get(name)?.clone();
        self.renamed
            .insert(join(container, name), join(container, &new_name));
        debug!(entity = %container, from = name, to = %new_name, "port renamed");
        Some(new_name)
    }

    fn rewrite_reference(&self, container: &str, reference: &str) -> Option<String> {
        let full = if reference.starts_with('.') {
            reference.to_string()
        } else {
            join(container, reference)
        };
        let replacement = self.renamed.get(&full)?;
        if reference.starts_with('.') {
            return Some(replacement.clone());
        }
        replacement
            .strip_prefix(container)
            .and_then(|rest| rest.strip_prefix('.'))
            .map(str::to_string)
    }
}

impl FilterPass for PortNamePass {
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
        let container = context.container_name();
        self.check_abandoned(&container);

        match (element, attribute) {
            ("port", "name") => {
                self.last_name = Some(value.to_string());
                if let Some(new_name) = self.rename_port(&container, value) {
                    return Ok(Some(new_name));
                }
            }
            (_, "name") => self.last_name = Some(value.to_string()),
            ("entity", "class") | ("class", "extends") => {
                if self.changes.contains_key(value) {
                    if let Some(name) = &self.last_name {
                        let full_name = join(&container, name);
                        trace!(entity = %full_name, class = value, "tracking port renames");
                        self.tracked = Some(Tracked {
                            full_name,
                            class: value.to_string(),
                        });
                    }
                }
            }
            ("link" | "unlink", "port") => {
                if let Some(rewritten) = self.rewrite_reference(&container, value) {
                    debug!(from = value, to = %rewritten, "link port rewritten");
                    return Ok(Some(rewritten));
                }
            }
            _ => {}
        }
        Ok(Some(value.to_string()))
    }

    fn filter_end_element(
        &mut self,
        context: &mut EndElementContext<'_>,
        element: &str,
    ) -> FilterResult<Option<String>> {
        let closes_tracked = self
            .tracked
            .as_ref()
            .is_some_and(|t| t.full_name == context.container_name());
        if closes_tracked && (element == "entity" || element == "class") {
            trace!(tracked = ?self.tracked, "port rename tracking done");
            self.tracked = None;
        }
        Ok(Some(element.to_string()))
    }
}
