//! Filters that drop whole elements by class.

use std::collections::BTreeSet;
use std::sync::Arc;

use mml_parser::{FilterContext, FilterPass, FilterResult, MomlFilter};
use regex_lite::Regex;
use tracing::debug;

use crate::tables::{TablesError, TablesResult};

/// Drops elements whose class is one of a fixed set of retired classes.
#[derive(Debug, Clone)]
pub struct RemoveClasses {
    classes: Arc<BTreeSet<String>>,
}

impl RemoveClasses {
    pub fn new(classes: BTreeSet<String>) -> Self {
        Self {
            classes: Arc::new(classes),
        }
    }
}

impl MomlFilter for RemoveClasses {
    fn name(&self) -> &str {
        "remove-classes"
    }

    fn new_pass(&self) -> Box<dyn FilterPass> {
        let classes = Arc::clone(&self.classes);
        Box::new(ClassMatchPass {
            matches: Box::new(move |class| classes.contains(class)),
        })
    }
}

/// Drops rendition-only elements: icons, locations, editor hints. Classes
/// are matched against regular expressions.
#[derive(Debug, Clone)]
pub struct RemoveGraphicalClasses {
    patterns: Arc<Vec<Regex>>,
}

impl RemoveGraphicalClasses {
    pub fn new(patterns: &[String]) -> TablesResult<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| TablesError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<TablesResult<Vec<_>>>()?;
        Ok(Self {
            patterns: Arc::new(patterns),
        })
    }
}

impl MomlFilter for RemoveGraphicalClasses {
    fn name(&self) -> &str {
        "remove-graphical-classes"
    }

    fn new_pass(&self) -> Box<dyn FilterPass> {
        let patterns = Arc::clone(&self.patterns);
        Box::new(ClassMatchPass {
            matches: Box::new(move |class| patterns.iter().any(|p| p.is_match(class))),
        })
    }
}

/// Drops an element when its `class` satisfies `matches`.
struct ClassMatchPass {
    matches: Box<dyn Fn(&str) -> bool + Send>,
}

impl FilterPass for ClassMatchPass {
    fn filter_attribute_value(
        &mut self,
        context: &FilterContext<'_>,
        element: &str,
        attribute: &str,
        value: Option<&str>,
    ) -> FilterResult<Option<String>> {
        match value {
            Some(class) if attribute == "class" && (self.matches)(class) => {
                debug!(element, class, container = %context.container_name(), "removing element");
                Ok(None)
            }
            other => Ok(other.map(str::to_string)),
        }
    }
}
