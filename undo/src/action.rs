//! Undo actions and entries.

use std::fmt;

use mml_core::NodeId;

/// An executable undo step.
///
/// A group runs its members in order; a merged entry is a group whose first
/// member reverses the most recent edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoAction {
    /// A single MML fragment.
    Moml(String),
    /// A sequence of actions executed in order.
    Group(Vec<UndoAction>),
}

impl UndoAction {
    /// Build an action from inverse fragments listed in execution order.
    ///
    /// Returns `None` when there is nothing to undo.
    pub fn from_fragments(fragments: Vec<String>) -> Option<Self> {
        let mut actions: Vec<UndoAction> = fragments.into_iter().map(UndoAction::Moml).collect();
        match actions.len() {
            0 => None,
            1 => actions.pop(),
            _ => Some(UndoAction::Group(actions)),
        }
    }

    /// Render as MML text. Groups become `<group>` elements.
    pub fn to_moml(&self) -> String {
        let mut out = String::new();
        self.write_moml(&mut out);
        out
    }

    fn write_moml(&self, out: &mut String) {
        match self {
            UndoAction::Moml(text) => out.push_str(text),
            UndoAction::Group(actions) => {
                out.push_str("<group>");
                for action in actions {
                    action.write_moml(out);
                }
                out.push_str("</group>");
            }
        }
    }

    /// Number of leaf fragments.
    pub fn fragment_count(&self) -> usize {
        match self {
            UndoAction::Moml(_) => 1,
            UndoAction::Group(actions) => actions.iter().map(UndoAction::fragment_count).sum(),
        }
    }
}

impl fmt::Display for UndoAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_moml())
    }
}

/// An undo action together with the node it must run in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry {
    /// Container the action is parsed into; `None` for top level.
    pub context: Option<NodeId>,
    pub action: UndoAction,
}

impl UndoEntry {
    pub fn new(context: Option<NodeId>, action: UndoAction) -> Self {
        Self { context, action }
    }

    /// Shorthand for an entry holding one fragment.
    pub fn moml(context: Option<NodeId>, text: impl Into<String>) -> Self {
        Self::new(context, UndoAction::Moml(text.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_fragments() {
        assert_eq!(UndoAction::from_fragments(Vec::new()), None);
        assert_eq!(
            UndoAction::from_fragments(vec!["<a/>".to_string()]),
            Some(UndoAction::Moml("<a/>".to_string()))
        );

        let group = UndoAction::from_fragments(vec!["<a/>".to_string(), "<b/>".to_string()]).unwrap();
        assert_eq!(group.fragment_count(), 2);
        assert_eq!(group.to_moml(), "<group><a/><b/></group>");
    }

    #[test]
    fn test_nested_group_rendering() {
        // GIVEN
        let action = UndoAction::Group(vec![
            UndoAction::Moml(r#"<property name="x" value="2"/>"#.to_string()),
            UndoAction::Group(vec![
                UndoAction::Moml("<a/>".to_string()),
                UndoAction::Moml("<b/>".to_string()),
            ]),
        ]);

        // WHEN
        let text = action.to_string();

        // THEN
        assert_eq!(
            text,
            r#"<group><property name="x" value="2"/><group><a/><b/></group></group>"#
        );
        assert_eq!(action.fragment_count(), 3);
    }
}
