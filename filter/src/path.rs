//! Full-name comparisons shared by the tracking filters.

/// `inner` is `outer` or lies below it.
pub(crate) fn is_path_prefix(outer: &str, inner: &str) -> bool {
    inner == outer
        || (inner.starts_with(outer) && inner[outer.len()..].starts_with('.'))
        || outer.is_empty()
}

/// Neither name lies below the other, so an element tracked at `tracked`
/// can no longer be the one closing at `container`.
pub(crate) fn is_unrelated(tracked: &str, container: &str) -> bool {
    !is_path_prefix(tracked, container) && !is_path_prefix(container, tracked)
}
