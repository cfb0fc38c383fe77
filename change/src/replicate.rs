//! Replication of changes to deferring objects.
//!
//! A change made in the context of a class definition must also be made in
//! every object that defers to it, so instances keep mirroring the class.

use mml_core::NodeId;
use mml_graph::Graph;
use tracing::debug;

use crate::error::ChangeError;
use crate::request::ChangeRequest;

/// The nearest of `node` and its containers that other objects defer to.
pub fn get_deferred_to_parent(graph: &Graph, node: NodeId) -> Option<NodeId> {
    std::iter::once(node)
        .chain(graph.ancestors(node))
        .find(|&candidate| !graph.deferred_from(candidate).is_empty())
}

/// Replicas of `request` for the objects deferring to `target`.
///
/// Replicas whose context already appears in the request's lineage would
/// loop forever; they are returned as structural errors instead.
pub(crate) fn replicas(
    graph: &Graph,
    request: &ChangeRequest,
    target: NodeId,
) -> Vec<Result<ChangeRequest, (ChangeRequest, ChangeError)>> {
    graph
        .deferred_from(target)
        .iter()
        .map(|&instance| {
            let replica = request.replica(instance);
            if request.lineage().contains(&instance) {
                let error = ChangeError::structural(format!(
                    "deferral cycle: {} already received this change",
                    graph.full_name(instance)
                ));
                return Err((replica, error));
            }
            debug!(
                from = %graph.full_name(target),
                to = %graph.full_name(instance),
                "replicating change"
            );
            Ok(replica)
        })
        .collect()
}
