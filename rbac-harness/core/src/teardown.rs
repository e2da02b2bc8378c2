use crate::{
    api::{ApiError, ClusterApi},
    outcome::{ResourceId, ResourceKind, ResourceResult},
    topology::Topology,
};
use tracing::{info, warn};

/// Deletes the namespaces, cluster role bindings, and cluster roles declared
/// in the topology, in that order.
///
/// Roles, role bindings, and service accounts are removed by the control plane
/// along with their namespace and are not deleted individually. Every
/// deletion is attempted regardless of how provisioning or earlier deletions
/// went.
pub async fn teardown<C>(cluster: &C, topology: &Topology) -> Vec<ResourceResult>
where
    C: ClusterApi + ?Sized,
{
    let mut results = Vec::new();

    for ns in &topology.namespaces {
        let id = ResourceId::cluster(ResourceKind::Namespace, ns);
        results.push(deleted(id, cluster.delete_namespace(ns).await));
    }

    for crb in &topology.cluster_role_bindings {
        let id = ResourceId::cluster(ResourceKind::ClusterRoleBinding, &crb.name);
        let res = cluster.delete_cluster_role_binding(&crb.name).await;
        results.push(deleted(id, res));
    }

    for role in &topology.cluster_roles {
        let id = ResourceId::cluster(ResourceKind::ClusterRole, &role.name);
        results.push(deleted(id, cluster.delete_cluster_role(&role.name).await));
    }

    results
}

fn deleted(id: ResourceId, result: Result<(), ApiError>) -> ResourceResult {
    match &result {
        Ok(()) => info!(kind = %id.kind, name = %id.name, "Deleted"),
        Err(error) => warn!(kind = %id.kind, name = %id.name, %error, "Failed to delete"),
    }
    ResourceResult { id, result }
}
