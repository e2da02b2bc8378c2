use crate::{
    api::{ApiError, ClusterApi},
    outcome::{ResourceId, ResourceKind, ResourceResult},
    topology::Topology,
};
use tracing::{info, warn};

/// Creates every resource declared in the topology.
///
/// Namespaces are created first, then service accounts, roles, cluster roles,
/// role bindings, and finally cluster role bindings. Each resource is
/// attempted exactly once and a failure never prevents the remaining
/// attempts. The returned results are in attempt order.
pub async fn provision<C>(cluster: &C, topology: &Topology) -> Vec<ResourceResult>
where
    C: ClusterApi + ?Sized,
{
    let mut results = Vec::new();

    for ns in &topology.namespaces {
        let id = ResourceId::cluster(ResourceKind::Namespace, ns);
        results.push(created(id, cluster.create_namespace(ns).await));
    }

    for sa in &topology.service_accounts {
        let id = ResourceId::namespaced(ResourceKind::ServiceAccount, &sa.namespace, &sa.name);
        let res = cluster.create_service_account(&sa.namespace, &sa.name).await;
        results.push(created(id, res));
    }

    for role in &topology.roles {
        let id = ResourceId::namespaced(ResourceKind::Role, &role.namespace, &role.name);
        results.push(created(id, cluster.create_role(role).await));
    }

    for role in &topology.cluster_roles {
        let id = ResourceId::cluster(ResourceKind::ClusterRole, &role.name);
        results.push(created(id, cluster.create_cluster_role(role).await));
    }

    for rb in &topology.role_bindings {
        let id = ResourceId::namespaced(ResourceKind::RoleBinding, &rb.namespace, &rb.name);
        results.push(created(id, cluster.create_role_binding(rb).await));
    }

    for crb in &topology.cluster_role_bindings {
        let id = ResourceId::cluster(ResourceKind::ClusterRoleBinding, &crb.name);
        let res = cluster.create_cluster_role_binding(crb).await;
        results.push(created(id, res));
    }

    results
}

fn created(id: ResourceId, result: Result<(), ApiError>) -> ResourceResult {
    match &result {
        Ok(()) => info!(kind = %id.kind, namespace = ?id.namespace, name = %id.name, "Created"),
        Err(error) => warn!(
            kind = %id.kind,
            namespace = ?id.namespace,
            name = %id.name,
            %error,
            "Failed to create"
        ),
    }
    ResourceResult { id, result }
}
