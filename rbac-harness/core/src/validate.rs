//! Optional referential-integrity checks run before provisioning.
//!
//! The control plane accepts bindings that reference roles or subjects that do
//! not exist, so typos in a topology otherwise only show up as failed probes.

use crate::{
    outcome::{ResourceId, ResourceKind},
    topology::{
        RoleRef, Subject, Topology, CLUSTER_ROLE_KIND, ROLE_KIND, SERVICE_ACCOUNT_KIND,
    },
};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Issue {
    #[error("{resource} is in undeclared namespace {namespace}")]
    UndeclaredNamespace {
        resource: ResourceId,
        namespace: String,
    },

    #[error("{binding} references undeclared Role {namespace}/{name}")]
    UnresolvedRole {
        binding: ResourceId,
        namespace: String,
        name: String,
    },

    #[error("{binding} references undeclared ClusterRole {name}")]
    UnresolvedClusterRole { binding: ResourceId, name: String },

    #[error("{binding} references a Role but is cluster-scoped")]
    RoleInClusterBinding { binding: ResourceId },

    #[error("{binding} references unknown role kind {kind:?}")]
    UnknownRoleKind { binding: ResourceId, kind: String },

    #[error("{binding} grants to undeclared ServiceAccount {namespace}/{name}")]
    UnresolvedSubject {
        binding: ResourceId,
        namespace: String,
        name: String,
    },
}

struct Declared<'t> {
    namespaces: HashSet<&'t str>,
    accounts: HashSet<(&'t str, &'t str)>,
    roles: HashSet<(&'t str, &'t str)>,
    cluster_roles: HashSet<&'t str>,
}

/// Returns every dangling reference in the topology, in declaration order.
///
/// Only references into the topology itself are checked, so a binding to a
/// built-in cluster role such as `view` is reported as unresolved.
pub fn validate(topology: &Topology) -> Vec<Issue> {
    let declared = Declared::from(topology);
    let mut issues = Vec::new();

    for sa in &topology.service_accounts {
        let id = ResourceId::namespaced(ResourceKind::ServiceAccount, &sa.namespace, &sa.name);
        declared.check_namespace(id, &sa.namespace, &mut issues);
    }

    for role in &topology.roles {
        let id = ResourceId::namespaced(ResourceKind::Role, &role.namespace, &role.name);
        declared.check_namespace(id, &role.namespace, &mut issues);
    }

    for rb in &topology.role_bindings {
        let id = ResourceId::namespaced(ResourceKind::RoleBinding, &rb.namespace, &rb.name);
        declared.check_namespace(id.clone(), &rb.namespace, &mut issues);
        declared.check_role_ref(&id, Some(rb.namespace.as_str()), &rb.role, &mut issues);
        declared.check_subjects(&id, Some(rb.namespace.as_str()), &rb.subjects, &mut issues);
    }

    for crb in &topology.cluster_role_bindings {
        let id = ResourceId::cluster(ResourceKind::ClusterRoleBinding, &crb.name);
        declared.check_role_ref(&id, None, &crb.role, &mut issues);
        declared.check_subjects(&id, None, &crb.subjects, &mut issues);
    }

    issues
}

// === impl Declared ===

impl<'t> From<&'t Topology> for Declared<'t> {
    fn from(topology: &'t Topology) -> Self {
        Self {
            namespaces: topology.namespaces.iter().map(String::as_str).collect(),
            accounts: topology
                .service_accounts
                .iter()
                .map(|sa| (sa.namespace.as_str(), sa.name.as_str()))
                .collect(),
            roles: topology
                .roles
                .iter()
                .map(|r| (r.namespace.as_str(), r.name.as_str()))
                .collect(),
            cluster_roles: topology
                .cluster_roles
                .iter()
                .map(|r| r.name.as_str())
                .collect(),
        }
    }
}

impl Declared<'_> {
    fn check_namespace(&self, resource: ResourceId, ns: &str, issues: &mut Vec<Issue>) {
        if !self.namespaces.contains(ns) {
            issues.push(Issue::UndeclaredNamespace {
                resource,
                namespace: ns.to_string(),
            });
        }
    }

    /// `ns` is the binding's namespace, or `None` for cluster-scoped bindings.
    fn check_role_ref(
        &self,
        binding: &ResourceId,
        ns: Option<&str>,
        role: &RoleRef,
        issues: &mut Vec<Issue>,
    ) {
        match (role.kind.as_str(), ns) {
            (ROLE_KIND, Some(ns)) => {
                if !self.roles.contains(&(ns, role.name.as_str())) {
                    issues.push(Issue::UnresolvedRole {
                        binding: binding.clone(),
                        namespace: ns.to_string(),
                        name: role.name.clone(),
                    });
                }
            }
            (ROLE_KIND, None) => issues.push(Issue::RoleInClusterBinding {
                binding: binding.clone(),
            }),
            (CLUSTER_ROLE_KIND, _) => {
                if !self.cluster_roles.contains(role.name.as_str()) {
                    issues.push(Issue::UnresolvedClusterRole {
                        binding: binding.clone(),
                        name: role.name.clone(),
                    });
                }
            }
            (kind, _) => issues.push(Issue::UnknownRoleKind {
                binding: binding.clone(),
                kind: kind.to_string(),
            }),
        }
    }

    fn check_subjects(
        &self,
        binding: &ResourceId,
        ns: Option<&str>,
        subjects: &[Subject],
        issues: &mut Vec<Issue>,
    ) {
        for subject in subjects {
            if subject.kind != SERVICE_ACCOUNT_KIND {
                continue;
            }
            let subject_ns = match (subject.namespace.as_str(), ns) {
                ("", Some(ns)) => ns,
                (subject_ns, _) => subject_ns,
            };
            if !self.accounts.contains(&(subject_ns, subject.name.as_str())) {
                issues.push(Issue::UnresolvedSubject {
                    binding: binding.clone(),
                    namespace: subject_ns.to_string(),
                    name: subject.name.clone(),
                });
            }
        }
    }
}
