//! Builds Kubernetes objects from topology declarations.

use crate::{
    ClusterRole, ClusterRoleBinding, Namespace, ObjectMeta, PolicyRule, Role, RoleBinding,
    RoleRef, ServiceAccount, Subject,
};
use rbac_harness_core::topology;

pub fn namespace(name: &str) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn service_account(ns: &str, name: &str) -> ServiceAccount {
    ServiceAccount {
        metadata: namespaced_meta(ns, name),
        ..Default::default()
    }
}

pub fn role(role: &topology::Role) -> Role {
    Role {
        metadata: namespaced_meta(&role.namespace, &role.name),
        rules: Some(rules(&role.rules)),
    }
}

pub fn cluster_role(role: &topology::ClusterRole) -> ClusterRole {
    ClusterRole {
        metadata: ObjectMeta {
            name: Some(role.name.clone()),
            ..Default::default()
        },
        rules: Some(rules(&role.rules)),
        ..Default::default()
    }
}

pub fn role_binding(binding: &topology::RoleBinding) -> RoleBinding {
    RoleBinding {
        metadata: namespaced_meta(&binding.namespace, &binding.name),
        role_ref: role_ref(&binding.role),
        subjects: Some(subjects(&binding.subjects)),
    }
}

pub fn cluster_role_binding(binding: &topology::ClusterRoleBinding) -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: ObjectMeta {
            name: Some(binding.name.clone()),
            ..Default::default()
        },
        role_ref: role_ref(&binding.role),
        subjects: Some(subjects(&binding.subjects)),
    }
}

fn namespaced_meta(ns: &str, name: &str) -> ObjectMeta {
    ObjectMeta {
        namespace: Some(ns.to_string()),
        name: Some(name.to_string()),
        ..Default::default()
    }
}

fn rules(rules: &[topology::Rule]) -> Vec<PolicyRule> {
    rules
        .iter()
        .map(|rule| PolicyRule {
            api_groups: Some(rule.api_groups.clone()),
            resources: Some(rule.resources.clone()),
            verbs: rule.verbs.clone(),
            resource_names: rule.resource_names.clone(),
            non_resource_urls: rule.non_resource_urls.clone(),
        })
        .collect()
}

fn role_ref(role: &topology::RoleRef) -> RoleRef {
    RoleRef {
        api_group: role.api_group.clone(),
        kind: role.kind.clone(),
        name: role.name.clone(),
    }
}

fn subjects(subjects: &[topology::Subject]) -> Vec<Subject> {
    subjects
        .iter()
        .map(|s| Subject {
            kind: s.kind.clone(),
            name: s.name.clone(),
            api_group: non_empty(&s.api_group),
            namespace: non_empty(&s.namespace),
        })
        .collect()
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
