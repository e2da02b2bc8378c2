//! The declarative access-control topology.
//!
//! Field names follow the bootstrap document format, so a topology can be
//! deserialized directly from JSON or YAML.

use serde::{Deserialize, Serialize};

/// Everything the harness provisions, probes, and tears down.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Topology {
    #[serde(default)]
    pub service_accounts: Vec<ServiceAccount>,

    #[serde(default)]
    pub namespaces: Vec<String>,

    #[serde(default)]
    pub roles: Vec<Role>,

    #[serde(default)]
    pub cluster_roles: Vec<ClusterRole>,

    #[serde(default)]
    pub role_bindings: Vec<RoleBinding>,

    #[serde(default)]
    pub cluster_role_bindings: Vec<ClusterRoleBinding>,
}

/// A service identity along with the authorization probes to run as it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    pub name: String,
    pub namespace: String,

    #[serde(default, rename = "tests")]
    pub probes: Vec<Probe>,
}

/// A request path and the status code expected when it is issued as the
/// owning service account.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Probe {
    pub path: String,
    pub expected_code: u16,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub name: String,
    pub namespace: String,

    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRole {
    pub name: String,

    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// An allow-rule. List order carries no meaning.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default)]
    pub resources: Vec<String>,

    #[serde(default)]
    pub verbs: Vec<String>,

    #[serde(default)]
    pub api_groups: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_names: Option<Vec<String>>,

    #[serde(
        default,
        rename = "nonResourceURLs",
        skip_serializing_if = "Option::is_none"
    )]
    pub non_resource_urls: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBinding {
    pub name: String,
    pub namespace: String,

    #[serde(default)]
    pub subjects: Vec<Subject>,

    pub role: RoleRef,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRoleBinding {
    pub name: String,

    #[serde(default)]
    pub subjects: Vec<Subject>,

    pub role: RoleRef,
}

/// Names the role a binding grants. It is never resolved locally before the
/// binding is submitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRef {
    pub kind: String,
    pub name: String,

    #[serde(default)]
    pub api_group: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub kind: String,
    pub name: String,

    #[serde(default)]
    pub api_group: String,

    #[serde(default)]
    pub namespace: String,
}

pub const ROLE_KIND: &str = "Role";
pub const CLUSTER_ROLE_KIND: &str = "ClusterRole";
pub const SERVICE_ACCOUNT_KIND: &str = "ServiceAccount";
