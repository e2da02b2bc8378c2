//! Per-resource and per-probe results produced by each pipeline phase.

use crate::{api::ApiError, credentials::CredentialError};
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Namespace,
    ServiceAccount,
    Role,
    ClusterRole,
    RoleBinding,
    ClusterRoleBinding,
}

/// Names a single control-plane object touched by the harness.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub kind: ResourceKind,
    pub namespace: Option<String>,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceResult {
    pub id: ResourceId,
    pub result: Result<(), ApiError>,
}

/// The verification result for one service account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountReport {
    pub name: String,
    pub namespace: String,
    pub outcome: AccountOutcome,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountOutcome {
    /// The credential lookup failed, so no probes ran.
    Unresolved(CredentialError),

    /// The account exists but no credential has been issued for it.
    NoCredential,

    /// A credential was resolved and every probe was attempted.
    Probed(Vec<ProbeResult>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeResult {
    pub path: String,
    pub expected: u16,
    pub outcome: ProbeOutcome,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    Pass,
    Fail { observed: u16 },

    /// The request could not be completed, so there is nothing to compare.
    Skipped { error: String },
}

// === impl ResourceKind ===

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Namespace => "Namespace",
            Self::ServiceAccount => "ServiceAccount",
            Self::Role => "Role",
            Self::ClusterRole => "ClusterRole",
            Self::RoleBinding => "RoleBinding",
            Self::ClusterRoleBinding => "ClusterRoleBinding",
        };
        f.write_str(kind)
    }
}

// === impl ResourceId ===

impl ResourceId {
    pub fn cluster(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: None,
            name: name.into(),
        }
    }

    pub fn namespaced(
        kind: ResourceKind,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.kind, ns, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

// === impl ResourceResult ===

impl ResourceResult {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

// === impl AccountReport ===

impl AccountReport {
    pub fn probes(&self) -> &[ProbeResult] {
        match &self.outcome {
            AccountOutcome::Probed(probes) => probes,
            _ => &[],
        }
    }
}

// === impl ProbeResult ===

impl ProbeResult {
    pub fn observed(&self) -> Option<u16> {
        match self.outcome {
            ProbeOutcome::Pass => Some(self.expected),
            ProbeOutcome::Fail { observed } => Some(observed),
            ProbeOutcome::Skipped { .. } => None,
        }
    }
}
