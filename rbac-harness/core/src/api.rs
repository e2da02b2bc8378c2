use crate::topology::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use std::collections::BTreeMap;
use thiserror::Error;

/// A control-plane request failure.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{reason} ({code}): {message}")]
    Status {
        code: u16,
        reason: String,
        message: String,
    },

    #[error("request failed: {0}")]
    Transport(String),
}

/// The parts of a secret the credential lookup inspects.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Secret {
    pub name: String,
    pub type_: Option<String>,
    pub data: BTreeMap<String, Vec<u8>>,
}

/// Models the control-plane operations the pipeline issues.
///
/// Each call is a single attempt; implementations must not retry.
#[async_trait::async_trait]
pub trait ClusterApi {
    async fn create_namespace(&self, name: &str) -> Result<(), ApiError>;

    async fn create_service_account(&self, namespace: &str, name: &str) -> Result<(), ApiError>;

    async fn create_role(&self, role: &Role) -> Result<(), ApiError>;

    async fn create_cluster_role(&self, role: &ClusterRole) -> Result<(), ApiError>;

    async fn create_role_binding(&self, binding: &RoleBinding) -> Result<(), ApiError>;

    async fn create_cluster_role_binding(
        &self,
        binding: &ClusterRoleBinding,
    ) -> Result<(), ApiError>;

    /// Returns the names of the secrets referenced by a service account, in
    /// the order the control plane lists them.
    async fn service_account_secrets(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Vec<String>, ApiError>;

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, ApiError>;

    async fn delete_namespace(&self, name: &str) -> Result<(), ApiError>;

    async fn delete_cluster_role_binding(&self, name: &str) -> Result<(), ApiError>;

    async fn delete_cluster_role(&self, name: &str) -> Result<(), ApiError>;
}
