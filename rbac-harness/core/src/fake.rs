//! An in-memory control plane that journals every call it receives.

use crate::{
    api::{ApiError, ClusterApi, Secret},
    credentials::SERVICE_ACCOUNT_TOKEN_TYPE,
    outcome::{ResourceId, ResourceKind},
    topology::{ClusterRole, ClusterRoleBinding, Role, RoleBinding},
};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Create(ResourceId),
    Delete(ResourceId),
    GetServiceAccount { namespace: String, name: String },
    GetSecret { namespace: String, name: String },
}

#[derive(Debug, Default)]
pub struct FakeCluster {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    objects: BTreeSet<(ResourceKind, Option<String>, String)>,
    failures: HashMap<ResourceId, ApiError>,
    secret_refs: HashMap<(String, String), Vec<String>>,
    secrets: HashMap<(String, String), Secret>,
    calls: Vec<Call>,
}

// === impl FakeCluster ===

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a resource as already present, as if left behind by a prior run.
    pub fn with_existing(self, id: ResourceId) -> Self {
        self.state.lock().objects.insert(key(&id));
        self
    }

    /// Makes every create or delete of `id` fail with `error`.
    pub fn with_failure(self, id: ResourceId, error: ApiError) -> Self {
        self.state.lock().failures.insert(id, error);
        self
    }

    /// Attaches a secret to a service account, appending to its secret list.
    pub fn add_secret(&self, namespace: &str, account: &str, secret: Secret) {
        let mut state = self.state.lock();
        state
            .secret_refs
            .entry((namespace.to_string(), account.to_string()))
            .or_default()
            .push(secret.name.clone());
        state
            .secrets
            .insert((namespace.to_string(), secret.name.clone()), secret);
    }

    /// Lists a secret on a service account without the secret existing.
    pub fn add_dangling_secret_ref(&self, namespace: &str, account: &str, secret: &str) {
        self.state
            .lock()
            .secret_refs
            .entry((namespace.to_string(), account.to_string()))
            .or_default()
            .push(secret.to_string());
    }

    /// Issues a service-account token secret named `<account>-token`.
    pub fn issue_token(&self, namespace: &str, account: &str, token: &str) {
        self.add_secret(
            namespace,
            account,
            Secret {
                name: format!("{account}-token"),
                type_: Some(SERVICE_ACCOUNT_TOKEN_TYPE.to_string()),
                data: [("token".to_string(), token.as_bytes().to_vec())]
                    .into_iter()
                    .collect(),
            },
        );
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn exists(&self, id: &ResourceId) -> bool {
        self.state.lock().objects.contains(&key(id))
    }

    fn create(&self, id: ResourceId) -> Result<(), ApiError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Create(id.clone()));
        if let Some(error) = state.failures.get(&id) {
            return Err(error.clone());
        }
        if !state.objects.insert(key(&id)) {
            return Err(ApiError::AlreadyExists(id.to_string()));
        }
        Ok(())
    }

    fn delete(&self, id: ResourceId) -> Result<(), ApiError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Delete(id.clone()));
        if let Some(error) = state.failures.get(&id) {
            return Err(error.clone());
        }
        if !state.objects.remove(&key(&id)) {
            return Err(ApiError::NotFound(id.to_string()));
        }
        if id.kind == ResourceKind::Namespace {
            // Namespaced objects go with their namespace.
            let ns = Some(id.name);
            state.objects.retain(|(_, n, _)| *n != ns);
        }
        Ok(())
    }
}

fn key(id: &ResourceId) -> (ResourceKind, Option<String>, String) {
    (id.kind, id.namespace.clone(), id.name.clone())
}

#[async_trait::async_trait]
impl ClusterApi for FakeCluster {
    async fn create_namespace(&self, name: &str) -> Result<(), ApiError> {
        self.create(ResourceId::cluster(ResourceKind::Namespace, name))
    }

    async fn create_service_account(&self, namespace: &str, name: &str) -> Result<(), ApiError> {
        self.create(ResourceId::namespaced(
            ResourceKind::ServiceAccount,
            namespace,
            name,
        ))
    }

    async fn create_role(&self, role: &Role) -> Result<(), ApiError> {
        self.create(ResourceId::namespaced(
            ResourceKind::Role,
            &role.namespace,
            &role.name,
        ))
    }

    async fn create_cluster_role(&self, role: &ClusterRole) -> Result<(), ApiError> {
        self.create(ResourceId::cluster(ResourceKind::ClusterRole, &role.name))
    }

    async fn create_role_binding(&self, binding: &RoleBinding) -> Result<(), ApiError> {
        self.create(ResourceId::namespaced(
            ResourceKind::RoleBinding,
            &binding.namespace,
            &binding.name,
        ))
    }

    async fn create_cluster_role_binding(
        &self,
        binding: &ClusterRoleBinding,
    ) -> Result<(), ApiError> {
        self.create(ResourceId::cluster(
            ResourceKind::ClusterRoleBinding,
            &binding.name,
        ))
    }

    async fn service_account_secrets(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Vec<String>, ApiError> {
        let mut state = self.state.lock();
        state.calls.push(Call::GetServiceAccount {
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
        let id = ResourceId::namespaced(ResourceKind::ServiceAccount, namespace, name);
        if !state.objects.contains(&key(&id)) {
            return Err(ApiError::NotFound(id.to_string()));
        }
        Ok(state
            .secret_refs
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, ApiError> {
        let mut state = self.state.lock();
        state.calls.push(Call::GetSecret {
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
        state
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Secret {namespace}/{name}")))
    }

    async fn delete_namespace(&self, name: &str) -> Result<(), ApiError> {
        self.delete(ResourceId::cluster(ResourceKind::Namespace, name))
    }

    async fn delete_cluster_role_binding(&self, name: &str) -> Result<(), ApiError> {
        self.delete(ResourceId::cluster(ResourceKind::ClusterRoleBinding, name))
    }

    async fn delete_cluster_role(&self, name: &str) -> Result<(), ApiError> {
        self.delete(ResourceId::cluster(ResourceKind::ClusterRole, name))
    }
}
