use crate::{
    resources, Api, Client, ClusterRole, ClusterRoleBinding, Error, Namespace, Role, RoleBinding,
    Secret, ServiceAccount,
};
use kube::{
    api::{DeleteParams, PostParams},
    core::ErrorResponse,
};
use rbac_harness_core::{
    api::{self, ApiError, ClusterApi},
    topology, FIELD_MANAGER,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// Issues the harness's control-plane calls through a Kubernetes client.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

// === impl KubeCluster ===

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn post_params() -> PostParams {
        PostParams {
            dry_run: false,
            field_manager: Some(FIELD_MANAGER.to_string()),
        }
    }

    async fn create<K>(api: Api<K>, obj: &K) -> Result<(), ApiError>
    where
        K: kube::Resource + Clone + Debug + DeserializeOwned + Serialize,
    {
        tracing::trace!(?obj, "Creating");
        api.create(&Self::post_params(), obj)
            .await
            .map(|_| ())
            .map_err(api_error)
    }

    async fn delete<K>(api: Api<K>, name: &str) -> Result<(), ApiError>
    where
        K: kube::Resource + Clone + Debug + DeserializeOwned,
    {
        api.delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(api_error)
    }
}

#[async_trait::async_trait]
impl ClusterApi for KubeCluster {
    async fn create_namespace(&self, name: &str) -> Result<(), ApiError> {
        let api = Api::<Namespace>::all(self.client.clone());
        Self::create(api, &resources::namespace(name)).await
    }

    async fn create_service_account(&self, namespace: &str, name: &str) -> Result<(), ApiError> {
        let api = Api::<ServiceAccount>::namespaced(self.client.clone(), namespace);
        Self::create(api, &resources::service_account(namespace, name)).await
    }

    async fn create_role(&self, role: &topology::Role) -> Result<(), ApiError> {
        let api = Api::<Role>::namespaced(self.client.clone(), &role.namespace);
        Self::create(api, &resources::role(role)).await
    }

    async fn create_cluster_role(&self, role: &topology::ClusterRole) -> Result<(), ApiError> {
        let api = Api::<ClusterRole>::all(self.client.clone());
        Self::create(api, &resources::cluster_role(role)).await
    }

    async fn create_role_binding(&self, binding: &topology::RoleBinding) -> Result<(), ApiError> {
        let api = Api::<RoleBinding>::namespaced(self.client.clone(), &binding.namespace);
        Self::create(api, &resources::role_binding(binding)).await
    }

    async fn create_cluster_role_binding(
        &self,
        binding: &topology::ClusterRoleBinding,
    ) -> Result<(), ApiError> {
        let api = Api::<ClusterRoleBinding>::all(self.client.clone());
        Self::create(api, &resources::cluster_role_binding(binding)).await
    }

    async fn service_account_secrets(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Vec<String>, ApiError> {
        let sa = Api::<ServiceAccount>::namespaced(self.client.clone(), namespace)
            .get(name)
            .await
            .map_err(api_error)?;
        Ok(sa
            .secrets
            .unwrap_or_default()
            .into_iter()
            .filter_map(|r| r.name)
            .collect())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<api::Secret, ApiError> {
        let secret = Api::<Secret>::namespaced(self.client.clone(), namespace)
            .get(name)
            .await
            .map_err(api_error)?;
        Ok(api::Secret {
            name: secret.metadata.name.unwrap_or_else(|| name.to_string()),
            type_: secret.type_,
            data: secret
                .data
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, v.0))
                .collect(),
        })
    }

    async fn delete_namespace(&self, name: &str) -> Result<(), ApiError> {
        Self::delete(Api::<Namespace>::all(self.client.clone()), name).await
    }

    async fn delete_cluster_role_binding(&self, name: &str) -> Result<(), ApiError> {
        Self::delete(Api::<ClusterRoleBinding>::all(self.client.clone()), name).await
    }

    async fn delete_cluster_role(&self, name: &str) -> Result<(), ApiError> {
        Self::delete(Api::<ClusterRole>::all(self.client.clone()), name).await
    }
}

fn api_error(error: Error) -> ApiError {
    match error {
        Error::Api(ErrorResponse { code: 409, message, reason, .. })
            if reason == "AlreadyExists" =>
        {
            ApiError::AlreadyExists(message)
        }
        Error::Api(ErrorResponse { code: 404, message, .. }) => ApiError::NotFound(message),
        Error::Api(ErrorResponse {
            code,
            message,
            reason,
            ..
        }) => ApiError::Status {
            code,
            reason,
            message,
        },
        error => ApiError::Transport(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(code: u16, reason: &str, message: &str) -> Error {
        Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: message.to_string(),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn maps_status_responses() {
        assert_eq!(
            api_error(response(
                409,
                "AlreadyExists",
                r#"namespaces "team-a" already exists"#
            )),
            ApiError::AlreadyExists(r#"namespaces "team-a" already exists"#.to_string())
        );
        assert_eq!(
            api_error(response(404, "NotFound", r#"serviceaccounts "bob" not found"#)),
            ApiError::NotFound(r#"serviceaccounts "bob" not found"#.to_string())
        );
        assert_eq!(
            api_error(response(409, "Conflict", "the object has been modified")),
            ApiError::Status {
                code: 409,
                reason: "Conflict".to_string(),
                message: "the object has been modified".to_string(),
            }
        );
        assert_eq!(
            api_error(response(403, "Forbidden", "cannot create clusterroles")),
            ApiError::Status {
                code: 403,
                reason: "Forbidden".to_string(),
                message: "cannot create clusterroles".to_string(),
            }
        );
    }

    #[test]
    fn maps_transport_errors() {
        let err = api_error(Error::SerdeError(
            serde_json::from_str::<ErrorResponse>("not json").unwrap_err(),
        ));
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
