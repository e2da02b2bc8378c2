#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod cluster;
pub mod resources;

pub use self::cluster::KubeCluster;
pub use k8s_openapi::api::{
    core::v1::{Namespace, Secret, ServiceAccount},
    rbac::v1::{ClusterRole, ClusterRoleBinding, PolicyRule, Role, RoleBinding, RoleRef, Subject},
};
pub use kube::{
    api::{Api, ObjectMeta},
    Client, Error,
};
