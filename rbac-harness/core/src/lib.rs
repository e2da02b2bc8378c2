#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod api;
pub mod credentials;
#[cfg(any(test, feature = "test-util"))]
pub mod fake;
pub mod outcome;
pub mod provision;
pub mod teardown;
pub mod topology;
pub mod validate;

pub use self::{
    api::{ApiError, ClusterApi, Secret},
    credentials::{resolve_token, CredentialError, Token},
    outcome::{
        AccountOutcome, AccountReport, ProbeOutcome, ProbeResult, ResourceId, ResourceKind,
        ResourceResult,
    },
    provision::provision,
    teardown::teardown,
    topology::Topology,
};

/// Identifies writes made by this harness to the control plane.
pub const FIELD_MANAGER: &str = "rbac-harness";
