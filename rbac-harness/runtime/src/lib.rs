#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use rbac_harness_core as core;
pub use rbac_harness_k8s as k8s;

mod args;
pub mod load;
pub mod pipeline;
pub mod verify;

pub use self::{
    args::{Args, KubeconfigArgs, Preflight},
    pipeline::{Report, Summary},
    verify::ProbeClient,
};
