use crate::{core::validate, k8s::KubeCluster, load, pipeline, ProbeClient, Report};
use anyhow::{bail, Context, Result};
use clap::Parser;
use kube::config::{KubeConfigOptions, Kubeconfig};
use rbac_harness_core::Topology;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[clap(
    name = "rbac-harness",
    about = "Provisions an RBAC topology, probes it as each service account, and tears it down"
)]
pub struct Args {
    #[clap(long, default_value = "rbac_harness=info,warn", env = "RBAC_HARNESS_LOG")]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    /// Path to the topology document. Files ending in `.yaml` or `.yml` are
    /// read as YAML, anything else as JSON.
    #[clap(long, default_value = "bootstrap.json", env = "RBAC_HARNESS_BOOTSTRAP")]
    bootstrap: PathBuf,

    #[clap(flatten)]
    kubeconfig: KubeconfigArgs,

    /// Checks the topology's role and subject references before provisioning.
    #[clap(long, value_enum, default_value = "off")]
    preflight: Preflight,
}

/// Selects the cluster to run against.
///
/// Unlike `kubert::ClientArgs`, this resolves to a `kube::Config` rather than
/// a client, so the probe client can target the kubeconfig's `cluster_url`.
#[derive(Clone, Debug, Default, clap::Args)]
pub struct KubeconfigArgs {
    /// The name of the kubeconfig cluster to use
    #[clap(long)]
    pub cluster: Option<String>,

    /// The name of the kubeconfig context to use
    #[clap(long)]
    pub context: Option<String>,

    /// The name of the kubeconfig user to use
    #[clap(long)]
    pub user: Option<String>,

    /// The path to the kubeconfig file to use
    #[clap(long)]
    pub kubeconfig: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Preflight {
    /// Skips the check.
    Off,
    /// Logs dangling references and continues.
    Warn,
    /// Logs dangling references and aborts before provisioning.
    Deny,
}

// === impl Args ===

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            bootstrap,
            kubeconfig,
            preflight,
        } = self;

        log_format
            .try_init(log_level)
            .context("failed to initialize logging")?;

        let report = execute(&bootstrap, &kubeconfig, preflight).await?;
        report.summary().log();
        Ok(())
    }
}

/// Loads and checks the topology, connects, and runs the pipeline.
///
/// Every error is returned before the first control-plane call.
async fn execute(
    bootstrap: &Path,
    kubeconfig: &KubeconfigArgs,
    preflight: Preflight,
) -> Result<Report> {
    let topology = load::topology(bootstrap)?;
    info!(path = %bootstrap.display(), "Loaded topology");
    preflight.check(&topology)?;

    let config = kubeconfig.load_config().await?;
    let probes = ProbeClient::new(config.cluster_url.to_string())
        .context("failed to build probe client")?;
    let client = kube::Client::try_from(config).context("failed to create Kubernetes client")?;

    Ok(pipeline::run(&KubeCluster::new(client), &probes, &topology).await)
}

// === impl KubeconfigArgs ===

impl KubeconfigArgs {
    /// Builds a client configuration from an explicit kubeconfig when one is
    /// given, and otherwise from the environment.
    pub async fn load_config(&self) -> Result<kube::Config> {
        let options = KubeConfigOptions {
            context: self.context.clone(),
            cluster: self.cluster.clone(),
            user: self.user.clone(),
        };

        if let Some(path) = &self.kubeconfig {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("failed to read kubeconfig {}", path.display()))?;
            return kube::Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .with_context(|| format!("invalid kubeconfig {}", path.display()));
        }

        if self.context.is_none() && self.cluster.is_none() && self.user.is_none() {
            return kube::Config::infer()
                .await
                .context("failed to infer a Kubernetes client configuration");
        }

        kube::Config::from_kubeconfig(&options)
            .await
            .context("failed to load the default kubeconfig")
    }
}

// === impl Preflight ===

impl Preflight {
    pub fn check(self, topology: &Topology) -> Result<()> {
        if self == Self::Off {
            return Ok(());
        }

        let issues = validate::validate(topology);
        for issue in &issues {
            warn!(%issue, "Dangling reference");
        }
        if self == Self::Deny && !issues.is_empty() {
            bail!("topology has {} dangling reference(s)", issues.len());
        }
        Ok(())
    }
}
