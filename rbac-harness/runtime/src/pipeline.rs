use crate::verify::{self, ProbeClient};
use rbac_harness_core::{
    provision, teardown, AccountOutcome, AccountReport, ClusterApi, ProbeOutcome, ResourceResult,
    Topology,
};
use tracing::{info, info_span, Instrument};

/// The per-resource results of each phase of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub provisioned: Vec<ResourceResult>,
    pub verified: Vec<AccountReport>,
    pub torn_down: Vec<ResourceResult>,
}

/// Counts derived from a [`Report`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub created: usize,
    pub create_failures: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub unverified_accounts: usize,
    pub deleted: usize,
    pub delete_failures: usize,
}

/// Provisions the topology, verifies it, and tears it down.
///
/// Each phase runs to completion regardless of what the previous phase
/// reported.
pub async fn run<C>(cluster: &C, probes: &ProbeClient, topology: &Topology) -> Report
where
    C: ClusterApi + ?Sized,
{
    let provisioned = provision(cluster, topology)
        .instrument(info_span!("provision"))
        .await;
    let verified = verify::verify(cluster, probes, topology)
        .instrument(info_span!("verify", endpoint = %probes.endpoint()))
        .await;
    let torn_down = teardown(cluster, topology)
        .instrument(info_span!("teardown"))
        .await;

    Report {
        provisioned,
        verified,
        torn_down,
    }
}

// === impl Report ===

impl Report {
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();

        for res in &self.provisioned {
            if res.is_ok() {
                summary.created += 1;
            } else {
                summary.create_failures += 1;
            }
        }

        for account in &self.verified {
            if let AccountOutcome::Probed(probes) = &account.outcome {
                for probe in probes {
                    match probe.outcome {
                        ProbeOutcome::Pass => summary.passed += 1,
                        ProbeOutcome::Fail { .. } => summary.failed += 1,
                        ProbeOutcome::Skipped { .. } => summary.skipped += 1,
                    }
                }
            } else {
                summary.unverified_accounts += 1;
            }
        }

        for res in &self.torn_down {
            if res.is_ok() {
                summary.deleted += 1;
            } else {
                summary.delete_failures += 1;
            }
        }

        summary
    }
}

// === impl Summary ===

impl Summary {
    pub fn log(&self) {
        info!(
            created = self.created,
            create_failures = self.create_failures,
            passed = self.passed,
            failed = self.failed,
            skipped = self.skipped,
            unverified_accounts = self.unverified_accounts,
            deleted = self.deleted,
            delete_failures = self.delete_failures,
            "Finished"
        );
    }
}
