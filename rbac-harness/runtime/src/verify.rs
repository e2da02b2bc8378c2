use rbac_harness_core::{
    resolve_token,
    topology::{Probe, ServiceAccount},
    AccountOutcome, AccountReport, ClusterApi, ProbeOutcome, ProbeResult, Token, Topology,
};
use tracing::{info, warn};

/// Issues authorization probes against the control plane's API endpoint.
///
/// Server certificates are not verified. The control-plane client keeps its
/// own TLS configuration.
#[derive(Clone, Debug)]
pub struct ProbeClient {
    http: reqwest::Client,
    endpoint: String,
}

/// Replays every service account's probes with that account's credential.
///
/// Accounts are handled in declaration order. An account whose credential
/// cannot be resolved has its probes skipped and the remaining accounts are
/// still verified.
pub async fn verify<C>(
    cluster: &C,
    client: &ProbeClient,
    topology: &Topology,
) -> Vec<AccountReport>
where
    C: ClusterApi + ?Sized,
{
    let mut reports = Vec::with_capacity(topology.service_accounts.len());
    for sa in &topology.service_accounts {
        let outcome = match resolve_token(cluster, &sa.namespace, &sa.name).await {
            Ok(Some(token)) => AccountOutcome::Probed(probe_account(client, sa, &token).await),
            Ok(None) => {
                warn!(
                    account = %sa.name,
                    namespace = %sa.namespace,
                    "No service account token found; skipping probes"
                );
                AccountOutcome::NoCredential
            }
            Err(error) => {
                warn!(
                    account = %sa.name,
                    namespace = %sa.namespace,
                    %error,
                    "Failed to resolve service account token; skipping probes"
                );
                AccountOutcome::Unresolved(error)
            }
        };
        reports.push(AccountReport {
            name: sa.name.clone(),
            namespace: sa.namespace.clone(),
            outcome,
        });
    }
    reports
}

async fn probe_account(
    client: &ProbeClient,
    sa: &ServiceAccount,
    token: &Token,
) -> Vec<ProbeResult> {
    let mut results = Vec::with_capacity(sa.probes.len());
    for probe in &sa.probes {
        let outcome = client.probe(token, probe).await;
        match &outcome {
            ProbeOutcome::Pass => info!(
                account = %sa.name,
                namespace = %sa.namespace,
                path = %probe.path,
                expected = probe.expected_code,
                observed = probe.expected_code,
                "Probe passed"
            ),
            ProbeOutcome::Fail { observed } => warn!(
                account = %sa.name,
                namespace = %sa.namespace,
                path = %probe.path,
                expected = probe.expected_code,
                observed,
                "Probe failed"
            ),
            ProbeOutcome::Skipped { error } => warn!(
                account = %sa.name,
                namespace = %sa.namespace,
                path = %probe.path,
                expected = probe.expected_code,
                %error,
                "Probe request failed"
            ),
        }
        results.push(ProbeResult {
            path: probe.path.clone(),
            expected: probe.expected_code,
            outcome,
        });
    }
    results
}

// === impl ProbeClient ===

impl ProbeClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Issues a single GET for `probe.path` as the holder of `token`.
    pub async fn probe(&self, token: &Token, probe: &Probe) -> ProbeOutcome {
        let url = format!("{}{}", self.endpoint, probe.path);
        match self.http.get(url).bearer_auth(token.as_str()).send().await {
            Ok(rsp) => {
                let observed = rsp.status().as_u16();
                if observed == probe.expected_code {
                    ProbeOutcome::Pass
                } else {
                    ProbeOutcome::Fail { observed }
                }
            }
            Err(error) => ProbeOutcome::Skipped {
                error: error.to_string(),
            },
        }
    }
}
