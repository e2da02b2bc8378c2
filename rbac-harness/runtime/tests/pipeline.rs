mod support;

use rbac_harness_core::{
    fake::{Call, FakeCluster},
    topology::*,
    ApiError, ProbeOutcome, ResourceId, ResourceKind,
};
use rbac_harness_runtime::{pipeline, ProbeClient, Summary};
use support::ApiServer;

const PODS: &str = "/api/v1/namespaces/team-a/pods";

/// A namespace with one account that should be able to list pods.
fn team_a(with_binding: bool) -> Topology {
    let role_bindings = if with_binding {
        vec![RoleBinding {
            name: "alice-reads-pods".to_string(),
            namespace: "team-a".to_string(),
            subjects: vec![Subject {
                kind: SERVICE_ACCOUNT_KIND.to_string(),
                name: "alice".to_string(),
                namespace: "team-a".to_string(),
                ..Default::default()
            }],
            role: RoleRef {
                kind: ROLE_KIND.to_string(),
                name: "pod-reader".to_string(),
                api_group: "rbac.authorization.k8s.io".to_string(),
            },
        }]
    } else {
        vec![]
    };

    Topology {
        namespaces: vec!["team-a".to_string()],
        service_accounts: vec![ServiceAccount {
            name: "alice".to_string(),
            namespace: "team-a".to_string(),
            probes: vec![Probe {
                path: PODS.to_string(),
                expected_code: 200,
            }],
        }],
        roles: vec![Role {
            name: "pod-reader".to_string(),
            namespace: "team-a".to_string(),
            rules: vec![Rule {
                resources: vec!["pods".to_string()],
                verbs: vec!["get".to_string(), "list".to_string()],
                api_groups: vec!["".to_string()],
                ..Default::default()
            }],
        }],
        cluster_roles: vec![ClusterRole {
            name: "cluster-admin".to_string(),
            rules: vec![],
        }],
        role_bindings,
        ..Default::default()
    }
}

#[tokio::test(flavor = "current_thread")]
async fn bound_account_passes() {
    let server = ApiServer::new([("alice-token", vec![PODS])]);
    let probes = ProbeClient::new(server.spawn().await).expect("client must build");
    let cluster = FakeCluster::new();
    cluster.issue_token("team-a", "alice", "alice-token");

    let report = pipeline::run(&cluster, &probes, &team_a(true)).await;

    assert_eq!(report.verified[0].probes()[0].outcome, ProbeOutcome::Pass);
    assert_eq!(
        report.summary(),
        Summary {
            created: 5,
            passed: 1,
            deleted: 2,
            ..Default::default()
        }
    );
}

#[tokio::test(flavor = "current_thread")]
async fn unbound_account_fails() {
    // The stand-in server grants nothing to alice, as the control plane would
    // without a binding.
    let server = ApiServer::new([("alice-token", vec![])]);
    let probes = ProbeClient::new(server.spawn().await).expect("client must build");
    let cluster = FakeCluster::new();
    cluster.issue_token("team-a", "alice", "alice-token");

    let report = pipeline::run(&cluster, &probes, &team_a(false)).await;

    assert_eq!(
        report.verified[0].probes()[0].outcome,
        ProbeOutcome::Fail { observed: 403 }
    );
    assert_eq!(report.summary().failed, 1);
}

#[tokio::test(flavor = "current_thread")]
async fn phases_run_in_order_despite_failures() {
    let server = ApiServer::new([("alice-token", vec![PODS])]);
    let probes = ProbeClient::new(server.spawn().await).expect("client must build");
    let cluster_admin = ResourceId::cluster(ResourceKind::ClusterRole, "cluster-admin");
    let cluster = FakeCluster::new().with_existing(cluster_admin.clone());
    cluster.issue_token("team-a", "alice", "alice-token");

    let report = pipeline::run(&cluster, &probes, &team_a(true)).await;

    let conflict = report
        .provisioned
        .iter()
        .find(|r| r.id == cluster_admin)
        .expect("cluster role must be attempted");
    assert!(matches!(conflict.result, Err(ApiError::AlreadyExists(_))));
    assert!(report.torn_down.iter().all(|r| r.is_ok()));
    assert!(!cluster.exists(&cluster_admin));

    // Every create happens before the first lookup, and every delete after
    // the last one.
    let calls = cluster.calls();
    let last_create = calls
        .iter()
        .rposition(|c| matches!(c, Call::Create(_)))
        .unwrap();
    let first_lookup = calls
        .iter()
        .position(|c| matches!(c, Call::GetServiceAccount { .. }))
        .unwrap();
    let last_lookup = calls
        .iter()
        .rposition(|c| matches!(c, Call::GetSecret { .. }))
        .unwrap();
    let first_delete = calls
        .iter()
        .position(|c| matches!(c, Call::Delete(_)))
        .unwrap();
    assert!(last_create < first_lookup);
    assert!(last_lookup < first_delete);
}

#[tokio::test(flavor = "current_thread")]
async fn repeated_runs_verify_the_same() {
    let server = ApiServer::new([("alice-token", vec![PODS])]);
    let probes = ProbeClient::new(server.spawn().await).expect("client must build");
    let cluster = FakeCluster::new();
    cluster.issue_token("team-a", "alice", "alice-token");
    let topology = team_a(true);

    let first = pipeline::run(&cluster, &probes, &topology).await;
    let second = pipeline::run(&cluster, &probes, &topology).await;

    assert_eq!(first.verified, second.verified);
}
