// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `space.rs`
//!
//! These drive whole reconciles against the in-memory cluster, which mirrors every
//! write back into the cache the way the watches would.

use super::*;
use crate::crd::{SpaceDomain, SpaceSpec, SpaceStatus};
use crate::test_utils::FakeCluster;
use k8s_openapi::api::core::v1::EnvVar;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{OwnerReference, Time};
use std::sync::Arc;

fn new_space(name: &str) -> Space {
    let mut space = Space::new(name, SpaceSpec::default());
    space.metadata.uid = Some(format!("{name}-uid"));
    space.metadata.generation = Some(1);
    space
}

fn setup(space: Option<Space>) -> (Arc<FakeCluster>, Context) {
    let (cluster, stores) = FakeCluster::new();
    if let Some(space) = space {
        cluster.seed(space);
    }
    let ctx = Context::new(cluster.clone(), stores);
    (cluster, ctx)
}

fn status(cluster: &FakeCluster, name: &str) -> SpaceStatus {
    cluster.space(name).and_then(|s| s.status).unwrap()
}

fn condition<'a>(status: &'a SpaceStatus, condition_type: &str) -> &'a crate::crd::Condition {
    status.condition(condition_type).unwrap()
}

#[tokio::test]
async fn test_new_space_creates_dependents_and_becomes_ready() {
    let (cluster, ctx) = setup(Some(new_space("my-space")));

    let result = reconcile_space(&ctx, "my-space").await.unwrap();
    assert_eq!(result, ReconcileResult::Synced);

    assert_eq!(
        cluster.writes(),
        vec![
            "create Namespace my-space",
            "create Role my-space/space-developer",
            "create Role my-space/space-auditor",
            "create ResourceQuota my-space/space-quota",
            "create LimitRange my-space/space-limit-range",
            "patch_status Space my-space",
        ]
    );

    let status = status(&cluster, "my-space");
    assert_eq!(status.observed_generation, Some(1));
    assert_eq!(status.conditions.len(), 5);
    assert_eq!(status.conditions[0].r#type, "Ready");
    assert!(status
        .conditions
        .iter()
        .all(|c| c.status == ConditionStatus::True));

    let space = cluster.space("my-space").unwrap();
    assert!(space.is_ready());
}

#[tokio::test]
async fn test_second_reconcile_issues_no_writes() {
    let (cluster, ctx) = setup(Some(new_space("my-space")));
    reconcile_space(&ctx, "my-space").await.unwrap();
    cluster.clear_writes();

    let result = reconcile_space(&ctx, "my-space").await.unwrap();

    assert_eq!(result, ReconcileResult::Synced);
    assert!(cluster.writes().is_empty(), "{:?}", cluster.writes());
}

#[tokio::test]
async fn test_missing_space_is_a_no_op() {
    let (cluster, ctx) = setup(None);

    let result = reconcile_space(&ctx, "gone").await.unwrap();

    assert_eq!(result, ReconcileResult::Synced);
    assert!(cluster.writes().is_empty());
}

#[tokio::test]
async fn test_space_being_deleted_is_left_alone() {
    let mut space = new_space("my-space");
    space.metadata.deletion_timestamp = Some(Time(k8s_openapi::jiff::Timestamp::now()));
    space.metadata.finalizers = Some(vec!["example.com/cleanup".to_string()]);
    let (cluster, ctx) = setup(Some(space));

    let result = reconcile_space(&ctx, "my-space").await.unwrap();

    assert_eq!(result, ReconcileResult::Synced);
    assert!(cluster.writes().is_empty());
    assert!(cluster.object::<Namespace>(None, "my-space").is_none());
    assert!(cluster.space("my-space").unwrap().status.is_none());
}

#[tokio::test]
async fn test_namespace_failure_is_retried_and_reported() {
    let (cluster, ctx) = setup(Some(new_space("my-space")));
    cluster.fail("create", "Namespace", 500, "InternalError");

    let err = reconcile_space(&ctx, "my-space").await.unwrap_err();
    assert!(matches!(err, ReconcileError::Sync(SyncError::Api { kind: "Namespace", .. })));

    assert_eq!(cluster.writes(), vec!["patch_status Space my-space"]);

    let status = status(&cluster, "my-space");
    let ready = condition(&status, "Ready");
    assert_eq!(ready.status, ConditionStatus::False);
    assert_eq!(ready.reason.as_deref(), Some("ReconcileFailed"));
    assert!(ready.message.as_deref().unwrap().contains("Namespace"));

    let role = condition(&status, "RoleReady");
    assert_eq!(role.status, ConditionStatus::Unknown);
    assert_eq!(role.reason.as_deref(), Some("NamespaceNotReady"));
}

#[tokio::test]
async fn test_recovers_after_transient_failure() {
    let (cluster, ctx) = setup(Some(new_space("my-space")));
    cluster.fail("create", "ResourceQuota", 503, "ServiceUnavailable");
    assert!(reconcile_space(&ctx, "my-space").await.is_err());

    let status = status(&cluster, "my-space");
    assert_eq!(
        condition(&status, "ResourceQuotaReady").status,
        ConditionStatus::False
    );
    assert_eq!(
        condition(&status, "LimitRangeReady").status,
        ConditionStatus::True
    );

    cluster.clear_failures();
    let result = reconcile_space(&ctx, "my-space").await.unwrap();
    assert_eq!(result, ReconcileResult::Synced);
    assert!(cluster.space("my-space").unwrap().is_ready());
}

#[tokio::test]
async fn test_foreign_namespace_is_an_ownership_conflict() {
    let (cluster, ctx) = setup(Some(new_space("my-space")));
    let mut foreign = Namespace::default();
    foreign.metadata.name = Some("my-space".to_string());
    foreign.metadata.owner_references = Some(vec![OwnerReference {
        api_version: "kf.dev/v1alpha1".to_string(),
        kind: "Space".to_string(),
        name: "my-space".to_string(),
        uid: "previous-incarnation".to_string(),
        controller: Some(true),
        ..Default::default()
    }]);
    cluster.seed(foreign);

    let result = reconcile_space(&ctx, "my-space").await.unwrap();
    assert_eq!(result, ReconcileResult::Stalled);

    assert_eq!(cluster.writes(), vec!["patch_status Space my-space"]);
    let status = status(&cluster, "my-space");
    let ready = condition(&status, "Ready");
    assert_eq!(ready.status, ConditionStatus::False);
    assert_eq!(ready.reason.as_deref(), Some("OwnershipConflict"));
}

#[tokio::test]
async fn test_forbidden_role_write_is_stalled() {
    let (cluster, ctx) = setup(Some(new_space("my-space")));
    cluster.fail("create", "Role", 403, "Forbidden");

    let result = reconcile_space(&ctx, "my-space").await.unwrap();
    assert_eq!(result, ReconcileResult::Stalled);

    let status = status(&cluster, "my-space");
    assert_eq!(condition(&status, "NamespaceReady").status, ConditionStatus::True);
    assert_eq!(condition(&status, "RoleReady").status, ConditionStatus::False);
    assert_eq!(
        condition(&status, "ResourceQuotaReady").status,
        ConditionStatus::True
    );
    let ready = condition(&status, "Ready");
    assert!(ready.message.as_deref().unwrap().contains("Role"));
}

#[tokio::test]
async fn test_invalid_space_name_is_stalled_without_dependent_writes() {
    let (cluster, ctx) = setup(Some(new_space("bad_space")));

    let result = reconcile_space(&ctx, "bad_space").await.unwrap();
    assert_eq!(result, ReconcileResult::Stalled);

    assert_eq!(cluster.writes(), vec!["patch_status Space bad_space"]);
    let status = status(&cluster, "bad_space");
    let ready = condition(&status, "Ready");
    assert_eq!(ready.status, ConditionStatus::False);
    assert_eq!(ready.reason.as_deref(), Some("InvalidSpec"));
}

#[tokio::test]
async fn test_space_with_limits_and_domains() {
    let mut space = new_space("my-space");
    space.spec.network_config.domains =
        vec![SpaceDomain::new("domain-1"), SpaceDomain::new("domain-2")];
    space.spec.build_config.container_registry = "some-registry".to_string();
    space.spec.build_config.env = vec![EnvVar {
        name: "JAVA_VERSION".to_string(),
        value: Some("17".to_string()),
        ..Default::default()
    }];
    space
        .spec
        .resource_limits
        .space_quota
        .insert("memory".to_string(), Quantity("10Gi".to_string()));
    space
        .spec
        .resource_limits
        .resource_defaults
        .insert("cpu".to_string(), Quantity("100m".to_string()));
    let (cluster, ctx) = setup(Some(space));

    let result = reconcile_space(&ctx, "my-space").await.unwrap();
    assert_eq!(result, ReconcileResult::Synced);

    let limits: LimitRange = cluster
        .object(Some("my-space"), "space-limit-range")
        .unwrap();
    let item = &limits.spec.unwrap().limits[0];
    assert_eq!(
        item.default_request.as_ref().unwrap().get("cpu"),
        Some(&Quantity("100m".to_string()))
    );

    let space = cluster.space("my-space").unwrap();
    let expected = vec![
        SpaceDomain {
            domain: "domain-1".to_string(),
            is_default: true,
        },
        SpaceDomain {
            domain: "domain-2".to_string(),
            is_default: false,
        },
    ];
    assert_eq!(status(&cluster, "my-space").domains, expected);
    assert_eq!(space.domains(), expected.as_slice());
    assert_eq!(space.domains().iter().filter(|d| d.is_default).count(), 1);
    // The spec itself is left as the user wrote it
    assert!(space.spec.network_config.domains.iter().all(|d| !d.is_default));
    assert!(space.is_ready());
}

#[tokio::test]
async fn test_flagged_domain_stays_default_and_changes_are_reported() {
    let mut space = new_space("my-space");
    space.spec.network_config.domains = vec![
        SpaceDomain::new("domain-1"),
        SpaceDomain {
            domain: "domain-2".to_string(),
            is_default: true,
        },
    ];
    let (cluster, ctx) = setup(Some(space));

    reconcile_space(&ctx, "my-space").await.unwrap();
    let defaults: Vec<_> = status(&cluster, "my-space")
        .domains
        .iter()
        .map(|d| (d.domain.clone(), d.is_default))
        .collect();
    assert_eq!(
        defaults,
        vec![("domain-1".to_string(), false), ("domain-2".to_string(), true)]
    );

    // Dropping the flagged domain moves the default to the first remaining entry
    let mut edited = cluster.space("my-space").unwrap();
    edited.spec.network_config.domains = vec![SpaceDomain::new("domain-3")];
    edited.metadata.generation = Some(2);
    cluster.seed(edited);
    cluster.clear_writes();

    reconcile_space(&ctx, "my-space").await.unwrap();

    assert_eq!(cluster.writes(), vec!["patch_status Space my-space"]);
    assert_eq!(
        status(&cluster, "my-space").domains,
        vec![SpaceDomain {
            domain: "domain-3".to_string(),
            is_default: true,
        }]
    );
}

#[tokio::test]
async fn test_drifted_role_is_restored() {
    let (cluster, ctx) = setup(Some(new_space("my-space")));
    reconcile_space(&ctx, "my-space").await.unwrap();

    let mut role: Role = cluster.object(Some("my-space"), "space-developer").unwrap();
    role.rules = Some(Vec::new());
    cluster.seed(role);
    cluster.clear_writes();

    let result = reconcile_space(&ctx, "my-space").await.unwrap();
    assert_eq!(result, ReconcileResult::Synced);
    assert_eq!(
        cluster.writes(),
        vec!["replace Role my-space/space-developer"]
    );
}

#[tokio::test]
async fn test_status_write_conflict_is_retried() {
    let (cluster, ctx) = setup(Some(new_space("my-space")));
    cluster.fail("patch_status", "Space", 409, "Conflict");

    let err = reconcile_space(&ctx, "my-space").await.unwrap_err();
    assert!(matches!(err, ReconcileError::Status { .. }));
}

#[tokio::test]
async fn test_generation_bump_rewrites_observed_generation() {
    let (cluster, ctx) = setup(Some(new_space("my-space")));
    reconcile_space(&ctx, "my-space").await.unwrap();

    let mut space = cluster.space("my-space").unwrap();
    space.metadata.generation = Some(2);
    cluster.seed(space);
    cluster.clear_writes();

    reconcile_space(&ctx, "my-space").await.unwrap();
    assert_eq!(cluster.writes(), vec!["patch_status Space my-space"]);
    assert_eq!(status(&cluster, "my-space").observed_generation, Some(2));
}
