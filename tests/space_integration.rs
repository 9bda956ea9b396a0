// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Integration tests for the Space controller
//!
//! These tests need a Kubernetes cluster with the Space CRD installed and the
//! controller running.
//!
//! Run with: cargo test --test space_integration -- --ignored

use k8s_openapi::api::core::v1::{LimitRange, Namespace, ResourceQuota};
use k8s_openapi::api::rbac::v1::Role;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kf_spaces::client::{KubeSpacesClient, SpacesClient};
use kf_spaces::crd::{Space, SpaceDomain, SpaceSpec};
use kube::api::{Api, DeleteParams};
use kube::client::Client;
use std::time::Duration;

/// Test helper to check if running in a Kubernetes cluster
async fn get_kube_client_or_skip() -> Option<Client> {
    match Client::try_default().await {
        Ok(client) => {
            println!("✓ Successfully connected to Kubernetes cluster");
            Some(client)
        }
        Err(e) => {
            eprintln!("⊘ Skipping integration test: not running in Kubernetes cluster: {e}");
            None
        }
    }
}

async fn delete_space(client: &Client, name: &str) {
    let spaces: Api<Space> = Api::all(client.clone());
    match spaces.delete(name, &DeleteParams::default()).await {
        Ok(_) => println!("✓ Deleted Space {name}"),
        Err(e) => eprintln!("⚠ Failed to delete Space {name}: {e}"),
    }
}

#[tokio::test]
#[ignore = "requires a Kubernetes cluster running the Space controller"]
async fn test_space_lifecycle() {
    let Some(client) = get_kube_client_or_skip().await else {
        return;
    };
    let name = "kf-spaces-it";

    let mut spec = SpaceSpec::default();
    spec.build_config.container_registry = "some-registry".to_string();
    spec.network_config.domains = vec![SpaceDomain::new("domain-1"), SpaceDomain::new("domain-2")];
    spec.resource_limits
        .space_quota
        .insert("memory".to_string(), Quantity("1Gi".to_string()));
    spec.resource_limits
        .resource_defaults
        .insert("cpu".to_string(), Quantity("100m".to_string()));

    let spaces = KubeSpacesClient::new(client.clone());
    spaces.create(name, spec).await.expect("create Space");

    let space = spaces
        .wait_for_ready(name, Duration::from_secs(120))
        .await
        .expect("Space becomes ready");
    assert!(space.spec.network_config.domains[0].is_default);
    assert!(!space.spec.network_config.domains[1].is_default);
    assert_eq!(space.domains().iter().filter(|d| d.is_default).count(), 1);

    let namespace = Api::<Namespace>::all(client.clone())
        .get(name)
        .await
        .expect("Namespace exists");
    assert!(namespace
        .metadata
        .owner_references
        .unwrap_or_default()
        .iter()
        .any(|o| o.kind == "Space" && o.controller == Some(true)));

    Api::<Role>::namespaced(client.clone(), name)
        .get("space-developer")
        .await
        .expect("developer Role exists");
    Api::<Role>::namespaced(client.clone(), name)
        .get("space-auditor")
        .await
        .expect("auditor Role exists");
    Api::<ResourceQuota>::namespaced(client.clone(), name)
        .get("space-quota")
        .await
        .expect("ResourceQuota exists");
    Api::<LimitRange>::namespaced(client.clone(), name)
        .get("space-limit-range")
        .await
        .expect("LimitRange exists");

    delete_space(&client, name).await;
}
