// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Integration tests for the OpenStack operator CRD surface.
//!
//! These tests verify the CRDs round-trip through a real API server. They
//! skip gracefully when no cluster (or no installed CRDs) is available, so
//! they are safe to run in plain CI.
//!
//! Run with: cargo test --test operator_integration

mod common;

use common::{create_test_namespace, crd_installed, delete_test_namespace, get_kube_client_or_skip};
use kube::api::{Api, DeleteParams, PostParams};
use kube::ResourceExt;
use openstack_operator::crd::{OpenstackFlavor, OpenstackProject};
use serde_json::json;

#[tokio::test]
async fn test_project_cr_round_trip() {
    let Some(client) = get_kube_client_or_skip().await else {
        return;
    };
    if !crd_installed(&client, "openstackprojects.sunet.se").await {
        eprintln!("Skipping: openstackprojects.sunet.se CRD not installed");
        return;
    }

    let namespace = "osop-test-projects";
    create_test_namespace(&client, namespace)
        .await
        .expect("namespace creation failed");

    let api: Api<OpenstackProject> = Api::namespaced(client.clone(), namespace);

    let project: OpenstackProject = serde_json::from_value(json!({
        "apiVersion": "sunet.se/v1alpha1",
        "kind": "OpenstackProject",
        "metadata": {"name": "alpha", "namespace": namespace},
        "spec": {
            "name": "alpha.example.se",
            "domain": "sso-users",
            "networks": [
                {"name": "internal", "cidr": "10.0.0.0/24"},
                {"name": "dmz", "cidr": "10.0.1.0/24", "router": {"externalNetwork": "public"}}
            ],
            "roleBindings": [{"role": "member", "users": ["alice@x"]}],
            "federationRef": {"configMapName": "fed"}
        }
    }))
    .expect("spec must deserialize");

    let created = api
        .create(&PostParams::default(), &project)
        .await
        .expect("create should succeed");
    assert_eq!(created.spec.name, "alpha.example.se");
    assert_eq!(created.spec.networks.len(), 2);
    assert!(created.spec.networks[1].router.is_some());
    assert!(created.spec.enabled, "enabled must default to true");

    let fetched = api.get("alpha").await.expect("get should succeed");
    assert_eq!(fetched.spec.role_bindings[0].users, vec!["alice@x"]);
    assert_eq!(
        fetched
            .spec
            .federation_ref
            .as_ref()
            .map(|r| r.config_map_name.as_str()),
        Some("fed")
    );

    api.delete("alpha", &DeleteParams::default())
        .await
        .expect("delete should succeed");
    delete_test_namespace(&client, namespace).await;
}

#[tokio::test]
async fn test_flavor_cr_defaults_apply_server_side() {
    let Some(client) = get_kube_client_or_skip().await else {
        return;
    };
    if !crd_installed(&client, "openstackflavors.sunet.se").await {
        eprintln!("Skipping: openstackflavors.sunet.se CRD not installed");
        return;
    }

    let api: Api<OpenstackFlavor> = Api::all(client.clone());

    let flavor: OpenstackFlavor = serde_json::from_value(json!({
        "apiVersion": "sunet.se/v1alpha1",
        "kind": "OpenstackFlavor",
        "metadata": {"name": "osop-test-m1"},
        "spec": {"name": "m1", "vcpus": 2, "ram": 2048}
    }))
    .expect("spec must deserialize");

    let created = api
        .create(&PostParams::default(), &flavor)
        .await
        .expect("create should succeed");
    assert_eq!(created.spec.disk, 0, "disk must default to 0");
    assert!(created.spec.is_public, "isPublic must default to true");
    assert_eq!(created.name_any(), "osop-test-m1");

    api.delete("osop-test-m1", &DeleteParams::default())
        .await
        .expect("delete should succeed");
}
