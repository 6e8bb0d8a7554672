// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Behavioural tests for the OpenStack client against a mock HTTP server.

#[cfg(test)]
mod tests {
    use super::super::auth::{AuthConfig, CloudConfig};
    use super::super::retry::RetryPolicy;
    use super::super::OpenStackClient;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Mount a Keystone token endpoint whose catalog points every service
    /// back at the mock server.
    async fn mount_auth(server: &MockServer) {
        let base = server.uri();
        let catalog: Vec<_> = ["identity", "compute", "image", "network", "volumev3"]
            .iter()
            .map(|service| {
                json!({
                    "type": service,
                    "endpoints": [{"interface": "public", "url": base, "region": "test"}]
                })
            })
            .collect();

        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("X-Subject-Token", "test-token")
                    .set_body_json(json!({"token": {"catalog": catalog}})),
            )
            .mount(server)
            .await;
    }

    fn test_client(server: &MockServer) -> OpenStackClient {
        let config = CloudConfig {
            auth: AuthConfig {
                auth_url: server.uri(),
                username: "operator".into(),
                password: "secret".into(),
                user_domain_name: Some("Default".into()),
                project_name: None,
                project_domain_name: None,
            },
            region_name: None,
            interface: None,
        };
        OpenStackClient::new(config, "test".into(), 4, 0.0).with_retry_policy(RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(1),
            backoff: 2.0,
            jitter: 0.0,
        })
    }

    #[tokio::test]
    async fn test_finder_miss_returns_none() {
        let server = MockServer::start().await;
        mount_auth(&server).await;

        Mock::given(method("GET"))
            .and(path("/v3/domains"))
            .and(query_param("name", "missing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"domains": []})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v3/domains/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let domain = client.get_domain("missing").await.unwrap();
        assert!(domain.is_none(), "finder must map 404 to None, not error");
    }

    #[tokio::test]
    async fn test_finder_hit_returns_resource() {
        let server = MockServer::start().await;
        mount_auth(&server).await;

        Mock::given(method("GET"))
            .and(path("/v3/domains"))
            .and(query_param("name", "sso-users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "domains": [{"id": "d1", "name": "sso-users", "enabled": true}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let domain = client.get_domain("sso-users").await.unwrap().unwrap();
        assert_eq!(domain.id, "d1");
        assert_eq!(domain.name, "sso-users");
    }

    #[tokio::test]
    async fn test_conflict_on_tagging_is_swallowed() {
        let server = MockServer::start().await;
        mount_auth(&server).await;

        Mock::given(method("PUT"))
            .and(path("/v3/projects/p1/tags/managed-by-openstack-operator"))
            .respond_with(ResponseTemplate::new(409).set_body_string("tag exists"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        client
            .add_project_tag("p1", "managed-by-openstack-operator")
            .await
            .expect("conflict must be swallowed");
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let server = MockServer::start().await;
        mount_auth(&server).await;

        // First attempt fails with a 503, the retry sees a healthy server
        Mock::given(method("GET"))
            .and(path("/v3/roles"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v3/roles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "roles": [{"id": "r1", "name": "member"}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let role = client.get_role("member").await.unwrap().unwrap();
        assert_eq!(role.id, "r1");
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let server = MockServer::start().await;
        mount_auth(&server).await;

        Mock::given(method("POST"))
            .and(path("/v3/projects"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v3/domains"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "domains": [{"id": "d1", "name": "sso-users", "enabled": true}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .create_project("alpha", "sso-users", "", true)
            .await
            .unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_delete_swallows_not_found() {
        let server = MockServer::start().await;
        mount_auth(&server).await;

        Mock::given(method("DELETE"))
            .and(path("/v3/projects/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = test_client(&server);
        client
            .delete_project("gone")
            .await
            .expect("delete must be idempotent at the remote");
    }

    #[tokio::test]
    async fn test_expired_token_triggers_reauthentication() {
        let server = MockServer::start().await;
        mount_auth(&server).await;

        // The first data call is rejected with 401; after re-auth it works
        Mock::given(method("GET"))
            .and(path("/v3/roles"))
            .respond_with(ResponseTemplate::new(401))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v3/roles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "roles": [{"id": "r1", "name": "member"}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let role = client.get_role("member").await.unwrap();
        assert!(role.is_some());
    }
}
