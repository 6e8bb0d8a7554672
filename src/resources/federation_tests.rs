// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `federation.rs`

#[cfg(test)]
mod tests {
    use super::super::{generate_mapping_rule, rule_matches_group, FederationConfig, FederationManager};
    use crate::openstack::auth::{AuthConfig, CloudConfig};
    use crate::openstack::{MappingRule, OpenStackClient};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn users(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_generated_rule_shape() {
        let rule = generate_mapping_rule("alpha.example.se", &users(&["alice@x"]), "sso");

        let group = rule.local[1].group.as_ref().unwrap();
        assert_eq!(group.name, "alpha-example-se-users");
        assert_eq!(group.domain.name, "sso");

        let user = rule.local[0].user.as_ref().unwrap();
        assert_eq!(user.name, "{0}");
        assert_eq!(user.r#type.as_deref(), Some("ephemeral"));

        assert_eq!(rule.remote[0].r#type, "HTTP_OIDC_SUB");
        assert!(rule.remote[0].any_one_of.is_none());
        assert_eq!(
            rule.remote[1].any_one_of.as_deref(),
            Some(&users(&["alice@x"])[..])
        );
    }

    #[test]
    fn test_rule_matches_group() {
        let rule = generate_mapping_rule("alpha", &users(&["a@x"]), "sso");
        assert!(rule_matches_group(&rule, "alpha-users"));
        assert!(!rule_matches_group(&rule, "beta-users"));
        assert!(!rule_matches_group(&MappingRule::default(), "alpha-users"));
    }

    /// The read-modify-write merge is idempotent: applying the same project
    /// rule twice leaves exactly one rule for that project.
    #[test]
    fn test_merge_is_idempotent() {
        let merge = |rules: Vec<MappingRule>, project: &str, users: &[String]| {
            let group = crate::names::group_name(project);
            let mut merged: Vec<MappingRule> = rules
                .into_iter()
                .filter(|rule| !rule_matches_group(rule, &group))
                .collect();
            merged.push(generate_mapping_rule(project, users, "sso"));
            merged
        };

        let other = generate_mapping_rule("beta", &users(&["b@x"]), "sso");
        let once = merge(vec![other.clone()], "alpha", &users(&["a@x", "c@x"]));
        let twice = merge(once.clone(), "alpha", &users(&["a@x", "c@x"]));

        assert_eq!(once, twice);
        assert_eq!(
            twice
                .iter()
                .filter(|r| rule_matches_group(r, "alpha-users"))
                .count(),
            1
        );
        assert!(twice.contains(&other), "unrelated rules must survive");
    }

    #[test]
    fn test_remove_then_merge_drops_rule() {
        let rules = vec![
            generate_mapping_rule("alpha", &users(&["a@x"]), "sso"),
            generate_mapping_rule("beta", &users(&["b@x"]), "sso"),
        ];

        let remaining: Vec<MappingRule> = rules
            .into_iter()
            .filter(|rule| !rule_matches_group(rule, "alpha-users"))
            .collect();

        assert_eq!(remaining.len(), 1);
        assert!(rule_matches_group(&remaining[0], "beta-users"));
    }

    async fn mount_auth(server: &MockServer) {
        let base = server.uri();
        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("X-Subject-Token", "tok")
                    .set_body_json(json!({"token": {"catalog": [
                        {"type": "identity", "endpoints": [{"interface": "public", "url": base}]}
                    ]}})),
            )
            .mount(server)
            .await;
    }

    /// First mapping write for an IdP creates the IdP, the mapping document
    /// and the protocol.
    #[tokio::test]
    async fn test_first_mapping_write_bootstraps_federation() {
        let server = MockServer::start().await;
        mount_auth(&server).await;

        Mock::given(method("GET"))
            .and(path("/v3/OS-FEDERATION/identity_providers/sso"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/v3/OS-FEDERATION/identity_providers/sso"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "identity_provider": {"id": "sso", "remote_ids": ["https://idp"], "enabled": true}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v3/OS-FEDERATION/mappings/sso_oidc_mapping"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/v3/OS-FEDERATION/mappings/sso_oidc_mapping"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "mapping": {"id": "sso_oidc_mapping", "rules": []}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v3/OS-FEDERATION/identity_providers/sso/protocols/openid"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/v3/OS-FEDERATION/identity_providers/sso/protocols/openid"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "protocol": {"id": "openid", "mapping_id": "sso_oidc_mapping"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let os = OpenStackClient::new(
            CloudConfig {
                auth: AuthConfig {
                    auth_url: server.uri(),
                    username: "op".into(),
                    password: "pw".into(),
                    user_domain_name: None,
                    project_name: None,
                    project_domain_name: None,
                },
                region_name: None,
                interface: None,
            },
            "test".into(),
            4,
            0.0,
        );

        let manager = FederationManager::new(
            &os,
            &FederationConfig {
                idp_name: "sso".into(),
                idp_remote_id: "https://idp".into(),
                sso_domain: "sso".into(),
            },
        );

        manager
            .add_project_mapping("alpha.example.se", &users(&["alice@x"]))
            .await
            .unwrap();
    }
}
