// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `auth.rs`

#[cfg(test)]
mod tests {
    use super::super::{load_cloud_config, normalize_identity_url};
    use std::io::Write;

    fn write_clouds_yaml(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_cloud_config() {
        let file = write_clouds_yaml(
            r"
clouds:
  openstack:
    auth:
      auth_url: https://keystone.example.se:5000/v3
      username: operator
      password: hunter2
      user_domain_name: Default
      project_name: admin
      project_domain_name: Default
    region_name: se-east
    interface: public
",
        );

        let config = load_cloud_config(file.path(), "openstack").unwrap();
        assert_eq!(config.auth.username, "operator");
        assert_eq!(config.auth.project_name.as_deref(), Some("admin"));
        assert_eq!(config.region_name.as_deref(), Some("se-east"));
        assert_eq!(config.interface.as_deref(), Some("public"));
    }

    #[test]
    fn test_load_cloud_config_unknown_cloud() {
        let file = write_clouds_yaml(
            r"
clouds:
  other:
    auth:
      auth_url: https://keystone/v3
      username: u
      password: p
",
        );

        let err = load_cloud_config(file.path(), "openstack").unwrap_err();
        assert!(err.to_string().contains("openstack"));
    }

    #[test]
    fn test_load_cloud_config_missing_file() {
        let err =
            load_cloud_config(std::path::Path::new("/nonexistent/clouds.yaml"), "openstack")
                .unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }

    #[test]
    fn test_normalize_identity_url() {
        assert_eq!(
            normalize_identity_url("https://keystone:5000").unwrap(),
            "https://keystone:5000/v3"
        );
        assert_eq!(
            normalize_identity_url("https://keystone:5000/v3").unwrap(),
            "https://keystone:5000/v3"
        );
        assert_eq!(
            normalize_identity_url("https://keystone:5000/v3/").unwrap(),
            "https://keystone:5000/v3"
        );
        assert!(normalize_identity_url("not a url").is_err());
    }
}
