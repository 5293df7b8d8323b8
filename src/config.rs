use anyhow::{Context, Result};
use regex::Regex;
use semver::{Comparator, Op, Prerelease, VersionReq};
use serde::Deserialize;
use std::{env, fs, path::Path};
use tracing::info;

pub static DEFAULT_REPO: &str = "docker.io/opensearchproject";
pub static DEFAULT_IMAGE: &str = "opensearch";
pub static DEFAULT_DASHBOARDS_IMAGE: &str = "opensearch-dashboards";
pub static DEFAULT_INIT_HELPER_REPO: &str = "public.ecr.aws/opsterio";
pub static DEFAULT_INIT_HELPER_IMAGE: &str = "busybox";
pub static DEFAULT_INIT_HELPER_VERSION: &str = "1.27.2-buildx";

pub const DEFAULT_HTTP_PORT: i32 = 9200;
pub const LEGACY_HTTP_PORT: i32 = 9300;
pub static SECURITY_CONFIG_PATH: &str = "/usr/share/opensearch/config/opensearch-security";
pub static LEGACY_SECURITY_CONFIG_PATH: &str =
    "/usr/share/opensearch/plugins/opensearch-security/securityconfig";

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub images: ImageDefaults,
    pub version_policy: VersionPolicyDefaults,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageDefaults {
    pub main: MainDefaults,
    pub dashboards: DashboardsDefaults,
    pub init_helper: InitHelperDefaults,
}

/// Repository and image name used when no custom image is given.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MainDefaults {
    pub repo: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardsDefaults {
    pub repo: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct InitHelperDefaults {
    pub repo: String,
    pub name: String,
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VersionPolicyDefaults {
    /// Versions served with the current listener and security layout.
    pub threshold: VersionReq,
    pub default_http_port: i32,
    pub legacy_http_port: i32,
    pub security_config_path: String,
    pub legacy_security_config_path: String,
}

impl Default for ImageDefaults {
    fn default() -> Self {
        Self {
            main: MainDefaults::default(),
            dashboards: DashboardsDefaults::default(),
            init_helper: InitHelperDefaults::default(),
        }
    }
}

impl Default for MainDefaults {
    fn default() -> Self {
        Self {
            repo: DEFAULT_REPO.to_string(),
            name: DEFAULT_IMAGE.to_string(),
        }
    }
}

impl Default for DashboardsDefaults {
    fn default() -> Self {
        Self {
            repo: DEFAULT_REPO.to_string(),
            name: DEFAULT_DASHBOARDS_IMAGE.to_string(),
        }
    }
}

impl Default for InitHelperDefaults {
    fn default() -> Self {
        Self {
            repo: DEFAULT_INIT_HELPER_REPO.to_string(),
            name: DEFAULT_INIT_HELPER_IMAGE.to_string(),
            version: DEFAULT_INIT_HELPER_VERSION.to_string(),
        }
    }
}

impl Default for VersionPolicyDefaults {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            default_http_port: DEFAULT_HTTP_PORT,
            legacy_http_port: LEGACY_HTTP_PORT,
            security_config_path: SECURITY_CONFIG_PATH.to_string(),
            legacy_security_config_path: LEGACY_SECURITY_CONFIG_PATH.to_string(),
        }
    }
}

/// `>=2.0.0`
fn default_threshold() -> VersionReq {
    VersionReq {
        comparators: vec![Comparator {
            op: Op::GreaterEq,
            major: 2,
            minor: Some(0),
            patch: Some(0),
            pre: Prerelease::EMPTY,
        }],
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    info!("Loading config from file {}", path.as_ref().display());
    let yaml_str = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

    let expanded = expand_env_vars(&yaml_str)?;
    if expanded.trim().is_empty() {
        return Ok(Config::default());
    }

    let config = serde_yaml_ng::from_str(&expanded)
        .context("Failed to parse YAML config after environment variable expansion")?;

    Ok(config)
}

/// Replaces `${VAR}` placeholders with environment variables values.
/// Returns an error naming every missing env var.
fn expand_env_vars(input: &str) -> Result<String> {
    let re =
        Regex::new(r"\$\{([^}]+)}").context("Invalid regex pattern for env var substitution")?;

    let mut missing = Vec::new();
    let result = re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        env::var(var_name).unwrap_or_else(|_| {
            missing.push(var_name.to_string());
            String::new()
        })
    });

    if !missing.is_empty() {
        anyhow::bail!("Missing environment variable: {}", missing.join(", "));
    }

    Ok(result.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_expand_env_vars_success() {
        unsafe {
            env::set_var("RESOLVER_TEST_REPO", "registry.local");
        }
        let input = "repo: ${RESOLVER_TEST_REPO}/mirror";
        let expanded = expand_env_vars(input).expect("Expansion should succeed");
        assert_eq!(expanded, "repo: registry.local/mirror");
        unsafe {
            env::remove_var("RESOLVER_TEST_REPO");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_var() {
        let input = "This will fail: ${RESOLVER_MISSING_A} ${RESOLVER_MISSING_B}";
        let err = expand_env_vars(input).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing environment variable: RESOLVER_MISSING_A, RESOLVER_MISSING_B"
        );
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let input = "No variables here";
        let expanded = expand_env_vars(input).expect("Expansion should succeed");
        assert_eq!(expanded, input);
    }

    #[test]
    fn test_load_empty_config_file() {
        let tmp_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");

        let config = load_config(tmp_file.path()).expect("Should load config");

        assert_eq!(config, Config::default());
        assert_eq!(config.images.main.repo, DEFAULT_REPO);
        assert_eq!(
            config.version_policy.threshold,
            VersionReq::parse(">=2.0.0").expect("Should parse requirement")
        );
    }

    #[test]
    fn test_load_config_file() {
        let yaml_content = r#"
        images:
          main:
            repo: registry.local/opensearch
            name: opensearch-custom
          initHelper:
            version: "1.36.1"
        versionPolicy:
          threshold: ">=3.0.0"
          defaultHttpPort: 9201
        "#;

        let tmp_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let path = tmp_file.path();
        fs::write(path, yaml_content).expect("Failed to write to temp file");

        let config = load_config(path).expect("Should load config");

        assert_eq!(config.images.main.repo, "registry.local/opensearch");
        assert_eq!(config.images.main.name, "opensearch-custom");
        assert_eq!(config.images.dashboards.name, DEFAULT_DASHBOARDS_IMAGE);
        assert_eq!(config.images.init_helper.repo, DEFAULT_INIT_HELPER_REPO);
        assert_eq!(config.images.init_helper.version, "1.36.1");
        assert_eq!(
            config.version_policy.threshold,
            VersionReq::parse(">=3.0.0").expect("Should parse requirement")
        );
        assert_eq!(config.version_policy.default_http_port, 9201);
        assert_eq!(config.version_policy.legacy_http_port, LEGACY_HTTP_PORT);
        assert_eq!(
            config.version_policy.legacy_security_config_path,
            LEGACY_SECURITY_CONFIG_PATH
        );
    }

    #[test]
    fn test_load_config_partial_subject_defaults() {
        let yaml_content = r#"
        images:
          main:
            repo: registry.local/opensearch
          dashboards:
            name: dashboards-fips
        "#;

        let tmp_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let path = tmp_file.path();
        fs::write(path, yaml_content).expect("Failed to write to temp file");

        let config = load_config(path).expect("Should load config");

        assert_eq!(config.images.main.repo, "registry.local/opensearch");
        assert_eq!(config.images.main.name, DEFAULT_IMAGE);
        assert_eq!(config.images.dashboards.repo, DEFAULT_REPO);
        assert_eq!(config.images.dashboards.name, "dashboards-fips");
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/nonexistent/resolver.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
