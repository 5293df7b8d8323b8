use crate::config::VersionPolicyDefaults;
use semver::{BuildMetadata, Prerelease, Version, VersionReq};
use std::fmt;
use tracing::{debug, warn};

/// Listener and security settings that differ between major generations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortPolicy {
    pub http_port: i32,
    pub security_config_path: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum VersionParseError {
    Empty,
    InvalidSegment(String),
    InvalidPrerelease(String),
    InvalidBuildMetadata(String),
}

impl std::error::Error for VersionParseError {}
impl fmt::Display for VersionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionParseError::Empty => write!(f, "version is empty"),
            VersionParseError::InvalidSegment(segment) => {
                write!(f, "invalid numeric version segment: {:?}", segment)
            }
            VersionParseError::InvalidPrerelease(pre) => {
                write!(f, "invalid prerelease: {}", pre)
            }
            VersionParseError::InvalidBuildMetadata(build) => {
                write!(f, "invalid build metadata: {}", build)
            }
        }
    }
}

/// Parses versions the way cluster specs write them: `2`, `2.11`, `v2.11.1`,
/// `2.0.0-rc1+build.5`. Missing minor and patch segments are zero, segments
/// past the patch are ignored. Surrounding whitespace is rejected.
pub fn parse_version(input: &str) -> Result<Version, VersionParseError> {
    let unprefixed = input.strip_prefix('v').unwrap_or(input);
    if unprefixed.is_empty() {
        return Err(VersionParseError::Empty);
    }

    let (rest, build) = match unprefixed.split_once('+') {
        Some((rest, build)) => (rest, Some(build)),
        None => (unprefixed, None),
    };
    let (core, pre) = match rest.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (rest, None),
    };

    let segments = core
        .split('.')
        .map(|segment| {
            segment
                .parse::<u64>()
                .map_err(|_| VersionParseError::InvalidSegment(segment.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let segment = |i: usize| segments.get(i).copied().unwrap_or(0);
    let mut version = Version::new(segment(0), segment(1), segment(2));

    if let Some(pre) = pre {
        version.pre = Prerelease::new(pre)
            .ok()
            .filter(|parsed| !parsed.is_empty())
            .ok_or_else(|| VersionParseError::InvalidPrerelease(pre.to_string()))?;
    }
    if let Some(build) = build {
        version.build = BuildMetadata::new(build)
            .ok()
            .filter(|parsed| !parsed.is_empty())
            .ok_or_else(|| VersionParseError::InvalidBuildMetadata(build.to_string()))?;
    }

    Ok(version)
}

#[derive(Clone, Debug, Default)]
pub struct VersionPolicy {
    defaults: VersionPolicyDefaults,
}

impl VersionPolicy {
    pub fn new(defaults: VersionPolicyDefaults) -> Self {
        Self { defaults }
    }

    /// Prereleases never satisfy the threshold, even a prerelease of a
    /// higher version.
    pub fn meets_threshold(&self, version: &Version) -> bool {
        self.defaults.threshold.matches(version)
    }

    /// Never fails. An unparseable version is logged and evaluated as
    /// below the threshold.
    pub fn evaluate(&self, version: &str, declared_port: Option<i32>) -> PortPolicy {
        let current = match parse_version(version) {
            Ok(parsed) => self.meets_threshold(&parsed),
            Err(e) => {
                warn!(
                    "Could not parse version {:?} ({}), using settings for versions not matching {}",
                    version, e, self.defaults.threshold
                );
                false
            }
        };

        let policy = if current {
            PortPolicy {
                http_port: declared_port
                    .filter(|port| *port > 0)
                    .unwrap_or(self.defaults.default_http_port),
                security_config_path: self.defaults.security_config_path.clone(),
            }
        } else {
            PortPolicy {
                http_port: self.defaults.legacy_http_port,
                security_config_path: self.defaults.legacy_security_config_path.clone(),
            }
        };

        debug!(
            "Version {} resolved to http port {} and security config path {}",
            version, policy.http_port, policy.security_config_path
        );
        policy
    }
}
