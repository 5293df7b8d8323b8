use crate::cluster::{DesiredState, ImageSpec, NodePool, ObservedStatus, PullPolicy};
use crate::config::ImageDefaults;
use crate::image_reference::ImageReference;
use k8s_openapi::api::core::v1::{Container, LocalObjectReference, PodSpec};
use std::fmt;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subject {
    Main,
    Dashboards,
    InitHelper,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Main => write!(f, "main"),
            Subject::Dashboards => write!(f, "dashboards"),
            Subject::InitHelper => write!(f, "init-helper"),
        }
    }
}

/// Final image for one subject. `image` is always set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedImage {
    pub image: String,
    pub pull_policy: Option<PullPolicy>,
    pub pull_secrets: Vec<LocalObjectReference>,
}

impl ResolvedImage {
    pub fn apply_to_container(&self, container: &mut Container) {
        container.image = Some(self.image.clone());
        if let Some(pull_policy) = self.pull_policy {
            container.image_pull_policy = Some(pull_policy.to_string());
        }
    }

    /// Adds the pull secrets not already referenced by the pod.
    pub fn apply_pull_secrets(&self, pod_spec: &mut PodSpec) {
        if self.pull_secrets.is_empty() {
            return;
        }
        let existing = pod_spec.image_pull_secrets.get_or_insert_with(Vec::new);
        for secret in &self.pull_secrets {
            if !existing.iter().any(|s| s.name == secret.name) {
                existing.push(secret.clone());
            }
        }
    }
}

/// Copies pull policy and non-empty pull secrets from the override. Returns
/// the custom image when the override names one.
fn merge_override(image_spec: &ImageSpec, result: &mut ResolvedImage) -> Option<String> {
    if let Some(pull_policy) = image_spec.image_pull_policy {
        result.pull_policy = Some(pull_policy);
    }
    if !image_spec.image_pull_secrets.is_empty() {
        result.pull_secrets = image_spec.image_pull_secrets.clone();
    }
    image_spec.image.clone()
}

#[derive(Clone, Debug, Default)]
pub struct ImageResolver {
    defaults: ImageDefaults,
}

impl ImageResolver {
    pub fn new(defaults: ImageDefaults) -> Self {
        Self { defaults }
    }

    /// `node_pool` only scopes resolution for [`Subject::Main`].
    pub fn resolve(
        &self,
        subject: Subject,
        desired: &DesiredState,
        observed: &ObservedStatus,
        node_pool: Option<&NodePool>,
    ) -> ResolvedImage {
        match subject {
            Subject::Main => self.resolve_main(desired, observed, node_pool),
            Subject::Dashboards => self.resolve_dashboards(desired),
            Subject::InitHelper => self.resolve_init_helper(desired),
        }
    }

    pub fn resolve_main(
        &self,
        desired: &DesiredState,
        observed: &ObservedStatus,
        node_pool: Option<&NodePool>,
    ) -> ResolvedImage {
        let version = match node_pool {
            None => desired.general.version.as_str(),
            Some(node_pool) => target_version(desired, observed, node_pool),
        };
        self.compose(
            Subject::Main,
            &desired.general.image_spec,
            desired,
            &self.defaults.main.repo,
            &self.defaults.main.name,
            version,
        )
    }

    pub fn resolve_dashboards(&self, desired: &DesiredState) -> ResolvedImage {
        self.compose(
            Subject::Dashboards,
            &desired.dashboards.image_spec,
            desired,
            &self.defaults.dashboards.repo,
            &self.defaults.dashboards.name,
            &desired.dashboards.version,
        )
    }

    pub fn resolve_init_helper(&self, desired: &DesiredState) -> ResolvedImage {
        let defaults = &self.defaults.init_helper;
        let version = desired
            .init_helper
            .version
            .as_deref()
            .unwrap_or(&defaults.version);
        self.compose(
            Subject::InitHelper,
            &desired.init_helper.image_spec,
            desired,
            &defaults.repo,
            &defaults.name,
            version,
        )
    }

    fn compose(
        &self,
        subject: Subject,
        image_spec: &ImageSpec,
        desired: &DesiredState,
        default_repo: &str,
        name: &str,
        version: &str,
    ) -> ResolvedImage {
        let mut result = ResolvedImage::default();

        if let Some(custom_image) = merge_override(image_spec, &mut result) {
            debug!("Using custom {} image {}", subject, custom_image);
            result.image = custom_image;
            return result;
        }

        let repo = desired.general.default_repo.as_deref().unwrap_or(default_repo);
        result.image = ImageReference::new(repo, name, version).to_string();
        debug!("Resolved {} image {}", subject, result.image);
        result
    }
}

/// Version a node pool should run. While the cluster moves between versions,
/// pools without an upgrade marker stay on the observed version.
fn target_version<'a>(
    desired: &'a DesiredState,
    observed: &'a ObservedStatus,
    node_pool: &NodePool,
) -> &'a str {
    let desired_version = desired.general.version.as_str();
    if observed.version.is_empty() || observed.version == desired_version {
        return desired_version;
    }

    if observed.has_upgrade_marker(node_pool) {
        debug!(
            "Node pool {} is upgrading from {} to {}",
            node_pool.component, observed.version, desired_version
        );
        desired_version
    } else {
        debug!(
            "Node pool {} stays on {} until its upgrade to {} starts",
            node_pool.component, observed.version, desired_version
        );
        &observed.version
    }
}
