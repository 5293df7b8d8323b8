use k8s_openapi::api::core::v1::LocalObjectReference;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Component tag of the status entries that mark a node pool upgrade.
pub static UPGRADER_COMPONENT: &str = "Upgrader";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PullPolicy {
    Always,
    IfNotPresent,
    Never,
}

impl PullPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullPolicy::Always => "Always",
            PullPolicy::IfNotPresent => "IfNotPresent",
            PullPolicy::Never => "Never",
        }
    }
}

impl fmt::Display for PullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully or partially specified image override. Every field may be absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    pub image: Option<String>,
    pub image_pull_policy: Option<PullPolicy>,
    #[serde(default)]
    pub image_pull_secrets: Vec<LocalObjectReference>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredState {
    pub general: GeneralConfig,
    #[serde(default)]
    pub dashboards: DashboardsConfig,
    #[serde(default)]
    pub init_helper: InitHelperConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralConfig {
    #[serde(flatten)]
    pub image_spec: ImageSpec,
    pub default_repo: Option<String>,
    pub version: String,
    pub http_port: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardsConfig {
    #[serde(flatten)]
    pub image_spec: ImageSpec,
    #[serde(default)]
    pub version: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitHelperConfig {
    #[serde(flatten)]
    pub image_spec: ImageSpec,
    pub version: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct NodePool {
    pub component: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedStatus {
    /// Last fully reconciled version, empty until the first reconcile completes.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub components_status: Vec<ComponentStatus>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ComponentStatus {
    pub component: String,
    /// Phase reported by the reconciler. Not consulted when matching markers.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub description: String,
}

impl ObservedStatus {
    pub fn find_component(&self, component: &str, description: &str) -> Option<&ComponentStatus> {
        self.components_status
            .iter()
            .find(|cs| cs.component == component && cs.description == description)
    }

    /// True when an upgrade has been dispatched for the pool, whatever its phase.
    pub fn has_upgrade_marker(&self, node_pool: &NodePool) -> bool {
        self.find_component(UPGRADER_COMPONENT, &node_pool.component)
            .is_some()
    }
}
