//! Image and version policy resolution for the components of a managed
//! OpenSearch cluster.
//!
//! Both entry points are pure: [`ImageResolver`] turns the desired state and
//! the observed status into the image each subject should run, and
//! [`VersionPolicy`] derives the listener and security settings of the target
//! version. Neither returns errors; see each type for how bad input degrades.

pub mod cluster;
pub mod config;
pub mod image_reference;
pub mod resolver;
pub mod version_policy;

pub use cluster::{
    ComponentStatus, DesiredState, ImageSpec, NodePool, ObservedStatus, PullPolicy,
};
pub use config::{Config, load_config};
pub use resolver::{ImageResolver, ResolvedImage, Subject};
pub use version_policy::{PortPolicy, VersionPolicy, parse_version};
