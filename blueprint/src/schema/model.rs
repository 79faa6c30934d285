//! Typed mirror of the schema for decoding loaded blueprints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::SemVer;

/// A complete blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    /// Blueprint format version.
    pub version: SemVer,
    /// Repository-wide configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<Global>,
    /// Configuration of the project owning the blueprint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,
    /// Top-level fields the schema does not describe.
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

/// Repository-wide configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Global {
    /// CI system configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ci: Option<GlobalCi>,
    /// Deployment configuration shared by all projects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<GlobalDeployment>,
    /// Repository metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<GlobalRepo>,
}

/// Repository-wide CI configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalCi {
    /// Target filters used when simulating a local run.
    #[serde(default)]
    pub local: Vec<String>,
    /// CI providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers: Option<Providers>,
    /// Container registries images are pushed to.
    #[serde(default)]
    pub registries: Vec<String>,
    /// Secrets passed to every target.
    #[serde(default)]
    pub secrets: Vec<Secret>,
}

/// Deployment configuration shared by all projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalDeployment {
    /// Registries used for deployments.
    pub registries: GlobalDeploymentRegistries,
    /// Repository holding deployment manifests.
    pub repo: GlobalDeploymentRepo,
    /// Root directory inside the deployment repository.
    pub root: String,
}

/// Registries used for deployments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalDeploymentRegistries {
    /// Default registry for deployed containers.
    pub containers: String,
    /// Registry holding deployment modules.
    pub modules: String,
}

/// Repository holding deployment manifests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalDeploymentRepo {
    /// Git ref to deploy from.
    #[serde(rename = "ref")]
    pub reference: String,
    /// Repository URL.
    pub url: String,
}

/// Repository metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalRepo {
    /// Repository name, such as `owner/name`.
    pub name: String,
    /// Default branch.
    pub default_branch: String,
}

/// CI providers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Providers {
    /// AWS provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<ProviderAws>,
    /// Docker Hub provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<ProviderDocker>,
    /// Earthly Cloud provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earthly: Option<ProviderEarthly>,
    /// GitHub provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<ProviderGithub>,
}

/// AWS provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAws {
    /// Role to assume.
    pub role: String,
    /// Region to use.
    pub region: String,
    /// ECR registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
}

/// Docker Hub provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDocker {
    /// Docker Hub credentials.
    pub credentials: Secret,
}

/// Earthly Cloud provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEarthly {
    /// Earthly Cloud credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Secret>,
    /// Organisation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    /// Satellite used for caching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satellite: Option<String>,
    /// Earthly version used in CI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// GitHub provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderGithub {
    /// GitHub credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Secret>,
    /// GitHub container registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
}

/// A secret held by a secret provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    /// Mapping from secret names to keys in the secret.
    #[serde(default)]
    pub maps: BTreeMap<String, String>,
    /// Name of the secret; exclusive with `maps`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether a missing secret is tolerated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    /// Path of the secret inside the provider.
    pub path: String,
    /// Secret provider.
    pub provider: String,
}

/// Configuration of one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Project name.
    pub name: String,
    /// Name the project's container is built as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    /// CI configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ci: Option<ProjectCi>,
    /// Deployment configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<Deployment>,
    /// Releases keyed by name.
    #[serde(default)]
    pub release: BTreeMap<String, Release>,
}

/// CI configuration of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCi {
    /// Targets keyed by name.
    #[serde(default)]
    pub targets: BTreeMap<String, Target>,
}

/// A CI target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Arguments passed to the target.
    #[serde(default)]
    pub args: BTreeMap<String, String>,
    /// Platforms to run against.
    #[serde(default)]
    pub platforms: Vec<String>,
    /// Whether the target runs privileged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privileged: Option<bool>,
    /// Number of retries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    /// Secrets passed to the target.
    #[serde(default)]
    pub secrets: Vec<Secret>,
}

/// A project release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    /// Release-specific configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<JsonValue>,
    /// Events that trigger the release.
    pub on: BTreeMap<String, JsonValue>,
    /// Target to run; defaults to the release name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Deployment configuration of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    /// Environment to deploy to.
    pub environment: String,
    /// Events that trigger a deployment.
    #[serde(default)]
    pub on: BTreeMap<String, JsonValue>,
    /// Deployment modules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<DeploymentModules>,
}

/// Deployment modules of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentModules {
    /// Main module.
    pub main: Module,
    /// Supporting modules keyed by name.
    #[serde(default)]
    pub support: BTreeMap<String, Module>,
}

/// A deployment module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Container holding the deployment code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    /// Namespace to deploy into.
    pub namespace: String,
    /// Values passed to the module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<JsonValue>,
    /// Module version.
    pub version: String,
}
