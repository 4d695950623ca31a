// Copyright 2025 Chisomo Makombo Sakala
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use crate::config::Variables;
use crate::error::TaskError;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Schema version of the generated build tool config.
pub const BUILD_TOOLS_CONFIG_VERSION: u32 = 1;

/// Build tools with a JFrog CLI integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildToolType {
  Maven,
  Gradle,
  Npm,
  Nuget,
  Go,
  Pip,
}

impl BuildToolType {
  pub fn as_str(self) -> &'static str {
    match self {
      BuildToolType::Maven => "maven",
      BuildToolType::Gradle => "gradle",
      BuildToolType::Npm => "npm",
      BuildToolType::Nuget => "nuget",
      BuildToolType::Go => "go",
      BuildToolType::Pip => "pip",
    }
  }

  /// Executable that must be on PATH for the integration to work.
  pub fn executable(self) -> &'static str {
    match self {
      BuildToolType::Maven => "mvn",
      other => other.as_str(),
    }
  }

  /// The `jfrog rt` subcommand wrapping this tool.
  pub fn cli_subcommand(self) -> &'static str {
    match self {
      BuildToolType::Maven => "rt mvn",
      BuildToolType::Gradle => "rt gradle",
      BuildToolType::Npm => "rt npm",
      BuildToolType::Nuget => "rt nuget",
      BuildToolType::Go => "rt go",
      BuildToolType::Pip => "rt pip-install",
    }
  }

  /// Task inputs naming repositories for `role`, paired with their config keys.
  pub fn repo_inputs(self, role: ServerRole) -> &'static [(&'static str, &'static str)] {
    match (self, role) {
      (BuildToolType::Maven, ServerRole::Resolver) => &[
        ("resolveSnapshotRepo", "snapshotRepo"),
        ("resolveReleaseRepo", "releaseRepo"),
      ],
      (BuildToolType::Maven, ServerRole::Deployer) => &[
        ("deploySnapshotRepo", "snapshotRepo"),
        ("deployReleaseRepo", "releaseRepo"),
      ],
      (_, ServerRole::Resolver) => &[("resolveRepo", "repo")],
      (_, ServerRole::Deployer) => &[("deployRepo", "repo")],
    }
  }
}

impl fmt::Display for BuildToolType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerRole {
  Resolver,
  Deployer,
}

impl ServerRole {
  pub fn as_str(self) -> &'static str {
    match self {
      ServerRole::Resolver => "resolver",
      ServerRole::Deployer => "deployer",
    }
  }

  /// Input naming the service endpoint used for this role.
  pub fn service_input(self) -> &'static str {
    match self {
      ServerRole::Resolver => "resolverService",
      ServerRole::Deployer => "deployerService",
    }
  }
}

impl fmt::Display for ServerRole {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Repository mapping for one role, plus the CLI server it resolves against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSettings {
  #[serde(rename = "serverID", default, skip_serializing_if = "String::is_empty")]
  pub server_id: String,
  #[serde(flatten)]
  pub repos: BTreeMap<String, String>,
}

impl RepoSettings {
  pub fn new(server_id: impl Into<String>) -> Self {
    Self {
      server_id: server_id.into(),
      repos: BTreeMap::new(),
    }
  }

  pub fn repo(mut self, key: &str, repo: impl Into<String>) -> Self {
    self.repos.insert(key.to_string(), repo.into());
    self
  }

  pub fn is_empty(&self) -> bool {
    self.server_id.is_empty() && self.repos.is_empty()
  }
}

/// The document consumed by `jfrog rt <tool>` commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildToolConfig {
  pub version: u32,
  #[serde(rename = "type")]
  pub tool_type: BuildToolType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub resolver: Option<RepoSettings>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub deployer: Option<RepoSettings>,
}

impl BuildToolConfig {
  /// Builds the document; empty resolver or deployer settings are dropped.
  pub fn new(tool_type: BuildToolType, resolver: RepoSettings, deployer: RepoSettings) -> Self {
    let non_empty = |settings: RepoSettings| (!settings.is_empty()).then_some(settings);
    Self {
      version: BUILD_TOOLS_CONFIG_VERSION,
      tool_type,
      resolver: non_empty(resolver),
      deployer: non_empty(deployer),
    }
  }
}

/// Writes the build tool config to `config_path`, replacing any existing file.
pub fn create_build_tool_config_file(
  config_path: &Path,
  tool_type: BuildToolType,
  resolver: RepoSettings,
  deployer: RepoSettings,
) -> Result<BuildToolConfig, TaskError> {
  let config = BuildToolConfig::new(tool_type, resolver, deployer);
  let yaml = serde_yaml::to_string(&config)?;
  tracing::info!("{}", yaml);

  let write = || -> std::io::Result<()> {
    if let Some(parent) = config_path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(config_path, &yaml)
  };
  write().map_err(|source| TaskError::WriteBuildToolConfig {
    path: config_path.to_path_buf(),
    source,
  })?;
  Ok(config)
}

/// `<definition>-<build number>-<tool>-<role>`, unique per build tool and role in a run.
pub fn assemble_build_tool_server_id(
  variables: &Variables,
  tool_type: BuildToolType,
  role: ServerRole,
) -> String {
  [
    variables.build_definition_name.as_deref().unwrap_or_default(),
    variables.build_build_number.as_deref().unwrap_or_default(),
    tool_type.as_str(),
    role.as_str(),
  ]
  .join("-")
}
