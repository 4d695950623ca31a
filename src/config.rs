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
use crate::command::CliCommand;
use crate::credentials::ServiceEndpoint;
use crate::error::ConfigError;
use crate::platform::Platform;
use figment::Figment;
use figment::Metadata;
use figment::Profile;
use figment::Provider;
use figment::providers::Env;
use figment::providers::Format;
use figment::providers::Json;
use figment::providers::Serialized;
use figment::value::Dict;
use figment::value::Map;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

// --- Pinned values ---
pub const TOOL_NAME: &str = "jfrog";
pub const JFROG_CLI_VERSION: &str = "1.35.1";
pub const PLUGIN_VERSION: &str = "1.8.1";
pub const BUILD_AGENT: &str = "artifactory-azure-devops-extension";

/// Prefix of environment variables overriding the task configuration.
pub const ENV_PREFIX: &str = "JFROG_TASK_";

/// Accepts strings, numbers and booleans as an optional string.
///
/// JSON task files may carry build numbers or passwords as numbers.
pub fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(value.and_then(value_to_string))
}

fn value_to_string(value: Value) -> Option<String> {
  match value {
    Value::Null => None,
    Value::String(s) => Some(s),
    other => Some(other.to_string()),
  }
}

/// `JFROG_TASK_*` overrides with every value kept as the raw string.
///
/// `__` separates nested keys, so `JFROG_TASK_ENDPOINTS__RT__PASSWORD` sets
/// `endpoints.rt.password`. Values are never parsed: `0123` stays `0123`.
pub struct RawEnv {
  env: Env,
}

impl RawEnv {
  pub fn prefixed(prefix: &str) -> Self {
    Self {
      env: Env::prefixed(prefix).split("__"),
    }
  }
}

impl Provider for RawEnv {
  fn metadata(&self) -> Metadata {
    Metadata::named("environment variable(s)")
  }

  fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
    self
      .env
      .iter()
      .filter(|(key, _)| !key.as_str().is_empty())
      .fold(Figment::new(), |figment, (key, value)| {
        let key = key.as_str().to_ascii_lowercase();
        figment.merge(Serialized::default(&key, value))
      })
      .data()
  }
}

/// Pipeline variables supplied by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variables {
  pub agent_work_folder: PathBuf,
  pub system_default_working_directory: PathBuf,
  #[serde(default, deserialize_with = "scalar_string")]
  pub build_definition_name: Option<String>,
  #[serde(default, deserialize_with = "scalar_string")]
  pub build_build_number: Option<String>,
}

impl Default for Variables {
  fn default() -> Self {
    Self {
      agent_work_folder: PathBuf::from("."),
      system_default_working_directory: PathBuf::from("."),
      build_definition_name: None,
      build_build_number: None,
    }
  }
}

/// Task inputs, looked up by case-insensitive name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskInputs(BTreeMap<String, Value>);

impl TaskInputs {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
    self.0.insert(name.to_string(), value.into());
    self
  }

  fn lookup(&self, name: &str) -> Option<&Value> {
    self
      .0
      .iter()
      .find(|(key, _)| key.eq_ignore_ascii_case(name))
      .map(|(_, value)| value)
  }

  /// Returns the input as a string. Empty values count as absent.
  pub fn get(&self, name: &str) -> Option<String> {
    self
      .lookup(name)
      .cloned()
      .and_then(value_to_string)
      .filter(|v| !v.is_empty())
  }

  pub fn get_required(&self, name: &str) -> Result<String, ConfigError> {
    self.get(name).ok_or_else(|| ConfigError::MissingInput {
      name: name.to_string(),
    })
  }

  /// Reads a boolean input. Absent inputs are `false`.
  pub fn get_bool(&self, name: &str) -> Result<bool, ConfigError> {
    match self.lookup(name) {
      None | Some(Value::Null) => Ok(false),
      Some(Value::Bool(b)) => Ok(*b),
      Some(Value::String(s)) if s.is_empty() => Ok(false),
      Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(true),
      Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(false),
      Some(other) => Err(ConfigError::InvalidBoolInput {
        name: name.to_string(),
        value: other.to_string(),
      }),
    }
  }
}

/// The whole configuration handed to a task by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskConfig {
  #[serde(default)]
  pub variables: Variables,
  #[serde(default)]
  pub inputs: TaskInputs,
  #[serde(default)]
  pub endpoints: BTreeMap<String, ServiceEndpoint>,
}

impl TaskConfig {
  /// Layers defaults, an optional JSON task file and `JFROG_TASK_*` environment overrides.
  pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(TaskConfig::default()));
    if let Some(path) = config_file {
      tracing::debug!(path = %path.display(), "Loading task configuration file");
      figment = figment.merge(Json::file(path));
    }
    figment
      .merge(RawEnv::prefixed(ENV_PREFIX))
      .extract()
      .map_err(|e| ConfigError::Load(Box::new(e)))
  }

  pub fn endpoint(&self, name: &str) -> Result<&ServiceEndpoint, ConfigError> {
    self
      .endpoints
      .iter()
      .find(|(key, _)| key.eq_ignore_ascii_case(name))
      .map(|(_, endpoint)| endpoint)
      .ok_or_else(|| ConfigError::EndpointNotFound {
        name: name.to_string(),
      })
  }

  /// Resolves the endpoint named by the value of `input`.
  pub fn endpoint_from_input(&self, input: &str) -> Result<&ServiceEndpoint, ConfigError> {
    let name = self.inputs.get_required(input)?;
    self.endpoint(&name)
  }
}

/// Everything a task needs, threaded explicitly instead of held in globals.
#[derive(Debug, Clone)]
pub struct TaskContext {
  pub config: TaskConfig,
  pub platform: Platform,
}

impl TaskContext {
  /// Anchors relative agent folders at the current directory, since CLI
  /// commands run with other working directories.
  pub fn new(mut config: TaskConfig, platform: Platform) -> Self {
    let variables = &mut config.variables;
    variables.agent_work_folder = absolute(&variables.agent_work_folder);
    variables.system_default_working_directory =
      absolute(&variables.system_default_working_directory);
    Self { config, platform }
  }

  pub fn inputs(&self) -> &TaskInputs {
    &self.config.inputs
  }

  pub fn variables(&self) -> &Variables {
    &self.config.variables
  }

  /// Name of the CLI executable on this platform.
  pub fn cli_file_name(&self) -> String {
    self.platform.executable_name(TOOL_NAME)
  }

  /// `<Agent.WorkFolder>/_jfrog`, also used as `JFROG_CLI_HOME`.
  pub fn jfrog_folder(&self) -> PathBuf {
    self.variables().agent_work_folder.join("_jfrog")
  }

  /// Optional manually installed CLI that takes precedence over any download.
  pub fn custom_cli_path(&self) -> PathBuf {
    self.jfrog_folder().join("current").join(self.cli_file_name())
  }

  /// Version-keyed cache directory for the downloaded CLI.
  pub fn cli_cache_dir(&self) -> PathBuf {
    self.tool_cache_root().join(JFROG_CLI_VERSION)
  }

  pub fn tool_cache_root(&self) -> PathBuf {
    self.jfrog_folder().join("tools").join(TOOL_NAME)
  }

  /// Package name of the CLI build for this platform, e.g. `jfrog-cli-linux-amd64`.
  pub fn cli_package(&self) -> String {
    format!("jfrog-cli-{}", self.platform.architecture())
  }

  /// Default public download location of the pinned CLI version.
  pub fn default_download_url(&self) -> String {
    let package = self.cli_package();
    format!(
      "https://api.bintray.com/content/jfrog/jfrog-cli-go/{JFROG_CLI_VERSION}/{package}/{}?bt_package={package}",
      self.cli_file_name()
    )
  }

  /// Environment passed to every CLI invocation.
  pub fn cli_env(&self) -> Vec<(String, String)> {
    vec![
      (
        "JFROG_CLI_HOME".to_string(),
        self.jfrog_folder().display().to_string(),
      ),
      ("JFROG_CLI_OFFER_CONFIG".to_string(), "false".to_string()),
      (
        "JFROG_CLI_USER_AGENT".to_string(),
        format!("{BUILD_AGENT}/{PLUGIN_VERSION}"),
      ),
    ]
  }

  /// Starts a command for the CLI at `cli_path`, carrying the CLI environment.
  pub fn cli_command(&self, cli_path: &Path) -> CliCommand {
    CliCommand::new(cli_path).envs(self.cli_env())
  }
}

fn absolute(path: &Path) -> PathBuf {
  std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn inputs_are_case_insensitive() {
    let inputs = TaskInputs::new().with("buildName", "myBuild");
    assert_eq!(inputs.get("BUILDNAME").as_deref(), Some("myBuild"));
    assert_eq!(inputs.get("buildname").as_deref(), Some("myBuild"));
  }

  #[test]
  fn empty_inputs_are_absent() {
    let inputs = TaskInputs::new().with("specVars", "");
    assert_eq!(inputs.get("specVars"), None);
    assert!(matches!(
      inputs.get_required("specVars"),
      Err(ConfigError::MissingInput { .. })
    ));
  }

  #[test]
  fn bool_inputs_accept_strings_and_booleans() {
    let inputs = TaskInputs::new()
      .with("a", true)
      .with("b", "TRUE")
      .with("c", "false")
      .with("d", "maybe");
    assert!(inputs.get_bool("a").unwrap());
    assert!(inputs.get_bool("b").unwrap());
    assert!(!inputs.get_bool("c").unwrap());
    assert!(!inputs.get_bool("missing").unwrap());
    assert!(inputs.get_bool("d").is_err());
  }

  #[test]
  fn numeric_inputs_read_as_strings() {
    let inputs = TaskInputs::new().with("buildNumber", 7);
    assert_eq!(inputs.get("buildNumber").as_deref(), Some("7"));
  }

  #[test]
  fn loads_json_task_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("task.json");
    std::fs::write(
      &path,
      r#"{
        "variables": {
          "agent_work_folder": "/agent/_work",
          "system_default_working_directory": "/src",
          "build_build_number": 12
        },
        "inputs": { "artifactoryService": "rt" },
        "endpoints": { "rt": { "url": "https://rt", "apitoken": "abc" } }
      }"#,
    )
    .unwrap();

    let config = TaskConfig::load(Some(&path)).unwrap();
    assert_eq!(config.variables.agent_work_folder, PathBuf::from("/agent/_work"));
    assert_eq!(config.variables.build_build_number.as_deref(), Some("12"));
    let endpoint = config.endpoint_from_input("artifactoryService").unwrap();
    assert_eq!(endpoint.apitoken.as_deref(), Some("abc"));
  }

  #[test]
  fn derived_paths_follow_work_folder() {
    let config = TaskConfig {
      variables: Variables {
        agent_work_folder: PathBuf::from("/w"),
        ..Variables::default()
      },
      ..TaskConfig::default()
    };
    let ctx = TaskContext::new(config, Platform::Linux { x64: true });
    assert_eq!(ctx.custom_cli_path(), PathBuf::from("/w/_jfrog/current/jfrog"));
    assert_eq!(ctx.cli_cache_dir(), PathBuf::from("/w/_jfrog/tools/jfrog/1.35.1"));
    assert_eq!(
      ctx.default_download_url(),
      "https://api.bintray.com/content/jfrog/jfrog-cli-go/1.35.1/jfrog-cli-linux-amd64/jfrog?bt_package=jfrog-cli-linux-amd64"
    );
  }

  #[test]
  fn env_overrides_keep_raw_text() {
    figment::Jail::expect_with(|jail| {
      jail.set_env("JFROG_TASK_VARIABLES__BUILD_BUILD_NUMBER", "20241018.10");
      jail.set_env("JFROG_TASK_ENDPOINTS__RT__PASSWORD", "0123");
      jail.set_env("JFROG_TASK_INPUTS__BUILDNUMBER", "1.50");
      jail.set_env("JFROG_TASK_INPUTS__DRYRUN", "true");

      let config = TaskConfig::load(None).unwrap();
      assert_eq!(config.variables.build_build_number.as_deref(), Some("20241018.10"));
      assert_eq!(config.endpoint("rt").unwrap().password.as_deref(), Some("0123"));
      assert_eq!(config.inputs.get("buildNumber").as_deref(), Some("1.50"));
      assert!(config.inputs.get_bool("dryRun").unwrap());
      Ok(())
    });
  }

  #[test]
  fn env_overrides_win_over_task_file() {
    figment::Jail::expect_with(|jail| {
      jail.create_file(
        "task.json",
        r#"{ "variables": { "build_build_number": "1" }, "inputs": { "buildName": "file" } }"#,
      )?;
      jail.set_env("JFROG_TASK_VARIABLES__BUILD_BUILD_NUMBER", "007");

      let config = TaskConfig::load(Some(Path::new("task.json"))).unwrap();
      assert_eq!(config.variables.build_build_number.as_deref(), Some("007"));
      assert_eq!(config.inputs.get("buildName").as_deref(), Some("file"));
      Ok(())
    });
  }

  #[test]
  fn relative_agent_folders_become_absolute() {
    // The jail pins the working directory while the paths are resolved.
    figment::Jail::expect_with(|_| {
      let config = TaskConfig {
        variables: Variables {
          agent_work_folder: PathBuf::from("agent"),
          system_default_working_directory: PathBuf::from("sources"),
          ..Variables::default()
        },
        ..TaskConfig::default()
      };
      let ctx = TaskContext::new(config, Platform::Linux { x64: true });
      let cwd = std::env::current_dir().unwrap();
      assert_eq!(ctx.custom_cli_path(), cwd.join("agent/_jfrog/current/jfrog"));
      assert_eq!(ctx.variables().system_default_working_directory, cwd.join("sources"));
      assert!(ctx.cli_cache_dir().is_absolute());
      Ok(())
    });
  }
}
