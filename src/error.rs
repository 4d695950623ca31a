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
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error enum for the jfrog-task library.
#[derive(Error, Debug)]
pub enum TaskError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Credentials(#[from] CredentialError),

  #[error(transparent)]
  Spec(#[from] SpecError),

  #[error(transparent)]
  Exec(#[from] ExecError),

  /// A failed CLI download, carrying the remediation text shown to the user.
  #[error("{message}\n{source}")]
  Download {
    message: String,
    #[source]
    source: DownloadError,
  },

  #[error("Failed writing build tool config to {path}")]
  WriteBuildToolConfig {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to serialize build tool config")]
  SerializeBuildToolConfig(#[from] serde_yaml::Error),

  #[error("Could not find '{tool}' on PATH. Make sure it is installed on the build agent.")]
  ToolNotFound { tool: String },

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

/// Errors related to reading the task configuration (src/config.rs).
#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Failed to load task configuration")]
  Load(#[from] Box<figment::Error>),

  #[error("Input required: {name}")]
  MissingInput { name: String },

  #[error("Input '{name}' has an invalid boolean value: {value}")]
  InvalidBoolInput { name: String, value: String },

  #[error("Service endpoint not found: {name}")]
  EndpointNotFound { name: String },
}

/// Errors related to resolving endpoint credentials (src/credentials.rs).
#[derive(Error, Debug)]
pub enum CredentialError {
  #[error("Service endpoint has no username configured")]
  MissingUsername,

  #[error("Service endpoint has no password configured for user '{username}'")]
  MissingPassword { username: String },
}

/// Errors related to writing a file-spec (src/spec.rs).
#[derive(Error, Debug)]
pub enum SpecError {
  #[error("Failed creating File-Spec, since the provided File-Spec source value is invalid.")]
  InvalidSource(String),

  #[error("Failed to read File-Spec from {path}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to parse File-Spec JSON: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("The File Spec has no 'files' section.")]
  MissingFiles,

  #[error("The File Spec includes 'regexp: true' which is currently not supported.")]
  RegexpNotSupported,

  #[error("Failed to write File-Spec to {path}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Errors raised while running a JFrog CLI command (src/executor.rs).
///
/// Messages of the `Spawn` and `Failed` variants have already been scrubbed
/// of credentials.
#[derive(Error, Debug)]
pub enum ExecError {
  #[error("JFrog CLI execution path doesn't exist: {}", .0.display())]
  PathNotFound(PathBuf),

  #[error("Cannot execute empty Cli command.")]
  EmptyCommand,

  #[error("{0}")]
  Spawn(String),

  #[error("{0}")]
  Failed(String),
}

/// Errors related to downloading and caching the CLI (src/download.rs).
#[derive(Error, Debug)]
pub enum DownloadError {
  #[error("HTTP request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Failed to cache downloaded file: {0}")]
  Cache(#[from] fs_extra::error::Error),
}
