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
use crate::config::TaskContext;
use crate::credentials::AuthMode;
use crate::credentials::ServiceEndpoint;
use crate::download::AuthHandler;
use crate::executor::StdioMode;
use crate::executor::execute_cli_command;
use crate::error::TaskError;
use crate::locator::locate_cli;
use std::path::Path;
use std::path::PathBuf;
use tracing::Instrument;

const CLI_CONFIG_COMMAND: &str = "rt c";
const COLLECT_ENV_COMMAND: &str = "rt bce";

/// The body of a pipeline task, run once the CLI is available.
#[allow(async_fn_in_trait)]
pub trait CliTask {
  /// Short name used in log spans.
  fn name(&self) -> &'static str;

  async fn run(&self, ctx: &TaskContext, cli_path: &Path) -> Result<(), TaskError>;
}

/// Where to fetch the CLI from when it is not installed yet.
#[derive(Debug, Clone, Default)]
pub struct CliSource {
  /// `None` selects the public default URL, always without auth.
  pub url: Option<String>,
  pub auth: Vec<AuthHandler>,
}

/// Task entry point: locate the CLI, run `task`, then collect environment variables if asked.
pub async fn execute_cli_task<T: CliTask>(
  ctx: &TaskContext,
  source: CliSource,
  task: &T,
) -> Result<(), TaskError> {
  let span = tracing::info_span!("task", name = task.name());

  async move {
    let (url, auth) = match source.url {
      Some(url) => (url, source.auth),
      None => (ctx.default_download_url(), Vec::new()),
    };
    let cli_path = locate_cli(ctx, &url, &auth).await?;

    tracing::info!("Running jfrog-cli from {}.", cli_path.display());
    log_cli_version(ctx, &cli_path).await;
    task.run(ctx, &cli_path).await?;

    collect_env_vars_if_needed(ctx, &cli_path).await
  }
  .instrument(span)
  .await
}

/// Logs the CLI's reported version. Failures are logged and otherwise ignored.
pub async fn log_cli_version(ctx: &TaskContext, cli_path: &Path) {
  let command = ctx.cli_command(cli_path).arg("--version");
  let running_dir = cli_path.parent().unwrap_or(Path::new("."));
  match execute_cli_command(&command, running_dir, StdioMode::Capture).await {
    Ok(output) => {
      let stdout = String::from_utf8_lossy(&output.stdout);
      match stdout.split(' ').nth(2) {
        Some(version) => tracing::info!("JFrog CLI version: {}", version.trim()),
        None => tracing::warn!(output = %stdout.trim(), "Unexpected JFrog CLI version output"),
      }
    }
    Err(e) => tracing::error!("Failed to get JFrog CLI version: {}", e),
  }
}

/// Runs `rt bce` when the `includeEnvVars` input is set.
pub async fn collect_env_vars_if_needed(
  ctx: &TaskContext,
  cli_path: &Path,
) -> Result<(), TaskError> {
  if !ctx.inputs().get_bool("includeEnvVars")? {
    return Ok(());
  }
  collect_env_vars(ctx, cli_path).await
}

pub async fn collect_env_vars(ctx: &TaskContext, cli_path: &Path) -> Result<(), TaskError> {
  tracing::info!("Collecting environment variables...");
  let build_name = ctx.inputs().get_required("buildName")?;
  let build_number = ctx.inputs().get_required("buildNumber")?;
  let command = ctx
    .cli_command(cli_path)
    .subcommand(COLLECT_ENV_COMMAND)
    .quoted(build_name)
    .quoted(build_number);
  execute_cli_command(
    &command,
    &ctx.variables().system_default_working_directory,
    StdioMode::Inherit,
  )
  .await?;
  Ok(())
}

/// Adds `server_id` to the CLI configuration, pointing at `endpoint`.
pub async fn configure_cli_server(
  ctx: &TaskContext,
  cli_path: &Path,
  endpoint: &ServiceEndpoint,
  server_id: &str,
  running_dir: &Path,
) -> Result<(), TaskError> {
  let command = ctx
    .cli_command(cli_path)
    .subcommand(CLI_CONFIG_COMMAND)
    .quoted(server_id)
    .flag("url", endpoint.url())
    .raw_flag("interactive", false);
  let command = match endpoint.auth_mode()? {
    AuthMode::Token(token) => command.secret_flag("access-token", token),
    AuthMode::Basic { username, password } => command
      .flag("user", username)
      .secret_flag("password", password),
    AuthMode::Anonymous => command,
  };
  execute_cli_command(&command, running_dir, StdioMode::Inherit).await?;
  Ok(())
}

/// Removes each server from the CLI configuration, stopping at the first failure.
pub async fn delete_cli_servers(
  ctx: &TaskContext,
  cli_path: &Path,
  running_dir: &Path,
  server_ids: &[String],
) -> Result<(), TaskError> {
  for server_id in server_ids {
    let command: CliCommand = ctx
      .cli_command(cli_path)
      .subcommand(CLI_CONFIG_COMMAND)
      .arg("delete")
      .quoted(server_id.as_str())
      .raw_flag("interactive", false);
    execute_cli_command(&command, running_dir, StdioMode::Inherit).await?;
  }
  Ok(())
}

/// The directory to run the CLI in.
///
/// An absolute `provided` path wins, a relative one is joined onto `default`.
pub fn determine_cli_work_dir(default: &Path, provided: Option<&str>) -> PathBuf {
  match provided.filter(|p| !p.is_empty()) {
    Some(provided) if Path::new(provided).is_absolute() => PathBuf::from(provided),
    Some(provided) => default.join(provided),
    None => default.to_path_buf(),
  }
}

/// Whether `tool` resolves to an executable on PATH.
pub fn is_tool_exists(tool: &str) -> bool {
  which::which(tool).is_ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn work_dir_resolution() {
    let default = Path::new("/src");
    assert_eq!(determine_cli_work_dir(default, None), PathBuf::from("/src"));
    assert_eq!(determine_cli_work_dir(default, Some("")), PathBuf::from("/src"));
    assert_eq!(determine_cli_work_dir(default, Some("app")), PathBuf::from("/src/app"));
    #[cfg(unix)]
    assert_eq!(determine_cli_work_dir(default, Some("/other")), PathBuf::from("/other"));
  }

  #[test]
  fn missing_tools_are_reported() {
    assert!(!is_tool_exists("definitely-not-a-real-tool-4f1c2b"));
  }

  #[cfg(unix)]
  #[test]
  fn shell_is_found_on_path() {
    assert!(is_tool_exists("sh"));
  }
}
