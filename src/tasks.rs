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
use crate::build_tool::BuildToolType;
use crate::build_tool::RepoSettings;
use crate::build_tool::ServerRole;
use crate::build_tool::assemble_build_tool_server_id;
use crate::build_tool::create_build_tool_config_file;
use crate::command::add_bool_flag;
use crate::command::add_credentials;
use crate::command::add_string_flag;
use crate::command::append_build_flags;
use crate::config::TaskContext;
use crate::download::build_cli_artifactory_download_url;
use crate::download::create_auth_handlers;
use crate::error::TaskError;
use crate::executor::StdioMode;
use crate::executor::execute_cli_command;
use crate::runner::CliSource;
use crate::runner::CliTask;
use crate::runner::configure_cli_server;
use crate::runner::delete_cli_servers;
use crate::runner::determine_cli_work_dir;
use crate::runner::is_tool_exists;
use crate::spec::SpecSource;
use crate::spec::write_spec_content_to_spec_path;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Makes sure the CLI is installed, optionally downloading it through Artifactory.
#[derive(Debug, Default)]
pub struct InstallTask;

impl InstallTask {
  /// Download source from the `artifactoryService` and `cliInstallationRepo` inputs.
  ///
  /// Without an `artifactoryService` the public default location is used.
  pub fn cli_source(ctx: &TaskContext) -> Result<CliSource, TaskError> {
    let Some(service) = ctx.inputs().get("artifactoryService") else {
      return Ok(CliSource::default());
    };
    let endpoint = ctx.config.endpoint(&service)?;
    let repo = ctx.inputs().get_required("cliInstallationRepo")?;
    Ok(CliSource {
      url: Some(build_cli_artifactory_download_url(ctx, endpoint.url(), &repo)),
      auth: create_auth_handlers(endpoint)?,
    })
  }
}

impl CliTask for InstallTask {
  fn name(&self) -> &'static str {
    "install"
  }

  async fn run(&self, _ctx: &TaskContext, cli_path: &Path) -> Result<(), TaskError> {
    tracing::info!("JFrog CLI is available at {}", cli_path.display());
    Ok(())
  }
}

/// Direction of a generic file transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GenericCommand {
  Upload,
  Download,
}

impl GenericCommand {
  fn cli_subcommand(self) -> &'static str {
    match self {
      GenericCommand::Upload => "rt u",
      GenericCommand::Download => "rt dl",
    }
  }

  fn spec_prefix(self) -> &'static str {
    match self {
      GenericCommand::Upload => "uploadSpec",
      GenericCommand::Download => "downloadSpec",
    }
  }
}

/// Uploads or downloads files described by a file-spec.
#[derive(Debug)]
pub struct GenericTask {
  pub command: GenericCommand,
}

impl GenericTask {
  pub fn new(command: GenericCommand) -> Self {
    Self { command }
  }

  fn spec_path(&self, work_dir: &Path) -> PathBuf {
    let millis = SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .map(|d| d.as_millis())
      .unwrap_or_default();
    work_dir.join(format!("{}{millis}.json", self.command.spec_prefix()))
  }

  async fn run_with_spec(
    &self,
    ctx: &TaskContext,
    cli_path: &Path,
    spec_path: &Path,
  ) -> Result<(), TaskError> {
    let source = ctx.inputs().get_required("specSource")?.parse::<SpecSource>()?;
    write_spec_content_to_spec_path(ctx, source, spec_path)?;

    let endpoint = ctx.config.endpoint_from_input("artifactoryService")?;
    let inputs = ctx.inputs();
    let command = ctx
      .cli_command(cli_path)
      .subcommand(self.command.cli_subcommand())
      .flag("url", endpoint.url())
      .flag("spec", spec_path.display().to_string());
    let command = add_credentials(command, endpoint)?;
    let command = add_string_flag(command, inputs, "specVars", "spec-vars");
    let command = add_bool_flag(command, inputs, "failNoOp", "fail-no-op")?;
    let command = add_bool_flag(command, inputs, "dryRun", "dry-run")?;
    let command = append_build_flags(command, inputs)?;

    execute_cli_command(
      &command,
      &ctx.variables().system_default_working_directory,
      StdioMode::Inherit,
    )
    .await?;
    Ok(())
  }
}

impl CliTask for GenericTask {
  fn name(&self) -> &'static str {
    match self.command {
      GenericCommand::Upload => "generic-upload",
      GenericCommand::Download => "generic-download",
    }
  }

  async fn run(&self, ctx: &TaskContext, cli_path: &Path) -> Result<(), TaskError> {
    let spec_path = self.spec_path(&ctx.variables().system_default_working_directory);
    let result = self.run_with_spec(ctx, cli_path, &spec_path).await;

    if spec_path.exists() {
      if let Err(e) = std::fs::remove_file(&spec_path) {
        tracing::warn!(path = %spec_path.display(), error = %e, "Failed to remove file spec");
      }
    }
    result
  }
}

/// Runs a build tool through the CLI with resolver/deployer servers configured for the run.
#[derive(Debug)]
pub struct BuildToolTask {
  pub tool: BuildToolType,
}

impl BuildToolTask {
  pub fn new(tool: BuildToolType) -> Self {
    Self { tool }
  }

  /// Repo settings for `role`, or empty settings when no service is selected for it.
  fn repo_settings(&self, ctx: &TaskContext, role: ServerRole) -> Result<RepoSettings, TaskError> {
    if ctx.inputs().get(role.service_input()).is_none() {
      return Ok(RepoSettings::default());
    }
    let server_id = assemble_build_tool_server_id(ctx.variables(), self.tool, role);
    let mut settings = RepoSettings::new(server_id);
    for (input, key) in self.tool.repo_inputs(role) {
      if let Some(repo) = ctx.inputs().get(input) {
        settings = settings.repo(key, repo);
      }
    }
    Ok(settings)
  }

  fn config_path(&self, work_dir: &Path) -> PathBuf {
    work_dir
      .join(".jfrog")
      .join("projects")
      .join(format!("{}.yaml", self.tool))
  }

  async fn run_configured(
    &self,
    ctx: &TaskContext,
    cli_path: &Path,
    work_dir: &Path,
    configured: &mut Vec<String>,
  ) -> Result<(), TaskError> {
    let resolver = self.repo_settings(ctx, ServerRole::Resolver)?;
    let deployer = self.repo_settings(ctx, ServerRole::Deployer)?;

    for (role, settings) in [(ServerRole::Resolver, &resolver), (ServerRole::Deployer, &deployer)] {
      if settings.is_empty() {
        continue;
      }
      let endpoint = ctx.config.endpoint_from_input(role.service_input())?;
      configure_cli_server(ctx, cli_path, endpoint, &settings.server_id, work_dir).await?;
      configured.push(settings.server_id.clone());
    }

    let config_path = self.config_path(work_dir);
    create_build_tool_config_file(&config_path, self.tool, resolver, deployer)?;

    let command = ctx
      .cli_command(cli_path)
      .subcommand(self.tool.cli_subcommand())
      .quoted(ctx.inputs().get_required("command")?)
      .quoted(config_path.display().to_string());
    let command = append_build_flags(command, ctx.inputs())?;
    execute_cli_command(&command, work_dir, StdioMode::Inherit).await?;
    Ok(())
  }
}

impl CliTask for BuildToolTask {
  fn name(&self) -> &'static str {
    self.tool.as_str()
  }

  async fn run(&self, ctx: &TaskContext, cli_path: &Path) -> Result<(), TaskError> {
    let executable = self.tool.executable();
    if !is_tool_exists(executable) {
      return Err(TaskError::ToolNotFound {
        tool: executable.to_string(),
      });
    }

    let work_dir = determine_cli_work_dir(
      &ctx.variables().system_default_working_directory,
      ctx.inputs().get("workingDirectory").as_deref(),
    );

    let mut configured = Vec::new();
    let result = self.run_configured(ctx, cli_path, &work_dir, &mut configured).await;

    // Servers are removed even when the build failed.
    let cleanup = delete_cli_servers(ctx, cli_path, &work_dir, &configured).await;
    result.and(cleanup)
  }
}
