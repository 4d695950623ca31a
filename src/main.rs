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
use Commands::BuildTool;
use Commands::Generic;
use Commands::Install;
use anyhow::Result;
use clap::Parser;
use jfrog_task::cli::Cli;
use jfrog_task::cli::Commands;
use jfrog_task::config::TaskConfig;
use jfrog_task::config::TaskContext;
use jfrog_task::error::TaskError;
use jfrog_task::logging::setup_tracing;
use jfrog_task::platform::Platform;
use jfrog_task::runner::CliSource;
use jfrog_task::runner::execute_cli_task;
use jfrog_task::tasks::BuildToolTask;
use jfrog_task::tasks::GenericTask;
use jfrog_task::tasks::InstallTask;

async fn run(command: Commands, ctx: &TaskContext) -> Result<(), TaskError> {
  match command {
    Install => {
      let source = InstallTask::cli_source(ctx)?;
      execute_cli_task(ctx, source, &InstallTask).await
    }
    Generic { command } => {
      execute_cli_task(ctx, CliSource::default(), &GenericTask::new(command)).await
    }
    BuildTool { tool } => {
      execute_cli_task(ctx, CliSource::default(), &BuildToolTask::new(tool)).await
    }
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let _log_guard = setup_tracing()?;

  let Cli { config, command } = Cli::parse();
  let main_span = tracing::info_span!("jfrog_task");
  let _enter = main_span.enter();

  let task_config = TaskConfig::load(config.as_deref())?;
  let ctx = TaskContext::new(task_config, Platform::current());

  if let Err(e) = run(command, &ctx).await {
    anyhow::bail!("Error occurred while executing task:\n{e}");
  }

  tracing::info!("Task completed successfully.");
  Ok(())
}
