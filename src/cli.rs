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
use crate::tasks::GenericCommand;
use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Runs JFrog CLI pipeline tasks")]
pub struct Cli {
  /// JSON task configuration holding variables, inputs and service endpoints.
  /// Values can be overridden with JFROG_TASK_<SECTION>__<KEY> variables.
  #[arg(long, global = true, env = "JFROG_TASK_CONFIG")]
  pub config: Option<PathBuf>,

  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
  /// Make sure the JFrog CLI is installed, downloading it if needed.
  Install,

  /// Upload or download files described by a file-spec.
  Generic {
    #[arg(value_enum)]
    command: GenericCommand,
  },

  /// Run a build tool with Artifactory resolution and deployment configured.
  BuildTool {
    #[arg(value_enum)]
    tool: BuildToolType,
  },
}
