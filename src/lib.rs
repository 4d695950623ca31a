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

//! # jfrog-task
//!
//! `jfrog-task` runs JFrog CLI pipeline tasks. It turns task inputs
//! (credentials, file-specs, build tool settings) into JFrog CLI invocations,
//! downloads and caches the CLI when needed, and reports failures with any
//! credentials scrubbed.
//!
//! This crate contains the library logic for the `jfrog-task` binary.
//!
//! ## Core Modules
//!
//! * [`runner`]: The task entry point `execute_cli_task`, plus server
//!   configuration and environment collection steps.
//! * [`tasks`]: Concrete task bodies (install, generic transfer, build tools).
//! * [`locator`] and [`download`]: Find or fetch the CLI binary.
//! * [`command`]: The structured `CliCommand` and the flag helpers.
//! * [`credentials`]: Service endpoints and their auth mode.
//! * [`spec`]: File-spec reading, validation and writing.
//! * [`build_tool`]: Build tool config documents and server ids.
//! * [`executor`]: Runs commands and redacts secrets from failures.
//! * [`platform`]: Host-specific escaping, naming and permissions.
//! * [`config`]: `figment`-based task configuration and the `TaskContext`.
//! * [`cli`]: Defines the `clap`-based command-line interface.
//! * [`error`]: Defines the custom error types for the library.
//! * [`logging`]: Provides the `setup_tracing` utility.

pub mod build_tool;
pub mod cli;
pub mod command;
pub mod config;
pub mod credentials;
pub mod download;
pub mod error;
pub mod executor;
pub mod locator;
pub mod logging;
pub mod platform;
pub mod runner;
pub mod spec;
pub mod tasks;
