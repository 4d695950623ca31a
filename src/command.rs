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
use crate::config::TaskInputs;
use crate::credentials::AuthMode;
use crate::credentials::ServiceEndpoint;
use crate::error::TaskError;
use crate::platform::encode_path;
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

/// Joins non-empty tokens with single spaces, preserving their order.
pub fn join<I, S>(tokens: I) -> String
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut command = String::new();
  for token in tokens {
    let token = token.as_ref();
    if token.is_empty() {
      continue;
    }
    if !command.is_empty() {
      command.push(' ');
    }
    command.push_str(token);
  }
  command
}

/// Wraps a value in double quotes. Embedded quotes are not escaped.
pub fn quote(value: &str) -> String {
  format!("\"{value}\"")
}

/// A single argument of a CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliArg {
  /// A bare word such as a subcommand; quoted for display only if it holds whitespace.
  Word(String),
  /// A positional value that is always displayed quoted.
  Quoted(String),
  /// A `--name=value` flag. Secret flags never show their value in redacted output.
  Flag {
    name: String,
    value: String,
    quoted: bool,
    secret: bool,
  },
}

impl CliArg {
  fn render(&self, redact: bool) -> String {
    match self {
      CliArg::Word(word) => {
        let already_quoted = word.starts_with('"') && word.ends_with('"') && word.len() > 1;
        if word.contains(char::is_whitespace) && !already_quoted {
          quote(word)
        } else {
          word.clone()
        }
      }
      CliArg::Quoted(value) => quote(value),
      CliArg::Flag { name, secret: true, .. } if redact => format!("--{name}=***"),
      CliArg::Flag {
        name,
        value,
        quoted,
        ..
      } => {
        if *quoted {
          format!("--{name}={}", quote(value))
        } else {
          format!("--{name}={value}")
        }
      }
    }
  }

  /// The argument exactly as the child process receives it.
  fn to_os_arg(&self) -> OsString {
    match self {
      CliArg::Word(value) | CliArg::Quoted(value) => OsString::from(value),
      CliArg::Flag { name, value, .. } => OsString::from(format!("--{name}={value}")),
    }
  }
}

/// An ordered JFrog CLI invocation.
///
/// Arguments are kept structured until the execution boundary: [`CliCommand::argv`]
/// feeds the process spawner, [`CliCommand::render`] produces the familiar
/// quoted command line, and [`CliCommand::redacted`] is what gets logged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliCommand {
  program: PathBuf,
  args: Vec<CliArg>,
  envs: Vec<(String, String)>,
}

impl CliCommand {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      ..Self::default()
    }
  }

  pub fn envs(mut self, envs: Vec<(String, String)>) -> Self {
    self.envs.extend(envs);
    self
  }

  /// Appends whitespace-separated words, e.g. `"rt u"`. Empty input adds nothing.
  pub fn subcommand(mut self, words: &str) -> Self {
    self
      .args
      .extend(words.split_whitespace().map(|w| CliArg::Word(w.to_string())));
    self
  }

  /// Appends a raw word. Empty words are skipped.
  pub fn arg(mut self, word: impl Into<String>) -> Self {
    let word = word.into();
    if !word.is_empty() {
      self.args.push(CliArg::Word(word));
    }
    self
  }

  /// Appends a positional value that is displayed quoted.
  pub fn quoted(mut self, value: impl Into<String>) -> Self {
    self.args.push(CliArg::Quoted(value.into()));
    self
  }

  /// Appends `--name="value"`.
  pub fn flag(self, name: &str, value: impl Into<String>) -> Self {
    self.push_flag(name, value.into(), true, false)
  }

  /// Appends `--name=value` without quoting, used for booleans.
  pub fn raw_flag(self, name: &str, value: impl fmt::Display) -> Self {
    self.push_flag(name, value.to_string(), false, false)
  }

  /// Appends `--name="value"` whose value is masked in redacted output.
  pub fn secret_flag(self, name: &str, value: impl Into<String>) -> Self {
    self.push_flag(name, value.into(), true, true)
  }

  fn push_flag(mut self, name: &str, value: String, quoted: bool, secret: bool) -> Self {
    self.args.push(CliArg::Flag {
      name: name.to_string(),
      value,
      quoted,
      secret,
    });
    self
  }

  pub fn program(&self) -> &Path {
    &self.program
  }

  pub fn args(&self) -> &[CliArg] {
    &self.args
  }

  pub fn env_vars(&self) -> &[(String, String)] {
    &self.envs
  }

  pub fn is_empty(&self) -> bool {
    self.program.as_os_str().is_empty()
  }

  pub fn argv(&self) -> Vec<OsString> {
    self.args.iter().map(CliArg::to_os_arg).collect()
  }

  fn render_with(&self, redact: bool) -> String {
    let program = encode_path(&self.program.display().to_string());
    join(std::iter::once(program).chain(self.args.iter().map(|a| a.render(redact))))
  }

  /// The full command line with every flag value visible.
  pub fn render(&self) -> String {
    self.render_with(false)
  }

  /// The command line with secret flag values replaced by `***`.
  pub fn redacted(&self) -> String {
    self.render_with(true)
  }
}

impl fmt::Display for CliCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.redacted())
  }
}

/// Adds the endpoint's credentials: access token, anonymous user, or user and password.
pub fn add_credentials(
  command: CliCommand,
  endpoint: &ServiceEndpoint,
) -> Result<CliCommand, TaskError> {
  let command = match endpoint.auth_mode()? {
    AuthMode::Token(token) => command.secret_flag("access-token", token),
    AuthMode::Anonymous => command.flag("user", "anonymous"),
    AuthMode::Basic { username, password } => command
      .flag("user", username)
      .secret_flag("password", password),
  };
  Ok(command)
}

/// Adds `--flag="value"` when the input is present.
pub fn add_string_flag(
  command: CliCommand,
  inputs: &TaskInputs,
  input: &str,
  flag: &str,
) -> CliCommand {
  match inputs.get(input) {
    Some(value) => command.flag(flag, value),
    None => command,
  }
}

/// Always adds `--flag=true|false` from a boolean input.
pub fn add_bool_flag(
  command: CliCommand,
  inputs: &TaskInputs,
  input: &str,
  flag: &str,
) -> Result<CliCommand, TaskError> {
  let value = inputs.get_bool(input)?;
  Ok(command.raw_flag(flag, value))
}

/// Adds `--build-name` and `--build-number` when build-info collection is enabled.
pub fn append_build_flags(
  command: CliCommand,
  inputs: &TaskInputs,
) -> Result<CliCommand, TaskError> {
  if !inputs.get_bool("collectBuildInfo")? {
    return Ok(command);
  }
  let build_name = inputs.get_required("buildName")?;
  let build_number = inputs.get_required("buildNumber")?;
  Ok(
    command
      .flag("build-name", build_name)
      .flag("build-number", build_number),
  )
}
