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
use crate::error::ExecError;
use regex::Regex;
use std::path::Path;
use std::process::Output;
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::process::Command;

static PASSWORD_FLAG: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#"--password=".*""#).expect("valid password regex"));
static TOKEN_FLAG: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#"--access-token=".*""#).expect("valid access-token regex"));

/// How the child's standard streams are wired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StdioMode {
  /// Stream straight to this process's stdin, stdout and stderr.
  #[default]
  Inherit,
  /// Collect stdout and stderr into the returned [`Output`].
  Capture,
}

/// Masks quoted password and access-token flag values in free text.
///
/// Best effort: each pattern is applied once and matches greedily up to the
/// last quote on the line.
pub fn redact_secrets(text: &str) -> String {
  let text = PASSWORD_FLAG.replace_all(text, "--password=***");
  TOKEN_FLAG.replace_all(&text, "--access-token=***").into_owned()
}

/// Runs `command` in `running_dir`.
///
/// Fails before spawning if the directory is missing or the command is
/// empty. Spawn failures and non-zero exits produce an error whose text has
/// been passed through [`redact_secrets`].
pub async fn execute_cli_command(
  command: &CliCommand,
  running_dir: &Path,
  stdio: StdioMode,
) -> Result<Output, ExecError> {
  if !running_dir.exists() {
    return Err(ExecError::PathNotFound(running_dir.to_path_buf()));
  }
  if command.is_empty() {
    return Err(ExecError::EmptyCommand);
  }

  let mut cmd = Command::new(command.program());
  cmd
    .args(command.argv())
    .envs(command.env_vars().iter().map(|(k, v)| (k, v)))
    .current_dir(running_dir)
    .stdin(Stdio::inherit());
  match stdio {
    StdioMode::Inherit => {
      cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    }
    StdioMode::Capture => {
      cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    }
  }

  tracing::debug!(command = %command, dir = %running_dir.display(), "Executing cliCommand");
  let output = cmd.output().await.map_err(|e| {
    ExecError::Spawn(redact_secrets(&format!(
      "Failed to spawn command: {}\n{e}",
      command.redacted()
    )))
  })?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut message = format!(
      "Command {} exited with {}",
      command.redacted(),
      output.status
    );
    if !stderr.trim().is_empty() {
      message.push('\n');
      message.push_str(stderr.trim_end());
    }
    return Err(ExecError::Failed(redact_secrets(&message)));
  }

  Ok(output)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn redacts_password_and_token() {
    let text = r#"Error: jfrog rt u --user="admin" --password="secret123" failed"#;
    let redacted = redact_secrets(text);
    assert!(!redacted.contains("secret123"));
    assert!(redacted.contains("--password=***"));

    let text = r#"jfrog rt dl --access-token="eyJ0eXAi" --url="x""#;
    let redacted = redact_secrets(text);
    assert!(!redacted.contains("eyJ0eXAi"));
    assert!(redacted.contains("--access-token=***"));
  }

  #[test]
  fn redaction_leaves_clean_text_alone() {
    assert_eq!(redact_secrets("nothing to hide"), "nothing to hide");
  }

  #[tokio::test]
  async fn missing_directory_fails_before_spawn() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");
    // The program does not exist either; the directory check must come first.
    let cmd = CliCommand::new(dir.path().join("no-such-binary"));
    let err = execute_cli_command(&cmd, &missing, StdioMode::Inherit)
      .await
      .unwrap_err();
    assert!(matches!(err, ExecError::PathNotFound(_)));
    assert!(err.to_string().contains("JFrog CLI execution path doesn't exist"));
  }

  #[tokio::test]
  async fn empty_command_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = execute_cli_command(&CliCommand::default(), dir.path(), StdioMode::Inherit)
      .await
      .unwrap_err();
    assert!(matches!(err, ExecError::EmptyCommand));
  }

  #[tokio::test]
  async fn spawn_failure_is_redacted() {
    let dir = tempfile::tempdir().unwrap();
    let cmd = CliCommand::new(dir.path().join("no-such-binary"))
      .secret_flag("password", "secret123");
    let err = execute_cli_command(&cmd, dir.path(), StdioMode::Inherit)
      .await
      .unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, ExecError::Spawn(_)));
    assert!(!message.contains("secret123"));
    assert!(message.contains("--password=***"));
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn non_zero_exit_scrubs_echoed_secrets() {
    let dir = tempfile::tempdir().unwrap();
    let cmd = CliCommand::new("sh")
      .arg("-c")
      .arg(r#"echo 'bad --access-token="tkn-value"' >&2; exit 3"#)
      .secret_flag("password", "secret123");
    let err = execute_cli_command(&cmd, dir.path(), StdioMode::Capture)
      .await
      .unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, ExecError::Failed(_)));
    assert!(!message.contains("secret123"));
    assert!(!message.contains("tkn-value"));
    assert!(message.contains("--access-token=***"));
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn captures_stdout_in_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
    let cmd = CliCommand::new("cat").arg("marker.txt");
    let output = execute_cli_command(&cmd, dir.path(), StdioMode::Capture)
      .await
      .unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout), "here");
  }
}
