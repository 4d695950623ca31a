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
use crate::config::JFROG_CLI_VERSION;
use crate::config::TaskContext;
use crate::download::AuthHandler;
use crate::download::completion_marker;
use crate::download::download_cli;
use crate::error::TaskError;
use std::path::PathBuf;

/// Returns the cached CLI for the pinned version, if a previous download completed.
pub fn find_cached_cli(ctx: &TaskContext) -> Option<PathBuf> {
  let cache_dir = ctx.cli_cache_dir();
  if !cache_dir.is_dir() || !completion_marker(&cache_dir).exists() {
    return None;
  }
  Some(cache_dir.join(ctx.cli_file_name()))
}

/// Resolves a local CLI executable, downloading it when nothing usable exists.
///
/// Order: the custom path under `_jfrog/current`, then the version cache, then `url`.
pub async fn locate_cli(
  ctx: &TaskContext,
  url: &str,
  auth: &[AuthHandler],
) -> Result<PathBuf, TaskError> {
  let custom_cli_path = ctx.custom_cli_path();
  if custom_cli_path.exists() {
    tracing::debug!(path = %custom_cli_path.display(), "Using cli from custom cli path");
    return Ok(custom_cli_path);
  }

  if let Some(cli_path) = find_cached_cli(ctx) {
    tracing::debug!(path = %cli_path.display(), "Using existing versioned cli path");
    return Ok(cli_path);
  }

  let message = download_error_message(ctx, url);
  std::fs::create_dir_all(ctx.jfrog_folder())?;
  download_cli(ctx, url, auth)
    .await
    .map_err(|source| TaskError::Download { message, source })
}

/// Remediation text attached to a failed download.
pub fn download_error_message(ctx: &TaskContext, url: &str) -> String {
  let default_url = ctx.default_download_url();
  let mut message = format!("Failed while attempting to download JFrog CLI from {url}. ");
  if url == default_url {
    message.push_str(&format!(
      "If this build agent cannot access the internet, you may use the 'Artifactory Tools Installer' task, to download JFrog CLI through an Artifactory repository, which proxies {default_url}. You "
    ));
  } else {
    message.push_str("If the chosen Artifactory Service cannot access the internet, you ");
  }
  message.push_str(&format!(
    "may also manually download version {JFROG_CLI_VERSION} of JFrog CLI and place it on the agent in the following path: {}",
    ctx.custom_cli_path().display()
  ));
  message
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::TaskConfig;
  use crate::config::Variables;
  use crate::platform::Platform;
  use std::path::Path;

  fn context(work: &Path) -> TaskContext {
    let config = TaskConfig {
      variables: Variables {
        agent_work_folder: work.to_path_buf(),
        ..Variables::default()
      },
      ..TaskConfig::default()
    };
    TaskContext::new(config, Platform::Linux { x64: true })
  }

  // Nothing listens on port 1, so any download attempt fails fast.
  const UNREACHABLE: &str = "http://127.0.0.1:1/jfrog";

  #[tokio::test]
  async fn prefers_custom_cli_path() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    std::fs::create_dir_all(ctx.custom_cli_path().parent().unwrap()).unwrap();
    std::fs::write(ctx.custom_cli_path(), "").unwrap();

    let path = locate_cli(&ctx, UNREACHABLE, &[]).await.unwrap();
    assert_eq!(path, ctx.custom_cli_path());
  }

  #[tokio::test]
  async fn uses_completed_cache() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    std::fs::create_dir_all(ctx.cli_cache_dir()).unwrap();
    std::fs::write(ctx.cli_cache_dir().join("jfrog"), "").unwrap();
    std::fs::write(completion_marker(&ctx.cli_cache_dir()), "").unwrap();

    let path = locate_cli(&ctx, UNREACHABLE, &[]).await.unwrap();
    assert_eq!(path, ctx.cli_cache_dir().join("jfrog"));
  }

  #[tokio::test]
  async fn failed_download_carries_remediation() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    // A cache directory without the completion marker is ignored.
    std::fs::create_dir_all(ctx.cli_cache_dir()).unwrap();

    let err = locate_cli(&ctx, UNREACHABLE, &[]).await.unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, TaskError::Download { .. }));
    assert!(
      message.contains("Failed while attempting to download JFrog CLI from http://127.0.0.1:1/jfrog")
    );
    assert!(message.contains("If the chosen Artifactory Service cannot access the internet"));
    assert!(message.contains(&ctx.custom_cli_path().display().to_string()));
    assert!(ctx.jfrog_folder().is_dir());
  }

  #[test]
  fn default_url_message_mentions_tools_installer() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let message = download_error_message(&ctx, &ctx.default_download_url());
    assert!(message.contains("'Artifactory Tools Installer'"));
    assert!(message.contains("version 1.35.1"));
  }
}
