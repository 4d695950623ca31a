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
use crate::config::BUILD_AGENT;
use crate::config::JFROG_CLI_VERSION;
use crate::config::PLUGIN_VERSION;
use crate::config::TaskContext;
use crate::credentials::AuthMode;
use crate::credentials::ServiceEndpoint;
use crate::error::CredentialError;
use crate::error::DownloadError;
use fs_extra::file::CopyOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

/// HTTP authentication applied to the CLI download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthHandler {
  Bearer(String),
  Basic { username: String, password: String },
}

impl AuthHandler {
  fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match self {
      AuthHandler::Bearer(token) => request.bearer_auth(token),
      AuthHandler::Basic { username, password } => request.basic_auth(username, Some(password)),
    }
  }
}

/// Auth handlers for downloading through an Artifactory endpoint.
///
/// Token endpoints use Bearer auth, anonymous endpoints none, and the rest Basic.
pub fn create_auth_handlers(
  endpoint: &ServiceEndpoint,
) -> Result<Vec<AuthHandler>, CredentialError> {
  Ok(match endpoint.auth_mode()? {
    AuthMode::Token(token) => vec![AuthHandler::Bearer(token)],
    AuthMode::Anonymous => Vec::new(),
    AuthMode::Basic { username, password } => vec![AuthHandler::Basic { username, password }],
  })
}

pub fn strip_trailing_slash(s: &str) -> &str {
  s.strip_suffix('/').unwrap_or(s)
}

/// Download URL of the pinned CLI inside an Artifactory repository proxying the public one.
pub fn build_cli_artifactory_download_url(
  ctx: &TaskContext,
  rt_url: &str,
  repo_name: &str,
) -> String {
  format!(
    "{}/{repo_name}/{JFROG_CLI_VERSION}/{}/{}",
    strip_trailing_slash(rt_url),
    ctx.cli_package(),
    ctx.cli_file_name()
  )
}

/// Marker written next to a cache directory once it is fully populated.
pub fn completion_marker(cache_dir: &Path) -> PathBuf {
  let mut marker = cache_dir.as_os_str().to_owned();
  marker.push(".complete");
  PathBuf::from(marker)
}

/// Downloads the CLI from `url` and caches it under the version-keyed directory.
///
/// Returns the path of the cached executable.
pub async fn download_cli(
  ctx: &TaskContext,
  url: &str,
  auth: &[AuthHandler],
) -> Result<PathBuf, DownloadError> {
  tracing::info!(%url, "Downloading JFrog CLI");

  let client = reqwest::Client::builder()
    .user_agent(format!("{BUILD_AGENT}/{PLUGIN_VERSION}"))
    .build()?;
  let mut request = client.get(url);
  for handler in auth {
    request = handler.apply(request);
  }

  let bytes = request.send().await?.error_for_status()?.bytes().await?;
  tracing::debug!(size = bytes.len(), "Downloaded JFrog CLI");

  let jfrog_folder = ctx.jfrog_folder();
  std::fs::create_dir_all(&jfrog_folder)?;
  let mut downloaded = tempfile::NamedTempFile::new_in(&jfrog_folder)?;
  downloaded.write_all(&bytes)?;
  downloaded.flush()?;

  let cli_path = cache_file(ctx, downloaded.path())?;
  tracing::debug!("Finished downloading JFrog cli.");
  Ok(cli_path)
}

/// Copies a downloaded file into the cache and marks the version complete.
fn cache_file(ctx: &TaskContext, source: &Path) -> Result<PathBuf, DownloadError> {
  let cache_dir = ctx.cli_cache_dir();
  std::fs::create_dir_all(&cache_dir)?;
  let cli_path = cache_dir.join(ctx.cli_file_name());

  // A previous partial download leaves a read-only file behind.
  if cli_path.exists() {
    std::fs::remove_file(&cli_path)?;
  }
  let mut options = CopyOptions::new();
  options.overwrite = true;
  fs_extra::file::copy(source, &cli_path, &options)?;
  ctx.platform.set_executable(&cli_path)?;

  std::fs::write(completion_marker(&cache_dir), "")?;
  Ok(cli_path)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::TaskConfig;
  use crate::config::Variables;
  use crate::platform::Platform;
  use tokio::io::AsyncReadExt;
  use tokio::io::AsyncWriteExt;
  use tokio::net::TcpListener;

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

  /// Serves one HTTP response and hands back the raw request it received.
  async fn serve_once(
    status: &'static str,
    body: &'static [u8],
  ) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut buf = vec![0u8; 4096];
      let n = socket.read(&mut buf).await.unwrap();
      let request = String::from_utf8_lossy(&buf[..n]).to_string();
      let response = format!(
        "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
        body.len()
      );
      socket.write_all(response.as_bytes()).await.unwrap();
      socket.write_all(body).await.unwrap();
      socket.shutdown().await.unwrap();
      request
    });
    (format!("http://{addr}/jfrog"), handle)
  }

  #[test]
  fn auth_handlers_follow_credential_priority() {
    let token = ServiceEndpoint {
      username: Some("u".into()),
      password: Some("p".into()),
      apitoken: Some("t".into()),
      ..ServiceEndpoint::default()
    };
    assert_eq!(create_auth_handlers(&token).unwrap(), vec![AuthHandler::Bearer("t".into())]);

    let anonymous = ServiceEndpoint {
      username: Some(String::new()),
      ..ServiceEndpoint::default()
    };
    assert!(create_auth_handlers(&anonymous).unwrap().is_empty());
  }

  #[test]
  fn artifactory_url_adds_missing_slash() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let expected = "https://rt/artifactory/jfrog-cli/1.35.1/jfrog-cli-linux-amd64/jfrog";
    for rt_url in ["https://rt/artifactory", "https://rt/artifactory/"] {
      assert_eq!(build_cli_artifactory_download_url(&ctx, rt_url, "jfrog-cli"), expected);
    }
  }

  #[tokio::test]
  async fn downloads_into_version_cache_with_bearer_auth() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let (url, server) = serve_once("200 OK", b"#!/bin/sh\necho fake\n").await;

    let cli_path = download_cli(&ctx, &url, &[AuthHandler::Bearer("tkn".into())])
      .await
      .unwrap();

    let request = server.await.unwrap();
    assert!(request.to_ascii_lowercase().contains("authorization: bearer tkn"));
    assert_eq!(cli_path, ctx.cli_cache_dir().join("jfrog"));
    assert_eq!(std::fs::read(&cli_path).unwrap(), b"#!/bin/sh\necho fake\n");
    assert!(completion_marker(&ctx.cli_cache_dir()).exists());

    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      let mode = std::fs::metadata(&cli_path).unwrap().permissions().mode();
      assert_eq!(mode & 0o777, 0o555);
    }
  }

  #[tokio::test]
  async fn http_errors_propagate() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let (url, server) = serve_once("404 Not Found", b"").await;

    let err = download_cli(&ctx, &url, &[]).await.unwrap_err();
    server.await.unwrap();
    assert!(matches!(err, DownloadError::Http(_)));
    assert!(!completion_marker(&ctx.cli_cache_dir()).exists());
  }
}
