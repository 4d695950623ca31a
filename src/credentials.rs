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
use crate::config::scalar_string;
use crate::error::CredentialError;
use serde::Deserialize;
use serde::Serialize;

/// A host-managed credential record for an Artifactory server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
  #[serde(default, deserialize_with = "scalar_string")]
  pub url: Option<String>,
  #[serde(default, deserialize_with = "scalar_string")]
  pub username: Option<String>,
  #[serde(default, deserialize_with = "scalar_string")]
  pub password: Option<String>,
  #[serde(default, deserialize_with = "scalar_string")]
  pub apitoken: Option<String>,
}

/// The effective way an endpoint authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
  Token(String),
  Anonymous,
  Basic { username: String, password: String },
}

impl ServiceEndpoint {
  pub fn url(&self) -> &str {
    self.url.as_deref().unwrap_or_default()
  }

  /// Resolves the auth mode by strict priority: token, then anonymous, then basic.
  ///
  /// A present token wins even when username and password are also set.
  pub fn auth_mode(&self) -> Result<AuthMode, CredentialError> {
    if let Some(token) = self.apitoken.as_deref().filter(|t| !t.is_empty()) {
      return Ok(AuthMode::Token(token.to_string()));
    }

    match self.username.as_deref() {
      Some("") => Ok(AuthMode::Anonymous),
      Some(username) => {
        let password = self
          .password
          .clone()
          .ok_or_else(|| CredentialError::MissingPassword {
            username: username.to_string(),
          })?;
        Ok(AuthMode::Basic {
          username: username.to_string(),
          password,
        })
      }
      None => Err(CredentialError::MissingUsername),
    }
  }
}
