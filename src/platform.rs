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
use std::borrow::Cow;
use std::path::Path;
use std::path::MAIN_SEPARATOR;

/// Host platform capabilities that change how the CLI is fetched and invoked.
///
/// Selected once at startup with [`Platform::current`]; tests construct the
/// variants directly to exercise behavior of other hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
  Windows,
  MacOs,
  Linux { x64: bool },
}

impl Platform {
  pub fn current() -> Self {
    if cfg!(target_os = "windows") {
      Platform::Windows
    } else if cfg!(target_os = "macos") {
      Platform::MacOs
    } else {
      Platform::Linux {
        x64: cfg!(target_pointer_width = "64"),
      }
    }
  }

  pub fn is_windows(self) -> bool {
    matches!(self, Platform::Windows)
  }

  /// Architecture segment of the published CLI package name.
  pub fn architecture(self) -> &'static str {
    match self {
      Platform::Windows => "windows-amd64",
      Platform::MacOs => "mac-386",
      Platform::Linux { x64: true } => "linux-amd64",
      Platform::Linux { x64: false } => "linux-386",
    }
  }

  /// File name of the executable for `tool` on this platform.
  pub fn executable_name(self, tool: &str) -> String {
    if self.is_windows() {
      format!("{tool}.exe")
    } else {
      tool.to_string()
    }
  }

  /// Doubles raw backslashes so native Windows paths survive as JSON string content.
  ///
  /// A backslash is doubled when it follows a non-backslash character and is
  /// not itself followed by a backslash. Existing double backslashes and a
  /// backslash at the very start are kept as-is. No-op off Windows.
  pub fn escape_backslashes(self, text: &str) -> Cow<'_, str> {
    if !self.is_windows() || !text.contains('\\') {
      return Cow::Borrowed(text);
    }

    let chars: Vec<char> = text.chars().collect();
    let mut escaped = String::with_capacity(text.len() + 8);
    let mut i = 0;
    while i < chars.len() {
      let c = chars[i];
      let lone_backslash_follows = c != '\\'
        && chars.get(i + 1) == Some(&'\\')
        && chars.get(i + 2) != Some(&'\\');
      escaped.push(c);
      if lone_backslash_follows {
        escaped.push_str("\\\\");
        i += 2;
      } else {
        i += 1;
      }
    }
    Cow::Owned(escaped)
  }

  /// Whether file-specs using `regexp: true` must be rejected.
  pub fn rejects_regexp_specs(self) -> bool {
    self.is_windows()
  }

  /// Marks a cached binary as read + execute for owner, group and other.
  pub fn set_executable(self, path: &Path) -> std::io::Result<()> {
    if self.is_windows() {
      return Ok(());
    }
    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o555))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
  }
}

/// Quotes path segments containing a space.
///
/// `a/b/Program Files/c` becomes `a/b/"Program Files"/c`. Segments that are
/// already quoted are left alone.
pub fn encode_path(path: &str) -> String {
  let sep = MAIN_SEPARATOR;
  let sections: Vec<String> = path
    .split(sep)
    .filter(|section| !section.is_empty())
    .map(|section| {
      let has_inner_space = section.find(' ').is_some_and(|idx| idx > 0);
      if has_inner_space && !section.starts_with('"') && !section.ends_with('"') {
        format!("\"{section}\"")
      } else {
        section.to_string()
      }
    })
    .collect();

  let mut encoded = sections.join(&sep.to_string());
  if !sections.is_empty() && path.ends_with(sep) {
    encoded.push(sep);
  }
  if path.starts_with(sep) {
    encoded.insert(0, sep);
  }
  encoded
}

#[cfg(test)]
mod tests {
  use super::*;

  const WIN: Platform = Platform::Windows;
  const LINUX: Platform = Platform::Linux { x64: true };

  #[test]
  fn escaping_without_backslashes_is_identity() {
    for p in [WIN, LINUX, Platform::MacOs] {
      let spec = r#"{"files":[{"pattern":"a/b"}]}"#;
      assert_eq!(p.escape_backslashes(spec), spec);
    }
  }

  #[test]
  fn escaping_is_noop_off_windows() {
    assert_eq!(LINUX.escape_backslashes(r"C:\dir\file"), r"C:\dir\file");
  }

  #[test]
  fn escapes_raw_backslashes_on_windows() {
    assert_eq!(WIN.escape_backslashes(r"C:\dir\file"), r"C:\\dir\\file");
  }

  #[test]
  fn keeps_already_escaped_backslashes() {
    assert_eq!(WIN.escape_backslashes(r"C:\\dir\\file"), r"C:\\dir\\file");
  }

  #[test]
  fn escaping_is_stable_on_escaped_input() {
    let once = WIN.escape_backslashes(r"repo\path\*.zip").into_owned();
    assert_eq!(WIN.escape_backslashes(&once), once);
  }

  #[test]
  fn escaping_edge_inputs() {
    // Leading backslash has no preceding character.
    assert_eq!(WIN.escape_backslashes(r"\dir"), r"\dir");
    // UNC prefix is already a double backslash.
    assert_eq!(WIN.escape_backslashes(r"\\server\share"), r"\\server\\share");
    // Trailing backslash before a quote is doubled, changing the JSON meaning.
    assert_eq!(WIN.escape_backslashes(r#""C:\dir\""#), r#""C:\\dir\\""#);
    // Three backslashes in a row are left untouched.
    assert_eq!(WIN.escape_backslashes(r"a\\\b"), r"a\\\b");
  }

  #[test]
  fn architecture_and_executable_names() {
    assert_eq!(WIN.architecture(), "windows-amd64");
    assert_eq!(Platform::MacOs.architecture(), "mac-386");
    assert_eq!(Platform::Linux { x64: false }.architecture(), "linux-386");
    assert_eq!(WIN.executable_name("jfrog"), "jfrog.exe");
    assert_eq!(LINUX.executable_name("jfrog"), "jfrog");
  }

  #[cfg(unix)]
  #[test]
  fn encode_path_quotes_sections_with_spaces() {
    assert_eq!(encode_path("/a/b/Program Files/c"), "/a/b/\"Program Files\"/c");
    assert_eq!(encode_path("a/\"Program Files\"/c/"), "a/\"Program Files\"/c/");
    assert_eq!(encode_path("/plain/path"), "/plain/path");
  }
}
