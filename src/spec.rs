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
use crate::config::TaskContext;
use crate::error::SpecError;
use crate::error::TaskError;
use crate::platform::Platform;
use serde_json::Value;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

/// Where the file-spec content comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecSource {
  /// Read from the path held by the `file` input.
  File,
  /// Inline text held by the `fileSpec` input.
  TaskConfiguration,
}

impl FromStr for SpecSource {
  type Err = SpecError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "file" => Ok(SpecSource::File),
      "taskConfiguration" => Ok(SpecSource::TaskConfiguration),
      other => Err(SpecError::InvalidSource(other.to_string())),
    }
  }
}

/// Rejects specs with `regexp: true` entries on platforms that escape backslashes.
pub fn validate_spec_without_regex(platform: Platform, file_spec: &str) -> Result<(), SpecError> {
  if !platform.rejects_regexp_specs() {
    return Ok(());
  }

  let spec: Value = serde_json::from_str(file_spec)?;
  let entries: Vec<&Value> = match spec.get("files") {
    Some(Value::Array(files)) => files.iter().collect(),
    Some(Value::Object(files)) => files.values().collect(),
    _ => return Err(SpecError::MissingFiles),
  };

  let uses_regexp = entries.iter().any(|entry| match entry.get("regexp") {
    Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
    Some(Value::Bool(b)) => *b,
    _ => false,
  });
  if uses_regexp {
    return Err(SpecError::RegexpNotSupported);
  }
  Ok(())
}

/// Reads, escapes, validates and writes the task's file-spec to `spec_path`.
///
/// Nothing is written when validation fails.
pub fn write_spec_content_to_spec_path(
  ctx: &TaskContext,
  source: SpecSource,
  spec_path: &Path,
) -> Result<(), TaskError> {
  let file_spec = match source {
    SpecSource::File => {
      let input_path = PathBuf::from(ctx.inputs().get_required("file")?);
      tracing::info!("Using file spec located at {}", input_path.display());
      std::fs::read_to_string(&input_path).map_err(|source| SpecError::Read {
        path: input_path,
        source,
      })?
    }
    SpecSource::TaskConfiguration => ctx.inputs().get_required("fileSpec")?,
  };

  let file_spec = ctx.platform.escape_backslashes(&file_spec);
  validate_spec_without_regex(ctx.platform, &file_spec)?;
  tracing::info!("Using file spec:\n{}", file_spec);

  let write = |path: &Path| -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, file_spec.as_bytes())
  };
  write(spec_path).map_err(|source| SpecError::Write {
    path: spec_path.to_path_buf(),
    source,
  })?;
  Ok(())
}
