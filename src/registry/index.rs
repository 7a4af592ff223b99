//! Sparse registry index queries
//!
//! The index serves one file per package at a sharded path. Each file holds one
//! JSON record per published version; only `vers` matters here.

use crate::core::error::{ConfigError, RegistryQueryError, ReleaseResult};
use crate::registry::Registry;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeSet;

/// Sparse index of the canonical default registry
pub const CRATES_IO_INDEX_URL: &str = "https://index.crates.io";

/// Every version string a registry reports for a package, yanked included
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishedVersionSet {
  versions: BTreeSet<String>,
}

impl PublishedVersionSet {
  pub fn contains(&self, version: &str) -> bool {
    self.versions.contains(version)
  }

  pub fn len(&self) -> usize {
    self.versions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.versions.is_empty()
  }
}

impl<S: Into<String>> FromIterator<S> for PublishedVersionSet {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    Self {
      versions: iter.into_iter().map(Into::into).collect(),
    }
  }
}

/// Source of published-version sets
pub trait RegistryIndex {
  fn published_versions(&self, package: &str, registry: &Registry) -> ReleaseResult<PublishedVersionSet>;
}

/// Index path for a package: `1/a`, `2/ab`, `3/a/abc`, `ab/cd/abcd...`
pub fn shard_path(package: &str) -> String {
  let name = package.to_lowercase();
  match name.len() {
    1 => format!("1/{}", name),
    2 => format!("2/{}", name),
    3 => format!("3/{}/{}", &name[..1], name),
    _ => format!("{}/{}/{}", &name[..2], &name[2..4], name),
  }
}

#[derive(Deserialize)]
struct IndexRecord {
  vers: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IndexBody {
  Many(Vec<IndexRecord>),
  One(IndexRecord),
}

/// Parse an index file. Accepts a single JSON record, a JSON array of records,
/// or one record per line; blank lines are ignored.
pub fn parse_index_body(body: &str) -> Result<PublishedVersionSet, String> {
  let trimmed = body.trim();
  if trimmed.is_empty() {
    return Ok(PublishedVersionSet::default());
  }

  if let Ok(parsed) = serde_json::from_str::<IndexBody>(trimmed) {
    return Ok(match parsed {
      IndexBody::Many(records) => records.into_iter().map(|r| r.vers).collect(),
      IndexBody::One(record) => std::iter::once(record.vers).collect(),
    });
  }

  body
    .lines()
    .enumerate()
    .filter(|(_, line)| !line.trim().is_empty())
    .map(|(n, line)| {
      serde_json::from_str::<IndexRecord>(line)
        .map(|r| r.vers)
        .map_err(|e| format!("line {}: {}", n + 1, e))
    })
    .collect()
}

/// HTTP sparse index client
pub struct SparseIndex {
  client: reqwest::blocking::Client,
}

impl SparseIndex {
  pub fn new(user_agent: &str) -> ReleaseResult<Self> {
    let client = reqwest::blocking::Client::builder()
      .user_agent(user_agent)
      .build()
      .map_err(|e| ConfigError::HttpClient { reason: e.to_string() })?;
    Ok(Self { client })
  }
}

impl RegistryIndex for SparseIndex {
  fn published_versions(&self, package: &str, registry: &Registry) -> ReleaseResult<PublishedVersionSet> {
    let url = format!("{}/{}", registry.index_url, shard_path(package));
    let query_error = |reason: String| RegistryQueryError {
      package: package.to_string(),
      url: url.clone(),
      reason,
    };

    log::debug!("Requesting {}", url);
    let response = self.client.get(&url).send().map_err(|e| query_error(e.to_string()))?;

    let status = response.status();
    // Sparse indexes answer 404 (crates.io) or 410 for names never published
    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
      log::debug!("{} has never been published to {}", package, registry.name);
      return Ok(PublishedVersionSet::default());
    }
    if !status.is_success() {
      return Err(query_error(format!("HTTP {}", status)).into());
    }

    let body = response.text().map_err(|e| query_error(e.to_string()))?;
    let versions = parse_index_body(&body).map_err(query_error)?;
    if versions.is_empty() {
      log::warn!("Index file for {} on {} lists no versions", package, registry.name);
    }
    log::debug!("{} has {} published version(s) on {}", package, versions.len(), registry.name);
    Ok(versions)
  }
}
