//! Idempotency gate: publish only versions the registry has never seen

use crate::core::error::ReleaseResult;
use crate::registry::Registry;
use crate::registry::index::RegistryIndex;

/// Decides whether a package version still needs publishing.
/// The index is queried fresh on every call.
pub struct PublishGate<'a, I: RegistryIndex> {
  index: &'a I,
}

impl<'a, I: RegistryIndex> PublishGate<'a, I> {
  pub fn new(index: &'a I) -> Self {
    Self { index }
  }

  /// True if `version` was ever published (yanked counts)
  pub fn is_published(&self, package: &str, version: &str, registry: &Registry) -> ReleaseResult<bool> {
    let published = self.index.published_versions(package, registry)?;
    Ok(published.contains(version))
  }

  pub fn should_publish(&self, package: &str, version: &str, registry: &Registry) -> ReleaseResult<bool> {
    Ok(!self.is_published(package, version, registry)?)
  }
}
