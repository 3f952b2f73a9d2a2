//! Persistence of the validated working set.

use std::path::PathBuf;

use tracing::debug;

use crate::proxy::ProxyCandidate;
use crate::Result;

/// Destination for the working set produced by a pool refresh.
///
/// Saved on every refresh so a validated set survives the process; the
/// pool never reads it back itself — seeding from a previous run goes
/// through `ProxyPool::with_candidates`.
pub trait ProxyStore: Send + Sync {
    fn save(&self, candidates: &[ProxyCandidate]) -> Result<()>;
}

/// Writes the working set to a JSON file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads a previously saved working set back.
    pub fn load(&self) -> Result<Vec<ProxyCandidate>> {
        let json = std::fs::read_to_string(&self.path)?;
        let candidates = serde_json::from_str(&json)?;
        Ok(candidates)
    }
}

impl ProxyStore for JsonFileStore {
    fn save(&self, candidates: &[ProxyCandidate]) -> Result<()> {
        let json = serde_json::to_string_pretty(candidates)?;
        std::fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), count = candidates.len(), "saved working set");
        Ok(())
    }
}
