//! Dynamic proxy pool: candidate discovery, health probing, and a
//! synchronized working set with immediate eviction on real-traffic failure.

mod candidate;
mod pool;
mod probe;
pub mod sources;
mod store;

pub use candidate::{HealthState, ProxyCandidate};
pub use pool::ProxyPool;
pub use probe::Prober;
pub use sources::{default_sources, fetch_candidates, ProxyListSource};
pub use store::{JsonFileStore, ProxyStore};
