// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod config;
pub mod drill;
pub mod extract;
pub mod history;
pub mod judge;
pub mod notes;
pub mod runtime;
pub mod topic;

/// Cadence of the host tick loop; the drill's auto-advance countdown is
/// decremented in units of this.
pub const TICK_RATE_MS: u64 = 100;
