// Data structures shared across the crate: the configuration and ledger files,
// and the GitHub release payloads.

pub mod release;
pub mod toolbox;
