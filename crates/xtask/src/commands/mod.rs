//! xtask command implementations

mod determinism_guard;
mod read_journal;

pub use determinism_guard::DeterminismGuard;
pub use read_journal::ReadJournal;
