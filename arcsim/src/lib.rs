//! Runner side of the economy simulation: snapshot storage, the event
//! journal, and settings loading. The tick itself lives in `arcsim-core`.

pub mod journal;
pub mod loader;
pub mod settings;

pub use journal::{merge_journal, JournalSettings};
pub use loader::Snapshot;
pub use settings::Settings;
