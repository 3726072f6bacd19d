pub mod detail;
pub mod flight;
pub mod search;
pub mod session;
pub mod storage;
pub mod watched;

#[cfg(test)]
pub(crate) mod testing;

pub use detail::{DetailCompletion, DetailError, DetailLoader, DetailTicket};
pub use flight::Applied;
pub use search::{SearchCompletion, SearchController, SearchTicket};
pub use session::{Session, SessionError};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StorageError};
pub use watched::{AddOutcome, StoreError, WatchedStore, WATCHED_KEY};
