//! Persistence for the launcher assistant: the append-only conversation log,
//! the cross-invocation request-state cache, and the diagnostic log.
//!
//! `TurnStore` and `RequestStateCache` are ports with file-backed and
//! in-memory implementations so callers can swap disk for a test double.
//! Concurrent invocations may race on the backing files; readers are lenient
//! (corrupt records are skipped, a corrupt cache reads as empty) and writers
//! are last-writer-wins.

mod cache;
mod diagnostic;
mod error;
mod paths;
mod store;
mod turn;

pub use cache::{CacheValue, FileRequestStateCache, MemoryRequestStateCache, RequestStateCache};
pub use diagnostic::{DiagnosticEntry, DiagnosticLog, BLOCK_MARKER};
pub use error::StoreError;
pub use paths::{
    cache_path, diagnostic_log_path, turn_log_path, CACHE_FILE, DIAGNOSTIC_LOG_FILE, TURN_LOG_FILE,
};
pub use store::{FileTurnStore, MemoryTurnStore, TurnStore};
pub use turn::{Turn, EMPTY_PLACEHOLDER, UNLOCK_ACK};
