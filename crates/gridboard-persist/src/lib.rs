#![forbid(unsafe_code)]

//! Durable persistence for the dashboard document.
//!
//! Two halves:
//!
//! - [`DocumentStore`]: a last-write-wins key/value contract holding one
//!   serialized document per key, with an always-available in-memory backend
//!   and an atomic write-rename file backend.
//! - [`SaveScheduler`]: the debounce state machine. Qualifying transitions
//!   arm (or re-arm) a quiet-period deadline; only when the burst goes quiet
//!   does the owning store serialize the *current* document and write it.
//!   Intermediate snapshots are never persisted.
//!
//! The scheduler is deliberately thread-free: the host event loop injects
//! `Instant`s, which keeps every debounce scenario deterministic in tests.

pub mod scheduler;
pub mod store;

pub use scheduler::{SaveScheduler, SaveState, SaveStatus, SchedulerConfig};
pub use store::{DocumentStore, FileStore, MemoryStore, StorageError, StorageResult};
