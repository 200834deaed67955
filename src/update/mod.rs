//! Throttled update checking with persisted state
//!
//! This module decides when a remote check may run, resolves the newest
//! upstream version for the configured scheme, and merges results into a
//! durable, schema-versioned state record.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Throttle   │────▶│  Scheduler  │────▶│    Store    │
//! │   (gate)    │     │   (merge)   │     │  (SQLite)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                            ▼
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Sources   │◀────│  Resolver   │     │   Policy    │
//! │(GitHub,API) │     │ (tag/date)  │     │ (classify)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`clock`]: Injected time source
//! - [`error`]: Error types for sources and state persistence
//! - [`policy`]: Current vs remote classification and the notifier seam
//! - [`resolver`]: Canonical remote identifier per scheme
//! - [`scheduler`]: Version and usage checks with throttling and single-flight
//! - [`scheme`]: Versioning schemes and date formatting
//! - [`source`]: Remote source traits and payload schema
//! - [`sources`]: Concrete sources (GitHub, usage API)
//! - [`state`]: Persisted record and payload migrations
//! - [`store`]: State storage backends
//! - [`throttle`]: Throttle gate

pub mod clock;
pub mod error;
pub mod policy;
pub mod resolver;
pub mod scheduler;
pub mod scheme;
pub mod source;
pub mod sources;
pub mod state;
pub mod store;
pub mod throttle;
