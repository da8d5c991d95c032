//! Worker communication module.
//!
//! Database access is delegated to a long-running worker process so the
//! generator itself stays driver-agnostic. The worker runs catalog queries
//! and returns their rows; everything else happens in Rust.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │        sprocket (Rust + Tokio)               │
//! │   WorkerClient                               │
//! │   - spawns worker as a child process         │
//! │   - NDJSON over stdin/stdout                 │
//! │   - request IDs for response correlation     │
//! └──────────────────────────────────────────────┘
//!            stdin (NDJSON) │ stdout (NDJSON)
//!                           ▼
//! ┌──────────────────────────────────────────────┐
//! │        sprocket-worker (database driver)     │
//! └──────────────────────────────────────────────┘
//! ```

mod client;
mod error;
pub mod protocol;

pub use client::WorkerClient;
pub use error::{WorkerError, WorkerResult};
