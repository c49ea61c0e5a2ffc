//! Manifest of whitelisted resources, handed to an external mirroring job.
//!
//! # Architecture
//!
//! - `format.rs` - Line layouts (`plain`, `tagged`)
//! - `writer.rs` - In-memory body, batched flushes, atomic publishing
//!
//! The published file is always a complete manifest: every flush rewrites
//! the whole body through [`fastdl_fs::atomic_write`].

pub use error::{ManifestError, Result};
pub use format::ManifestFormat;
pub use writer::{FlushPolicy, ManifestWriter};

mod error;
mod format;
mod writer;
