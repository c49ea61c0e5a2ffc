//! Crash-consistent file publishing primitives.
//!
//! # Architecture
//!
//! - `primitives/atomic_write.rs` - temp file + fsync + rename publishing
//! - `error.rs` - Path-carrying I/O errors
//!
//! A reader of a path written with [`atomic_write`] observes either the old
//! content or the new content, never a partial file.

mod error;
mod primitives;

pub use error::{Error, Result};
pub use primitives::{AtomicWriteOptions, atomic_read, atomic_write, ensure_dir};
