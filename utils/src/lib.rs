//! Shared infrastructure utilities for Orion.
//!
//! - **`atomic_write`**: Crash-safe file persistence (temp + rename) for the
//!   credential vault and exported previews.

pub mod atomic_write;

pub use atomic_write::{
    FileMode, WriteOptions, atomic_write, atomic_write_with_options, ensure_private_dir,
};
