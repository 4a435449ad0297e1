//! Read-only access to QUBIDE / QL-SD hard disk images.
//!
//! A volume is a flat run of blocks described by a single block map: every
//! physical block carries the number of the file owning it and its position in
//! that file. Directories are ordinary files made of 64-byte records.

pub mod core;
pub mod date;
pub mod error;
pub mod layout;
pub mod source;
pub mod volume;

pub use crate::core::{ListingMode, Volume};
pub use crate::error::{QubError, Result};
