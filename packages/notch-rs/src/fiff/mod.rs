//! Native FIFF (Neuromag/Elekta FIF) I/O.
//!
//! Implements the subset of the tag-based FIFF format needed to load a raw
//! MEG/EEG recording into a channels × samples matrix, and to persist a
//! filtered recording back to disk. Tag headers are four big-endian i32s
//! (kind, type, size, next); blocks are bracketed by explicit start/end
//! tags.

pub mod info;
pub mod raw;
pub mod tag;
pub mod write;

pub use info::{ChannelInfo, MeasInfo};
pub use raw::{open_raw, Raw, RawFif};
pub use write::save_raw;
