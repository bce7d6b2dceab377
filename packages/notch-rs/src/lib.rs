//! Power-line notch filtering for MEG/EEG recordings in FIF format.
//!
//! The crate loads a raw recording, removes power-line contamination with
//! an FIR, IIR or sinusoid-regression notch filter, and writes the filtered
//! recording plus the platform status file back to disk. [`pipeline::run`]
//! drives the whole thing from a Brainlife-style `config.json`.

pub mod config;
pub mod error;
pub mod fiff;
pub mod filter;
pub mod pipeline;
pub mod product;
pub mod psd;
pub mod report;
pub mod snr;
pub mod types;

pub use config::AppConfig;
pub use error::{NotchError, Result};
pub use fiff::{open_raw, save_raw, ChannelInfo, MeasInfo, Raw, RawFif};
pub use filter::notch_filter;
pub use pipeline::{RunOutcome, RunPaths};
pub use product::Product;
pub use types::{FreqSpec, Method, NotchParams};
