//! FIF writing: persist a recording to disk, overwriting any existing file.
//!
//! The writer emits a sequential tag stream (no directory): file id, a meas
//! block holding the measurement info (plus a bad-channel block when
//! needed), and the raw data as double-precision buffers. Buffer values are
//! divided by each channel's calibration so a round trip through the reader
//! reproduces the in-memory matrix.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;
use crate::fiff::raw::Raw;
use crate::fiff::tag::{block, dtype, kind};

/// Samples per written data buffer.
const BUFFER_SAMPLES: usize = 1000;

/// FIFF version 1.3.
const FIFF_VERSION: i32 = (1 << 16) | 3;

struct TagWriter<W: Write> {
    out: W,
}

impl<W: Write> TagWriter<W> {
    fn tag(&mut self, kind: i32, dtype: i32, data: &[u8]) -> Result<()> {
        self.tag_with_next(kind, dtype, data, 0)
    }

    fn tag_with_next(&mut self, kind: i32, dtype: i32, data: &[u8], next: i32) -> Result<()> {
        self.out.write_all(&kind.to_be_bytes())?;
        self.out.write_all(&dtype.to_be_bytes())?;
        self.out.write_all(&(data.len() as i32).to_be_bytes())?;
        self.out.write_all(&next.to_be_bytes())?;
        self.out.write_all(data)?;
        Ok(())
    }

    fn int_tag(&mut self, kind: i32, value: i32) -> Result<()> {
        self.tag(kind, dtype::INT, &value.to_be_bytes())
    }

    fn float_tag(&mut self, kind: i32, value: f32) -> Result<()> {
        self.tag(kind, dtype::FLOAT, &value.to_be_bytes())
    }

    fn string_tag(&mut self, kind: i32, value: &str) -> Result<()> {
        self.tag(kind, dtype::STRING, value.as_bytes())
    }

    fn block_start(&mut self, block: i32) -> Result<()> {
        self.int_tag(kind::BLOCK_START, block)
    }

    fn block_end(&mut self, block: i32) -> Result<()> {
        self.int_tag(kind::BLOCK_END, block)
    }
}

fn id_struct() -> Vec<u8> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let mut out = Vec::with_capacity(20);
    out.extend_from_slice(&FIFF_VERSION.to_be_bytes());
    out.extend_from_slice(&0i32.to_be_bytes()); // machine id
    out.extend_from_slice(&0i32.to_be_bytes());
    out.extend_from_slice(&(now.as_secs() as i32).to_be_bytes());
    out.extend_from_slice(&(now.subsec_micros() as i32).to_be_bytes());
    out
}

/// Write `raw` to `path`, replacing any existing file.
pub fn save_raw<P: AsRef<Path>>(raw: &Raw, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut w = TagWriter {
        out: BufWriter::new(file),
    };

    w.tag(kind::FILE_ID, dtype::ID_STRUCT, &id_struct())?;
    w.int_tag(kind::DIR_POINTER, -1)?;
    w.int_tag(kind::FREE_LIST, -1)?;

    w.block_start(block::MEAS)?;
    w.block_start(block::MEAS_INFO)?;
    w.int_tag(kind::NCHAN, raw.info.nchan as i32)?;
    w.float_tag(kind::SFREQ, raw.info.sfreq as f32)?;
    w.float_tag(kind::HIGHPASS, raw.info.highpass)?;
    w.float_tag(kind::LOWPASS, raw.info.lowpass)?;
    if let Some(lf) = raw.info.line_freq {
        w.float_tag(kind::LINE_FREQ, lf)?;
    }
    if let Some(date) = raw.info.meas_date {
        w.int_tag(kind::MEAS_DATE, date as i32)?;
    }
    for ch in &raw.info.chs {
        w.tag(kind::CH_INFO, dtype::CH_INFO_STRUCT, &ch.to_bytes())?;
    }
    if !raw.info.bads.is_empty() {
        w.block_start(block::BAD_CHANNELS)?;
        w.string_tag(kind::MNE_CH_NAME_LIST, &raw.info.bads.join(":"))?;
        w.block_end(block::BAD_CHANNELS)?;
    }
    w.block_end(block::MEAS_INFO)?;

    w.block_start(block::RAW_DATA)?;
    w.int_tag(kind::FIRST_SAMPLE, raw.first_samp as i32)?;

    let nchan = raw.n_channels();
    let n_samples = raw.n_samples();
    let inv_cal: Vec<f64> = raw
        .info
        .chs
        .iter()
        .map(|c| {
            let cal = c.calibration();
            if cal != 0.0 {
                1.0 / cal
            } else {
                1.0
            }
        })
        .collect();

    let mut start = 0usize;
    while start < n_samples {
        let stop = (start + BUFFER_SAMPLES).min(n_samples);
        let mut payload = Vec::with_capacity((stop - start) * nchan * 8);
        for s in start..stop {
            for ch in 0..nchan {
                let v = raw.data[[ch, s]] * inv_cal[ch];
                payload.extend_from_slice(&v.to_be_bytes());
            }
        }
        w.tag(kind::DATA_BUFFER, dtype::DOUBLE, &payload)?;
        start = stop;
    }

    w.block_end(block::RAW_DATA)?;
    w.block_end(block::MEAS)?;
    w.tag_with_next(kind::NOP, 0, &[], -1)?;
    w.out.flush()?;
    Ok(())
}
