//! Raw FIF reading: structural scan over a memory-mapped file, then on
//! demand assembly of the calibrated channels × samples matrix.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use ndarray::Array2;

use crate::error::{NotchError, Result};
use crate::fiff::info::{ChannelInfo, MeasInfo};
use crate::fiff::tag::{self, block, dtype, kind, TAG_HEADER_SIZE};

/// Location of one raw data buffer inside the file.
#[derive(Debug, Clone, Copy)]
pub struct BufferRecord {
    pub offset: usize,
    pub dtype: i32,
    pub n_values: usize,
}

/// A structurally parsed FIF file. Measurement info is available without
/// touching the sample data; [`RawFif::load_data`] materializes the matrix.
#[derive(Debug)]
pub struct RawFif {
    mmap: Mmap,
    pub info: MeasInfo,
    pub first_samp: i64,
    buffers: Vec<BufferRecord>,
}

impl RawFif {
    /// Open and scan a FIF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(NotchError::FileNotFound(path.display().to_string()));
        }
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let buf: &[u8] = &mmap;

        let first = tag::read_header(buf, 0)
            .map_err(|_| NotchError::NotFif(path.display().to_string()))?;
        if first.kind != kind::FILE_ID || first.dtype != dtype::ID_STRUCT {
            return Err(NotchError::NotFif(path.display().to_string()));
        }

        let mut info = MeasInfo::default();
        let mut first_samp = 0i64;
        let mut buffers = Vec::new();
        let mut block_stack: Vec<i32> = Vec::new();
        let mut pos = 0usize;

        loop {
            let header = tag::read_header(buf, pos)?;
            let data_pos = pos + TAG_HEADER_SIZE;
            let in_block = |b: i32| block_stack.contains(&b);

            match header.kind {
                kind::BLOCK_START => {
                    let b = tag::read_i32(buf, data_pos)?;
                    if b == block::PROCESSING_HISTORY {
                        info.has_proc_history = true;
                    }
                    block_stack.push(b);
                }
                kind::BLOCK_END => {
                    block_stack.pop();
                }
                kind::NCHAN if in_block(block::MEAS_INFO) => {
                    info.nchan = tag::read_i32(buf, data_pos)?.max(0) as usize;
                }
                kind::SFREQ if in_block(block::MEAS_INFO) => {
                    info.sfreq = f64::from(tag::read_f32(buf, data_pos)?);
                }
                kind::HIGHPASS if in_block(block::MEAS_INFO) => {
                    info.highpass = tag::read_f32(buf, data_pos)?;
                }
                kind::LOWPASS if in_block(block::MEAS_INFO) => {
                    info.lowpass = tag::read_f32(buf, data_pos)?;
                }
                kind::LINE_FREQ if in_block(block::MEAS_INFO) => {
                    info.line_freq = Some(tag::read_f32(buf, data_pos)?);
                }
                kind::MEAS_DATE if in_block(block::MEAS_INFO) => {
                    info.meas_date = Some(i64::from(tag::read_i32(buf, data_pos)?));
                }
                kind::CH_INFO if in_block(block::MEAS_INFO) => {
                    info.chs
                        .push(ChannelInfo::parse(buf, data_pos, header.size)?);
                }
                kind::MNE_CH_NAME_LIST if in_block(block::BAD_CHANNELS) => {
                    let names = tag::read_string(buf, data_pos, header.size)?;
                    info.bads = names
                        .split(':')
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                kind::FIRST_SAMPLE if in_block(block::RAW_DATA) => {
                    first_samp = i64::from(tag::read_i32(buf, data_pos)?);
                }
                kind::DATA_BUFFER if in_block(block::RAW_DATA) => {
                    let width = tag::value_width(header.dtype).ok_or_else(|| {
                        NotchError::FifParse(format!(
                            "unsupported data buffer type {}",
                            header.dtype
                        ))
                    })?;
                    buffers.push(BufferRecord {
                        offset: data_pos,
                        dtype: header.dtype,
                        n_values: header.size / width,
                    });
                }
                kind::DATA_SKIP if in_block(block::RAW_DATA) => {
                    log::warn!("ignoring data skip tag; skipped samples are dropped");
                }
                _ => {}
            }

            // next: 0 = sequential, >0 = absolute position, -1 = last tag
            if header.next == -1 {
                break;
            }
            let next_pos = if header.next > 0 {
                header.next as usize
            } else {
                data_pos + header.size
            };
            if next_pos <= pos || next_pos >= buf.len() {
                break;
            }
            pos = next_pos;
        }

        info.check()?;
        Ok(Self {
            mmap,
            info,
            first_samp,
            buffers,
        })
    }

    /// Total sample count across all data buffers.
    pub fn n_samples(&self) -> usize {
        let total: usize = self.buffers.iter().map(|b| b.n_values).sum();
        total / self.info.nchan
    }

    /// Recording duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.n_samples() as f64 / self.info.sfreq
    }

    /// Decode and calibrate all data buffers into a channels × samples
    /// matrix. Buffer values are stored sample-major; each value is scaled
    /// by its channel's `cal * range`.
    pub fn load_data(&self) -> Result<Array2<f64>> {
        let nchan = self.info.nchan;
        let n_samples = self.n_samples();
        let buf: &[u8] = &self.mmap;
        let cals: Vec<f64> = self.info.chs.iter().map(|c| c.calibration()).collect();

        let mut data = Array2::<f64>::zeros((nchan, n_samples));
        let mut sample = 0usize;
        for rec in &self.buffers {
            if rec.n_values % nchan != 0 {
                return Err(NotchError::FifParse(format!(
                    "buffer of {} values is not a multiple of {} channels",
                    rec.n_values, nchan
                )));
            }
            let buf_samples = rec.n_values / nchan;
            let width = tag::value_width(rec.dtype).unwrap_or(8);
            for s in 0..buf_samples {
                for ch in 0..nchan {
                    let pos = rec.offset + (s * nchan + ch) * width;
                    let v = match rec.dtype {
                        dtype::FLOAT => f64::from(tag::read_f32(buf, pos)?),
                        dtype::DOUBLE => tag::read_f64(buf, pos)?,
                        dtype::INT => f64::from(tag::read_i32(buf, pos)?),
                        dtype::SHORT => f64::from(tag::read_i16(buf, pos)?),
                        _ => unreachable!("unsupported dtype checked at scan time"),
                    };
                    data[[ch, sample + s]] = v * cals[ch];
                }
            }
            sample += buf_samples;
        }
        Ok(data)
    }

    /// Load into an owned [`Raw`] ready for filtering.
    pub fn into_raw(self) -> Result<Raw> {
        let data = self.load_data()?;
        Ok(Raw {
            info: self.info,
            first_samp: self.first_samp,
            data,
        })
    }
}

/// An in-memory recording: metadata plus the channels × samples matrix.
/// Owned by the running process; filtering mutates `data` in place.
#[derive(Debug, Clone)]
pub struct Raw {
    pub info: MeasInfo,
    pub first_samp: i64,
    pub data: Array2<f64>,
}

impl Raw {
    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// Recording duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.n_samples() as f64 / self.info.sfreq
    }

    /// Indices of MEG channels not marked bad.
    pub fn good_meg_picks(&self) -> Vec<usize> {
        self.info
            .chs
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_meg() && !self.info.is_bad(&c.name))
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of all data (MEG/EEG) channels.
    pub fn data_picks(&self) -> Vec<usize> {
        self.info
            .chs
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_data_channel())
            .map(|(i, _)| i)
            .collect()
    }
}

/// Open a FIF file and load the full recording.
pub fn open_raw<P: AsRef<Path>>(path: P) -> Result<Raw> {
    RawFif::open(path)?.into_raw()
}
