//! Measurement info: channel records and recording-level metadata.

use serde::Serialize;

use crate::error::{NotchError, Result};
use crate::fiff::tag;

/// Channel kind codes (FIFF channel types).
pub mod ch_kind {
    pub const MEG: i32 = 1;
    pub const EEG: i32 = 2;
    pub const STIM: i32 = 3;
    pub const EOG: i32 = 202;
    pub const ECG: i32 = 402;
    pub const MISC: i32 = 502;
}

pub const CH_INFO_STRUCT_SIZE: usize = 96;

/// One channel's info record (96-byte FIFF ch_info struct).
#[derive(Debug, Clone, Serialize)]
pub struct ChannelInfo {
    pub scan_no: i32,
    pub log_no: i32,
    pub kind: i32,
    pub range: f32,
    pub cal: f32,
    pub coil_type: i32,
    pub loc: [f32; 12],
    pub unit: i32,
    pub unit_mul: i32,
    pub name: String,
}

impl ChannelInfo {
    /// A plain channel record with unit calibration, mostly useful for
    /// synthesizing recordings.
    pub fn new(scan_no: i32, name: &str, kind: i32) -> Self {
        Self {
            scan_no,
            log_no: scan_no,
            kind,
            range: 1.0,
            cal: 1.0,
            coil_type: 0,
            loc: [0.0; 12],
            unit: 0,
            unit_mul: 0,
            name: name.to_string(),
        }
    }

    /// MEG or EEG sensor channel (the default filtering targets).
    pub fn is_data_channel(&self) -> bool {
        self.kind == ch_kind::MEG || self.kind == ch_kind::EEG
    }

    pub fn is_meg(&self) -> bool {
        self.kind == ch_kind::MEG
    }

    /// Combined calibration factor applied to raw buffer values.
    pub fn calibration(&self) -> f64 {
        f64::from(self.cal) * f64::from(self.range)
    }

    /// Decode a 96-byte ch_info struct.
    pub fn parse(buf: &[u8], pos: usize, size: usize) -> Result<Self> {
        if size < CH_INFO_STRUCT_SIZE {
            return Err(NotchError::FifParse(format!(
                "channel info struct too small ({} bytes)",
                size
            )));
        }
        let mut loc = [0.0f32; 12];
        for (i, slot) in loc.iter_mut().enumerate() {
            *slot = tag::read_f32(buf, pos + 24 + 4 * i)?;
        }
        Ok(Self {
            scan_no: tag::read_i32(buf, pos)?,
            log_no: tag::read_i32(buf, pos + 4)?,
            kind: tag::read_i32(buf, pos + 8)?,
            range: tag::read_f32(buf, pos + 12)?,
            cal: tag::read_f32(buf, pos + 16)?,
            coil_type: tag::read_i32(buf, pos + 20)?,
            loc,
            unit: tag::read_i32(buf, pos + 72)?,
            unit_mul: tag::read_i32(buf, pos + 76)?,
            name: tag::read_string(buf, pos + 80, 16)?,
        })
    }

    /// Encode to the 96-byte ch_info struct layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CH_INFO_STRUCT_SIZE);
        out.extend_from_slice(&self.scan_no.to_be_bytes());
        out.extend_from_slice(&self.log_no.to_be_bytes());
        out.extend_from_slice(&self.kind.to_be_bytes());
        out.extend_from_slice(&self.range.to_be_bytes());
        out.extend_from_slice(&self.cal.to_be_bytes());
        out.extend_from_slice(&self.coil_type.to_be_bytes());
        for v in &self.loc {
            out.extend_from_slice(&v.to_be_bytes());
        }
        out.extend_from_slice(&self.unit.to_be_bytes());
        out.extend_from_slice(&self.unit_mul.to_be_bytes());
        let mut name = [0u8; 16];
        for (i, b) in self.name.as_bytes().iter().take(16).enumerate() {
            name[i] = *b;
        }
        out.extend_from_slice(&name);
        out
    }
}

/// Recording-level measurement info.
#[derive(Debug, Clone, Serialize)]
pub struct MeasInfo {
    pub nchan: usize,
    /// Sampling frequency in Hz.
    pub sfreq: f64,
    /// Highpass applied at acquisition time, Hz.
    pub highpass: f32,
    /// Lowpass applied at acquisition time, Hz.
    pub lowpass: f32,
    /// Mains frequency recorded at the site, if stored.
    pub line_freq: Option<f32>,
    /// Measurement date as Unix seconds, if stored.
    pub meas_date: Option<i64>,
    pub chs: Vec<ChannelInfo>,
    /// Bad channel names.
    pub bads: Vec<String>,
    /// The file carried a processing-history block (e.g. MaxFilter).
    pub has_proc_history: bool,
}

impl MeasInfo {
    pub fn ch_names(&self) -> Vec<&str> {
        self.chs.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn is_bad(&self, name: &str) -> bool {
        self.bads.iter().any(|b| b == name)
    }

    /// Measurement date as a UTC timestamp, if stored.
    pub fn meas_datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        use chrono::TimeZone;
        self.meas_date
            .and_then(|secs| chrono::Utc.timestamp_opt(secs, 0).single())
    }

    /// Validate internal consistency after parsing.
    pub fn check(&self) -> Result<()> {
        if self.nchan == 0 {
            return Err(NotchError::FifParse("no channels in file".to_string()));
        }
        if self.chs.len() != self.nchan {
            return Err(NotchError::FifParse(format!(
                "channel count mismatch: nchan={} but {} channel records",
                self.nchan,
                self.chs.len()
            )));
        }
        if self.sfreq <= 0.0 {
            return Err(NotchError::FifParse(
                "missing or invalid sampling frequency".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MeasInfo {
    fn default() -> Self {
        Self {
            nchan: 0,
            sfreq: 0.0,
            highpass: 0.0,
            lowpass: 0.0,
            line_freq: None,
            meas_date: None,
            chs: Vec::new(),
            bads: Vec::new(),
            has_proc_history: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ch_info_struct_roundtrip() {
        let mut ch = ChannelInfo::new(1, "MEG 0113", ch_kind::MEG);
        ch.cal = 3.25e-10;
        ch.range = 1.0;
        ch.coil_type = 3012;
        ch.loc[0] = -0.1;
        let bytes = ch.to_bytes();
        assert_eq!(bytes.len(), CH_INFO_STRUCT_SIZE);

        let parsed = ChannelInfo::parse(&bytes, 0, bytes.len()).unwrap();
        assert_eq!(parsed.name, "MEG 0113");
        assert_eq!(parsed.kind, ch_kind::MEG);
        assert_eq!(parsed.coil_type, 3012);
        assert!((parsed.cal - 3.25e-10).abs() < 1e-16);
        assert!((parsed.loc[0] + 0.1).abs() < 1e-7);
    }

    #[test]
    fn test_data_channel_detection() {
        assert!(ChannelInfo::new(1, "MEG 0113", ch_kind::MEG).is_data_channel());
        assert!(ChannelInfo::new(2, "EEG 001", ch_kind::EEG).is_data_channel());
        assert!(!ChannelInfo::new(3, "STI 014", ch_kind::STIM).is_data_channel());
        assert!(!ChannelInfo::new(4, "EOG 061", ch_kind::EOG).is_data_channel());
    }

    #[test]
    fn test_info_consistency_check() {
        let mut info = MeasInfo {
            nchan: 2,
            sfreq: 1000.0,
            ..MeasInfo::default()
        };
        info.chs.push(ChannelInfo::new(1, "A", ch_kind::MEG));
        assert!(info.check().is_err());
        info.chs.push(ChannelInfo::new(2, "B", ch_kind::MEG));
        assert!(info.check().is_ok());
    }
}
