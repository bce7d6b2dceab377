//! Notch-filter parameter types.
//!
//! These are the typed counterparts of the flat `param_*` fields found in a
//! Brainlife `config.json`. Sentinel handling (empty string standing in for
//! an absent value) happens once at the config parse boundary; everything in
//! this module works with explicit `Option`s.

use serde::{Deserialize, Serialize};

use crate::error::{NotchError, Result};

/// Filtering method selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Overlap-add FIR filtering (zero phase).
    Fir,
    /// Forward-backward IIR filtering (filtfilt).
    Iir,
    /// Sinusoid regression with F-test detection of line components.
    SpectrumFit,
}

impl Method {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "fir" => Ok(Self::Fir),
            "iir" => Ok(Self::Iir),
            "spectrum_fit" => Ok(Self::SpectrumFit),
            other => Err(NotchError::InvalidConfig(format!(
                "Unknown method '{}'. Valid methods: fir, iir, spectrum_fit",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fir => "fir",
            Self::Iir => "iir",
            Self::SpectrumFit => "spectrum_fit",
        }
    }
}

/// Target frequency specification.
///
/// Either a single frequency, an arithmetic sequence covering a fundamental
/// and its harmonics, or automatic detection (`spectrum_fit` only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FreqSpec {
    /// No explicit frequencies; significant sinusoidal components are
    /// detected per channel. Only valid with [`Method::SpectrumFit`].
    Auto,
    /// Notch one frequency.
    Single(f64),
    /// Notch `start, start+step, ...` up to but excluding `end`.
    Sequence { start: f64, end: f64, step: f64 },
}

impl FreqSpec {
    /// Resolve to the explicit frequency set, or `None` for auto-detection.
    ///
    /// The sequence form is end-exclusive: start=60, end=241, step=60
    /// resolves to [60, 120, 180, 240].
    pub fn resolve(&self) -> Option<Vec<f64>> {
        match self {
            Self::Auto => None,
            Self::Single(f) => Some(vec![*f]),
            Self::Sequence { start, end, step } => {
                let mut freqs = Vec::new();
                if *step > 0.0 {
                    let mut i = 0u32;
                    loop {
                        let f = start + f64::from(i) * step;
                        if f >= *end {
                            break;
                        }
                        freqs.push(f);
                        i += 1;
                    }
                }
                Some(freqs)
            }
        }
    }

    /// Human-readable summary for status messages and the report.
    pub fn describe(&self) -> String {
        match self {
            Self::Auto => "automatically detected line components".to_string(),
            Self::Single(f) => format!("{}Hz", f),
            Self::Sequence { start, .. } => format!("{}Hz and its harmonics", start),
        }
    }
}

/// FIR filter length: automatic, or a human-readable duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FilterLength {
    Auto,
    Seconds(f64),
}

impl FilterLength {
    /// Parse `"auto"`, `"10s"` or `"5500ms"`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s == "auto" {
            return Ok(Self::Auto);
        }
        if let Some(ms) = s.strip_suffix("ms") {
            let v: f64 = ms.parse().map_err(|_| bad_length(s))?;
            return Ok(Self::Seconds(v / 1000.0));
        }
        if let Some(sec) = s.strip_suffix('s') {
            let v: f64 = sec.parse().map_err(|_| bad_length(s))?;
            return Ok(Self::Seconds(v));
        }
        Err(bad_length(s))
    }
}

fn bad_length(s: &str) -> NotchError {
    NotchError::InvalidConfig(format!(
        "Invalid filter length '{}'. Use 'auto' or a duration like '10s' or '5500ms'",
        s
    ))
}

/// FIR window function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirWindow {
    Hamming,
    Hann,
    Blackman,
}

impl FirWindow {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "hamming" => Ok(Self::Hamming),
            "hann" => Ok(Self::Hann),
            "blackman" => Ok(Self::Blackman),
            other => Err(NotchError::InvalidConfig(format!(
                "Unknown FIR window '{}'. Valid windows: hamming, hann, blackman",
                other
            ))),
        }
    }

    /// Transition-width attenuation factor for automatic filter lengths.
    pub fn attenuation_factor(&self) -> f64 {
        match self {
            Self::Hamming => 3.3,
            Self::Hann => 3.1,
            Self::Blackman => 5.0,
        }
    }
}

/// FIR design strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirDesign {
    /// Windowed-sinc band-stop composition.
    Firwin,
    /// Frequency-sampling design.
    Firwin2,
}

impl FirDesign {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "firwin" => Ok(Self::Firwin),
            "firwin2" => Ok(Self::Firwin2),
            other => Err(NotchError::InvalidConfig(format!(
                "Unknown FIR design '{}'. Valid designs: firwin, firwin2",
                other
            ))),
        }
    }
}

/// FIR phase mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Single delay-compensated pass.
    Zero,
    /// Two passes, the second time-reversed.
    ZeroDouble,
}

impl Phase {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "zero" => Ok(Self::Zero),
            "zero-double" => Ok(Self::ZeroDouble),
            other => Err(NotchError::InvalidConfig(format!(
                "Unknown phase '{}'. Valid phases: zero, zero-double",
                other
            ))),
        }
    }
}

/// Edge padding mode for FIR application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadMode {
    /// Odd reflection about the edge value.
    ReflectLimited,
    /// Even reflection.
    Reflect,
    /// Repeat the edge value.
    Edge,
    /// Zero padding.
    Zero,
}

impl PadMode {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "reflect_limited" => Ok(Self::ReflectLimited),
            "reflect" => Ok(Self::Reflect),
            "edge" => Ok(Self::Edge),
            "zero" | "constant" => Ok(Self::Zero),
            other => Err(NotchError::InvalidConfig(format!(
                "Unknown pad mode '{}'. Valid modes: reflect_limited, reflect, edge, zero",
                other
            ))),
        }
    }
}

/// IIR design sub-parameters (`param_iir_parameters`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IirParams {
    #[serde(default = "default_iir_order")]
    pub order: u32,
    #[serde(default = "default_iir_ftype")]
    pub ftype: String,
}

fn default_iir_order() -> u32 {
    4
}

fn default_iir_ftype() -> String {
    "butter".to_string()
}

impl Default for IirParams {
    fn default() -> Self {
        Self {
            order: default_iir_order(),
            ftype: default_iir_ftype(),
        }
    }
}

/// Complete, validated notch-filter invocation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotchParams {
    pub freqs: FreqSpec,
    /// Channel names to filter; `None` selects all data channels.
    pub picks: Option<Vec<String>>,
    pub filter_length: FilterLength,
    /// Stop-band width in Hz. `None` falls back to `freq / 200`.
    pub widths: Option<f64>,
    /// Transition band width in Hz.
    pub trans_bandwidth: f64,
    /// Worker count for per-channel parallelism.
    pub n_jobs: usize,
    pub method: Method,
    pub iir_params: IirParams,
    /// Detection bandwidth in Hz for `spectrum_fit`.
    pub mt_bandwidth: Option<f64>,
    /// F-test significance threshold for `spectrum_fit` auto-detection.
    pub p_value: f64,
    pub phase: Phase,
    pub fir_window: FirWindow,
    pub fir_design: FirDesign,
    pub pad: PadMode,
}

impl NotchParams {
    /// Stop-band width for a given notch frequency.
    pub fn width_for(&self, freq: f64) -> f64 {
        self.widths.unwrap_or(freq / 200.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_harmonic_sequence() {
        let spec = FreqSpec::Sequence {
            start: 60.0,
            end: 241.0,
            step: 60.0,
        };
        assert_eq!(spec.resolve().unwrap(), vec![60.0, 120.0, 180.0, 240.0]);
    }

    #[test]
    fn test_resolve_sequence_end_exclusive() {
        let spec = FreqSpec::Sequence {
            start: 60.0,
            end: 240.0,
            step: 60.0,
        };
        assert_eq!(spec.resolve().unwrap(), vec![60.0, 120.0, 180.0]);
    }

    #[test]
    fn test_resolve_single() {
        assert_eq!(FreqSpec::Single(50.0).resolve().unwrap(), vec![50.0]);
    }

    #[test]
    fn test_resolve_auto() {
        assert!(FreqSpec::Auto.resolve().is_none());
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::parse("fir").unwrap(), Method::Fir);
        assert_eq!(Method::parse("iir").unwrap(), Method::Iir);
        assert_eq!(Method::parse("spectrum_fit").unwrap(), Method::SpectrumFit);
        assert!(Method::parse("notch").is_err());
    }

    #[test]
    fn test_filter_length_parse() {
        assert_eq!(FilterLength::parse("auto").unwrap(), FilterLength::Auto);
        assert_eq!(
            FilterLength::parse("10s").unwrap(),
            FilterLength::Seconds(10.0)
        );
        assert_eq!(
            FilterLength::parse("5500ms").unwrap(),
            FilterLength::Seconds(5.5)
        );
        assert!(FilterLength::parse("10 samples").is_err());
    }

    #[test]
    fn test_pad_mode_parse() {
        assert_eq!(
            PadMode::parse("reflect_limited").unwrap(),
            PadMode::ReflectLimited
        );
        assert_eq!(PadMode::parse("constant").unwrap(), PadMode::Zero);
        assert!(PadMode::parse("wrap").is_err());
    }

    #[test]
    fn test_width_fallback() {
        let params = NotchParams {
            freqs: FreqSpec::Single(60.0),
            picks: None,
            filter_length: FilterLength::Auto,
            widths: None,
            trans_bandwidth: 1.0,
            n_jobs: 1,
            method: Method::Fir,
            iir_params: IirParams::default(),
            mt_bandwidth: None,
            p_value: 0.05,
            phase: Phase::Zero,
            fir_window: FirWindow::Hamming,
            fir_design: FirDesign::Firwin,
            pad: PadMode::ReflectLimited,
        };
        assert!((params.width_for(60.0) - 0.3).abs() < 1e-12);
        let narrow = NotchParams {
            widths: Some(2.0),
            ..params
        };
        assert!((narrow.width_for(60.0) - 2.0).abs() < 1e-12);
    }
}
