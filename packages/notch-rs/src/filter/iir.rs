//! IIR notch filtering: a cascade of second-order notch sections applied
//! forward and backward (filtfilt) for zero phase.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type};

use crate::error::{NotchError, Result};
use crate::types::NotchParams;

/// Design the second-order sections for the frequency set.
///
/// Each notch frequency gets `order / 2` identical sections; the quality
/// factor comes from the per-frequency stop-band width.
pub fn notch_coeffs(
    freqs: &[f64],
    sfreq: f64,
    params: &NotchParams,
) -> Result<Vec<Coefficients<f64>>> {
    let iir = &params.iir_params;
    if iir.ftype != "butter" {
        return Err(NotchError::InvalidParameter(format!(
            "unsupported IIR filter type '{}'; only 'butter' is available",
            iir.ftype
        )));
    }
    if iir.order == 0 || iir.order % 2 != 0 {
        return Err(NotchError::InvalidParameter(format!(
            "IIR order must be a positive even number, got {}",
            iir.order
        )));
    }

    let sections = (iir.order / 2) as usize;
    let mut coeffs = Vec::with_capacity(freqs.len() * sections);
    for &f in freqs {
        let bw = params.width_for(f).max(1e-3);
        let q = f / bw;
        let c = Coefficients::<f64>::from_params(Type::Notch, sfreq.hz(), f.hz(), q)
            .map_err(|e| NotchError::Filter(format!("IIR design failed at {} Hz: {:?}", f, e)))?;
        for _ in 0..sections {
            coeffs.push(c);
        }
    }
    Ok(coeffs)
}

/// Forward-backward application of the section cascade.
pub fn filtfilt(x: &mut Vec<f64>, coeffs: &[Coefficients<f64>]) {
    run_cascade(x, coeffs);
    x.reverse();
    run_cascade(x, coeffs);
    x.reverse();
}

fn run_cascade(x: &mut [f64], coeffs: &[Coefficients<f64>]) {
    for c in coeffs {
        let mut df = DirectForm2Transposed::<f64>::new(*c);
        for v in x.iter_mut() {
            *v = df.run(*v);
        }
    }
}
