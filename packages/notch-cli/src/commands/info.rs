use notch_rs::RawFif;
use serde::Serialize;

use crate::cli::InfoArgs;
use crate::exit_codes;
use crate::output;

#[derive(Serialize)]
struct InfoOutput {
    file: String,
    n_channels: usize,
    n_samples: usize,
    sfreq: f64,
    duration_secs: f64,
    highpass: f32,
    lowpass: f32,
    line_freq: Option<f32>,
    meas_date: Option<String>,
    bad_channels: Vec<String>,
    maxfilter_applied: bool,
    channels: Vec<String>,
}

pub fn execute(args: InfoArgs) -> i32 {
    let fif = match RawFif::open(&args.file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::INPUT_ERROR;
        }
    };

    let info = &fif.info;
    let result = InfoOutput {
        file: args.file.clone(),
        n_channels: info.nchan,
        n_samples: fif.n_samples(),
        sfreq: info.sfreq,
        duration_secs: fif.duration_secs(),
        highpass: info.highpass,
        lowpass: info.lowpass,
        line_freq: info.line_freq,
        meas_date: info
            .meas_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        bad_channels: info.bads.clone(),
        maxfilter_applied: info.has_proc_history,
        channels: info.ch_names().iter().map(|s| s.to_string()).collect(),
    };

    if args.json {
        if let Err(e) = output::emit_json(&result, false) {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    } else {
        println!("File:               {}", result.file);
        println!("Channels:           {}", result.n_channels);
        println!("Samples:            {}", result.n_samples);
        println!("Sampling frequency: {} Hz", result.sfreq);
        println!("Duration:           {:.1} s", result.duration_secs);
        println!("Highpass:           {} Hz", result.highpass);
        println!("Lowpass:            {} Hz", result.lowpass);
        match result.line_freq {
            Some(lf) => println!("Line frequency:     {} Hz", lf),
            None => println!("Line frequency:     unknown"),
        }
        if let Some(ref date) = result.meas_date {
            println!("Measurement date:   {}", date);
        }
        println!(
            "Bad channels:       {}",
            if result.bad_channels.is_empty() {
                "none".to_string()
            } else {
                result.bad_channels.join(", ")
            }
        );
        if result.maxfilter_applied {
            println!("MaxFilter:          applied");
        }
    }

    exit_codes::SUCCESS
}
