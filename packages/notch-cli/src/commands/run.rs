use std::path::PathBuf;

use notch_rs::pipeline::{self, RunPaths};
use notch_rs::NotchError;

use crate::cli::RunArgs;
use crate::exit_codes;
use crate::output;

pub fn execute(args: RunArgs) -> i32 {
    let paths = RunPaths {
        config: PathBuf::from(&args.config),
        out_dir: PathBuf::from(&args.out_dir),
        product: PathBuf::from(&args.product),
    };

    if !args.quiet {
        eprintln!("Running notch filter from {}...", args.config);
    }

    match pipeline::run(&paths) {
        Ok(outcome) => {
            if !args.quiet {
                eprintln!(
                    "Filtered {} channel(s) x {} sample(s) at {:?} Hz",
                    outcome.n_channels, outcome.n_samples, outcome.freqs
                );
                eprintln!("Output written to {}", outcome.out_fif.display());
            }
            if args.json {
                if let Err(e) = output::emit_json(&outcome, args.compact) {
                    eprintln!("Error: {}", e);
                    return exit_codes::EXECUTION_ERROR;
                }
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            error_code(&e)
        }
    }
}

pub fn error_code(e: &NotchError) -> i32 {
    if e.is_input_error() {
        exit_codes::INPUT_ERROR
    } else {
        exit_codes::EXECUTION_ERROR
    }
}
