use std::path::Path;

use notch_rs::pipeline;
use notch_rs::AppConfig;

use crate::cli::ReportArgs;
use crate::exit_codes;

pub fn execute(args: ReportArgs) -> i32 {
    let cfg = match AppConfig::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::INPUT_ERROR;
        }
    };

    if !args.quiet {
        eprintln!("Building filtering report for {}...", cfg.fif);
    }

    match pipeline::build_report(&cfg, Path::new(&args.out_dir)) {
        Ok(path) => {
            if !args.quiet {
                eprintln!("Report written to {}", path.display());
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            super::run::error_code(&e)
        }
    }
}
