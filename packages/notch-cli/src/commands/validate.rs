use std::path::Path;

use notch_rs::AppConfig;
use serde::Serialize;

use crate::cli::ValidateArgs;
use crate::exit_codes;
use crate::output;

#[derive(Serialize)]
struct ValidateOutput {
    config: String,
    exists: bool,
    parseable: bool,
    valid: bool,
    method: Option<String>,
    freqs: Option<String>,
    input_file_exists: Option<bool>,
    error: Option<String>,
}

pub fn execute(args: ValidateArgs) -> i32 {
    let exists = Path::new(&args.config).exists();

    let (parseable, valid, method, freqs, input_file_exists, error) = if !exists {
        (
            false,
            false,
            None,
            None,
            None,
            Some(format!("Config not found: {}", args.config)),
        )
    } else {
        match AppConfig::load(&args.config) {
            Err(e) => (false, false, None, None, None, Some(e.to_string())),
            Ok(cfg) => {
                let input_exists = Path::new(&cfg.fif).exists();
                match cfg.to_params() {
                    Err(e) => (
                        true,
                        false,
                        None,
                        None,
                        Some(input_exists),
                        Some(e.to_string()),
                    ),
                    Ok(params) => {
                        let err = if input_exists {
                            None
                        } else {
                            Some(format!("Input file not found: {}", cfg.fif))
                        };
                        (
                            true,
                            err.is_none(),
                            Some(params.method.as_str().to_string()),
                            Some(params.freqs.describe()),
                            Some(input_exists),
                            err,
                        )
                    }
                }
            }
        }
    };

    let result = ValidateOutput {
        config: args.config.clone(),
        exists,
        parseable,
        valid,
        method,
        freqs,
        input_file_exists,
        error: error.clone(),
    };

    if args.json {
        if let Err(e) = output::emit_json(&result, false) {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    } else if let Some(ref err) = error {
        eprintln!("Error: {}", err);
    } else {
        println!(
            "Config '{}' is valid (method={}, freqs={})",
            args.config,
            result.method.as_deref().unwrap_or("?"),
            result.freqs.as_deref().unwrap_or("?")
        );
    }

    if error.is_some() {
        exit_codes::INPUT_ERROR
    } else {
        exit_codes::SUCCESS
    }
}
