use std::path::{Path, PathBuf};
use std::time::Instant;

use notch_rs::pipeline::{self, RunPaths};
use notch_rs::AppConfig;

use crate::cli::BatchArgs;
use crate::exit_codes;

pub fn execute(args: BatchArgs) -> i32 {
    let files = match resolve_files(&args) {
        Ok(f) => f,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    if files.is_empty() {
        eprintln!("Error: No matching files found");
        return exit_codes::INPUT_ERROR;
    }

    if args.dry_run {
        for f in &files {
            println!("{}", f);
        }
        if !args.quiet {
            eprintln!("Found {} file(s)", files.len());
        }
        return exit_codes::SUCCESS;
    }

    // The template config supplies the filter parameters; the fif path is
    // replaced per file.
    let template = match AppConfig::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::INPUT_ERROR;
        }
    };
    if let Err(e) = template.to_params() {
        eprintln!("Error: {}", e);
        return exit_codes::INPUT_ERROR;
    }

    let started = Instant::now();
    let mut n_ok = 0usize;
    let mut n_failed = 0usize;

    for file in &files {
        if !args.quiet {
            eprintln!("Filtering {}...", file);
        }

        let mut cfg = template.clone();
        cfg.fif = file.clone();

        let out_dir = Path::new(&args.out_dir).join(file_stem(file));
        let paths = RunPaths {
            config: PathBuf::from(&args.config),
            out_dir: out_dir.clone(),
            product: out_dir.join(pipeline::PRODUCT_FILE),
        };
        if let Err(e) = std::fs::create_dir_all(&out_dir) {
            eprintln!("Error: failed to create {}: {}", out_dir.display(), e);
            n_failed += 1;
            if !args.continue_on_error {
                return exit_codes::EXECUTION_ERROR;
            }
            continue;
        }

        match pipeline::run_with_config(&cfg, &paths) {
            Ok(_) => n_ok += 1,
            Err(e) => {
                eprintln!("Error filtering {}: {}", file, e);
                n_failed += 1;
                if !args.continue_on_error {
                    return super::run::error_code(&e);
                }
            }
        }
    }

    if !args.quiet {
        eprintln!(
            "Batch finished: {}/{} succeeded in {:.1}s",
            n_ok,
            files.len(),
            started.elapsed().as_secs_f64()
        );
    }

    if n_failed == 0 {
        exit_codes::SUCCESS
    } else if n_ok > 0 {
        exit_codes::PARTIAL_FAILURE
    } else {
        exit_codes::EXECUTION_ERROR
    }
}

fn resolve_files(args: &BatchArgs) -> Result<Vec<String>, String> {
    match (&args.pattern, &args.files) {
        (Some(_), Some(_)) => Err("Use either --pattern or --files, not both".to_string()),
        (None, None) => Err("One of --pattern or --files is required".to_string()),
        (None, Some(files)) => {
            for f in files {
                if !Path::new(f).exists() {
                    return Err(format!("File not found: {}", f));
                }
            }
            Ok(files.clone())
        }
        (Some(pattern), None) => {
            let entries =
                glob::glob(pattern).map_err(|e| format!("Invalid glob pattern: {}", e))?;
            let mut files = Vec::new();
            for entry in entries {
                match entry {
                    Ok(path) if path.is_file() => files.push(path.display().to_string()),
                    Ok(_) => {}
                    Err(e) => return Err(format!("Glob error: {}", e)),
                }
            }
            files.sort();
            Ok(files)
        }
    }
}

/// Per-file output subdirectory name.
fn file_stem(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}
