use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "meg-notch",
    version,
    about = "Power-line notch filtering for MEG/EEG recordings (FIF)",
    long_about = "Apply a notch filter to raw FIF recordings to remove power-line\n\
                  contamination. Runs are driven by a Brainlife-style config.json\n\
                  and write the filtered recording plus product.json."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the notch filter from a config.json
    Run(RunArgs),
    /// Run the notch filter over many FIF files
    Batch(BatchArgs),
    /// Show recording metadata from a FIF file
    Info(InfoArgs),
    /// Validate a config.json without running
    Validate(ValidateArgs),
    /// Build the HTML filtering quality report
    Report(ReportArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Path to config.json
    #[arg(long, default_value = "config.json")]
    pub config: String,

    /// Output directory for the filtered recording
    #[arg(long, default_value = "out_dir_notch_filter")]
    pub out_dir: String,

    /// Path for the status file
    #[arg(long, default_value = "product.json")]
    pub product: String,

    /// Print the run summary as JSON on stdout
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern for input FIF files (e.g. "data/**/*.fif")
    #[arg(long)]
    pub pattern: Option<String>,

    /// Explicit input FIF files
    #[arg(long, num_args = 1..)]
    pub files: Option<Vec<String>>,

    /// Template config.json applied to every file
    #[arg(long, default_value = "config.json")]
    pub config: String,

    /// Root output directory; each file gets a subdirectory
    #[arg(long, default_value = "out_dir_notch_filter")]
    pub out_dir: String,

    /// List matching files and exit without filtering
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Keep going when a single file fails
    #[arg(long, default_value_t = false)]
    pub continue_on_error: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Input FIF file
    #[arg(long)]
    pub file: String,

    /// Print as JSON instead of text
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to config.json
    #[arg(long, default_value = "config.json")]
    pub config: String,

    /// Print as JSON instead of text
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Path to config.json
    #[arg(long, default_value = "config.json")]
    pub config: String,

    /// Output directory for the report
    #[arg(long, default_value = "out_dir_report")]
    pub out_dir: String,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}
