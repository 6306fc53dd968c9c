use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "pdfhub",
    version,
    about = "Keeps an index of the PDF files in your folders, with first-page previews",
    after_help = "\
Configuration directory lookup order:
  1. --config-dir <path>         (explicit flag)
  2. $PDFHUB_CONFIG_DIR          (environment variable)
  3. Platform user config dir + /pdfhub (e.g. ~/.config or %APPDATA%)

Type `help` at the prompt for the list of console commands."
)]
pub struct Cli {
    /// Directory holding config.json and pdf_index.json
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Update descriptor URL (overrides update_url in config.json)
    #[arg(long, value_name = "URL")]
    pub update_url: Option<String>,

    /// Skip the startup update check
    #[arg(long)]
    pub no_update: bool,

    /// Install an available update without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
