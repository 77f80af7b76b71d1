use std::path::PathBuf;

use audit::SourceKind;
use clap::Parser;

/// Harvests organization audit logs into daily NDJSON files.
#[derive(Parser, Debug)]
#[command(name = "audit-harvester", version, about, long_about = None)]
pub struct Args {
    /// Path to a JSON settings file. Takes priority over the config directory and environment.
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// Environment file applied before settings are read. Ignored if missing.
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,

    /// Rotating debug log file.
    #[arg(long, default_value = "get_audit_logs.log")]
    pub log_file: PathBuf,

    /// Run a single cycle over all sources, then exit.
    #[arg(long)]
    pub once: bool,

    /// Only harvest these sources (mail, disk, all). Repeatable.
    #[arg(long = "source", value_name = "SOURCE")]
    pub sources: Vec<SourceKind>,
}
