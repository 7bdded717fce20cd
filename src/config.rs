use crate::index::SequenceIndex;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "borzoi")]
#[command(about = "Serve random-access subsequences of an indexed FASTA file")]
pub struct Config {
    /// FASTA file to serve
    #[arg(long, env = "BORZOI_FASTA")]
    pub fasta: PathBuf,

    /// Index side-file (defaults to <fasta>.fai; built if missing or stale)
    #[arg(long, env = "BORZOI_INDEX")]
    pub index: Option<PathBuf>,

    /// Rebuild the index even if a fresh one exists
    #[arg(long, env = "BORZOI_REBUILD_INDEX", default_value = "false")]
    pub rebuild_index: bool,

    /// Host address to bind to (empty for all interfaces)
    #[arg(long, env = "BORZOI_HOST", default_value = "")]
    pub host: String,

    /// Port to listen on (0 picks an unused port)
    #[arg(short, long, env = "BORZOI_PORT", default_value = "6042")]
    pub port: u16,

    /// Static file served at /
    #[arg(long, env = "BORZOI_HOMEPAGE")]
    pub homepage: Option<PathBuf>,

    /// Enable CORS for all origins
    #[arg(long, env = "BORZOI_CORS", default_value = "false")]
    pub cors: bool,

    /// Largest subsequence a single request may ask for
    #[arg(long, env = "BORZOI_MAX_SUBSEQUENCE_LENGTH", default_value = "1048576")]
    pub max_subsequence_length: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn index_path(&self) -> PathBuf {
        self.index
            .clone()
            .unwrap_or_else(|| SequenceIndex::default_path(&self.fasta))
    }

    /// Addresses to try binding, in order. An empty host means all
    /// interfaces: IPv4 first, then IPv6.
    pub fn bind_addresses(&self) -> Vec<String> {
        if self.host.is_empty() {
            vec![
                format!("0.0.0.0:{}", self.port),
                format!("[::]:{}", self.port),
            ]
        } else if self.host.contains(':') && !self.host.starts_with('[') {
            vec![format!("[{}]:{}", self.host, self.port)]
        } else {
            vec![format!("{}:{}", self.host, self.port)]
        }
    }
}
