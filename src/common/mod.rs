//! Common functionality shared across the `index`/`search` sub commands.

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

pub mod io;

/// Commonly used command line arguments.
#[derive(Parser, Debug, Clone)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            verbose: Verbosity::new(0, 0),
        }
    }
}

/// The version of the `jstrs` package.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Return the crate version, pinned to `x.y.z` in tests so snapshots stay stable.
pub fn worker_version() -> &'static str {
    if cfg!(test) {
        "x.y.z"
    } else {
        env!("CARGO_PKG_VERSION")
    }
}

/// Pre-filter construction/query configuration, shared by the `index` and
/// `search` sub commands and optionally overridden from a TOML config file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PrefilterConfig {
    /// Size in bases of one bin produced by `chunk(k)`.
    pub bin_size: u64,
    /// Overlap in bases between adjacent bins.
    pub bin_overlap: u64,
    /// Length of the k-mers indexed into the IBF.
    pub kmer_size: u8,
    /// Number of hash functions used per k-mer.
    pub hash_function_count: u8,
    /// Total size of the interleaved Bloom filter, in bytes.
    pub ibf_size_bytes: u64,
    /// Number of worker threads to use.
    pub thread_count: usize,
}

impl Default for PrefilterConfig {
    fn default() -> Self {
        Self {
            bin_size: 65_536,
            bin_overlap: 0,
            kmer_size: 13,
            hash_function_count: 3,
            ibf_size_bytes: 8 * 1024 * 1024,
            thread_count: 1,
        }
    }
}

impl PrefilterConfig {
    /// Load a configuration, layering an optional TOML file over the
    /// built-in defaults.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, anyhow::Error> {
        match path {
            Some(path) => {
                let toml_str = std::fs::read_to_string(path)?;
                Ok(toml::from_str(&toml_str)?)
            }
            None => Ok(Self::default()),
        }
    }
}
