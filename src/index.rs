//! Implementation of the `index` sub command: build an interleaved Bloom
//! filter pre-filter from a persisted RCMS store.

use crate::common;
use crate::err::AppError;
use crate::prefilter::Ibf;
use crate::rcms::{Rcms, RootedRcms};

/// Command line arguments for the `index` sub command.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "build an IBF pre-filter from an RCMS store", long_about = None)]
pub struct Args {
    /// Path to the persisted RCMS store to index.
    pub rcms_in: std::path::PathBuf,
    /// Path to write the persisted IBF to.
    pub ibf_out: std::path::PathBuf,

    /// Size in bases of one IBF bin.
    #[clap(long, default_value_t = 65_536)]
    pub bin_size: u64,
    /// Overlap in bases between adjacent bins.
    #[clap(long, default_value_t = 0)]
    pub bin_overlap: u64,
    /// Length of the k-mers indexed into the IBF.
    #[clap(long, default_value_t = 13)]
    pub kmer_size: u8,
    /// Number of worker threads to use when building the filter.
    #[clap(long)]
    pub threads: Option<usize>,
}

/// Main entry point for the `index` sub command.
pub fn run(args_common: &common::Args, args: &Args) -> Result<(), AppError> {
    let before_anything = std::time::Instant::now();
    tracing::info!("args_common = {:#?}", &args_common);
    tracing::info!("args = {:#?}", &args);

    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| AppError::Domain(e.to_string()))?;
    }

    let mut reader = common::io::open_read_maybe_gz(&args.rcms_in)?;
    let rcms = Rcms::read_from(&mut reader)?;
    let rooted = RootedRcms::new(&rcms);

    let cfg = common::PrefilterConfig {
        bin_size: args.bin_size,
        bin_overlap: args.bin_overlap,
        kmer_size: args.kmer_size,
        ..common::PrefilterConfig::default()
    };
    let ibf = Ibf::build(&rooted, &cfg)?;

    let mut writer = common::io::open_write_maybe_gz(&args.ibf_out)?;
    ibf.write_to(&mut writer)?;

    tracing::info!("`index` completed in {:?}", before_anything.elapsed());
    Ok(())
}
