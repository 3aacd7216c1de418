//! Implementation of the `search` sub command: load a persisted RCMS/IBF
//! pair, run every query line from `QUERIES_IN` through the orchestrator,
//! and write matches to `HITS_OUT`.

use std::io::Write;
use std::ops::ControlFlow;
use std::sync::Mutex;

use crate::common;
use crate::err::AppError;
use crate::orchestrator::{self, Hit, HitSink, MatcherKind, Needle};
use crate::prefilter::Ibf;
use crate::rcms::{Rcms, RootedRcms};

/// Command line arguments for the `search` sub command.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "search queries against an RCMS/IBF pair", long_about = None)]
pub struct Args {
    /// Path to the persisted RCMS store to search.
    pub rcms_in: std::path::PathBuf,
    /// Path to the persisted IBF pre-filter built from that store.
    pub ibf_in: std::path::PathBuf,
    /// Path to a plain-text file, one query sequence per line.
    pub queries_in: std::path::PathBuf,
    /// Path to write tab-separated hits to.
    pub hits_out: std::path::PathBuf,

    /// Maximum number of edits a match may carry.
    #[clap(long, default_value_t = 0)]
    pub error_rate: u32,
    /// Number of worker threads to search with.
    #[clap(long)]
    pub threads: Option<usize>,
    /// Which matcher to run the traversal with.
    #[clap(long, value_enum, default_value = "horspool")]
    pub matcher: MatcherKind,
}

/// Writes one tab-separated line per hit, behind a mutex so it can be
/// called from the orchestrator's parallel needle workers.
struct WriterSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl HitSink for WriterSink {
    fn emit(&self, hit: Hit) -> ControlFlow<(), ()> {
        let line = format!(
            "{}\t{}\t{}\t{}\t{}\n",
            hit.needle_id, hit.bin_id, hit.reference_begin, hit.reference_end, hit.label_offset
        );
        let mut w = self.writer.lock().expect("hit writer mutex poisoned");
        match w.write_all(line.as_bytes()) {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => ControlFlow::Break(()),
        }
    }
}

/// Main entry point for the `search` sub command.
pub fn run(args_common: &common::Args, args: &Args) -> Result<(), AppError> {
    let before_anything = std::time::Instant::now();
    tracing::info!("args_common = {:#?}", &args_common);
    tracing::info!("args = {:#?}", &args);

    let mut rcms_reader = common::io::open_read_maybe_gz(&args.rcms_in)?;
    let rcms = Rcms::read_from(&mut rcms_reader)?;
    let rooted = RootedRcms::new(&rcms);

    let mut ibf_reader = common::io::open_read_maybe_gz(&args.ibf_in)?;
    let ibf = Ibf::read_from(&mut ibf_reader, &rooted)?;

    let needles = common::io::read_lines(&args.queries_in)?
        .enumerate()
        .filter_map(|(id, line)| match line {
            Ok(line) if line.is_empty() => None,
            Ok(line) => Some(Ok(Needle {
                id: id as u32,
                sequence: line.into_bytes(),
            })),
            Err(e) => Some(Err(AppError::from(e))),
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let writer = common::io::open_write_maybe_gz(&args.hits_out)?;
    let sink = WriterSink {
        writer: Mutex::new(writer),
    };

    orchestrator::search(
        &rooted,
        &ibf,
        &needles,
        args.matcher,
        args.error_rate,
        args.threads,
        &sink,
    )?;

    tracing::info!("`search` completed in {:?}", before_anything.elapsed());
    Ok(())
}
