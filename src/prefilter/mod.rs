//! Interleaved Bloom filter pre-filter over bin-partitioned k-mer content:
//! decides which `(pattern, bin)` pairs are worth running the full
//! traversal+matcher on.

use std::collections::HashSet;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::common::PrefilterConfig;
use crate::err::{FormatError, IbfError};
use crate::rcms::RootedRcms;
use crate::tree::base::BaseTree;
use crate::tree::chunk::{compute_bins, Bin, BoundedTree};
use crate::tree::coloured::Coloured;
use crate::tree::labelled::{LabelMode, Labelled};
use crate::tree::left_extend::LeftExtend;
use crate::tree::merge::Merge;
use crate::tree::prune::PruneUnsupported;
use crate::tree::trim::Trim;
use crate::tree::volatile::Volatile;
use crate::tree::{BreakpointTree, RcmsView};
use crate::traversal::{Observer, Traversal};

/// Word-packed flat bit-vector, the same storage style as [`crate::coverage::Coverage`]
/// but sized to `bins * bits_per_bin` rather than a haplotype domain.
#[derive(Clone, Debug)]
struct BitSet {
    words: Vec<u64>,
    len: u64,
}

impl BitSet {
    fn new(len: u64) -> Self {
        let word_count = (len as usize).div_ceil(64).max(1);
        Self {
            words: vec![0u64; word_count],
            len,
        }
    }

    fn set(&mut self, i: u64) {
        debug_assert!(i < self.len);
        self.words[(i / 64) as usize] |= 1u64 << (i % 64);
    }

    fn get(&self, i: u64) -> bool {
        debug_assert!(i < self.len);
        (self.words[(i / 64) as usize] >> (i % 64)) & 1 == 1
    }
}

/// One needle's k-mer hits against a single bin column.
fn count_kmer_hits(ibf: &Ibf, bin_index: usize, kmers: &[Vec<u8>]) -> usize {
    kmers
        .iter()
        .filter(|kmer| ibf.contains(bin_index, kmer))
        .count()
}

pub struct Ibf {
    bin_size: u64,
    bin_overlap: u64,
    kmer_size: u8,
    hash_function_count: u8,
    bits_per_bin: u64,
    bins: Vec<Bin>,
    bits: BitSet,
}

impl Ibf {
    /// Build the filter from a rooted RCMS, enumerating every bin's k-mers
    /// along its trimmed+pruned+left-extended+merged tree.
    pub fn build(rooted: &RootedRcms<'_>, cfg: &PrefilterConfig) -> Result<Self, IbfError> {
        let seq_len = rooted.sequence().len() as u64;
        let bins = compute_bins(seq_len, cfg.bin_size, cfg.bin_overlap);
        if bins.is_empty() {
            return Err(IbfError::EmptyPartition {
                seq_len,
                bin_size: cfg.bin_size,
            });
        }
        for bin in &bins {
            if u64::from(bin.end - bin.start) < cfg.kmer_size as u64 {
                return Err(IbfError::KmerLargerThanBin {
                    kmer_size: cfg.kmer_size,
                    bin_width: (bin.end - bin.start) as u64,
                });
            }
        }

        let bits_per_bin = ((cfg.ibf_size_bytes * 8) / bins.len() as u64).max(64);
        let mut ibf = Ibf {
            bin_size: cfg.bin_size,
            bin_overlap: cfg.bin_overlap,
            kmer_size: cfg.kmer_size,
            hash_function_count: cfg.hash_function_count,
            bits_per_bin,
            bins: bins.clone(),
            bits: BitSet::new(bits_per_bin * bins.len() as u64),
        };

        for bin in &bins {
            let base = BaseTree::new(RootedRcms::new(rooted.rcms()));
            let bounded = BoundedTree::new(base, bin);
            let volatile = Volatile::new(bounded);
            let labelled = Labelled::new(volatile, LabelMode::RootPath);
            let coloured = Coloured::new(labelled);
            let window = cfg.kmer_size.saturating_sub(1) as usize;
            let trimmed = Trim::new(coloured, window);
            let pruned = PruneUnsupported::new(trimmed);
            let extended = LeftExtend::new(pruned, window, LabelMode::RootPath);
            let merged = Merge::new(extended);

            for kmer in enumerate_tree_kmers(merged, cfg.kmer_size as usize) {
                ibf.insert(bin.index, &kmer);
            }
        }

        Ok(ibf)
    }

    fn insert(&mut self, bin_index: usize, kmer: &[u8]) {
        for h in 0..self.hash_function_count {
            let local = hash_kmer(kmer, h as u64) % self.bits_per_bin;
            let global = bin_index as u64 * self.bits_per_bin + local;
            self.bits.set(global);
        }
    }

    fn contains(&self, bin_index: usize, kmer: &[u8]) -> bool {
        (0..self.hash_function_count).all(|h| {
            let local = hash_kmer(kmer, h as u64) % self.bits_per_bin;
            let global = bin_index as u64 * self.bits_per_bin + local;
            self.bits.get(global)
        })
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Candidate bins for `pattern` at the given allowed-error count, per the
    /// k-mer lemma threshold `T = |q|+1-(e+1)*k`.
    pub fn query(&self, pattern: &[u8], max_errors: u32) -> Vec<usize> {
        let k = self.kmer_size as usize;
        if pattern.len() < k {
            return Vec::new();
        }
        let kmers: Vec<Vec<u8>> = pattern.windows(k).map(|w| w.to_vec()).collect();
        let threshold = (pattern.len() as i64 + 1) - (max_errors as i64 + 1) * k as i64;
        if threshold <= 0 {
            return self.bins.iter().map(|b| b.index).collect();
        }
        let threshold = threshold as usize;

        self.bins
            .iter()
            .filter(|bin| count_kmer_hits(self, bin.index, &kmers) >= threshold)
            .map(|bin| bin.index)
            .collect()
    }

    /// Serialize to the persisted IBF format: magic, version,
    /// `bin_size`, `kmer`, `hashes`, `bins`, `bits_per_bin`, then the
    /// word-packed payload. `bin_overlap` is written right after `bin_size`,
    /// a deviation from the literal field list: bin boundaries (needed by
    /// [`BoundedTree`] at search time) can't be recovered from the bin count
    /// alone, so the value that produced them has to travel with the filter.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), FormatError> {
        w.write_all(IBF_MAGIC)?;
        w.write_u16::<LittleEndian>(IBF_VERSION)?;
        w.write_u64::<LittleEndian>(self.bin_size)?;
        w.write_u64::<LittleEndian>(self.bin_overlap)?;
        w.write_u8(self.kmer_size)?;
        w.write_u8(self.hash_function_count)?;
        w.write_u32::<LittleEndian>(self.bins.len() as u32)?;
        w.write_u64::<LittleEndian>(self.bits_per_bin)?;
        for word in &self.bits.words {
            w.write_u64::<LittleEndian>(*word)?;
        }
        Ok(())
    }

    /// Load a persisted filter. Bin boundaries aren't themselves part of the
    /// wire format, only the bin count is; they're recomputed from
    /// `bin_size`/`bin_overlap` against `rooted`'s sequence length, so the
    /// caller must load the matching RCMS first and pass it in here.
    pub fn read_from<R: Read>(r: &mut R, rooted: &RootedRcms<'_>) -> Result<Ibf, FormatError> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic != IBF_MAGIC {
            return Err(FormatError::BadMagic {
                expected: IBF_MAGIC,
                actual: magic.to_vec(),
            });
        }
        let version = r.read_u16::<LittleEndian>()?;
        if version != IBF_VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }
        let bin_size = r.read_u64::<LittleEndian>()?;
        let bin_overlap = r.read_u64::<LittleEndian>()?;
        let kmer_size = r.read_u8()?;
        let hash_function_count = r.read_u8()?;
        let bin_count = r.read_u32::<LittleEndian>()? as usize;
        let bits_per_bin = r.read_u64::<LittleEndian>()?;

        let seq_len = rooted.sequence().len() as u64;
        let bins = compute_bins(seq_len, bin_size, bin_overlap);
        if bins.len() != bin_count {
            return Err(FormatError::Malformed(format!(
                "persisted bin count {bin_count} does not match {} bins recomputed from bin_size={bin_size}/bin_overlap={bin_overlap} against this RCMS",
                bins.len()
            )));
        }

        let total_bits = bits_per_bin * bin_count as u64;
        let word_count = (total_bits as usize).div_ceil(64).max(1);
        let mut words = vec![0u64; word_count];
        for word in &mut words {
            *word = r.read_u64::<LittleEndian>()?;
        }

        Ok(Ibf {
            bin_size,
            bin_overlap,
            kmer_size,
            hash_function_count,
            bits_per_bin,
            bins,
            bits: BitSet {
                words,
                len: total_bits,
            },
        })
    }
}

const IBF_MAGIC: &[u8; 4] = b"JIBF";
const IBF_VERSION: u16 = 1;

fn hash_kmer(kmer: &[u8], seed: u64) -> u64 {
    xxhash_rust::xxh3::xxh3_64_with_seed(kmer, seed)
}

struct KmerCollector {
    kmer_size: usize,
    kmers: HashSet<Vec<u8>>,
}

impl<N> Observer<N> for KmerCollector
where
    N: crate::tree::labelled::LabelAccess,
{
    fn on_push(&mut self, node: &N) {
        self.collect(node);
    }

    fn on_pop(&mut self, _node: &N) {}
}

impl KmerCollector {
    fn collect<N: crate::tree::labelled::LabelAccess>(&mut self, node: &N) {
        let seq = node.label().sequence();
        if seq.len() >= self.kmer_size {
            for window in seq.windows(self.kmer_size) {
                self.kmers.insert(window.to_vec());
            }
        }
    }
}

/// Enumerate every distinct k-mer visible along every node label reachable
/// in `tree` (root included, since the root's own segment can still
/// contribute via left-extension on its children — but an empty root label
/// contributes nothing directly).
fn enumerate_tree_kmers<T>(tree: T, kmer_size: usize) -> HashSet<Vec<u8>>
where
    T: BreakpointTree + RcmsView,
    T::Node: crate::tree::labelled::LabelAccess + Clone,
{
    let mut collector = KmerCollector {
        kmer_size,
        kmers: HashSet::new(),
    };
    collector.collect(&tree.root());

    let mut driver = Traversal::new(tree);
    loop {
        let mut observers: Vec<&mut dyn Observer<T::Node>> = vec![&mut collector];
        match driver.step(&mut observers) {
            Some(_) => {}
            None => break,
        }
    }
    collector.kmers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::Coverage;
    use crate::rcms::{OwnedReference, Rcms};
    use crate::variant::{Breakpoint, Variant};

    fn sample_rcms() -> Rcms {
        let reference = OwnedReference::new("chr_test", b"AAAACCCCCGGGGGTTTTT".to_vec());
        let mut builder = Rcms::builder(reference, 4);
        builder
            .push(
                Variant::new(Breakpoint::new(4, 5), vec![b'G'], Coverage::from_bits(4, [0, 1]))
                    .unwrap(),
            )
            .unwrap();
        builder.build()
    }

    fn config() -> PrefilterConfig {
        PrefilterConfig {
            bin_size: 4,
            bin_overlap: 0,
            kmer_size: 3,
            hash_function_count: 3,
            ibf_size_bytes: 4096,
            thread_count: 1,
        }
    }

    #[test]
    fn build_partitions_into_the_expected_bin_count() {
        let rcms = sample_rcms();
        let rooted = RootedRcms::new(&rcms);
        let ibf = Ibf::build(&rooted, &config()).unwrap();
        assert_eq!(ibf.bins().len(), 5);
    }

    #[test]
    fn query_finds_the_bin_containing_an_exact_kmer_match() {
        let rcms = sample_rcms();
        let rooted = RootedRcms::new(&rcms);
        let ibf = Ibf::build(&rooted, &config()).unwrap();

        // "GGGT" spans S[12..16), entirely reference (no variant nearby).
        let hits = ibf.query(b"GGGT", 0);
        assert!(hits.contains(&3), "bin 3 covers S[12,16)");
    }

    #[test]
    fn query_excludes_a_bin_that_never_reaches_the_patterns_position() {
        let rcms = sample_rcms();
        let rooted = RootedRcms::new(&rcms);
        let ibf = Ibf::build(&rooted, &config()).unwrap();

        // "AAAA" only occurs in the leading run S[0,4), entirely inside
        // bin 0; bin 4's own tree never walks back over that prefix, so it
        // must not be offered as a candidate.
        let hits = ibf.query(b"AAAA", 0);
        assert!(hits.contains(&0), "bin 0 covers the leading run S[0,4)");
        assert!(!hits.contains(&4), "bin 4's tree starts well past position 0, never revisiting it");
    }

    #[test]
    fn query_rejects_a_pattern_present_in_no_bin() {
        let rcms = sample_rcms();
        let rooted = RootedRcms::new(&rcms);
        let ibf = Ibf::build(&rooted, &config()).unwrap();

        let hits = ibf.query(b"TTTAAA", 0);
        assert!(hits.is_empty());
    }

    #[test]
    fn build_rejects_a_kmer_larger_than_any_bin() {
        let rcms = sample_rcms();
        let rooted = RootedRcms::new(&rcms);
        let mut cfg = config();
        cfg.kmer_size = 50;
        let err = Ibf::build(&rooted, &cfg).unwrap_err();
        assert!(matches!(err, IbfError::KmerLargerThanBin { .. }));
    }

    #[test]
    fn write_then_read_round_trips_queries() {
        let rcms = sample_rcms();
        let rooted = RootedRcms::new(&rcms);
        let ibf = Ibf::build(&rooted, &config()).unwrap();

        let mut buf = Vec::new();
        ibf.write_to(&mut buf).unwrap();
        let loaded = Ibf::read_from(&mut &buf[..], &rooted).unwrap();

        assert_eq!(loaded.bins().len(), ibf.bins().len());
        assert_eq!(loaded.query(b"GGGT", 0), ibf.query(b"GGGT", 0));
        assert_eq!(loaded.query(b"TTTAAA", 0), ibf.query(b"TTTAAA", 0));
    }

    #[test]
    fn read_rejects_bad_magic() {
        let rcms = sample_rcms();
        let rooted = RootedRcms::new(&rcms);
        let err = Ibf::read_from(&mut &b"XXXX0000"[..], &rooted).unwrap_err();
        assert!(matches!(err, crate::err::FormatError::BadMagic { .. }));
    }
}
