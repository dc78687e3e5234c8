// Assembly driver: read segmentation and the k-mer size retry loop.

use crate::error::Result;
use crate::graph::AssemblyGraph;
use crate::haplotype::Haplotype;
use crate::math;
use crate::sam::SamRecord;

pub const INITIAL_KMER_SIZE: usize = 25;
pub const KMER_SIZE_ITERATION_INCREASE: usize = 10;
pub const MAX_KMER_ITERATIONS_TO_ATTEMPT: usize = 9;
pub const MAX_UNIQUE_KMERS_COUNT_TO_DISCARD: usize = 2000;
/// Phred 10, encoded. Bases below this never enter the graph.
pub const MIN_BASE_QUALITY_TO_USE: u8 = 10 + math::ASCII_OFFSET;

/// Maximal substrings of a read where every base is a called nucleotide of
/// at least the minimum quality. Runs shorter than the k-mer size carry no
/// usable k-mer and are discarded.
pub fn usable_segments(read: &SamRecord, kmer_size: usize) -> Vec<&[u8]> {
    let is_usable =
        |base: u8, qual: u8| base != b'N' && qual >= MIN_BASE_QUALITY_TO_USE;

    let mut segments = Vec::new();
    let mut start: Option<usize> = None;
    for i in 0..=read.len() {
        if i < read.len() && is_usable(read.seq[i], read.qual[i]) {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            if i - s >= kmer_size {
                segments.push(&read.seq[s..i]);
            }
        }
    }
    segments
}

fn assemble_with_kmer_size(
    reads: &[SamRecord],
    reference: &[u8],
    kmer_size: usize,
) -> Result<Vec<Haplotype>> {
    if reference.len() < kmer_size {
        return Ok(Vec::new());
    }

    let mut graph = AssemblyGraph::new(kmer_size);
    let segments: Vec<&[u8]> = reads
        .iter()
        .flat_map(|read| usable_segments(read, kmer_size))
        .collect();
    graph.build(reference, &segments);

    if log::log_enabled!(log::Level::Debug) {
        let mut dot = Vec::new();
        if graph.write_dot(&mut dot).is_ok() {
            log::debug!("assembly graph:\n{}", String::from_utf8_lossy(&dot));
        }
    }

    if graph.unique_kmer_count() > MAX_UNIQUE_KMERS_COUNT_TO_DISCARD {
        log::info!(
            "Not using kmer size of {} in assembler because it contains too many unique kmers",
            kmer_size
        );
        return Ok(Vec::new());
    }

    if graph.has_cycles() {
        log::info!(
            "Not using kmer size of {} in assembler because it contains a cycle",
            kmer_size
        );
        return Ok(Vec::new());
    }

    log::info!("Using kmer size of {} in assembler", kmer_size);

    graph.find_paths(reference)
}

/// Assemble candidate haplotypes for one window, retrying with larger k-mer
/// sizes while an attempt yields nothing. A result holding only the
/// reference haplotype means there is nothing to call.
pub fn assemble(reads: &[SamRecord], reference: &[u8]) -> Result<Vec<Haplotype>> {
    let mut kmer_size = INITIAL_KMER_SIZE;
    let mut iterations = 1;
    let mut haplotypes = assemble_with_kmer_size(reads, reference, kmer_size)?;
    while haplotypes.is_empty() && iterations < MAX_KMER_ITERATIONS_TO_ATTEMPT {
        iterations += 1;
        kmer_size += KMER_SIZE_ITERATION_INCREASE;
        haplotypes = assemble_with_kmer_size(reads, reference, kmer_size)?;
    }
    Ok(haplotypes)
}
