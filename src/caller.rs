// Window driver: tiles the reference, gathers and prepares reads, and runs
// assembly -> pair-HMM -> genotyping per window, streaming variants to VCF.

use crate::error::Result;
use crate::fasta;
use crate::genotyper;
use crate::interval::Interval;
use crate::pairhmm;
use crate::read_clipper;
use crate::read_filter;
use crate::sam::{self, SamRecord};
use crate::{assembler, variant::Variant};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Sample column name in the emitted VCF.
const SAMPLE_NAME: &str = "NA12878";

/// Driver tuning. The defaults reproduce production behavior; tests pin the
/// seed to make per-window read subsampling reproducible.
#[derive(Debug, Clone)]
pub struct CallerConfig {
    /// Callable window width.
    pub window_size: usize,
    /// Symmetric window padding, clamped to the contig.
    pub padding_size: usize,
    /// Hard cap on reads gathered into one window.
    pub max_reads_per_window: usize,
    /// Seed for the per-start-position read subsampling.
    pub seed: u64,
}

impl Default for CallerConfig {
    fn default() -> Self {
        CallerConfig {
            window_size: 245,
            padding_size: 85,
            max_reads_per_window: 1024,
            seed: 0,
        }
    }
}

/// Aggregate counters from one caller run, for logging and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallStats {
    pub reads_loaded: usize,
    pub windows_scanned: usize,
    pub windows_ignored: usize,
    pub windows_failed: usize,
    pub variants_emitted: usize,
}

impl fmt::Display for CallStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scanned {} windows ({} without reads, {} failed) over {} reads, emitted {} variants",
            self.windows_scanned,
            self.windows_ignored,
            self.windows_failed,
            self.reads_loaded,
            self.variants_emitted
        )
    }
}

pub struct HaplotypeCaller {
    input: PathBuf,
    reference: PathBuf,
    output: PathBuf,
    config: CallerConfig,
}

impl HaplotypeCaller {
    pub fn new(input: PathBuf, reference: PathBuf, output: PathBuf) -> Self {
        Self::with_config(input, reference, output, CallerConfig::default())
    }

    pub fn with_config(
        input: PathBuf,
        reference: PathBuf,
        output: PathBuf,
        config: CallerConfig,
    ) -> Self {
        HaplotypeCaller {
            input,
            reference,
            output,
            config,
        }
    }

    pub fn run(&self) -> Result<CallStats> {
        let mut stats = CallStats::default();
        let contig = fasta::read_first_record(&self.reference)?;
        let reference = contig.seq;
        log::info!(
            "Loaded reference {} ({} bp)",
            contig.name,
            reference.len()
        );

        // Reads bucketed by 0-based alignment start.
        let mut reads_map: Vec<Vec<SamRecord>> = vec![Vec::new(); reference.len()];
        let records = sam::read_records(&self.input)?;
        log::info!("Loaded {} reads from {}", records.len(), self.input.display());
        stats.reads_loaded = records.len();
        for record in records {
            let begin = record.alignment_begin();
            match reads_map.get_mut(begin) {
                Some(bucket) => bucket.push(record),
                None => log::warn!(
                    "Read {} starts at {} beyond the reference end; dropped",
                    record.qname,
                    begin
                ),
            }
        }

        let mut out = BufWriter::new(File::create(&self.output)?);
        write_vcf_header(&mut out)?;

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let window_size = self.config.window_size;
        let padding = self.config.padding_size;
        let window_count = (reference.len() + window_size - 1) / window_size;

        stats.windows_scanned = window_count;
        for w in 0..window_count {
            let origin_begin = w * window_size;
            let origin_end = (origin_begin + window_size).min(reference.len());
            let origin_region = Interval {
                contig: contig.name.clone(),
                begin: origin_begin,
                end: origin_end,
            };
            let padded_region = Interval {
                contig: contig.name.clone(),
                begin: origin_begin.saturating_sub(padding),
                end: (origin_end + padding).min(reference.len()),
            };

            let mut reads =
                gather_window_reads(&reads_map, &padded_region, self.config.max_reads_per_window, &mut rng);
            if reads.is_empty() {
                log::info!(
                    "Ignore {} (with overlap region = {})",
                    origin_region,
                    padded_region
                );
                stats.windows_ignored += 1;
                continue;
            }

            let ref_slice = &reference[padded_region.begin..padded_region.end];
            match call_window(&mut reads, ref_slice, &padded_region, &origin_region) {
                Ok(variants) => {
                    for variant in &variants {
                        writeln!(out, "{}", variant.vcf_line())?;
                    }
                    stats.variants_emitted += variants.len();
                }
                Err(e) => {
                    log::error!("Skipping window {}: {}", origin_region, e);
                    stats.windows_failed += 1;
                }
            }
        }

        out.flush()?;
        log::info!("{}", stats);
        log::info!("HaplotypeCaller done.");
        Ok(stats)
    }
}

/// One read per start position inside the padded window, chosen uniformly at
/// random among the reads starting there, up to the hard cap.
fn gather_window_reads(
    reads_map: &[Vec<SamRecord>],
    padded_region: &Interval,
    max_reads: usize,
    rng: &mut StdRng,
) -> Vec<SamRecord> {
    let mut reads = Vec::new();
    for begin in padded_region.begin..padded_region.end {
        let bucket = &reads_map[begin];
        if bucket.is_empty() {
            continue;
        }
        let pick = if bucket.len() == 1 {
            0
        } else {
            rng.gen_range(0..bucket.len())
        };
        reads.push(bucket[pick].clone());
        if reads.len() >= max_reads {
            break;
        }
    }
    reads
}

/// Run the per-window pipeline and return the window's variants, in
/// increasing locus order.
fn call_window(
    reads: &mut Vec<SamRecord>,
    reference: &[u8],
    padded_region: &Interval,
    origin_region: &Interval,
) -> Result<Vec<Variant>> {
    read_filter::apply_pre_assembly_filters(reads);
    for read in reads.iter_mut() {
        read_clipper::revert_soft_clipped_bases(read);
    }
    for read in reads.iter_mut() {
        read_clipper::hard_clip_to_interval(read, padded_region);
    }
    read_filter::drop_reads_below_minimum_length(reads);

    if reads.is_empty() {
        return Ok(Vec::new());
    }

    log::info!(
        "Assembling {} with {} reads (with overlap region = {})",
        origin_region,
        reads.len(),
        padded_region
    );

    let mut haplotypes = assembler::assemble(reads, reference)?;
    if haplotypes.len() <= 1 {
        return Ok(Vec::new());
    }

    let likelihoods = pairhmm::compute_likelihoods(&haplotypes, reads, &pairhmm::ORIGINAL_DEFAULT);
    genotyper::assign_genotype_likelihoods(
        reads,
        &mut haplotypes,
        &likelihoods,
        reference,
        padded_region,
        origin_region,
    )
}

/// VCF 4.2 header with the GT/GQ FORMAT declarations.
pub fn write_vcf_header(out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "##fileformat=VCFv4.2")?;
    writeln!(
        out,
        "##FORMAT=<ID=GQ,Number=1,Type=Integer,Description=\"Genotype Quality\">"
    )?;
    writeln!(
        out,
        "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">"
    )?;
    writeln!(
        out,
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\t{}",
        SAMPLE_NAME
    )?;
    Ok(())
}
