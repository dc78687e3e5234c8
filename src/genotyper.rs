// Diploid genotyper: turns haplotype placements and read likelihoods into
// variant calls.
//
// Stage one walks every haplotype's cigar against the window reference and
// records the variation events it implies. Stage two visits each event locus
// inside the origin region, normalizes the events to a shared reference
// allele, marginalizes the read likelihoods over alleles, and picks the
// diploid genotype with its quality.

use crate::cigar::CigarOp;
use crate::error::{CallError, Result};
use crate::haplotype::Haplotype;
use crate::interval::Interval;
use crate::math;
use crate::sam::SamRecord;
use crate::variant::Variant;
use std::collections::{BTreeMap, BTreeSet};

/// Placeholder ALT for a deletion spanning a downstream locus.
pub const SPAN_DEL: &str = "*";

const ALLELE_EXTENSION: usize = 2;
const MAX_GENOTYPE_QUALITY: usize = 99;
const MIN_GENOTYPE_QUALITY: usize = 10;
const MAX_ALLELE_COUNT: usize = 10;

lazy_static::lazy_static! {
    /// Unordered diploid genotypes per allele count, in the canonical
    /// (0,0),(0,1)..(0,A-1),(1,1)..(A-1,A-1) order.
    static ref GENOTYPE_PAIRS: Vec<Vec<(usize, usize)>> = {
        (0..=MAX_ALLELE_COUNT)
            .map(|allele_count| {
                let mut pairs = Vec::new();
                for a1 in 0..allele_count {
                    for a2 in a1..allele_count {
                        pairs.push((a1, a2));
                    }
                }
                pairs
            })
            .collect()
    };
}

/// Walk one haplotype's cigar against the window reference and store the
/// induced events, keyed by absolute reference begin.
fn process_cigar_for_initial_events(
    haplotype: &mut Haplotype,
    reference: &[u8],
    padded_region: &Interval,
) -> Result<()> {
    let contig = &padded_region.contig;
    let padded_begin = padded_region.begin;

    let mut ref_pos = haplotype.alignment_begin_wrt_ref;
    let mut hap_pos = 0usize;
    let cigar = haplotype.cigar.clone();
    for element in &cigar {
        let length = element.len;
        match element.op {
            CigarOp::M => {
                for offset in 0..length {
                    if reference[ref_pos + offset] != haplotype.bases[hap_pos + offset] {
                        let mismatch_begin = padded_begin + ref_pos + offset;
                        let variant = Variant {
                            location: Interval {
                                contig: contig.clone(),
                                begin: mismatch_begin,
                                end: mismatch_begin + 1,
                            },
                            ref_allele: (reference[ref_pos + offset] as char).to_string(),
                            alt_allele: (haplotype.bases[hap_pos + offset] as char).to_string(),
                            ..Variant::default()
                        };
                        haplotype
                            .event_map
                            .entry(mismatch_begin)
                            .or_insert(variant);
                    }
                }
                ref_pos += length;
                hap_pos += length;
            }
            CigarOp::I => {
                if ref_pos > 0 {
                    let anchor = reference[ref_pos - 1] as char;
                    let inserted =
                        String::from_utf8_lossy(&haplotype.bases[hap_pos..hap_pos + length]);
                    let insertion_begin = padded_begin + ref_pos - 1;
                    let variant = Variant {
                        location: Interval {
                            contig: contig.clone(),
                            begin: insertion_begin,
                            end: insertion_begin + 1,
                        },
                        ref_allele: anchor.to_string(),
                        alt_allele: format!("{}{}", anchor, inserted),
                        ..Variant::default()
                    };
                    haplotype
                        .event_map
                        .entry(insertion_begin)
                        .or_insert(variant);
                }
                hap_pos += length;
            }
            CigarOp::D => {
                if ref_pos > 0 {
                    let deletion_begin = padded_begin + ref_pos - 1;
                    let variant = Variant {
                        location: Interval {
                            contig: contig.clone(),
                            begin: deletion_begin,
                            end: deletion_begin + length + 1,
                        },
                        ref_allele: String::from_utf8_lossy(
                            &reference[ref_pos - 1..ref_pos + length],
                        )
                        .into_owned(),
                        alt_allele: (reference[ref_pos - 1] as char).to_string(),
                        ..Variant::default()
                    };
                    haplotype
                        .event_map
                        .entry(deletion_begin)
                        .or_insert(variant);
                }
                ref_pos += length;
            }
            CigarOp::S => {
                hap_pos += length;
            }
            _ => {
                return Err(CallError::InvalidInput(
                    "unsupported cigar operator created during SW alignment".to_string(),
                ))
            }
        }
    }
    Ok(())
}

/// Assign ranks, extract events for every haplotype, and collect the
/// distinct event begins.
fn set_events_for_haplotypes(
    haplotypes: &mut [Haplotype],
    reference: &[u8],
    padded_region: &Interval,
) -> Result<BTreeSet<usize>> {
    let mut event_begins = BTreeSet::new();
    for (rank, haplotype) in haplotypes.iter_mut().enumerate() {
        haplotype.rank = rank;
        process_cigar_for_initial_events(haplotype, reference, padded_region)?;
        event_begins.extend(haplotype.event_map.keys().copied());
    }
    Ok(event_begins)
}

/// Union of events across haplotypes overlapping the locus, deduplicated
/// and ordered by (location, REF, ALT).
fn events_at_locus(begin: usize, haplotypes: &[Haplotype]) -> Vec<Variant> {
    let mut unique_events = BTreeSet::new();
    for haplotype in haplotypes {
        for event in haplotype.overlapping_events(begin) {
            unique_events.insert(event);
        }
    }
    unique_events.into_iter().collect()
}

/// An upstream deletion spanning this locus is represented by the `*`
/// placeholder allele anchored at the locus itself.
fn replace_span_dels(events: &mut [Variant], ref_base: u8, begin: usize) {
    for event in events.iter_mut() {
        if event.location.begin != begin {
            *event = Variant {
                location: Interval {
                    contig: event.location.contig.clone(),
                    begin,
                    end: begin + 1,
                },
                ref_allele: (ref_base as char).to_string(),
                alt_allele: SPAN_DEL.to_string(),
                ..Variant::default()
            };
        }
    }
}

fn determine_reference_allele(events: &[Variant]) -> String {
    events
        .iter()
        .max_by_key(|event| event.ref_allele.len())
        .map(|event| event.ref_allele.clone())
        .unwrap_or_default()
}

/// Rewrite an event's ALT against a longer reference allele by appending the
/// reference suffix its own REF does not cover.
fn compatible_alternate_allele(ref_allele: &str, event: &Variant) -> String {
    if event.alt_allele == SPAN_DEL {
        return SPAN_DEL.to_string();
    }
    format!(
        "{}{}",
        event.alt_allele,
        &ref_allele[event.ref_allele.len()..]
    )
}

/// The shared allele list for a locus: the longest REF first, then the
/// normalized ALTs, unique and sorted. Returns the list and the location of
/// the longest event.
fn compatible_alleles(events: &[Variant]) -> (Vec<String>, Interval) {
    let ref_allele = determine_reference_allele(events);
    let mut longest_event = events[0].clone();
    let mut alts = BTreeSet::new();
    for event in events {
        if event.size() > longest_event.size() {
            longest_event = event.clone();
        }
        if event.ref_allele == ref_allele {
            alts.insert(event.alt_allele.clone());
        } else {
            alts.insert(compatible_alternate_allele(&ref_allele, event));
        }
    }
    let mut alleles = vec![ref_allele];
    alleles.extend(alts);
    (alleles, longest_event.location)
}

/// allele index -> ranks of the haplotypes carrying it at this locus.
fn allele_mapper(
    alleles: &[String],
    begin: usize,
    haplotypes: &[Haplotype],
) -> BTreeMap<usize, Vec<usize>> {
    let mut result: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    result.entry(0).or_default();
    let ref_allele_len = alleles[0].len();
    let index_of = |allele: &str| alleles.iter().position(|a| a == allele);

    for haplotype in haplotypes {
        let spanning_events = haplotype.overlapping_events(begin);
        if spanning_events.is_empty() {
            result.entry(0).or_default().push(haplotype.rank);
        }
        for event in &spanning_events {
            let index = if event.location.begin == begin {
                if event.ref_allele.len() == ref_allele_len {
                    index_of(&event.alt_allele)
                } else if event.ref_allele.len() < ref_allele_len {
                    index_of(&compatible_alternate_allele(&alleles[0], event))
                } else {
                    None
                }
            } else {
                index_of(SPAN_DEL)
            };
            if let Some(index) = index {
                result.entry(index).or_default().push(haplotype.rank);
            }
        }
    }
    result
}

/// Flatten the allele mapper into rank -> allele index.
fn haplotype_mapper(
    allele_mapper: &BTreeMap<usize, Vec<usize>>,
    haplotype_count: usize,
) -> Vec<usize> {
    let mut mapper = vec![0; haplotype_count];
    for (&allele_index, haplotype_ranks) in allele_mapper {
        for &rank in haplotype_ranks {
            mapper[rank] = allele_index;
        }
    }
    mapper
}

/// Reduce the reads-by-haplotypes matrix to reads-by-alleles: keep reads
/// overlapping the locus neighborhood, and give each allele the best
/// likelihood among its haplotypes.
fn marginalize(
    haplotype_mapper: &[usize],
    allele_count: usize,
    reads: &[SamRecord],
    haplotype_likelihoods: &[Vec<f64>],
    overlap: &Interval,
) -> Vec<Vec<f64>> {
    let read_indices_to_keep: Vec<usize> = (0..reads.len())
        .filter(|&i| reads[i].interval().overlaps(overlap))
        .collect();

    let mut allele_likelihoods =
        vec![vec![f64::MIN; allele_count]; read_indices_to_keep.len()];
    for (r, &old_read_index) in read_indices_to_keep.iter().enumerate() {
        for (h, &allele_index) in haplotype_mapper.iter().enumerate() {
            let likelihood = haplotype_likelihoods[old_read_index][h];
            if likelihood > allele_likelihoods[r][allele_index] {
                allele_likelihoods[r][allele_index] = likelihood;
            }
        }
    }
    allele_likelihoods
}

/// Per-read log likelihood of every unordered diploid genotype.
fn read_likelihoods_by_genotype(
    allele_likelihoods: &[Vec<f64>],
    allele_count: usize,
) -> Vec<Vec<f64>> {
    let log10_frequency = std::f64::consts::LOG10_2;
    let mut result = Vec::with_capacity(allele_count * (allele_count + 1) / 2);
    for a1 in 0..allele_count {
        for a2 in a1..allele_count {
            let row: Vec<f64> = if a1 == a2 {
                allele_likelihoods
                    .iter()
                    .map(|likelihoods| likelihoods[a1] + log10_frequency)
                    .collect()
            } else {
                allele_likelihoods
                    .iter()
                    .map(|likelihoods| {
                        math::approximate_log10_sum_log10(likelihoods[a1], likelihoods[a2])
                    })
                    .collect()
            };
            result.push(row);
        }
    }
    result
}

fn genotype_likelihoods(allele_likelihoods: &[Vec<f64>], allele_count: usize) -> Vec<f64> {
    let by_genotype = read_likelihoods_by_genotype(allele_likelihoods, allele_count);
    let denominator = allele_likelihoods.len() as f64 * std::f64::consts::LOG10_2;
    by_genotype
        .iter()
        .map(|row| row.iter().sum::<f64>() - denominator)
        .collect()
}

/// Index of the best genotype and the phred-scaled gap to the runner-up,
/// capped at 99.
fn genotype_quality_and_max_index(genotypes: &[f64]) -> (usize, usize) {
    let (mut max, mut second_max, mut max_index) = if genotypes[0] > genotypes[1] {
        (genotypes[0], genotypes[1], 0)
    } else {
        (genotypes[1], genotypes[0], 1)
    };
    for (i, &value) in genotypes.iter().enumerate().skip(2) {
        if value >= max {
            second_max = max;
            max = value;
            max_index = i;
        } else if value > second_max {
            second_max = value;
        }
    }
    let quality = ((-10.0 * (second_max - max)).round() as usize).min(MAX_GENOTYPE_QUALITY);
    (max_index, quality)
}

/// Scan every event locus inside the origin region and emit the variants
/// whose best genotype is non-reference with sufficient quality.
pub fn assign_genotype_likelihoods(
    reads: &[SamRecord],
    haplotypes: &mut [Haplotype],
    haplotype_likelihoods: &[Vec<f64>],
    reference: &[u8],
    padded_region: &Interval,
    origin_region: &Interval,
) -> Result<Vec<Variant>> {
    let event_begins = set_events_for_haplotypes(haplotypes, reference, padded_region)?;

    let mut variants = Vec::new();
    for begin in event_begins {
        if begin < origin_region.begin || begin >= origin_region.end {
            continue;
        }
        let mut events = events_at_locus(begin, haplotypes);
        if events.is_empty() {
            continue;
        }
        replace_span_dels(&mut events, reference[begin - padded_region.begin], begin);

        let (alleles, alleles_loc) = compatible_alleles(&events);
        let allele_count = alleles.len();
        if allele_count > MAX_ALLELE_COUNT {
            continue;
        }

        let allele_map = allele_mapper(&alleles, begin, haplotypes);
        let hap_map = haplotype_mapper(&allele_map, haplotypes.len());
        let overlap = alleles_loc.expand_within_contig(ALLELE_EXTENSION);
        let allele_likelihoods = marginalize(
            &hap_map,
            allele_count,
            reads,
            haplotype_likelihoods,
            &overlap,
        );
        let genotypes = genotype_likelihoods(&allele_likelihoods, allele_count);
        let (genotype_index, genotype_quality) = genotype_quality_and_max_index(&genotypes);
        if genotype_index == 0 || genotype_quality < MIN_GENOTYPE_QUALITY {
            continue;
        }

        let genotype = GENOTYPE_PAIRS[allele_count][genotype_index];
        variants.push(Variant {
            location: alleles_loc,
            alleles,
            genotype,
            genotype_quality,
            ..Variant::default()
        });
    }
    Ok(variants)
}
