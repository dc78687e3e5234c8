// Candidate haplotype produced by the assembly graph.

use crate::cigar::Cigar;
use crate::variant::Variant;
use std::collections::BTreeMap;

/// A full-length candidate sequence spanning the analyzed window, with its
/// placement on the reference and the variation events that placement
/// implies. `event_map` is keyed by absolute reference begin.
#[derive(Debug, Clone)]
pub struct Haplotype {
    pub bases: Vec<u8>,
    pub event_map: BTreeMap<usize, Variant>,
    pub cigar: Cigar,
    pub alignment_begin_wrt_ref: usize,
    pub score: f64,
    pub rank: usize,
}

impl Haplotype {
    pub fn new(bases: Vec<u8>, score: f64) -> Self {
        Haplotype {
            bases,
            event_map: BTreeMap::new(),
            cigar: Cigar::new(),
            alignment_begin_wrt_ref: 0,
            score,
            rank: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Events of this haplotype overlapping the locus at `begin`: every
    /// event starting at or before the locus whose end reaches past it.
    pub fn overlapping_events(&self, begin: usize) -> Vec<Variant> {
        self.event_map
            .range(..=begin)
            .filter(|(_, event)| event.location.end > begin)
            .map(|(_, event)| event.clone())
            .collect()
    }
}
