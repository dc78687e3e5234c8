// Pair-HMM read-vs-haplotype likelihood engine.
//
// A three-state (match/insertion/deletion) HMM with fixed transition
// probabilities computes log10 P(read | haplotype) for every pair. Rows of
// the result matrix are independent, so the reads are distributed over rayon
// workers; every worker owns its DP scratch matrices and the collected rows
// keep read order, making parallel results bit-identical to serial ones.

use crate::haplotype::Haplotype;
use crate::math;
use crate::sam::SamRecord;
use rayon::prelude::*;

const M_TO_M: usize = 0;
const M_TO_I: usize = 1;
const M_TO_D: usize = 2;
const I_TO_M: usize = 3;
const I_TO_I: usize = 4;
const D_TO_M: usize = 5;
const D_TO_D: usize = 6;

pub type TransitionProbs = [f64; 7];

/// Default transition vector, ordered M->M, M->I, M->D, I->M, I->I, D->M, D->D.
pub const ORIGINAL_DEFAULT: TransitionProbs = [0.9998, 0.0001, 0.0001, 0.9, 0.1, 0.9, 0.1];

const TRISTATE_CORRECTION: f64 = 3.0;
const MAXIMUM_BEST_ALT_LIKELIHOOD_DIFFERENCE: f64 = -4.5;
const EXPECTED_ERROR_RATE_PER_BASE: f64 = 0.02;
const LOG10_QUALITY_PER_BASE: f64 = -4.0;
const MAXIMUM_EXPECTED_ERROR_PER_READ: f64 = 2.0;

lazy_static::lazy_static! {
    /// Probabilities are scaled by 2^1020 to keep the recurrence inside the
    /// double range; the final likelihood subtracts it back out in log space.
    static ref INITIAL_CONDITION: f64 = 2f64.powi(1020);
    static ref INITIAL_CONDITION_LOG10: f64 = INITIAL_CONDITION.log10();
}

/// Per-worker DP state, sized once for the window's longest read and
/// haplotype and reused across pairs.
struct Workspace {
    width: usize,
    match_matrix: Vec<f64>,
    insertion_matrix: Vec<f64>,
    deletion_matrix: Vec<f64>,
    priors: Vec<f64>,
    previous_haplotype_length: usize,
}

impl Workspace {
    fn new(max_read_len: usize, max_haplotype_len: usize) -> Self {
        let width = max_haplotype_len + 1;
        let cells = (max_read_len + 1) * width;
        Workspace {
            width,
            match_matrix: vec![0.0; cells],
            insertion_matrix: vec![0.0; cells],
            deletion_matrix: vec![0.0; cells],
            priors: vec![0.0; cells],
            previous_haplotype_length: 0,
        }
    }

    fn likelihood(&mut self, read: &SamRecord, haplotype: &[u8], t: &TransitionProbs) -> f64 {
        let m = read.len();
        let n = haplotype.len();
        let w = self.width;

        // The D row seeds the alignment as equally likely to start at any
        // haplotype position; it only depends on the haplotype length.
        if self.previous_haplotype_length == 0 || self.previous_haplotype_length != n {
            let initial_value = *INITIAL_CONDITION / n as f64;
            for j in 0..=n {
                self.deletion_matrix[j] = initial_value;
            }
            self.previous_haplotype_length = n;
        }

        for i in 0..m {
            let base = read.seq[i];
            let error_prob = math::qual_to_error_prob(read.qual[i]);
            let match_prior = 1.0 - error_prob;
            let mismatch_prior = error_prob / TRISTATE_CORRECTION;
            for j in 0..n {
                let hap_base = haplotype[j];
                self.priors[(i + 1) * w + (j + 1)] =
                    if base == hap_base || base == b'N' || hap_base == b'N' {
                        match_prior
                    } else {
                        mismatch_prior
                    };
            }
        }

        for i in 1..=m {
            for j in 1..=n {
                let cell = i * w + j;
                let diag = (i - 1) * w + (j - 1);
                let up = (i - 1) * w + j;
                let left = i * w + (j - 1);
                self.match_matrix[cell] = self.priors[cell]
                    * (self.match_matrix[diag] * t[M_TO_M]
                        + self.insertion_matrix[diag] * t[I_TO_M]
                        + self.deletion_matrix[diag] * t[D_TO_M]);
                self.insertion_matrix[cell] = self.match_matrix[up] * t[M_TO_I]
                    + self.insertion_matrix[up] * t[I_TO_I];
                self.deletion_matrix[cell] = self.match_matrix[left] * t[M_TO_D]
                    + self.deletion_matrix[left] * t[D_TO_D];
            }
        }

        let mut final_sum_prob = 0.0;
        for j in 1..=n {
            final_sum_prob += self.match_matrix[m * w + j] + self.deletion_matrix[m * w + j];
        }
        final_sum_prob.log10() - *INITIAL_CONDITION_LOG10
    }
}

/// Cap every base quality by the read's mapping quality.
fn modify_read_qualities(read: &mut SamRecord) {
    let cap = (u16::from(math::ASCII_OFFSET) + read.mapq).min(255) as u8;
    for qual in &mut read.qual {
        *qual = (*qual).min(cap);
    }
}

/// Clamp each row up to `best - 4.5` and drop reads whose best likelihood
/// falls under the expected-error threshold. Removal runs in reverse index
/// order so surviving indices stay aligned between reads and matrix rows.
fn normalize_likelihoods_and_filter_poorly_modeled_reads(
    reads: &mut Vec<SamRecord>,
    log_likelihoods: &mut Vec<Vec<f64>>,
) {
    let mut remove_indices = Vec::new();
    for (i, row) in log_likelihoods.iter_mut().enumerate() {
        let best_likelihood = row.iter().copied().fold(f64::MIN, f64::max);
        let cap_likelihood = best_likelihood + MAXIMUM_BEST_ALT_LIKELIHOOD_DIFFERENCE;
        for likelihood in row.iter_mut() {
            if *likelihood < cap_likelihood {
                *likelihood = cap_likelihood;
            }
        }

        let likelihood_threshold = MAXIMUM_EXPECTED_ERROR_PER_READ
            .min((reads[i].len() as f64 * EXPECTED_ERROR_RATE_PER_BASE).ceil())
            * LOG10_QUALITY_PER_BASE;
        if best_likelihood < likelihood_threshold {
            remove_indices.push(i);
        }
    }

    for &i in remove_indices.iter().rev() {
        log_likelihoods.remove(i);
        reads.remove(i);
    }
}

/// Compute the reads-by-haplotypes log10 likelihood matrix, then normalize
/// rows and drop poorly modeled reads in place.
pub fn compute_likelihoods(
    haplotypes: &[Haplotype],
    reads: &mut Vec<SamRecord>,
    t: &TransitionProbs,
) -> Vec<Vec<f64>> {
    for read in reads.iter_mut() {
        modify_read_qualities(read);
    }

    let max_read_len = reads.iter().map(SamRecord::len).max().unwrap_or(0);
    let max_haplotype_len = haplotypes.iter().map(Haplotype::len).max().unwrap_or(0);

    let mut log_likelihoods: Vec<Vec<f64>> = reads
        .par_iter()
        .map_init(
            || Workspace::new(max_read_len, max_haplotype_len),
            |workspace, read| {
                haplotypes
                    .iter()
                    .map(|haplotype| workspace.likelihood(read, &haplotype.bases, t))
                    .collect()
            },
        )
        .collect();

    normalize_likelihoods_and_filter_poorly_modeled_reads(reads, &mut log_likelihoods);
    log_likelihoods
}
