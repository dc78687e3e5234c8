// Smith-Waterman aligner used to place assembled haplotypes onto the
// reference slice (and reads onto haplotypes where needed).
//
// Scalar affine-gap alignment over byte sequences. The traceback matrix
// stores gap run lengths rather than single steps: 0 is a diagonal move, a
// positive value is a deletion run of that length, a negative value an
// insertion run. Unaligned prefix/suffix bases of the query are reported as
// soft clips.

use crate::cigar::{Cigar, CigarElement, CigarOp};
use crate::error::{CallError, Result};

/// Scoring parameter pack: match reward, mismatch/gap penalties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwParameters {
    pub w_match: i32,
    pub w_mismatch: i32,
    pub w_open: i32,
    pub w_extend: i32,
}

impl SwParameters {
    // match=1, mismatch = -1/3, gap=-(1+k/3)
    pub const ORIGINAL_DEFAULT: SwParameters = SwParameters::new(3, -1, -4, -3);
    pub const STANDARD_NGS: SwParameters = SwParameters::new(25, -50, -110, -6);
    pub const NEW_SW_PARAMETERS: SwParameters = SwParameters::new(200, -150, -260, -11);
    pub const ALIGNMENT_TO_BEST_HAPLOTYPE: SwParameters = SwParameters::new(10, -15, -30, -5);

    pub const fn new(w_match: i32, w_mismatch: i32, w_open: i32, w_extend: i32) -> Self {
        SwParameters {
            w_match,
            w_mismatch,
            w_open,
            w_extend,
        }
    }
}

/// Mismatch count up to which an equal-length pair is taken as an all-match
/// alignment without running the full matrix.
const MINIMAL_MISMATCH_TO_TOLERANCE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Match,
    Insertion,
    Deletion,
    Clip,
}

impl State {
    fn op(self) -> CigarOp {
        match self {
            State::Match => CigarOp::M,
            State::Insertion => CigarOp::I,
            State::Deletion => CigarOp::D,
            State::Clip => CigarOp::S,
        }
    }
}

/// Align `alt` onto `reference`, returning the 0-based offset on the
/// reference where the alignment begins and the cigar describing `alt`
/// relative to the reference from that offset.
pub fn align(reference: &[u8], alt: &[u8], params: SwParameters) -> Result<(usize, Cigar)> {
    if reference.is_empty() || alt.is_empty() {
        return Err(CallError::InvalidInput(
            "non-empty sequences are required for the SW aligner".to_string(),
        ));
    }

    if is_all_match(reference, alt) {
        let cigar = Cigar::from_element(CigarElement::new(reference.len(), CigarOp::M));
        return Ok((0, cigar));
    }

    let width = alt.len() + 1;
    let mut score = vec![0i32; (reference.len() + 1) * width];
    let mut trace = vec![0i32; (reference.len() + 1) * width];
    calculate_matrix(reference, alt, &mut score, &mut trace, params);
    Ok(calculate_cigar(
        &score,
        &trace,
        reference.len(),
        alt.len(),
    ))
}

fn is_all_match(reference: &[u8], alt: &[u8]) -> bool {
    if alt.len() != reference.len() {
        return false;
    }
    let mut mismatch = 0;
    for (r, a) in reference.iter().zip(alt) {
        if r != a {
            mismatch += 1;
            if mismatch > MINIMAL_MISMATCH_TO_TOLERANCE {
                return false;
            }
        }
    }
    true
}

fn calculate_matrix(
    reference: &[u8],
    alt: &[u8],
    score: &mut [i32],
    trace: &mut [i32],
    params: SwParameters,
) {
    let row_size = reference.len() + 1;
    let col_size = alt.len() + 1;
    let width = col_size;

    // Best running gap score and its length, per column (gaps in the
    // reference direction) and per row (gaps in the query direction).
    let mut gap_size_down = vec![0i32; col_size + 1];
    let mut best_gap_down = vec![i32::MIN / 2; col_size + 1];
    let mut gap_size_right = vec![0i32; row_size + 1];
    let mut best_gap_right = vec![i32::MIN / 2; row_size + 1];

    let SwParameters {
        w_match,
        w_mismatch,
        w_open,
        w_extend,
    } = params;

    for i in 1..row_size {
        for j in 1..col_size {
            // step diag
            let step_diag = score[(i - 1) * width + (j - 1)]
                + if reference[i - 1] == alt[j - 1] {
                    w_match
                } else {
                    w_mismatch
                };

            // step down
            let gap_open_down = score[(i - 1) * width + j] + w_open;
            best_gap_down[j] += w_extend;
            if gap_open_down > best_gap_down[j] {
                best_gap_down[j] = gap_open_down;
                gap_size_down[j] = 1;
            } else {
                gap_size_down[j] += 1;
            }
            let step_down = best_gap_down[j];
            let step_down_size = gap_size_down[j];

            // step right
            let gap_open_right = score[i * width + (j - 1)] + w_open;
            best_gap_right[i] += w_extend;
            if gap_open_right > best_gap_right[i] {
                best_gap_right[i] = gap_open_right;
                gap_size_right[i] = 1;
            } else {
                gap_size_right[i] += 1;
            }
            let step_right = best_gap_right[i];
            let step_right_size = gap_size_right[i];

            // priority on ties: diagonal, then down, then right
            let cell = i * width + j;
            if step_diag >= step_down && step_diag >= step_right {
                score[cell] = step_diag;
                trace[cell] = 0;
            } else if step_down >= step_right {
                score[cell] = step_down;
                trace[cell] = step_down_size;
            } else {
                score[cell] = step_right;
                trace[cell] = -step_right_size;
            }
        }
    }
}

fn calculate_cigar(score: &[i32], trace: &[i32], ref_size: usize, alt_size: usize) -> (usize, Cigar) {
    let width = alt_size + 1;

    // Largest score on the rightmost column; >= combined with the traversal
    // direction picks the latest (diagonal-closest) cell on ties.
    let mut max_score = i32::MIN;
    let mut segment_length = 0usize;
    let mut pos_i = 0usize;
    for i in 1..=ref_size {
        let cur_score = score[i * width + alt_size];
        if cur_score >= max_score {
            max_score = cur_score;
            pos_i = i;
        }
    }

    // A larger score on the bottom row wins; the bases of the query past the
    // chosen column become a trailing soft clip.
    let mut pos_j = alt_size;
    let abs_diff = |x: usize, y: usize| if x > y { x - y } else { y - x };
    for j in 1..=alt_size {
        let cur_score = score[ref_size * width + j];
        if cur_score > max_score
            || (cur_score == max_score && abs_diff(ref_size, j) < abs_diff(pos_i, pos_j))
        {
            max_score = cur_score;
            pos_i = ref_size;
            pos_j = j;
            segment_length = alt_size - j;
        }
    }

    let mut segments: Vec<(usize, State)> = Vec::new();
    if segment_length > 0 {
        segments.push((segment_length, State::Clip));
        segment_length = 0;
    }

    let mut state = State::Match;
    loop {
        let cur_trace = trace[pos_i * width + pos_j];
        let (new_state, step_size) = if cur_trace > 0 {
            (State::Deletion, cur_trace as usize)
        } else if cur_trace < 0 {
            (State::Insertion, (-cur_trace) as usize)
        } else {
            (State::Match, 1)
        };

        match new_state {
            State::Match => {
                pos_i -= 1;
                pos_j -= 1;
            }
            State::Insertion => pos_j -= step_size,
            State::Deletion => pos_i -= step_size,
            State::Clip => {}
        }

        if new_state == state {
            segment_length += step_size;
        } else {
            if segment_length > 0 {
                segments.push((segment_length, state));
            }
            segment_length = step_size;
            state = new_state;
        }

        if pos_i == 0 || pos_j == 0 {
            break;
        }
    }

    if segment_length > 0 {
        segments.push((segment_length, state));
    }
    let alignment_offset = pos_i;
    if pos_j > 0 {
        segments.push((pos_j, State::Clip));
    }

    let mut cigar = Cigar::new();
    for (len, seg_state) in segments {
        cigar.push(len, seg_state.op());
    }
    cigar.reverse();
    (alignment_offset, cigar)
}
