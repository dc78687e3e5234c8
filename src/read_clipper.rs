// Read clipping ahead of assembly.
//
// Clipping trims SEQ and QUAL only. Except for the soft-clip revert, the
// CIGAR keeps its original reference span, so interval queries made after
// clipping still see the read's pre-clip placement.

use crate::cigar::CigarOp;
use crate::interval::Interval;
use crate::sam::SamRecord;

/// Turn soft-clipped bases back into aligned ones on the anchored side of
/// the read, and hard-clip them on the far side. For a forward-strand read a
/// leading S run becomes M (shifting POS back, when there is enough upstream
/// reference) and a trailing S run is cut off; a reverse-strand read is the
/// mirror image.
pub fn revert_soft_clipped_bases(read: &mut SamRecord) {
    if read.cigar.is_empty() {
        return;
    }

    if read.is_reverse_strand() {
        if let Some(front) = read.cigar.first() {
            if front.op == CigarOp::S {
                read.seq.drain(..front.len.min(read.seq.len()));
                read.qual.drain(..front.len.min(read.qual.len()));
            }
        }
        if let Some(back) = read.cigar.last_mut() {
            if back.op == CigarOp::S {
                back.op = CigarOp::M;
            }
        }
    } else {
        let alignment_begin = read.alignment_begin();
        if let Some(front) = read.cigar.first_mut() {
            if front.op == CigarOp::S && alignment_begin >= front.len {
                let front_len = front.len;
                front.op = CigarOp::M;
                read.pos = (alignment_begin - front_len + 1) as u32;
            }
        }
        if let Some(back) = read.cigar.last() {
            if back.op == CigarOp::S {
                read.seq.truncate(read.seq.len().saturating_sub(back.len));
                read.qual.truncate(read.qual.len().saturating_sub(back.len));
            }
        }
    }
}

/// Cut the read's bases down to the part of its alignment inside `interval`.
/// A clip request past the read end empties the read; the minimum-length
/// filter drops it afterwards.
pub fn hard_clip_to_interval(read: &mut SamRecord, interval: &Interval) {
    debug_assert_eq!(read.rname, interval.contig);

    let alignment_begin = read.alignment_begin();
    let alignment_end = read.alignment_end();
    if alignment_begin < interval.begin {
        let clip_size = (interval.begin - alignment_begin).min(read.seq.len());
        read.seq.drain(..clip_size);
        read.qual.drain(..clip_size);
    }
    if alignment_end > interval.end {
        let clip_size = alignment_end - interval.end;
        read.seq.truncate(read.seq.len().saturating_sub(clip_size));
        read.qual.truncate(read.qual.len().saturating_sub(clip_size));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(flag: u16, pos: u32, cigar: &str, seq: &str) -> SamRecord {
        SamRecord {
            qname: "read".to_string(),
            flag,
            rname: "chr1".to_string(),
            pos,
            mapq: 60,
            cigar: cigar.parse().unwrap(),
            rnext: "=".to_string(),
            pnext: 0,
            tlen: 0,
            seq: seq.as_bytes().to_vec(),
            qual: vec![b'I'; seq.len()],
        }
    }

    #[test]
    fn test_revert_forward_leading_clip_becomes_match() {
        let mut read = record(0, 11, "4S6M", "AAAACCCCCC");
        revert_soft_clipped_bases(&mut read);
        assert_eq!(read.cigar.to_string(), "4M6M");
        assert_eq!(read.pos, 7);
        assert_eq!(read.seq.len(), 10);
    }

    #[test]
    fn test_revert_forward_leading_clip_blocked_at_contig_start() {
        // Not enough upstream reference to un-clip.
        let mut read = record(0, 3, "4S6M", "AAAACCCCCC");
        revert_soft_clipped_bases(&mut read);
        assert_eq!(read.cigar.to_string(), "4S6M");
        assert_eq!(read.pos, 3);
    }

    #[test]
    fn test_revert_forward_trailing_clip_hard_clipped() {
        let mut read = record(0, 11, "6M4S", "CCCCCCAAAA");
        revert_soft_clipped_bases(&mut read);
        assert_eq!(read.seq, b"CCCCCC");
        assert_eq!(read.qual.len(), 6);
        // Trailing S stays in the cigar; SEQ/QUAL are what downstream uses.
        assert_eq!(read.cigar.to_string(), "6M4S");
    }

    #[test]
    fn test_revert_reverse_strand_mirrors() {
        let mut read = record(0x10, 11, "4S6M4S", "AAAACCCCCCTTTT");
        revert_soft_clipped_bases(&mut read);
        // Leading S hard-clipped, trailing S reverted to M.
        assert_eq!(read.seq, b"CCCCCCTTTT");
        assert_eq!(read.cigar.to_string(), "4S6M4M");
        assert_eq!(read.pos, 11);
    }

    #[test]
    fn test_hard_clip_both_sides() {
        let mut read = record(0, 1, "20M", "ACGTACGTACGTACGTACGT");
        let window = Interval::new("chr1", 5, 15).unwrap();
        hard_clip_to_interval(&mut read, &window);
        assert_eq!(read.seq, b"CGTACGTACG");
        assert_eq!(read.qual.len(), 10);
    }

    #[test]
    fn test_hard_clip_contained_read_untouched() {
        let mut read = record(0, 8, "5M", "ACGTA");
        let window = Interval::new("chr1", 0, 100).unwrap();
        hard_clip_to_interval(&mut read, &window);
        assert_eq!(read.seq, b"ACGTA");
    }

    #[test]
    fn test_hard_clip_past_read_end_empties() {
        // Deletion-heavy cigar: reference span far exceeds the base count.
        let mut read = record(0, 1, "5M90D5M", "ACGTAACGTA");
        let window = Interval::new("chr1", 0, 4).unwrap();
        hard_clip_to_interval(&mut read, &window);
        assert!(read.seq.is_empty());
    }
}
