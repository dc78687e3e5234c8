// Tests for src/sam.rs

#[cfg(test)]
mod tests {
    use crate::sam::SamRecord;

    const LINE: &str = "read1\t99\tchr1\t100\t60\t5S95M\t=\t300\t250\tACGTACGTAC\tIIIIIIIIII";

    #[test]
    fn test_parse_positional_fields() {
        let record: SamRecord = LINE.parse().unwrap();
        assert_eq!(record.qname, "read1");
        assert_eq!(record.flag, 99);
        assert_eq!(record.rname, "chr1");
        assert_eq!(record.pos, 100);
        assert_eq!(record.mapq, 60);
        assert_eq!(record.cigar.to_string(), "5S95M");
        assert_eq!(record.rnext, "=");
        assert_eq!(record.pnext, 300);
        assert_eq!(record.tlen, 250);
        assert_eq!(record.seq, b"ACGTACGTAC");
        assert_eq!(record.qual, b"IIIIIIIIII");
    }

    #[test]
    fn test_parse_ignores_optional_tags() {
        let with_tags = format!("{}\tNM:i:0\tMD:Z:95", LINE);
        let record: SamRecord = with_tags.parse().unwrap();
        assert_eq!(record.qual, b"IIIIIIIIII");
    }

    #[test]
    fn test_parse_rejects_truncated_line() {
        assert!("read1\t99\tchr1".parse::<SamRecord>().is_err());
    }

    #[test]
    fn test_parse_rejects_bad_flag() {
        let bad = LINE.replace("\t99\t", "\tff\t");
        assert!(bad.parse::<SamRecord>().is_err());
    }

    #[test]
    fn test_flag_predicates() {
        // 99 = paired + proper pair + mate reverse + first of pair
        let record: SamRecord = LINE.parse().unwrap();
        assert!(record.is_paired());
        assert!(record.is_proper_pair());
        assert!(!record.is_unmapped());
        assert!(!record.is_reverse_strand());
        assert!(record.is_mate_reverse_strand());
        assert!(record.is_first_of_pair());
        assert!(!record.is_second_of_pair());
        assert!(!record.is_secondary_alignment());
        assert!(!record.is_duplicate());
        assert!(!record.is_supplementary_alignment());
    }

    #[test]
    fn test_alignment_coordinates() {
        let record: SamRecord = LINE.parse().unwrap();
        // POS is 1-based; the 5S prefix does not consume reference.
        assert_eq!(record.alignment_begin(), 99);
        assert_eq!(record.alignment_end(), 99 + 95);
        let interval = record.interval();
        assert_eq!(interval.contig, "chr1");
        assert_eq!((interval.begin, interval.end), (99, 194));
    }
}
