// Shared fixtures for integration tests: a 300 bp synthetic contig with no
// repeated 25-mer, and reads carrying a homozygous substitution.

#![allow(dead_code)]

use ferrous_call::sam::SamRecord;

/// Synthetic contig; every 25-mer occurs once, so assembly accepts K=25.
pub const REFERENCE: &str = "GCTAAAGACAATTACATAACATACACGTCAGCACGAAACTTGTTGGCCCAGTGTGAATCGCTTAAGGGTTAAGTAAGTGTGATGCATACGCCTTTACTTGCTGTGTCCACCCCATCGGACTGGCATTTTTATTACACTCAGAAACAGAACTCGGGTAATTTTGACAGGTCACGCAGAGGCGCGCCCTCCTGAAGTGCGTGGACACTCGCTATGAATCTCTGATTTACCCACTCTGCCAAACTCCAGCGCGGTCAGTTCCATCACCCTAAGTAACCGAATAATGCGTTCGCTCTATTGACT";

pub const CONTIG: &str = "synthref";

/// 0-based position of the planted substitution.
pub const SNV_POS: usize = 150;
pub const SNV_REF: char = 'T';
pub const SNV_ALT: char = 'A';

/// The contig with the substitution applied.
pub fn alt_reference() -> String {
    let mut seq: Vec<u8> = REFERENCE.as_bytes().to_vec();
    seq[SNV_POS] = SNV_ALT as u8;
    String::from_utf8(seq).unwrap()
}

/// 0-based starts of the simulated 100 bp reads; all of them cover SNV_POS.
pub fn read_starts() -> Vec<usize> {
    (60..=140).step_by(5).collect()
}

/// A clean forward-strand 100 bp read of the variant contig.
pub fn simulated_read(start: usize) -> SamRecord {
    let bases = &alt_reference()[start..start + 100];
    SamRecord {
        qname: format!("read{}", start),
        flag: 0,
        rname: CONTIG.to_string(),
        pos: (start + 1) as u32,
        mapq: 60,
        cigar: "100M".parse().unwrap(),
        rnext: "=".to_string(),
        pnext: 0,
        tlen: 0,
        seq: bases.as_bytes().to_vec(),
        qual: vec![b'I'; 100],
    }
}

pub fn simulated_reads() -> Vec<SamRecord> {
    read_starts().into_iter().map(simulated_read).collect()
}

/// The simulated reads as SAM text, headers included.
pub fn sam_text() -> String {
    let mut text = format!("@HD\tVN:1.6\tSO:coordinate\n@SQ\tSN:{}\tLN:300\n", CONTIG);
    for read in simulated_reads() {
        text.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            read.qname,
            read.flag,
            read.rname,
            read.pos,
            read.mapq,
            read.cigar,
            read.rnext,
            read.pnext,
            read.tlen,
            String::from_utf8(read.seq.clone()).unwrap(),
            String::from_utf8(read.qual.clone()).unwrap(),
        ));
    }
    text
}

pub fn fasta_text() -> String {
    // 60-column wrapping, as a FASTA writer would emit.
    let mut text = format!(">{} synthetic test contig\n", CONTIG);
    let seq = REFERENCE.as_bytes();
    for chunk in seq.chunks(60) {
        text.push_str(std::str::from_utf8(chunk).unwrap());
        text.push('\n');
    }
    text
}
