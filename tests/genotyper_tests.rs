// Genotyper behavior on hand-built haplotypes and likelihood matrices.

use ferrous_call::genotyper::assign_genotype_likelihoods;
use ferrous_call::haplotype::Haplotype;
use ferrous_call::interval::Interval;
use ferrous_call::sam::SamRecord;

const REF: &[u8] = b"ACGTTGCAGTCACGTTGCAGTCAACGGTAC";

fn haplotype(bases: Vec<u8>, cigar: &str) -> Haplotype {
    let mut h = Haplotype::new(bases, 0.0);
    h.cigar = cigar.parse().unwrap();
    h.alignment_begin_wrt_ref = 0;
    h
}

fn reference_haplotype() -> Haplotype {
    haplotype(REF.to_vec(), "30M")
}

fn snv_haplotype(pos: usize, base: u8) -> Haplotype {
    let mut bases = REF.to_vec();
    bases[pos] = base;
    haplotype(bases, "30M")
}

fn window() -> Interval {
    Interval {
        contig: "chr1".to_string(),
        begin: 0,
        end: 30,
    }
}

fn reads(count: usize) -> Vec<SamRecord> {
    (0..count)
        .map(|i| SamRecord {
            qname: format!("read{}", i),
            flag: 0,
            rname: "chr1".to_string(),
            pos: 1,
            mapq: 60,
            cigar: "20M".parse().unwrap(),
            rnext: "=".to_string(),
            pnext: 0,
            tlen: 0,
            seq: vec![b'A'; 20],
            qual: vec![b'I'; 20],
        })
        .collect()
}

#[test]
fn homozygous_snv_is_called() {
    // Haplotype 0 carries C>T at position 10; every read prefers it.
    let mut haplotypes = vec![snv_haplotype(10, b'T'), reference_haplotype()];
    let likelihoods = vec![vec![-0.5, -5.0]; 6];
    let variants = assign_genotype_likelihoods(
        &reads(6),
        &mut haplotypes,
        &likelihoods,
        REF,
        &window(),
        &window(),
    )
    .unwrap();

    assert_eq!(variants.len(), 1);
    let v = &variants[0];
    assert_eq!((v.location.begin, v.location.end), (10, 11));
    assert_eq!(v.alleles, vec!["C".to_string(), "T".to_string()]);
    assert_eq!(v.genotype, (1, 1));
    assert_eq!(v.genotype_quality, 18);
}

#[test]
fn heterozygous_snv_is_called() {
    let mut haplotypes = vec![snv_haplotype(10, b'T'), reference_haplotype()];
    let mut likelihoods = vec![vec![-0.5, -5.0]; 3];
    likelihoods.extend(vec![vec![-5.0, -0.5]; 3]);
    let variants = assign_genotype_likelihoods(
        &reads(6),
        &mut haplotypes,
        &likelihoods,
        REF,
        &window(),
        &window(),
    )
    .unwrap();

    assert_eq!(variants.len(), 1);
    assert_eq!(variants[0].genotype, (0, 1));
    assert_eq!(variants[0].genotype_quality, 99);
}

#[test]
fn homozygous_reference_is_skipped() {
    let mut haplotypes = vec![snv_haplotype(10, b'T'), reference_haplotype()];
    let likelihoods = vec![vec![-5.0, -0.5]; 6];
    let variants = assign_genotype_likelihoods(
        &reads(6),
        &mut haplotypes,
        &likelihoods,
        REF,
        &window(),
        &window(),
    )
    .unwrap();
    assert!(variants.is_empty());
}

#[test]
fn low_genotype_quality_is_skipped() {
    // A single supporting read leaves the het/hom call too close.
    let mut haplotypes = vec![snv_haplotype(10, b'T'), reference_haplotype()];
    let likelihoods = vec![vec![-0.5, -5.0]];
    let variants = assign_genotype_likelihoods(
        &reads(1),
        &mut haplotypes,
        &likelihoods,
        REF,
        &window(),
        &window(),
    )
    .unwrap();
    assert!(variants.is_empty());
}

#[test]
fn deletion_and_spanning_star_allele() {
    // Haplotype 0 deletes ref[8..13]; haplotype 1 has a SNV inside the
    // deleted span; haplotype 2 is the reference.
    let mut deleted = REF[..8].to_vec();
    deleted.extend_from_slice(&REF[13..]);
    let mut haplotypes = vec![
        haplotype(deleted, "8M5D17M"),
        snv_haplotype(10, b'T'),
        reference_haplotype(),
    ];
    let likelihoods = vec![vec![-0.5, -5.0, -5.0]; 6];
    let variants = assign_genotype_likelihoods(
        &reads(6),
        &mut haplotypes,
        &likelihoods,
        REF,
        &window(),
        &window(),
    )
    .unwrap();

    assert_eq!(variants.len(), 2);

    // The deletion itself, anchored one base left.
    let del = &variants[0];
    assert_eq!((del.location.begin, del.location.end), (7, 13));
    assert_eq!(del.alleles, vec!["AGTCAC".to_string(), "A".to_string()]);
    assert_eq!(del.genotype, (1, 1));
    assert_eq!(del.genotype_quality, 18);

    // The SNV locus: the deletion spans it, so the deletion haplotype maps
    // to the `*` placeholder allele, which wins the genotype.
    let spanned = &variants[1];
    assert_eq!((spanned.location.begin, spanned.location.end), (10, 11));
    assert_eq!(
        spanned.alleles,
        vec!["C".to_string(), "*".to_string(), "T".to_string()]
    );
    assert_eq!(spanned.genotype, (1, 1));
    assert_eq!(spanned.genotype_quality, 18);
}

#[test]
fn alleles_normalized_to_longest_reference() {
    // A deletion and a SNV anchored at the same locus: the SNV's ALT is
    // rewritten against the deletion's longer REF allele.
    let mut deleted = REF[..8].to_vec();
    deleted.extend_from_slice(&REF[13..]);
    let mut haplotypes = vec![
        haplotype(deleted, "8M5D17M"),
        snv_haplotype(7, b'C'),
        reference_haplotype(),
    ];
    let likelihoods = vec![vec![-0.5, -5.0, -5.0]; 6];
    let variants = assign_genotype_likelihoods(
        &reads(6),
        &mut haplotypes,
        &likelihoods,
        REF,
        &window(),
        &window(),
    )
    .unwrap();

    assert_eq!(variants.len(), 1);
    let v = &variants[0];
    assert_eq!((v.location.begin, v.location.end), (7, 13));
    assert_eq!(
        v.alleles,
        vec!["AGTCAC".to_string(), "A".to_string(), "CGTCAC".to_string()]
    );
    // The deletion haplotype carries all the likelihood mass.
    assert_eq!(v.genotype, (1, 1));
}

#[test]
fn insertion_event_is_anchored_left() {
    let mut inserted = REF[..10].to_vec();
    inserted.extend_from_slice(b"TTT");
    inserted.extend_from_slice(&REF[10..27]);
    let mut haplotypes = vec![haplotype(inserted, "10M3I17M"), reference_haplotype()];
    let likelihoods = vec![vec![-0.5, -5.0]; 6];
    let variants = assign_genotype_likelihoods(
        &reads(6),
        &mut haplotypes,
        &likelihoods,
        REF,
        &window(),
        &window(),
    )
    .unwrap();

    assert_eq!(variants.len(), 1);
    let v = &variants[0];
    assert_eq!((v.location.begin, v.location.end), (9, 10));
    assert_eq!(v.alleles, vec!["T".to_string(), "TTTT".to_string()]);
    assert_eq!(v.genotype, (1, 1));
}

#[test]
fn leading_indel_without_anchor_is_skipped() {
    // An insertion at reference position zero has no left anchor base and
    // produces no event.
    let mut bases = b"TTT".to_vec();
    bases.extend_from_slice(&REF[..27]);
    let mut haplotypes = vec![haplotype(bases, "3I27M")];
    let likelihoods = vec![vec![-0.5]];
    let variants = assign_genotype_likelihoods(
        &reads(1),
        &mut haplotypes,
        &likelihoods,
        REF,
        &window(),
        &window(),
    )
    .unwrap();
    assert!(variants.is_empty());
    assert!(haplotypes[0].event_map.is_empty());
}

#[test]
fn unsupported_cigar_operator_is_an_error() {
    let mut haplotypes = vec![haplotype(REF.to_vec(), "10M5N15M")];
    let likelihoods = vec![vec![-0.5]];
    let result = assign_genotype_likelihoods(
        &reads(1),
        &mut haplotypes,
        &likelihoods,
        REF,
        &window(),
        &window(),
    );
    assert!(result.is_err());
}

#[test]
fn events_outside_origin_region_are_ignored() {
    // Same SNV, but the origin region ends before it.
    let mut haplotypes = vec![snv_haplotype(10, b'T'), reference_haplotype()];
    let likelihoods = vec![vec![-0.5, -5.0]; 6];
    let origin = Interval {
        contig: "chr1".to_string(),
        begin: 0,
        end: 10,
    };
    let variants = assign_genotype_likelihoods(
        &reads(6),
        &mut haplotypes,
        &likelihoods,
        REF,
        &window(),
        &origin,
    )
    .unwrap();
    assert!(variants.is_empty());
}
