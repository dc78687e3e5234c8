// Read filtering predicates applied by the window driver.

use crate::sam::SamRecord;

pub const MIN_MAPPING_QUALITY_SCORE: u16 = 20;
pub const MINIMUM_READ_LENGTH_AFTER_TRIMMING: usize = 25;

/// Filters applied before clipping: mapping quality, duplicate flag,
/// secondary alignments, and mates placed on another contig.
pub fn apply_pre_assembly_filters(reads: &mut Vec<SamRecord>) {
    reads.retain(|read| read.mapq >= MIN_MAPPING_QUALITY_SCORE);
    reads.retain(|read| !read.is_duplicate());
    reads.retain(|read| !read.is_secondary_alignment());
    reads.retain(|read| read.rnext == "=");
}

/// Reads too short to contribute a k-mer after clipping are dropped.
pub fn drop_reads_below_minimum_length(reads: &mut Vec<SamRecord>) {
    reads.retain(|read| read.len() >= MINIMUM_READ_LENGTH_AFTER_TRIMMING);
}
