// FASTA input using bio::io::fasta.
//
// The caller operates on one contig at a time; this module surfaces the first
// record of the file with its sequence uppercase-normalized. Plain and
// gzip-compressed files are both accepted.

use crate::error::{CallError, Result};
use crate::utils;
use bio::io::fasta;
use std::path::Path;

/// One reference contig.
#[derive(Debug, Clone)]
pub struct FastaRecord {
    pub name: String,
    pub comment: Option<String>,
    pub seq: Vec<u8>,
}

/// Read the first record of a FASTA file.
pub fn read_first_record(path: &Path) -> Result<FastaRecord> {
    let reader = fasta::Reader::new(utils::xzopen(path)?);
    let record = reader
        .records()
        .next()
        .ok_or_else(|| {
            CallError::InvalidInput(format!("no FASTA record in {}", path.display()))
        })?
        .map_err(|e| {
            CallError::InvalidInput(format!("malformed FASTA in {}: {}", path.display(), e))
        })?;

    Ok(FastaRecord {
        name: record.id().to_string(),
        comment: record.desc().map(str::to_string),
        seq: record.seq().to_ascii_uppercase(),
    })
}
