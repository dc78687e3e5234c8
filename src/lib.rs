pub mod assembler; // K-mer size retry loop and read segmentation
pub mod caller; // Window driver: tile, gather, call, write VCF
pub mod cigar;
pub mod error;
pub mod fasta; // Reference reading using bio::io::fasta
pub mod genotyper;
pub mod graph; // Arena de Bruijn assembly graph
pub mod haplotype;
pub mod interval;
pub mod math; // Quality/error and log-sum lookup tables
pub mod pairhmm;
pub mod read_clipper;
pub mod read_filter;
pub mod sam;
pub mod sw; // Scalar Smith-Waterman aligner
pub mod utils;
pub mod variant;
