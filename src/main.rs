use clap::Parser;
use std::path::PathBuf;

use ferrous_call::caller::HaplotypeCaller;

#[derive(Parser)]
#[command(name = "ferrous-call")]
#[command(about = "FerrousCall - germline small-variant caller for short-read alignments (Rust implementation)", long_about = None)]
#[command(version)]
struct Cli {
    /// Aligned reads in SAM text form. Required.
    #[arg(short = 'I', long = "input", value_name = "READS.SAM")]
    input: PathBuf,

    /// Reference sequence FASTA. Required.
    #[arg(short = 'R', long = "reference", value_name = "REF.FA")]
    reference: PathBuf,

    /// File to which variants should be written. Required.
    #[arg(short = 'O', long = "output", value_name = "OUT.VCF")]
    output: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    // Per-window diagnostics are progress output, so the logger writes to
    // stdout; the VCF goes to the -O path.
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .format_target(false)
        .target(env_logger::Target::Stdout)
        .init();

    log::info!("Calling variants in {}", cli.input.display());

    let caller = HaplotypeCaller::new(cli.input, cli.reference, cli.output);
    if let Err(e) = caller.run() {
        log::error!("Variant calling failed: {}", e);
        std::process::exit(1);
    }
}
