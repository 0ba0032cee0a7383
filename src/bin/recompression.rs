//! Command line front end: compresses a file into an RLSLP and optionally
//! stores it with one of the grammar coders.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{ArgAction, Parser};
use log::{error, info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use recompression::{io, Algorithm, Coder, Result, CHAR_ALPHABET};

#[derive(Parser)]
#[command(name = "recompression")]
#[command(author, version, about = "Grammar compression by recompression")]
struct Cli {
    /// File to compress
    input: PathBuf,

    /// Variant to run: hash, fast or parallel
    #[arg(short, long, default_value = "fast")]
    algorithm: String,

    /// Worker threads for the parallel variant
    #[arg(short, long, default_value_t = default_cores())]
    cores: usize,

    /// Only compress the first BYTES bytes (0 = whole file)
    #[arg(short, long, default_value_t = 0, value_name = "BYTES")]
    prefix: usize,

    /// Store the grammar with this coder: plain, fixed or sorted
    #[arg(long)]
    coder: Option<String>,

    /// Drop zero bytes from the input
    #[arg(long)]
    remove_zeroes: bool,

    /// Output path (default: input path plus the coder extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Check that the grammar (and the stored file) reproduce the input
    #[arg(long)]
    verify: bool,

    /// Increase logging verbosity
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn default_cores() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

fn level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Runs the command. Returns `false` if verification failed.
fn run(cli: &Cli) -> Result<bool> {
    let algorithm: Algorithm = cli.algorithm.parse()?;
    let coder = cli.coder.as_deref().map(Coder::from_name).transpose()?;

    let text = io::read_text(&cli.input, cli.prefix, cli.remove_zeroes)?;
    let mut work = text.clone();
    let mut recompression = algorithm.create(cli.cores)?;

    let start = Instant::now();
    let rlslp = recompression.recomp(&mut work, CHAR_ALPHABET)?;
    let elapsed = start.elapsed();

    let stats = rlslp.stats();
    println!(
        "{}: {} symbols -> {} productions ({} blocks, {} pairs, depth {}) in {:.3}s",
        algorithm,
        stats.text_len,
        stats.productions,
        stats.blocks,
        stats.pairs,
        stats.depth,
        elapsed.as_secs_f64()
    );
    println!("Compression ratio: {:.2}%", stats.compression_ratio());

    let mut verified = true;
    if cli.verify {
        verified &= rlslp.iter().eq(text.iter().copied());
        info!("grammar reproduces the input: {}", verified);
    }

    if let Some(coder) = coder {
        let output = cli.output.clone().unwrap_or_else(|| {
            let mut name = cli.input.clone().into_os_string();
            name.push(".");
            name.push(coder.extension());
            PathBuf::from(name)
        });
        let written = coder.write_file(&rlslp, &output)?;
        println!("{}: {} bytes written to {}", coder, written, output.display());

        if cli.verify {
            let decoded = coder.read_file(&output)?;
            let ok = decoded.iter().eq(text.iter().copied());
            info!("stored grammar reproduces the input: {}", ok);
            verified &= ok;
        }
    }
    Ok(verified)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    // Logging is best effort; a second logger is not an error worth stopping for.
    let _ = TermLogger::init(
        level(cli.verbose),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("verification failed");
            eprintln!("error: verification failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
