//! Main entry point for the gzix CLI application.
//!
//! Builds blob archives from directories and pulls single files back out of
//! them. Log output goes to stderr so that `gzix get` can stream file
//! contents on stdout.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};

use gzix::archive::{ArchiveExtractor, Index, build_archive, lookup, verify};
use gzix::cli::{Cli, Command};

/// Application entry point.
///
/// Library errors are mapped to an exit status by kind, so scripts can tell
/// a missing name from a corrupt archive.
fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<gzix::Error>())
        .map_or(1, |e| e.kind().exit_code())
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Index { dir } => index_dir(dir),
        Command::Get {
            index,
            blob,
            name,
            output,
        } => get_file(index, blob, name, output.as_deref()),
        Command::List { index, blob } => list_files(index, blob.as_deref()),
        Command::Verify { index, blob } => verify_archive(index, blob),
    }
}

/// Build `<dir>.gz` and `<dir>.idx`.
fn index_dir(dir: &Path) -> Result<()> {
    // Skipped files are already logged as warnings by the builder.
    build_archive(dir)
        .with_context(|| format!("failed to build archive from {}", dir.display()))?;
    Ok(())
}

/// Extract a single file to stdout or to `output`.
///
/// The index is consulted before the blob is opened, and the member is fully
/// decoded before anything is written, so errors never produce partial
/// output.
fn get_file(index: &Path, blob: &Path, name: &str, output: Option<&Path>) -> Result<()> {
    let entry = lookup(index, name)
        .with_context(|| format!("cannot find {name:?} in {}", index.display()))?;
    info!(
        "{} found at byte {} ({} bytes)",
        entry.name, entry.offset, entry.length
    );

    let extractor = ArchiveExtractor::open(blob)?;
    match output {
        Some(path) => extractor
            .extract_to_file(&entry, path)
            .with_context(|| format!("failed to extract {name:?} to {}", path.display()))?,
        None => {
            let stdout = std::io::stdout();
            let mut stdout = stdout.lock();
            extractor
                .extract_to_writer(&entry, &mut stdout)
                .with_context(|| format!("failed to extract {name:?}"))?;
        }
    }
    Ok(())
}

/// List index records.
///
/// Supports two output formats:
/// - Simple format (no blob): just file names, one per line
/// - Detailed format (with blob): table with sizes, ratio, and offsets read
///   from each member's gzip trailer
fn list_files(index: &Path, blob: Option<&Path>) -> Result<()> {
    let index = Index::load(index).with_context(|| format!("cannot read {}", index.display()))?;

    let Some(blob) = blob else {
        for entry in index.entries() {
            println!("{}", entry.name);
        }
        return Ok(());
    };

    let extractor = ArchiveExtractor::open(blob)?;

    println!(
        "{:>10}  {:>10}  {:>RATIO_WIDTH$}  {:>12}  Name",
        "Length", "Size", "Cmpr", "Offset"
    );
    println!("{}", "-".repeat(60));

    // Track totals for summary line
    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;

    for entry in index.entries() {
        let info = extractor
            .inspect(entry)
            .with_context(|| format!("cannot inspect {:?}", entry.name))?;
        let uncompressed = u64::from(info.uncompressed_size);

        println!(
            "{:>10}  {:>10}  {}  {:>12}  {}",
            uncompressed,
            entry.length,
            ratio(entry.length, uncompressed),
            entry.offset,
            entry.name
        );

        total_uncompressed += uncompressed;
        total_compressed += entry.length;
    }

    println!("{}", "-".repeat(60));
    println!(
        "{:>10}  {:>10}  {}  {:>12}  {} files",
        total_uncompressed,
        total_compressed,
        ratio(total_compressed, total_uncompressed),
        "",
        index.len()
    );
    Ok(())
}

/// Width of the `Cmpr` column.
const RATIO_WIDTH: usize = 6;

/// Space saved as a percentage; negative when compression grew the data.
/// Always [`RATIO_WIDTH`] characters wide.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    let saved = if uncompressed == 0 {
        0
    } else {
        // Tiny files can grow many times over; keep the column aligned.
        (100 - (compressed as i128 * 100 / uncompressed as i128)).max(-9999)
    };
    format!("{saved:>width$}%", width = RATIO_WIDTH - 1)
}

/// Check every member of an archive against its index.
fn verify_archive(index: &Path, blob: &Path) -> Result<()> {
    let index = Index::load(index).with_context(|| format!("cannot read {}", index.display()))?;
    let extractor = ArchiveExtractor::open(blob)?;

    let report = verify(&index, &extractor);
    for problem in &report.problems {
        println!("{problem}");
    }
    if !report.is_ok() {
        bail!(
            "{} problem(s) found in {} members",
            report.problems.len(),
            report.members
        );
    }
    println!("{} members OK", report.members);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_reports_space_saved() {
        assert_eq!(ratio(50, 100), "   50%");
        assert_eq!(ratio(100, 100), "    0%");
        assert_eq!(ratio(0, 0), "    0%");
    }

    #[test]
    fn ratio_fits_its_column_when_data_grows() {
        assert_eq!(ratio(300, 100), " -200%");
        assert_eq!(ratio(21, 1), "-2000%");
        assert_eq!(ratio(u64::MAX, 1), "-9999%");
        for (compressed, uncompressed) in [(0, 7), (20, 1), (1 << 40, 3), (5, 0)] {
            assert_eq!(ratio(compressed, uncompressed).len(), RATIO_WIDTH);
        }
    }
}
