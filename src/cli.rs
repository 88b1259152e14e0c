use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "gzix")]
#[command(version)]
#[command(about = "Pack a directory into gzip members with an index for random access", long_about = None)]
#[command(after_help = "Examples:\n  \
  gzix index photos                        write photos.gz and photos.idx\n  \
  gzix get photos.idx photos.gz cat.jpg > cat.jpg\n  \
  gzix list photos.idx photos.gz           show sizes and ratios")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More log output (-vv => trace)
    #[arg(short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (-qq => errors only)
    #[arg(short = 'q', global = true, action = clap::ArgAction::Count)]
    pub quiet: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build <DIR>.gz and <DIR>.idx from the files directly inside DIR
    Index {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Decompress one file from an archive
    Get {
        #[arg(value_name = "INDEX")]
        index: PathBuf,

        #[arg(value_name = "BLOB")]
        blob: PathBuf,

        /// Name of the archived file
        #[arg(value_name = "NAME")]
        name: String,

        /// Write to FILE instead of standard output
        #[arg(short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List index records; with BLOB, also show sizes read from the members
    List {
        #[arg(value_name = "INDEX")]
        index: PathBuf,

        #[arg(value_name = "BLOB")]
        blob: Option<PathBuf>,
    },

    /// Check that every member is where the index says and decodes cleanly
    Verify {
        #[arg(value_name = "INDEX")]
        index: PathBuf,

        #[arg(value_name = "BLOB")]
        blob: PathBuf,
    },
}

impl Cli {
    pub fn log_level(&self) -> Level {
        match (self.quiet, self.verbose) {
            (q, _) if q > 1 => Level::ERROR,
            (1, _) => Level::WARN,
            (_, 0) => Level::INFO,
            (_, 1) => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}
