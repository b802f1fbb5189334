//! Standalone tag inspector for MP3 files.
//!
//! Prints the title and artist the bot would store for each file, applying
//! the same file name check as uploads.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use squonk_radio::metadata::{is_mp3_file_name, LoftyTagReader, TagReader};

/// MP3 tag inspector.
#[derive(Parser, Debug)]
#[command(name = "inspect_tags")]
#[command(about = "Shows the title and artist Squonk Radio would read from MP3 files")]
#[command(version)]
struct Args {
    /// Files to inspect.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let reader = LoftyTagReader::new();

    let mut failures = 0;
    for path in &args.files {
        if !inspect(&reader, path) {
            failures += 1;
        }
    }

    println!();
    if failures == 0 {
        println!("✓ All {} files would be accepted", args.files.len());
        ExitCode::SUCCESS
    } else {
        eprintln!("✗ {failures} of {} files would be rejected", args.files.len());
        ExitCode::FAILURE
    }
}

fn inspect(reader: &impl TagReader, path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str());
    if !is_mp3_file_name(name) {
        eprintln!("✗ {}: only .mp3 files are supported", path.display());
        return false;
    }

    match reader.read(path) {
        Ok(tags) => {
            println!("✓ {}: \"{}\" by \"{}\"", path.display(), tags.title, tags.artist);
            true
        }
        Err(e) => {
            eprintln!("✗ {}: {e}", path.display());
            false
        }
    }
}
