//! Reference target program: copies its input file to its output file.
//!
//! Run with: suiterun-copy <input> <output> [--option] [--parameter VALUE]

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "suiterun-copy")]
#[command(about = "Copy an input file to an output file", long_about = None)]
struct Args {
    #[arg(value_name = "INPUT")]
    input: PathBuf,
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,
    // Accepted so suites can pass options; the copy ignores them.
    #[allow(dead_code)]
    #[arg(long)]
    option: bool,
    #[allow(dead_code)]
    #[arg(long, value_name = "VALUE")]
    parameter: Option<String>,
}

fn main() {
    let args = Args::parse();

    if !args.input.is_file() {
        eprintln!("Error: `{}` is not a valid file.", args.input.display());
        process::exit(1);
    }
    if let Err(e) = fs::copy(&args.input, &args.output) {
        eprintln!(
            "Error: cannot copy `{}` to `{}`: {}",
            args.input.display(),
            args.output.display(),
            e
        );
        process::exit(1);
    }
    println!("Done!");
}
