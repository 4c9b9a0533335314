//! `latchc` CLI.
//!
//! Command-line interface for translating blocking `sleep()`/`thread{}`
//! source into flat cooperative target code.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser as ClapParser, Subcommand};

#[derive(ClapParser)]
#[command(name = "latchc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Translate blocking sleep()/thread{} source into cooperative target code", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a source file and print (or write) the result
    Translate {
        /// Input source file
        input: PathBuf,

        /// Output path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path to a TranslateConfig TOML file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Parse and validate a source file without emitting output
    Check {
        /// Input source file
        input: PathBuf,

        /// Path to a TranslateConfig TOML file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("latchc=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Translate { input, output, config } => run_translate(&input, output.as_deref(), config.as_deref()),
        Commands::Check { input, config } => run_check(&input, config.as_deref()),
    }
}

fn load_config(config_path: Option<&Path>) -> latchc::TranslateConfig {
    match config_path {
        Some(path) => match latchc::TranslateConfig::from_toml_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error reading config {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => latchc::TranslateConfig::default(),
    }
}

fn read_source(input: &Path) -> String {
    match std::fs::read_to_string(input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", input.display(), e);
            process::exit(1);
        }
    }
}

fn run_translate(input: &Path, output: Option<&Path>, config_path: Option<&Path>) {
    let config = load_config(config_path);
    let source = read_source(input);

    match latchc::interpret_with_config(&source, &config) {
        Ok(translated) => match output {
            Some(path) => {
                if let Err(e) = std::fs::write(path, &translated) {
                    eprintln!("Error writing {}: {}", path.display(), e);
                    process::exit(1);
                }
                println!("Translated {} -> {}", input.display(), path.display());
            }
            None => print!("{}", translated),
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// `Check` runs the same pipeline as `Translate` but discards the
/// output — there's no separate parse-only stage to call into, since
/// the tokeniser/parser and the translator are not split into a
/// distinct front end in this pipeline. What matters for fast feedback
/// is surfacing `MalformedInput`/`UnsupportedConstruct` without the
/// cost of writing a file.
fn run_check(input: &Path, config_path: Option<&Path>) {
    let config = load_config(config_path);
    let source = read_source(input);

    match latchc::interpret_with_config(&source, &config) {
        Ok(_) => println!("{}: OK", input.display()),
        Err(e) => {
            eprintln!("{}: {}", input.display(), e);
            process::exit(1);
        }
    }
}
