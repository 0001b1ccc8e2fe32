//! `algoc` — the command-line driver for the Algolang compiler.
//!
//! Reads one source file, drives the `algolang` pipeline, writes the
//! emitted output (if any) to the output path, and renders collected
//! diagnostics to stderr. See `spec.md` §6 and `SPEC_FULL.md` §2 item 8,
//! §4.6 for the contract this binary implements.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use algolang::config::CompilerConfig;

#[derive(Parser)]
#[command(name = "algoc")]
#[command(about = "Algolang compiler: translates a .algo source file to C", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the Algolang source file.
    input: PathBuf,

    /// Path the emitted C source is written to.
    output: PathBuf,

    /// Path to an `algoc.toml` config file. Defaults to `algoc.toml`
    /// next to the input file, if present.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print one progress line per compiler pass to stderr.
    #[arg(short, long)]
    verbose: bool,

    /// Force-disable colored diagnostic output.
    #[arg(long)]
    no_color: bool,
}

fn load_config(cli: &Cli) -> Result<CompilerConfig> {
    let explicit = cli.config.clone();
    let implicit = cli.input.parent().map(|dir| dir.join("algoc.toml"));

    let path = explicit.or(implicit.filter(|p| p.exists()));
    match path {
        Some(path) if path.exists() => {
            CompilerConfig::load_from_file(&path).map_err(anyhow::Error::msg)
        }
        _ => Ok(CompilerConfig::default()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "erreur:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = load_config(cli)?;
    let color_enabled = !cli.no_color && config.color.unwrap_or(true);
    colored::control::set_override(color_enabled);

    let mut source = fs::read_to_string(&cli.input)
        .with_context(|| format!("impossible de lire {}", cli.input.display()))?;
    // (B1): a source missing a trailing newline is accepted; the driver
    // pads it before handing the text to the lexer.
    if !source.ends_with('\n') {
        source.push('\n');
    }

    if cli.verbose {
        eprintln!("{} {}", "lexing".dimmed(), cli.input.display());
    }
    let output = algolang::compile(&source, &config);

    if !output.double_minus_warnings.is_empty() {
        let buf = algolang::source_buffer::SourceBuffer::new(source.clone());
        for offset in &output.double_minus_warnings {
            let lc = buf.line_col(*offset);
            eprintln!(
                "{} ligne {}, colonne {}: signes « - » en double repliés dans le littéral numérique",
                "avertissement:".yellow().bold(),
                lc.line,
                lc.column
            );
        }
    }

    if cli.verbose {
        eprintln!(
            "{} {} diagnostic(s)",
            "analyzing".dimmed(),
            output.diagnostics.len()
        );
    }

    if !output.diagnostics.is_empty() {
        let buf = algolang::source_buffer::SourceBuffer::new(source);
        for diag in output.diagnostics.iter() {
            eprint!("{}", diag.render(&buf));
        }
        return Ok(ExitCode::FAILURE);
    }

    let emitted = output.emitted.expect("empty sink implies emission ran");
    if cli.verbose {
        eprintln!("{} {}", "emitting".dimmed(), cli.output.display());
    }
    fs::write(&cli.output, emitted)
        .with_context(|| format!("impossible d'écrire {}", cli.output.display()))?;

    Ok(ExitCode::SUCCESS)
}
