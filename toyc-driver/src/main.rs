//! ToyC Compiler Driver
//!
//! Command-line entry point. Orchestrates the pipeline:
//! read source, tokenize, parse, analyze, generate, write assembly.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use toyc_common::CompilerError;
use toyc_frontend::{Frontend, SemanticAnalyzer};

#[derive(Parser)]
#[command(name = "toyc")]
#[command(about = "ToyC compiler targeting RISC-V 32")]
#[command(version)]
struct Args {
    /// Input ToyC source file
    input: PathBuf,

    /// Output assembly file (defaults to the input basename with .s)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the abstract syntax tree after parsing
    #[arg(long)]
    ast: bool,

    /// Print tokens and stop after lexical analysis
    #[arg(long)]
    tokens: bool,

    /// Stop after parsing
    #[arg(long)]
    parse_only: bool,

    /// Verbose phase logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    if args.input.extension().map_or(true, |ext| ext != "tc") {
        eprintln!("Warning: input file should have .tc extension");
    }

    let source = fs::read_to_string(&args.input)
        .map_err(CompilerError::from)
        .with_context(|| format!("cannot open input file: {}", args.input.display()))?;

    info!("phase 1: lexing and parsing {}", args.input.display());
    let tokens = Frontend::tokenize_source(&source)?;

    if args.tokens {
        for token in &tokens {
            println!("{}", token);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut parser = toyc_frontend::Parser::new(tokens);
    let mut unit = parser.parse_compilation_unit()?;

    if args.ast {
        print!("{}", unit);
    }

    if args.parse_only {
        println!("Parse-only mode: parsing successful");
        return Ok(ExitCode::SUCCESS);
    }

    info!("phase 2: semantic analysis");
    let mut analyzer = SemanticAnalyzer::new();
    if !analyzer.analyze(&mut unit) {
        eprintln!("Semantic analysis failed:");
        for (i, diagnostic) in analyzer.errors().iter().enumerate() {
            eprintln!("  Error {}: {}", i + 1, diagnostic.message());
        }
        return Ok(ExitCode::FAILURE);
    }
    info!("semantic analysis found {}", analyzer.summary());

    info!("phase 3: code generation");
    let assembly = toyc_codegen::generate_assembly(&unit, analyzer.function_table())
        .map_err(CompilerError::from)?;

    info!("phase 4: writing output");
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("s"));
    fs::write(&output_path, &assembly)
        .map_err(CompilerError::from)
        .with_context(|| format!("cannot write output file: {}", output_path.display()))?;

    info!(
        "wrote {} ({} functions, {} assembly lines)",
        output_path.display(),
        unit.functions.len(),
        assembly.lines().count()
    );

    Ok(ExitCode::SUCCESS)
}
