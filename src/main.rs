//! voxsketch CLI - evaluate sketch scripts outside the editor

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::IVec3;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use voxsketch::{Interpreter, InterpreterConfig, STARTER_SCRIPT, Sketch};

#[derive(Parser)]
#[command(name = "voxsketch")]
#[command(about = "Build voxel sketches from scripts", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a script (or a .json sketch document) and report the result
    Eval {
        /// Script or sketch file; the starter sketch is used when omitted
        file: Option<PathBuf>,

        /// Grid size along every axis (1-1024)
        #[arg(long, default_value = "256", value_parser = clap::value_parser!(i32).range(1..=1024))]
        size: i32,

        /// Maximum nesting of function calls
        #[arg(long, default_value = "64")]
        max_call_depth: usize,

        /// Print every populated cell as `x y z group`
        #[arg(long)]
        cells: bool,

        /// Print the scene snapshot as JSON
        #[arg(long, conflicts_with = "cells")]
        snapshot: bool,
    },

    /// Wrap a script into a sketch document
    Save {
        /// Script file
        script: PathBuf,

        /// Output sketch document
        output: PathBuf,
    },
}

fn read_source(file: Option<&Path>) -> Result<String> {
    let Some(path) = file else {
        return Ok(STARTER_SCRIPT.to_string());
    };
    if path.extension().is_some_and(|ext| ext == "json") {
        let sketch = Sketch::load(path)
            .with_context(|| format!("Failed to load sketch {}", path.display()))?;
        return Ok(sketch.code);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Eval {
            file,
            size,
            max_call_depth,
            cells,
            snapshot,
        } => {
            let source = read_source(file.as_deref())?;
            let mut interpreter = Interpreter::new(InterpreterConfig {
                extent: IVec3::splat(size),
                max_call_depth,
                ..Default::default()
            });

            if let Err(err) = interpreter.evaluate(&source) {
                eprintln!("{err}");
                return Ok(ExitCode::FAILURE);
            }

            if snapshot {
                println!("{}", serde_json::to_string(&interpreter.snapshot())?);
            } else if cells {
                for cell in interpreter.grid().cells() {
                    let p = cell.position;
                    println!("{} {} {} {}", p.x, p.y, p.z, cell.group);
                }
            } else {
                let hints = interpreter.hints();
                println!("Filled voxels: {}", interpreter.grid().filled_count());
                println!("Material:      {:?}", hints.material);
                println!("Camera:        {:?}", hints.camera);
                println!("Background:    {}", hints.background);
                println!("Grid:          {}", if hints.grid_visible { "on" } else { "off" });
            }
        }

        Commands::Save { script, output } => {
            let code = std::fs::read_to_string(&script)
                .with_context(|| format!("Failed to read script {}", script.display()))?;
            Sketch::new(code)
                .save(&output)
                .with_context(|| format!("Failed to write sketch {}", output.display()))?;
            println!("Saved {}", output.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}
