//! mesh-simplify: Command-line interface for mesh simplification.
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=mesh_simplify=info` - Basic operation logging
//! - `RUST_LOG=mesh_simplify=debug` - Detailed progress logging
//! - `RUST_LOG=mesh_simplify::timing=debug` - Performance timing
//!
//! # Example
//!
//! ```bash
//! # Remove 90% of the triangles with info logging
//! RUST_LOG=mesh_simplify=info mesh-simplify simplify bunny.obj -o bunny_low.obj --rate 0.9
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use mesh_simplify::Mesh;
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// mesh-simplify - reduce the triangle count of closed manifold meshes.
#[derive(Parser)]
#[command(name = "mesh-simplify")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for results
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh statistics and information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Simplify a mesh to reduce triangle count
    Simplify {
        /// Input mesh file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Fraction of triangles to remove (0.0-1.0)
        #[arg(long, default_value = "0.5")]
        rate: f64,
    },
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over the -v flags when set.
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "mesh_simplify=info",
            2 => "mesh_simplify=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

#[derive(Serialize)]
struct InfoResult {
    input: String,
    vertices: usize,
    triangles: usize,
    edges: usize,
    dimensions: Option<[f64; 3]>,
}

fn run_info(input: &Path, cli: &Cli) -> Result<()> {
    let mesh =
        Mesh::load(input).with_context(|| format!("Failed to load mesh from {:?}", input))?;

    let result = InfoResult {
        input: input.display().to_string(),
        vertices: mesh.vertex_count(),
        triangles: mesh.triangle_count(),
        edges: mesh.edge_count(),
        dimensions: mesh
            .bounds()
            .map(|(min, max)| [max.x - min.x, max.y - min.y, max.z - min.z]),
    };

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}: {}", "Mesh".cyan().bold(), result.input);
                println!("  {}: {}", "Vertices".cyan(), result.vertices);
                println!("  {}: {}", "Triangles".cyan(), result.triangles);
                println!("  {}: {}", "Edges".cyan(), result.edges);
                if let Some([dx, dy, dz]) = result.dimensions {
                    println!(
                        "  {}: {:.2} x {:.2} x {:.2}",
                        "Dimensions".cyan(),
                        dx,
                        dy,
                        dz
                    );
                }
            }
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct SimplifyRunResult {
    input: String,
    output: String,
    rate: f64,
    original_triangles: usize,
    final_triangles: usize,
    reduction_ratio: f64,
}

fn run_simplify(input: &Path, output_path: &Path, rate: f64, cli: &Cli) -> Result<()> {
    let mesh =
        Mesh::load(input).with_context(|| format!("Failed to load mesh from {:?}", input))?;

    if !cli.quiet && matches!(cli.format, OutputFormat::Text) {
        println!(
            "Simplifying mesh ({} triangles, rate {:.2})...",
            mesh.triangle_count(),
            rate
        );
    }

    let simplified = mesh
        .simplify(rate)
        .with_context(|| format!("Failed to simplify {:?}", input))?;

    simplified
        .save(output_path)
        .with_context(|| format!("Failed to save simplified mesh to {:?}", output_path))?;

    let original_triangles = mesh.triangle_count();
    let final_triangles = simplified.triangle_count();
    let reduction = if original_triangles > 0 {
        1.0 - (final_triangles as f64 / original_triangles as f64)
    } else {
        0.0
    };

    let result = SimplifyRunResult {
        input: input.display().to_string(),
        output: output_path.display().to_string(),
        rate,
        original_triangles,
        final_triangles,
        reduction_ratio: reduction,
    };

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => {
            if !cli.quiet {
                println!(
                    "{} Simplified mesh saved to {}",
                    "✓".green().bold(),
                    output_path.display()
                );
                println!(
                    "  {}: {} → {} triangles ({:.1}% reduction)",
                    "Triangles".cyan(),
                    result.original_triangles,
                    result.final_triangles,
                    result.reduction_ratio * 100.0
                );
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Info { input } => run_info(input, &cli),
        Commands::Simplify {
            input,
            output,
            rate,
        } => run_simplify(input, output, *rate, &cli),
    };

    if let Err(e) = &result {
        if !cli.quiet {
            eprintln!("{}: {}", "Error".red().bold(), e);
            for cause in e.chain().skip(1) {
                eprintln!("  {}: {}", "Caused by".yellow(), cause);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
