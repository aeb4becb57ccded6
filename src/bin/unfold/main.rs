//! Unfold CLI - flatten meshes into 2D pieces.
//!
//! Usage: unfold <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `unfold --help` for available commands. Set `RUST_LOG=debug` for
//! solver diagnostics.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};

use unfolder::algo::unfold::{unfold, UnfoldOptions};
use unfolder::algo::StatusSink;
use unfolder::error::UnfoldStatus;
use unfolder::io;
use unfolder::mesh::triangulate;

#[derive(Parser)]
#[command(name = "unfold")]
#[command(author, version, about = "Mesh unfolding CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file (OBJ or STL)
        input: PathBuf,
    },

    /// Unfold a mesh into flat pieces
    Run {
        /// Input mesh file (OBJ or STL)
        input: PathBuf,

        /// Output file: `.obj` for a flat mesh, anything else for binary pieces
        output: Option<PathBuf>,

        /// Maximum conjugate gradient iterations per solve
        #[arg(short, long, default_value = "100000")]
        iterations: usize,

        /// Relative residual tolerance of the solver
        #[arg(short, long, default_value = "1e-10")]
        tolerance: f64,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// List the pieces stored in a binary pieces file
    Dump {
        /// Pieces file
        input: PathBuf,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Run {
            input,
            output,
            iterations,
            tolerance,
            sequential,
        } => {
            cmd_run(&input, output.as_deref(), iterations, tolerance, sequential)?;
        }

        Commands::Dump { input } => {
            cmd_dump(&input)?;
        }
    }

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let polygons = io::load_polygons(input)?;
    let mesh = triangulate(&polygons)?;

    println!("File: {}", input.display());
    println!("Polygons: {}", polygons.faces.len());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Triangles: {}", mesh.num_faces());
    println!("Edges: {}", mesh.num_edges());
    println!("Surface area: {:.6}", mesh.surface_area());

    let boundary = mesh.num_boundary_edges();
    if boundary == 0 {
        println!("Topology: Closed (no boundary, cut seams before unfolding)");
    } else {
        println!("Topology: Open ({} boundary edges)", boundary);
    }

    let interior = mesh
        .vertex_ids()
        .filter(|&v| mesh.is_interior_vertex(v))
        .count();
    println!("Interior vertices: {}", interior);

    Ok(())
}

fn cmd_run(
    input: &Path,
    output: Option<&Path>,
    iterations: usize,
    tolerance: f64,
    sequential: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let polygons = io::load_polygons(input)?;
    let mesh = triangulate(&polygons)?;

    println!("Loaded: {} vertices, {} triangles", mesh.num_vertices(), mesh.num_faces());

    let options = UnfoldOptions::default()
        .with_max_iterations(iterations)
        .with_tolerance(tolerance)
        .with_parallel(!sequential)
        .with_status(StatusSink::new(|line| eprintln!("{}", line)));

    let start = Instant::now();
    let result = unfold(&mesh, &options);
    let elapsed = start.elapsed();

    let status = UnfoldStatus::from_result(&result);
    let pieces = result?;
    println!("Status: {:?} ({:.2?})", status, elapsed);

    for piece in &pieces {
        let (w, h) = piece
            .bounds()
            .map(|(lo, hi)| (hi.x - lo.x, hi.y - lo.y))
            .unwrap_or_default();
        println!(
            "  {}: {} faces, {} vertices, {} fold/cut lines, {:.3} x {:.3}",
            piece.name,
            piece.num_faces(),
            piece.num_vertices(),
            piece.visible_edges().count(),
            w,
            h
        );
    }

    if let Some(output) = output {
        let is_obj = output
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("obj"));
        if is_obj {
            io::obj::save_pieces(&pieces, output)?;
        } else {
            io::pieces::save(&pieces, output)?;
        }
        println!("Saved: {}", output.display());
    }

    Ok(())
}

fn cmd_dump(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let pieces = io::pieces::load(input)?;

    println!("File: {}", input.display());
    println!("Pieces: {}", pieces.len());
    for piece in &pieces {
        let visible = piece.visible_edges().count();
        println!(
            "  {}: {} faces, {} vertices, {} edges ({} hidden)",
            piece.name,
            piece.num_faces(),
            piece.num_vertices(),
            piece.num_edges(),
            piece.num_edges() - visible
        );
    }

    Ok(())
}
