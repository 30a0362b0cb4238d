//! sudoku-ar CLI: solve a puzzle photo, inspect configuration.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sudoku_ar::detect::solve_image;
use sudoku_ar::ocr::{DigitRecognizer, LinearDigitModel};
use sudoku_ar::{EngineParams, EngineSnapshot, Solution, TickOutcome};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "sudoku-ar")]
#[command(about = "Locate, read and solve a sudoku puzzle in an image")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one engine tick on a still image.
    Solve {
        /// Path to the input image.
        image: PathBuf,

        /// Engine parameters (JSON). Missing fields use defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretrained linear digit model (JSON). Defaults to font templates.
        #[arg(long)]
        model: Option<PathBuf>,

        /// Write the published snapshot here (JSON).
        #[arg(long)]
        json: Option<PathBuf>,

        /// Log pipeline details.
        #[arg(long, short)]
        verbose: bool,
    },
    /// Print the default engine parameters as JSON.
    PrintConfig,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    #[cfg(feature = "tracing")]
    {
        let _ = tracing_log::LogTracer::init();
        sudoku_ar::core::init_tracing_with_level(false, level);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = sudoku_ar::core::init_with_level(level);
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Solve {
            image,
            config,
            model,
            json,
            verbose,
        } => {
            init_logging(verbose);
            run_solve(&image, config.as_deref(), model.as_deref(), json.as_deref())
        }
        Commands::PrintConfig => {
            println!("{}", serde_json::to_string_pretty(&EngineParams::default())?);
            Ok(())
        }
    }
}

fn run_solve(
    image_path: &Path,
    config: Option<&Path>,
    model: Option<&Path>,
    json: Option<&Path>,
) -> CliResult<()> {
    let params = match config {
        Some(path) => EngineParams::load(path)?,
        None => EngineParams::default(),
    };
    let recognizer = match model {
        Some(path) => DigitRecognizer::new(
            Arc::new(LinearDigitModel::load(path)?),
            params.recognizer.clone(),
        ),
        None => DigitRecognizer::templates(params.recognizer.clone()),
    };

    let img = image::open(image_path).map_err(|e| -> CliError {
        format!("failed to open image {}: {e}", image_path.display()).into()
    })?;
    let (outcome, snapshot) = solve_image(&img, params, recognizer)?;

    match (&outcome, &snapshot.solution) {
        (TickOutcome::Solved { .. }, Some(solution)) => print_solution(solution),
        (TickOutcome::NoGrid, _) => println!("no puzzle found"),
        (TickOutcome::Unsolvable(e), _) => println!("puzzle found but not solvable: {e}"),
        (other, _) => println!("tick ended with {other:?}"),
    }
    print_timings(&snapshot);

    if let Some(path) = json {
        std::fs::write(path, serde_json::to_string_pretty(snapshot.as_ref())?)?;
        log::info!("snapshot written to {}", path.display());
    }
    Ok(())
}

/// Known digits as printed, solved digits in brackets.
fn print_solution(solution: &Solution) {
    for (r, row) in solution.grid.cells.iter().enumerate() {
        if r > 0 && r % 3 == 0 {
            println!("{}", "-".repeat(35));
        }
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(c, cell)| {
                let d = cell.digit.map_or('.', |d| char::from(b'0' + d));
                let sep = if c > 0 && c % 3 == 0 { "|" } else { "" };
                if cell.is_known {
                    format!("{sep} {d} ")
                } else {
                    format!("{sep}[{d}]")
                }
            })
            .collect();
        println!("{}", line.concat());
    }
}

fn print_timings(snapshot: &EngineSnapshot) {
    let m = &snapshot.metrics;
    println!(
        "timings (ms): capture {:.2}, threshold {:.2}, components {:.2}, corners {:.2}, \
         perspective {:.2}, boxes {:.2}, recognize {:.2}, solve {:.2}, total {:.2}",
        m.capture,
        m.threshold,
        m.component_label,
        m.corner_detect,
        m.perspective_extract,
        m.box_extract,
        m.recognize,
        m.solve,
        m.total()
    );
}
