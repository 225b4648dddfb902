// ============================================================================
// PixelGrid CLI — headless rendering of .pxg projects
// ============================================================================
//
// Usage examples:
//   pixelgrid --input sprite.pxg --output sprite.png
//   pixelgrid -i art/*.pxg --output-dir renders/ --overlay
//
// No window is opened in CLI mode; every project is rebuilt from its cell
// histories and composited on the current thread.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::compositor;
use crate::io::{export_png, load_project};

/// PixelGrid headless renderer.
#[derive(Parser, Debug)]
#[command(
    name = "pixelgrid",
    about = "PixelGrid headless project renderer",
    long_about = "Render PixelGrid project files (.pxg) to PNG without opening\n\
                  the editor window.\n\n\
                  Example:\n  \
                  pixelgrid --input sprite.pxg --output sprite.png\n  \
                  pixelgrid -i art/*.pxg --output-dir renders/ --overlay"
)]
pub struct CliArgs {
    /// Input project file(s). Glob patterns accepted (e.g. "art/*.pxg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output PNG path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch rendering (files keep their stem).
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Draw the cell grid on top of the rendered image.
    #[arg(long)]
    pub overlay: bool,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process arguments.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }
}

/// Render every input and return an OS exit code.
/// Failure if any single file failed.
pub fn run(args: CliArgs) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch rendering.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!(
            "error: could not create output directory '{}': {}",
            dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        let Some(output_path) =
            build_output_path(input_path, args.output.as_deref(), args.output_dir.as_deref())
        else {
            eprintln!(
                "  error: cannot determine output path for '{}'.",
                input_path.display()
            );
            any_failure = true;
            continue;
        };

        match render_one(input_path, &output_path, args.overlay) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                log_err!("CLI render of {} failed: {}", input_path.display(), e);
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn render_one(input: &Path, output: &Path, overlay: bool) -> Result<(), String> {
    let editor = load_project(input).map_err(|e| format!("load failed: {}", e))?;
    let image = if overlay {
        compositor::with_overlay(editor.image(), editor.overlay())
    } else {
        editor.snapshot()
    };
    export_png(&image, output).map_err(|e| format!("save failed: {}", e))
}

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);
        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Output path for one input.
///
/// Priority:
/// 1. `--output`
/// 2. `--output-dir` joined with the input stem
/// 3. Next to the input, same stem, `.png`
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let stem = input.file_stem()?.to_string_lossy().into_owned();
    let file_name = format!("{}.png", stem);

    match output_dir {
        Some(dir) => Some(dir.join(file_name)),
        None => Some(input.parent().unwrap_or(Path::new(".")).join(file_name)),
    }
}
