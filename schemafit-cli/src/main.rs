//! SchemaFit CLI - netlist-to-template schematic adaptation from the command line.

use clap::{Parser, Subcommand, ValueEnum};
use schemafit::templates::{self, builtin};
use schemafit::{
    AdaptOptions, AdaptOutcome, InputNetlist, SchemaFitCore, Schematic,
};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "schemafit")]
#[command(about = "Netlist-to-template schematic adaptation tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Adapt the best-fitting template to a target netlist
    Adapt {
        /// Path to a target netlist JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Use a single named template instead of the whole registry
        #[arg(short, long)]
        template: Option<String>,

        /// Directory of extra template model JSON files
        #[arg(long, value_name = "DIR")]
        templates_dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Write the adapted model JSON to a file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Highest acceptable per-box mismatch score
        #[arg(long, default_value_t = 0)]
        max_box_score: u32,

        /// Fail instead of adapting when no template is compatible
        #[arg(long)]
        require_compatible: bool,
    },

    /// Score every template against a target netlist
    Score {
        /// Path to a target netlist JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Directory of extra template model JSON files
        #[arg(long, value_name = "DIR")]
        templates_dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Check whether a template is compatible with a target netlist
    Compat {
        /// Path to a target netlist JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Template name to check
        #[arg(short, long)]
        template: String,

        /// Directory of extra template model JSON files
        #[arg(long, value_name = "DIR")]
        templates_dir: Option<PathBuf>,

        /// Highest acceptable per-box mismatch score
        #[arg(long, default_value_t = 0)]
        max_box_score: u32,
    },

    /// List available templates
    Templates {
        /// Show per-template box and connection counts
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for pipelines
    Json,
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Adapt {
            file,
            template,
            templates_dir,
            format,
            output,
            max_box_score,
            require_compatible,
        } => handle_adapt(
            &file,
            template.as_deref(),
            templates_dir.as_deref(),
            format,
            output.as_deref(),
            max_box_score,
            require_compatible,
        ),
        Commands::Score {
            file,
            templates_dir,
            format,
        } => handle_score(&file, templates_dir.as_deref(), format),
        Commands::Compat {
            file,
            template,
            templates_dir,
            max_box_score,
        } => handle_compat(&file, &template, templates_dir.as_deref(), max_box_score),
        Commands::Templates { verbose } => {
            handle_templates(verbose);
            0
        }
    };

    process::exit(exit_code);
}

fn read_netlist(file: &Path) -> Result<InputNetlist, String> {
    let text = std::fs::read_to_string(file).map_err(|e| format!("{}: {e}", file.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("{}: {e}", file.display()))
}

/// Built-in templates plus any loaded from a directory, as named models.
fn collect_templates(templates_dir: Option<&Path>) -> Result<Vec<(String, Schematic)>, String> {
    let mut models: Vec<(String, Schematic)> = builtin::all()
        .into_iter()
        .map(|t| (t.name.to_string(), (t.build)()))
        .collect();

    if let Some(dir) = templates_dir {
        let (loaded, errors) = templates::load_templates_from_directory(dir);
        for error in &errors {
            eprintln!("Warning: {error}");
        }
        models.extend(loaded);
    }

    if models.is_empty() {
        return Err("no templates available".to_string());
    }
    Ok(models)
}

#[allow(clippy::too_many_arguments)]
fn handle_adapt(
    file: &Path,
    template: Option<&str>,
    templates_dir: Option<&Path>,
    format: OutputFormat,
    output: Option<&Path>,
    max_box_score: u32,
    require_compatible: bool,
) -> i32 {
    let target = match read_netlist(file) {
        Ok(netlist) => netlist,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };
    let mut models = match collect_templates(templates_dir) {
        Ok(models) => models,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };
    if let Some(name) = template {
        models.retain(|(n, _)| n == name);
        if models.is_empty() {
            eprintln!("Error: unknown template: {name}");
            return 1;
        }
    }

    let options = AdaptOptions {
        max_box_score,
        require_compatible,
        ..AdaptOptions::default()
    };

    match SchemaFitCore::adapt_best_model(&models, &target, &options) {
        Ok(outcome) => {
            if let Some(path) = output {
                let model_json = match serde_json::to_string_pretty(&outcome.model) {
                    Ok(json) => json,
                    Err(e) => {
                        eprintln!("Error: {e}");
                        return 1;
                    }
                };
                if let Err(e) = std::fs::write(path, model_json) {
                    eprintln!("Error: {}: {e}", path.display());
                    return 1;
                }
            }
            output_outcome(&outcome, &format);
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn handle_score(file: &Path, templates_dir: Option<&Path>, format: OutputFormat) -> i32 {
    let target = match read_netlist(file) {
        Ok(netlist) => netlist,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };
    let models = match collect_templates(templates_dir) {
        Ok(models) => models,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };

    let mut rows = Vec::new();
    for (name, model) in &models {
        match SchemaFitCore::score_template(model, &target) {
            Ok(report) => rows.push((name.clone(), report)),
            Err(e) => {
                eprintln!("Error: {e}");
                return 1;
            }
        }
    }
    rows.sort_by_key(|(_, report)| report.total_score());

    match format {
        OutputFormat::Human => {
            println!("Template scores (lower is better):\n");
            for (name, report) in &rows {
                let exact = if report.is_exact() { " (exact)" } else { "" };
                println!("  {:20} {}{}", name, report.total_score(), exact);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "scores": rows.iter().map(|(name, report)| {
                    serde_json::json!({
                        "template": name,
                        "score": report.total_score(),
                        "exact": report.is_exact(),
                        "matches": report.matches,
                    })
                }).collect::<Vec<_>>(),
            });
            match serde_json::to_string_pretty(&output) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error: {e}");
                    return 1;
                }
            }
        }
    }
    0
}

fn handle_compat(
    file: &Path,
    template: &str,
    templates_dir: Option<&Path>,
    max_box_score: u32,
) -> i32 {
    let target = match read_netlist(file) {
        Ok(netlist) => netlist,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };
    let models = match collect_templates(templates_dir) {
        Ok(models) => models,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };
    let Some((name, model)) = models.iter().find(|(n, _)| n == template) else {
        eprintln!("Error: unknown template: {template}");
        return 1;
    };

    let options = AdaptOptions {
        max_box_score,
        ..AdaptOptions::default()
    };
    match SchemaFitCore::check_compatibility(model, &target, &options) {
        Ok(verdict) => {
            if verdict.compatible {
                println!("{name}: compatible (score {})", verdict.report.total_score());
                0
            } else {
                println!(
                    "{name}: not compatible (score {}, {} missing connections)",
                    verdict.report.total_score(),
                    verdict.missing_connections
                );
                1
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn handle_templates(verbose: bool) {
    println!("Available templates:\n");
    for template in builtin::all() {
        println!("  {}", template.name);
        if verbose {
            let model = (template.build)();
            let netlist = model.to_netlist();
            println!(
                "    {} boxes, {} connections, {} wires",
                netlist.boxes.len(),
                netlist.connections.len(),
                model.wires.len()
            );
        }
    }
    println!();
}

fn output_outcome(outcome: &AdaptOutcome, format: &OutputFormat) {
    match format {
        OutputFormat::Human => {
            println!("Template: {}", outcome.template);
            println!("Score:    {}", outcome.score());

            println!("\nBox matches:");
            for m in &outcome.report.matches {
                match m.candidate_box {
                    Some(candidate) => println!(
                        "  target #{} -> candidate #{} at {} (score {})",
                        m.target_box, candidate, m.rotation, m.score
                    ),
                    None => println!("  target #{} -> unmatched", m.target_box),
                }
            }

            if outcome.operations.is_empty() {
                println!("\nNo edits required");
            } else {
                println!("\nEdits applied:");
                for op in &outcome.operations {
                    println!("  - {op}");
                }
            }

            if !outcome.issues.is_empty() {
                println!("\nIssues:");
                for issue in &outcome.issues {
                    println!("  - {issue}");
                }
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "template": outcome.template,
                "score": outcome.score(),
                "exact": outcome.is_exact(),
                "operations": outcome.operations,
                "matches": outcome.report.matches,
                "issues": outcome.issues,
                "model": outcome.model,
            });
            match serde_json::to_string_pretty(&output) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("Error: {e}"),
            }
        }
    }
}
