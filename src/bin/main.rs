use crossterm::style::Stylize;
use markov_core::batch::{run_batch, BatchReport};
use markov_core::core::direction::annotate_directions;
use markov_core::logging::init_logging;
use markov_core::persistence::save_model;
use markov_core::{
    BackoffModel, Config, CrossValidator, Dataset, DayId, DirectionalModel, Fix, LocationModel,
    PredictionError, Strategy, TrajectoryPreprocessor,
};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

const USAGE: &str = "\
usage: markov_eval [--config FILE] [--order 1|2] [--strategy loo|sequential|both]
                   [--derive-directions] [--unique-cells] [--save-model FILE]
                   [--verbose] DIR...

Each DIR holds one dataset: files named <day-number>.json, each a JSON array of
fixes {latitude, longitude, timestamp, original, direction}. --unique-cells
lists the distinct grid cells of each dataset before evaluating. --save-model
trains on every day of the first dataset after evaluation and writes the model.";

struct Args {
    config: Option<PathBuf>,
    order: u8,
    strategies: Vec<Strategy>,
    derive_directions: bool,
    unique_cells: bool,
    save_model: Option<PathBuf>,
    verbose: bool,
    datasets: Vec<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: None,
        order: 2,
        strategies: vec![Strategy::LeaveOneOut, Strategy::Sequential],
        derive_directions: false,
        unique_cells: false,
        save_model: None,
        verbose: false,
        datasets: Vec::new(),
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = Some(it.next().ok_or("--config needs a file")?.into()),
            "--order" => {
                args.order = match it.next().as_deref() {
                    Some("1") => 1,
                    Some("2") => 2,
                    _ => return Err("--order must be 1 or 2".into()),
                }
            }
            "--strategy" => {
                let value = it.next().ok_or("--strategy needs a value")?;
                args.strategies = if value == "both" {
                    vec![Strategy::LeaveOneOut, Strategy::Sequential]
                } else {
                    vec![value.parse().map_err(|e: PredictionError| e.to_string())?]
                };
            }
            "--derive-directions" => args.derive_directions = true,
            "--unique-cells" => args.unique_cells = true,
            "--save-model" => {
                args.save_model = Some(it.next().ok_or("--save-model needs a file")?.into())
            }
            "--verbose" | "-v" => args.verbose = true,
            "--help" | "-h" => return Err(String::new()),
            flag if flag.starts_with('-') => return Err(format!("unknown flag {flag}")),
            dir => args.datasets.push(dir.into()),
        }
    }
    if args.datasets.is_empty() {
        return Err("at least one dataset directory is required".into());
    }
    Ok(args)
}

/// Reads `<day-number>.json` files, ordered by day number.
fn read_days(
    dir: &Path,
    derive_directions: bool,
) -> markov_core::Result<Vec<(DayId, Vec<Fix>)>> {
    let mut days = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(id) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<DayId>().ok())
        else {
            continue;
        };
        let mut fixes: Vec<Fix> = serde_json::from_str(&fs::read_to_string(&path)?)?;
        if derive_directions {
            annotate_directions(&mut fixes);
        }
        days.push((id, fixes));
    }
    days.sort_by_key(|(id, _)| *id);
    info!(dir = %dir.display(), days = days.len(), "dataset read");
    Ok(days)
}

fn evaluate<M>(mut model: M, args: &Args, config: &Config) -> markov_core::Result<BatchReport>
where
    M: LocationModel + Clone + Send + Sync + Serialize,
{
    let preprocessor = TrajectoryPreprocessor::new(config.preprocess.clone())?;
    let datasets = args
        .datasets
        .iter()
        .map(|dir| Dataset::from_fixes(&preprocessor, read_days(dir, args.derive_directions)?))
        .collect::<markov_core::Result<Vec<_>>>()?;

    if args.unique_cells {
        let mut out = io::stdout().lock();
        for (dir, dataset) in args.datasets.iter().zip(&datasets) {
            write_unique_cells(&mut out, dir, dataset)?;
        }
    }

    let validator = CrossValidator::new(config.harness.clone());
    let runs = datasets
        .iter()
        .flat_map(|d| args.strategies.iter().map(move |&s| (d, s)));
    let report = run_batch(&validator, &mut model, runs)?;

    if let Some(path) = &args.save_model {
        validator.fit_all(&mut model, &datasets[0])?;
        save_model(&model, path)?;
    }
    Ok(report)
}

/// Sorted distinct cells of `dataset`, one per line, then their total.
fn write_unique_cells(out: &mut impl Write, dir: &Path, dataset: &Dataset) -> io::Result<()> {
    let cells = dataset.unique_cells();
    writeln!(out, "{} {}\n", "Unique locations in".bold(), dir.display())?;
    for cell in &cells {
        writeln!(out, "{cell}")?;
    }
    writeln!(out, "\nTotal: {}", cells.len())
}

fn print_report(report: &BatchReport, datasets: &[PathBuf], strategies: usize) {
    for (i, run) in report.reports.iter().enumerate() {
        let dir = datasets[i / strategies.max(1)].display();
        println!("\n{} {} ({})", "Dataset".bold(), dir, run.strategy.to_string().cyan());
        for fold in &run.folds {
            let accuracy = match fold.accuracy() {
                Some(a) => format!("{a:.4}"),
                None => "n/a".to_string(),
            };
            let line = format!(
                "  fold {:>3} | test {:?} | {}/{} | accuracy {}",
                fold.index + 1,
                fold.test_days,
                fold.evaluation.correct,
                fold.evaluation.total,
                accuracy
            );
            if fold.counted {
                println!("{line}");
            } else {
                println!("{}", line.dark_grey());
            }
        }
        match &run.best {
            Some(best) => {
                println!("  {} {:.4}", "Maximum accuracy:".green(), best.accuracy);
                println!("  Training days: {:?}", best.train_days);
                println!("  Test days:     {:?}", best.test_days);
            }
            None => println!("  {}", "No countable fold".yellow()),
        }
        if let Some(mean) = run.mean_accuracy {
            println!("  {} {:.4}", "Average accuracy:".green(), mean);
        }
    }
    match report.average_accuracy {
        Some(avg) => println!("\n{} {:.4}", "Overall average accuracy:".bold().green(), avg),
        None => println!("\n{}", "No dataset produced an average".bold().yellow()),
    }
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("{msg}\n");
            }
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "could not load configuration");
            return ExitCode::FAILURE;
        }
    };

    let result = match args.order {
        1 => evaluate(DirectionalModel::new(), &args, &config),
        _ => evaluate(BackoffModel::new(), &args, &config),
    };
    match result {
        Ok(report) => {
            print_report(&report, &args.datasets, args.strategies.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "evaluation failed");
            ExitCode::FAILURE
        }
    }
}
