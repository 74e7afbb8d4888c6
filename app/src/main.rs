use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Local;
use clap::{Parser, ValueEnum};
use env_logger::{Builder, Target};
use glob::glob;
use log::LevelFilter;
use thiserror::Error;

use pcd_exporter::{export_metrics_to_csv, write_summary_json, ExportError};
use pcd_parser::{parsers::parser_for, ParseError};
use tree_metrics::{MetricsConfig, MetricsError, MetricsPipeline, MetricsSummary};

#[derive(Parser, Debug)]
#[command(
    name = "tree-metrics",
    about = "Estimate per-tree height and DBH from classified LiDAR point clouds",
    author = "MIERUNE Inc.",
    version = "0.0.1"
)]
struct Cli {
    #[arg(short, long, required = true, num_args = 1.., value_name = "FILE")]
    input: Vec<String>,

    #[arg(short, long, value_name = "FILE", default_value = "outputs/tree_metrics.csv")]
    output: PathBuf,

    /// Also write summary statistics as JSON
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// JSON file with metrics parameters
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "METERS")]
    dbh_height: Option<f64>,

    #[arg(long, value_name = "METERS")]
    dbh_tolerance: Option<f64>,

    #[arg(long, value_name = "N")]
    dbh_min_points: Option<usize>,

    /// Attribute holding the tree id, e.g. "treeID" or "user_data"
    #[arg(long, value_name = "NAME")]
    tree_id_field: Option<String>,

    /// Measure trees one after another
    #[arg(long)]
    sequential: bool,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log lines are appended here as well as printed to stderr
    #[arg(long, value_name = "FILE", default_value = "logs/tree_metrics.log")]
    log_file: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Error)]
enum AppError {
    #[error("invalid input pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("no input files matched")]
    NoInputMatched,
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Copies every log line to stderr and to the log file.
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn expand_globs(input_patterns: &[String]) -> Result<Vec<PathBuf>, glob::PatternError> {
    let mut paths = Vec::new();
    for pattern in input_patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            for entry in glob(pattern)? {
                match entry {
                    Ok(path) => paths.push(path),
                    Err(e) => log::warn!("Skipping unreadable path: {:?}", e),
                }
            }
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }
    Ok(paths)
}

/// Defaults, then the optional JSON file, then command-line overrides.
fn build_config(args: &Cli) -> Result<MetricsConfig, MetricsError> {
    let mut config = match &args.config {
        Some(path) => MetricsConfig::from_json_file(path)?,
        None => MetricsConfig::default(),
    };

    if let Some(height) = args.dbh_height {
        config.dbh.height = height;
    }
    if let Some(tolerance) = args.dbh_tolerance {
        config.dbh.tolerance = tolerance;
    }
    if let Some(min_points) = args.dbh_min_points {
        config.dbh.min_points = min_points;
    }
    if args.sequential {
        config.parallel = false;
    }

    config.validate()?;
    Ok(config)
}

fn run(args: &Cli) -> Result<(), AppError> {
    let start = std::time::Instant::now();

    let pipeline = MetricsPipeline::new(build_config(args)?);
    let config = pipeline.config();
    log::info!(
        "DBH at {}m +/- {}m, at least {} trunk points, parallel: {}",
        config.dbh.height,
        config.dbh.tolerance,
        config.dbh.min_points,
        config.parallel
    );

    let input_files = expand_globs(&args.input)?;
    if input_files.is_empty() {
        return Err(AppError::NoInputMatched);
    }
    log::info!("Expanded input files: {:?}", input_files);

    log::info!("start parsing...");
    let start_local = std::time::Instant::now();
    let cloud = parser_for(input_files, args.tree_id_field.clone())?.parse()?;
    log::info!(
        "finish parsing {} points in {:?}",
        cloud.len(),
        start_local.elapsed()
    );

    log::info!("start measuring trees...");
    let start_local = std::time::Instant::now();
    let metrics = pipeline.process(&cloud)?;
    log::info!(
        "finish measuring {} trees in {:?}",
        metrics.len(),
        start_local.elapsed()
    );

    export_metrics_to_csv(&metrics, &args.output)?;

    let summary = MetricsSummary::from_table(&metrics);
    summary.log();
    if let Some(path) = &args.summary {
        write_summary_json(&summary, path)?;
    }

    log::info!("Elapsed: {:?}", start.elapsed());
    Ok(())
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let log_file = match open_log_file(&args.log_file) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error: cannot open log file {:?}: {}", args.log_file, e);
            return ExitCode::FAILURE;
        }
    };

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, args.log_level.into())
        .target(Target::Pipe(Box::new(TeeWriter { file: log_file })))
        .init();

    log::info!("input files: {:?}", args.input);
    log::info!("output file: {:?}", args.output);
    log::debug!(
        "Logging configured: level={:?}, file={:?}",
        args.log_level,
        args.log_file
    );

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Processing failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tree-metrics").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_without_config_file() {
        let args = cli(&["-i", "plot.las"]);
        assert_eq!(args.output, PathBuf::from("outputs/tree_metrics.csv"));
        assert_eq!(args.log_level, LogLevel::Info);
        assert_eq!(args.log_file, PathBuf::from("logs/tree_metrics.log"));
        assert_eq!(build_config(&args).unwrap(), MetricsConfig::default());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(&config_path, r#"{"dbh": {"height": 1.4, "min_points": 8}}"#).unwrap();

        let args = cli(&[
            "-i",
            "plot.las",
            "--config",
            config_path.to_str().unwrap(),
            "--dbh-min-points",
            "3",
            "--sequential",
        ]);
        let config = build_config(&args).unwrap();

        assert_eq!(config.dbh.height, 1.4);
        assert_eq!(config.dbh.tolerance, 0.05);
        assert_eq!(config.dbh.min_points, 3);
        assert!(!config.parallel);
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let args = cli(&["-i", "plot.las", "--dbh-tolerance=-0.1"]);
        assert!(matches!(
            build_config(&args),
            Err(MetricsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn log_lines_reach_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/logs/run.log");

        let mut writer = TeeWriter {
            file: open_log_file(&path).unwrap(),
        };
        writeln!(writer, "first").unwrap();
        writer.flush().unwrap();

        let mut writer = TeeWriter {
            file: open_log_file(&path).unwrap(),
        };
        writeln!(writer, "second").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn expands_glob_patterns() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.csv", "b.csv", "notes.md"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let pattern = dir.path().join("*.csv").to_string_lossy().into_owned();

        let paths = expand_globs(&[pattern, "other.las".to_string()]).unwrap();

        assert_eq!(
            paths,
            vec![
                dir.path().join("a.csv"),
                dir.path().join("b.csv"),
                PathBuf::from("other.las")
            ]
        );
    }
}
