//! Command line interface of the `lensbench` binary.
use std::{fs, path::PathBuf};

use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};

use crate::{
    bench_document::OpticBench,
    error::{BenchError, BenchResult},
    millisecond,
    sink::RecordingSink,
};

/// Log level selectable on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// errors only
    Error,
    /// warnings and errors
    Warn,
    /// informational messages
    Info,
    /// debug messages (including solver diagnostics)
    Debug,
    /// everything
    Trace,
}
impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

/// Validated command line arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    /// path to the bench document (YAML)
    pub file_path: PathBuf,
    /// number of frames to simulate
    pub frames: usize,
    /// duration of a single frame in milliseconds
    pub frame_time: f64,
    /// path of the JSON file receiving the ray paths. Printed to stdout if not given.
    pub output: Option<PathBuf>,
    /// log level overriding `RUST_LOG`
    pub log_level: Option<LogLevel>,
}

/// Trace the rays of an optical bench described in a YAML file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct PartialArgs {
    /// file path of the bench document, which should be read in
    #[arg(short, long)]
    file_path: Option<PathBuf>,

    /// number of frames to simulate
    #[arg(short = 'n', long, default_value_t = 60)]
    frames: usize,

    /// duration of a single frame in milliseconds
    #[arg(short = 't', long, default_value_t = 16.0)]
    frame_time: f64,

    /// path of the JSON output file. if not defined, the ray paths are printed to stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// log level (overrides the RUST_LOG environment variable)
    #[arg(short, long, value_enum)]
    log_level: Option<LogLevel>,
}

impl TryFrom<PartialArgs> for Args {
    type Error = BenchError;

    fn try_from(part_args: PartialArgs) -> BenchResult<Self> {
        let file_path = part_args.file_path.ok_or_else(|| {
            BenchError::Console("no bench document given. Please type \"lensbench -h\" for help!".into())
        })?;
        if !file_path.exists() {
            return Err(BenchError::Console(format!(
                "invalid file path: {}",
                file_path.display()
            )));
        }
        if part_args.frames == 0 {
            return Err(BenchError::Console("number of frames must be > 0".into()));
        }
        if !part_args.frame_time.is_finite() || part_args.frame_time <= 0.0 {
            return Err(BenchError::Console(
                "frame time must be > 0.0 and finite".into(),
            ));
        }
        Ok(Self {
            file_path,
            frames: part_args.frames,
            frame_time: part_args.frame_time,
            output: part_args.output,
            log_level: part_args.log_level,
        })
    }
}

/// Load the bench document given in `args` and simulate the requested number of frames.
///
/// # Errors
///
/// This function will return an error if the bench document cannot be loaded.
pub fn simulate(args: &Args) -> BenchResult<RecordingSink> {
    let mut bench = OpticBench::from_file(&args.file_path)?;
    let mut sink = RecordingSink::new();
    info!(
        "simulating {} frame(s) of {} ms",
        args.frames, args.frame_time
    );
    bench.run_frames(args.frames, millisecond!(args.frame_time), &mut sink);
    info!("{} ray path(s) traced", sink.len());
    Ok(sink)
}

/// Write the ray paths as JSON to the output file given in `args` or to stdout.
///
/// # Errors
///
/// This function will return an error if the serialization or writing the file fails.
pub fn write_output(args: &Args, sink: &RecordingSink) -> BenchResult<()> {
    let json = sink.to_json()?;
    match &args.output {
        Some(path) => {
            fs::write(path, json).map_err(|e| {
                BenchError::Console(format!("cannot write {}: {e}", path.display()))
            })?;
            info!("ray paths written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;

    const DEMO: &str = "./demos/single_lens.yaml";

    fn parse(args: &[&str]) -> BenchResult<Args> {
        Args::try_from(PartialArgs::parse_from(
            std::iter::once("lensbench").chain(args.iter().copied()),
        ))
    }
    #[test]
    fn defaults() {
        let args = parse(&["-f", DEMO]).unwrap();
        assert_eq!(args.file_path, PathBuf::from(DEMO));
        assert_eq!(args.frames, 60);
        assert_eq!(args.frame_time, 16.0);
        assert!(args.output.is_none());
        assert!(args.log_level.is_none());
    }
    #[test]
    fn all_options() {
        let args = parse(&[
            "--file-path",
            DEMO,
            "--frames",
            "5",
            "--frame-time",
            "33.3",
            "--output",
            "paths.json",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.frames, 5);
        assert_eq!(args.frame_time, 33.3);
        assert_eq!(args.output, Some(PathBuf::from("paths.json")));
        assert_eq!(args.log_level, Some(LogLevel::Debug));
    }
    #[test]
    fn invalid_args() {
        assert_matches!(parse(&[]), Err(BenchError::Console(_)));
        assert_matches!(
            parse(&["-f", "./invalid_file_path/bench.yaml"]),
            Err(BenchError::Console(_))
        );
        assert_matches!(parse(&["-f", DEMO, "-n", "0"]), Err(BenchError::Console(_)));
        assert_matches!(parse(&["-f", DEMO, "--frame-time=-1"]), Err(BenchError::Console(_)));
    }
    #[test]
    fn log_level() {
        assert_eq!(LevelFilter::from(LogLevel::Warn), LevelFilter::Warn);
        assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::Trace);
    }
    #[test]
    fn simulate_demo() {
        let args = parse(&["-f", DEMO, "-n", "3"]).unwrap();
        let sink = simulate(&args).unwrap();
        assert_eq!(sink.len(), 10);
        assert!(sink.paths().all(|p| p.points.len() >= 2));
    }
}
