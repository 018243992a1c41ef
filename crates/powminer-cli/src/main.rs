//! Powminer CLI
//!
//! Searches for a proof-of-work value for a giver contract and prints it
//! as hex, optionally wrapped into a serialized external message.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser, ValueEnum};
use powminer_core::{
    expected_attempts, expected_attempts_f64, format_attempts, open_backend, parse_literal, parse_mining_address,
    parse_u64_saturating_i64, run_benchmark, target_bytes, to_be_array, validate_target,
    BackendKind, BigUint, DeviceSelector, EnvelopeTarget, ResultEncoder, SearchConfig,
    SearchCoordinator, SearchOutcome, StdAddress,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const BUILD_INFO: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " build information: [ Commit: ",
    env!("POWMINER_COMMIT"),
    ", Date: ",
    env!("POWMINER_COMMIT_DATE"),
    " ]"
);

/// Per-factor measurement window when `-B` runs without `-t`
const DEFAULT_BENCHMARK_SECS: f64 = 5.0;

const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "pow-miner")]
#[command(author = "Powminer Team")]
#[command(version = BUILD_INFO)]
#[command(
    about = "Proof-of-work miner for giver contracts",
    long_about = "Outputs a valid <rdata> value for proof-of-work testgiver after computing at most \
                  <max-iterations> hashes, or terminates with a non-zero exit code"
)]
struct Cli {
    /// Increase verbosity level
    #[arg(short = 'v', action = ArgAction::Count)]
    verbose: u8,

    /// Number of worker threads
    #[arg(
        short = 'w',
        value_name = "THREADS",
        default_value_t = 1,
        value_parser = clap::value_parser!(u16).range(1..=256)
    )]
    threads: u16,

    /// Stop after this many seconds
    #[arg(short = 't', value_name = "SECONDS", value_parser = parse_timeout)]
    timeout: Option<Duration>,

    /// Benchmark every boost factor and exit
    #[arg(short = 'B')]
    benchmark: bool,

    /// Mine for the bounceable form of <ADDRESS>
    #[arg(short = 'b', overrides_with = "non_bounceable")]
    bounceable: bool,

    /// Mine for the non-bounceable form of <ADDRESS>
    #[arg(short = 'n', overrides_with = "bounceable")]
    non_bounceable: bool,

    /// GPU device index
    #[arg(short = 'g', value_name = "GPU_ID", value_parser = clap::value_parser!(u32).range(0..=16))]
    gpu_id: Option<u32>,

    /// OpenCL platform index
    #[arg(
        short = 'p',
        value_name = "PLATFORM_ID",
        default_value_t = 0,
        value_parser = clap::value_parser!(u32).range(0..=16)
    )]
    platform_id: u32,

    /// Work partitioning factor for the hash kernel
    #[arg(
        short = 'F',
        value_name = "BOOST_FACTOR",
        default_value_t = 16,
        value_parser = clap::value_parser!(u32).range(1..=65536)
    )]
    boost_factor: u32,

    /// Hash-trial backend
    #[arg(long, value_enum, default_value_t = BackendArg::Cpu)]
    backend: BackendArg,

    /// Address that will receive the giver's reward (workchain -1 or 0)
    #[arg(value_parser = parse_mining_address)]
    address: StdAddress,

    /// Giver seed, at most 128 bits
    #[arg(value_parser = parse_seed)]
    seed: [u8; 16],

    /// Difficulty target; a hash strictly below it wins
    #[arg(value_parser = parse_difficulty)]
    difficulty: BigUint,

    /// Attempt budget for each worker
    #[arg(value_parser = parse_u64_saturating_i64)]
    max_iterations: i64,

    /// Giver contract receiving the external message (workchain -1 or 0)
    #[arg(value_parser = parse_mining_address, requires = "output_path")]
    dest_address: Option<StdAddress>,

    /// Where to save the serialized external message
    #[arg(requires = "dest_address")]
    output_path: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Cpu,
    Cuda,
    Opencl,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Cpu => BackendKind::Cpu,
            BackendArg::Cuda => BackendKind::Cuda,
            BackendArg::Opencl => BackendKind::OpenCl,
        }
    }
}

fn parse_timeout(text: &str) -> Result<Duration> {
    let secs: f64 = text
        .parse()
        .with_context(|| format!("`{}` is not a number of seconds", text))?;
    anyhow::ensure!(secs > 0.0, "timeout must be positive");
    Duration::try_from_secs_f64(secs).context("timeout out of range")
}

fn parse_seed(text: &str) -> Result<[u8; 16]> {
    let seed = parse_literal(text, 128)?;
    to_be_array(&seed).context("seed does not fit in 16 bytes")
}

fn parse_difficulty(text: &str) -> Result<BigUint> {
    let target = parse_literal(text, 256)?;
    validate_target(&target)?;
    Ok(target)
}

fn usage_error(kind: ErrorKind, message: impl std::fmt::Display) -> clap::Error {
    Cli::command().error(kind, message)
}

/// Cross-argument validation that clap attributes cannot express
fn build_config(cli: &Cli) -> Result<(SearchConfig, Option<EnvelopeTarget>), clap::Error> {
    let kind = BackendKind::from(cli.backend);
    let threads = usize::from(cli.threads);
    if threads > kind.max_threads() {
        return Err(usage_error(
            ErrorKind::ValueValidation,
            format!(
                "{} backend runs at most {} worker thread(s), got -w{}",
                kind,
                kind.max_threads(),
                threads
            ),
        ));
    }

    let device = match cli.gpu_id {
        Some(gpu_id) => Some(DeviceSelector {
            gpu_id,
            platform_id: cli.platform_id,
        }),
        None if kind.needs_device() => {
            return Err(usage_error(
                ErrorKind::MissingRequiredArgument,
                format!("{} backend needs a GPU id (-g<gpu-id>)", kind),
            ));
        }
        None => None,
    };

    let target = target_bytes(&cli.difficulty)
        .map_err(|e| usage_error(ErrorKind::ValueValidation, e))?;

    // non-bounceable unless -b is the last bounce flag given
    let mut origin = cli.address;
    origin.bounceable = cli.bounceable && !cli.non_bounceable;

    let mut config = SearchConfig::new(origin, cli.seed, target, cli.max_iterations);
    config.threads = threads;
    config.boost_factor = cli.boost_factor;
    config.device = device;
    config.backend = kind;
    if !cli.benchmark {
        config.deadline = cli.timeout.map(|t| Instant::now() + t);
    }

    let envelope = match (cli.dest_address, &cli.output_path) {
        (Some(destination), Some(path)) => Some(EnvelopeTarget {
            destination,
            path: path.clone(),
        }),
        _ => None,
    };

    Ok((config, envelope))
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (config, envelope) = build_config(&cli).unwrap_or_else(|e| e.exit());

    let expected = expected_attempts(&cli.difficulty)?;
    let expected_f64 = expected_attempts_f64(&cli.difficulty)?;
    debug!(
        "[ expected required hashes for success: {} ({}) ]",
        expected,
        format_attempts(expected_f64)
    );
    info!(
        "mining for {} (bounceable: {})",
        config.origin.to_friendly(true),
        config.origin.bounceable
    );
    if let Some(envelope) = &envelope {
        info!(
            "message for {} goes to `{}`",
            envelope.destination.to_friendly(true),
            envelope.path.display()
        );
    }

    let cpus = num_cpus::get();
    if config.threads > cpus {
        warn!("{} worker threads on {} logical CPUs", config.threads, cpus);
    }

    let backend = open_backend(config.backend).context("failed to open hash-trial backend")?;
    let mut coordinator = SearchCoordinator::new(backend);
    if cli.verbose >= 2 {
        coordinator = coordinator.with_progress(PROGRESS_INTERVAL, Some(expected_f64));
    }

    if cli.benchmark {
        let window = cli
            .timeout
            .unwrap_or_else(|| Duration::from_secs_f64(DEFAULT_BENCHMARK_SECS));
        let report = run_benchmark(&coordinator, &config, window).context("benchmark failed")?;
        eprintln!("\n{}\n", report);
        return Ok(ExitCode::SUCCESS);
    }

    let encoder = ResultEncoder::new(envelope);
    let outcome = coordinator
        .run_search(&config, &encoder)
        .context("search failed")?;

    if cli.verbose >= 1 {
        info!("{}", outcome.stats());
    }

    Ok(ExitCode::from(exit_status(&outcome)))
}

/// 0 when a value was found, 1 when the budget or deadline ran out
fn exit_status(outcome: &SearchOutcome) -> u8 {
    if outcome.is_found() {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2N";

    fn parse(extra: &[&str]) -> Result<Cli, clap::Error> {
        let mut argv = vec!["pow-miner"];
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv)
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_minimal_invocation() {
        let cli = parse(&[ADDRESS, "0x0102", "0x10000", "1000"]).unwrap();
        assert_eq!(cli.threads, 1);
        assert_eq!(cli.boost_factor, 16);
        assert_eq!(cli.max_iterations, 1000);
        assert_eq!(&cli.seed[14..], &[0x01, 0x02]);
        assert!(cli.dest_address.is_none());

        let (config, envelope) = build_config(&cli).unwrap();
        assert_eq!(config.backend, BackendKind::Cpu);
        // the EQ tag is ignored without -b
        assert!(!config.origin.bounceable);
        assert!(config.deadline.is_none());
        assert_eq!(config.target[29], 0x01);
        assert!(envelope.is_none());
    }

    #[test]
    fn test_seed_too_wide_is_usage_error() {
        let seed = format!("0x1{}", "0".repeat(32));
        let err = parse(&[ADDRESS, &seed, "0x10000", "1000"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_basechain_only() {
        let raw = format!("1:{}", "83".repeat(32));
        let err = parse(&[&raw, "1", "0x10000", "1000"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        // raw masterchain addresses start with a hyphen
        let master = format!("-1:{}", "83".repeat(32));
        assert!(parse(&["--", &master, "1", "0x10000", "1000"]).is_ok());
    }

    #[test]
    fn test_difficulty_bounds() {
        let too_easy = format!("0x4{}", "0".repeat(48));
        assert!(parse(&[ADDRESS, "1", &too_easy, "1000"]).is_err());
        let hardest_allowed = format!("0x3{}", "f".repeat(48));
        assert!(parse(&[ADDRESS, "1", &hardest_allowed, "1000"]).is_ok());
        assert!(parse(&[ADDRESS, "1", "0", "1000"]).is_err());
    }

    #[test]
    fn test_iterations_saturate() {
        let cli = parse(&[ADDRESS, "1", "0x10000", "18446744073709551615"]).unwrap();
        assert_eq!(cli.max_iterations, i64::MAX);
    }

    #[test]
    fn test_last_bounce_flag_wins() {
        let cli = parse(&["-b", "-n", ADDRESS, "1", "0x10000", "1"]).unwrap();
        assert!(!build_config(&cli).unwrap().0.origin.bounceable);

        let cli = parse(&["-n", "-b", ADDRESS, "1", "0x10000", "1"]).unwrap();
        assert!(build_config(&cli).unwrap().0.origin.bounceable);

        let raw = format!("0:{}", "83".repeat(32));
        let cli = parse(&[&raw, "1", "0x10000", "1"]).unwrap();
        assert!(!build_config(&cli).unwrap().0.origin.bounceable);
        let cli = parse(&["-b", &raw, "1", "0x10000", "1"]).unwrap();
        assert!(build_config(&cli).unwrap().0.origin.bounceable);
    }

    #[test]
    fn test_option_ranges() {
        assert!(parse(&["-w0", ADDRESS, "1", "0x10000", "1"]).is_err());
        assert!(parse(&["-w257", ADDRESS, "1", "0x10000", "1"]).is_err());
        assert!(parse(&["-w256", ADDRESS, "1", "0x10000", "1"]).is_ok());
        assert!(parse(&["-F0", ADDRESS, "1", "0x10000", "1"]).is_err());
        assert!(parse(&["-F65537", ADDRESS, "1", "0x10000", "1"]).is_err());
        assert!(parse(&["-g17", ADDRESS, "1", "0x10000", "1"]).is_err());
        assert!(parse(&["-t0", ADDRESS, "1", "0x10000", "1"]).is_err());
        assert!(parse(&["-t", "-2", ADDRESS, "1", "0x10000", "1"]).is_err());
    }

    #[test]
    fn test_timeout_sets_deadline_outside_benchmark() {
        let cli = parse(&["-t2.5", ADDRESS, "1", "0x10000", "1"]).unwrap();
        assert_eq!(cli.timeout, Some(Duration::from_millis(2500)));
        assert!(build_config(&cli).unwrap().0.deadline.is_some());

        let cli = parse(&["-B", "-t1", ADDRESS, "1", "0x10000", "1"]).unwrap();
        assert!(build_config(&cli).unwrap().0.deadline.is_none());
    }

    #[test]
    fn test_destination_requires_output() {
        let dest = format!("-1:{}", "a0".repeat(32));
        let err = parse(&["--", ADDRESS, "1", "0x10000", "1", &dest]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let cli = parse(&["--", ADDRESS, "1", "0x10000", "1", &dest, "out.boc"]).unwrap();
        let (_, envelope) = build_config(&cli).unwrap();
        let envelope = envelope.unwrap();
        assert_eq!(envelope.destination.workchain, -1);
        assert_eq!(envelope.path, PathBuf::from("out.boc"));
    }

    #[test]
    fn test_destination_workchain_restricted() {
        let dest = format!("5:{}", "a0".repeat(32));
        let err = parse(&[ADDRESS, "1", "0x10000", "1", &dest, "out.boc"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert_eq!(err.exit_code(), 2);

        let dest = format!("0:{}", "a0".repeat(32));
        assert!(parse(&[ADDRESS, "1", "0x10000", "1", &dest, "out.boc"]).is_ok());
    }

    #[test]
    fn test_exit_code_follows_outcome() {
        let stats = powminer_core::StatsSnapshot {
            elapsed_secs: 1.0,
            attempts: 10,
            attempts_per_second: 10.0,
        };
        let found = SearchOutcome::Found {
            value: vec![0xAB],
            stats,
        };
        assert_eq!(exit_status(&found), 0);
        assert_eq!(exit_status(&SearchOutcome::Exhausted { stats }), 1);
    }

    #[test]
    fn test_device_backend_rules() {
        let cli = parse(&["--backend", "cuda", ADDRESS, "1", "0x10000", "1"]).unwrap();
        let err = build_config(&cli).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);

        let cli = parse(&["--backend", "opencl", "-g0", "-w2", ADDRESS, "1", "0x10000", "1"]).unwrap();
        assert_eq!(build_config(&cli).unwrap_err().kind(), ErrorKind::ValueValidation);

        let cli = parse(&["--backend", "opencl", "-g3", "-p1", ADDRESS, "1", "0x10000", "1"]).unwrap();
        let (config, _) = build_config(&cli).unwrap();
        assert_eq!(
            config.device,
            Some(DeviceSelector {
                gpu_id: 3,
                platform_id: 1
            })
        );
        assert_eq!(config.backend, BackendKind::OpenCl);
    }

    #[test]
    fn test_version_flag() {
        let err = parse(&["-V"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
        assert_eq!(err.exit_code(), 0);
    }
}
