use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

use services::{AppServices, Clock, DEFAULT_AUTO_ADVANCE_DELAY, FileCorpus, QuizLaunch};

mod terminal;

#[derive(Debug, PartialEq, Eq)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidSeed { raw: String },
    InvalidDelay { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidDelay { raw } => {
                write!(f, "invalid --auto-advance-ms value: {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  quiz [--bank <path>] [--db <sqlite_url>] [--seed <u64>] [--auto-advance-ms <ms>]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --bank questions.txt");
    eprintln!("  --db sqlite://quiz.sqlite3");
    eprintln!("  --auto-advance-ms 1500");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_BANK_PATH, QUIZ_DB_URL, QUIZ_SEED, QUIZ_AUTO_ADVANCE_MS, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    bank_path: PathBuf,
    db_url: String,
    seed: Option<u64>,
    auto_advance: Duration,
    help: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            bank_path: PathBuf::from("questions.txt"),
            db_url: "sqlite://quiz.sqlite3".into(),
            seed: None,
            auto_advance: DEFAULT_AUTO_ADVANCE_DELAY,
            help: false,
        }
    }
}

impl Args {
    /// Defaults overridden by `QUIZ_*` variables. Unparseable values are ignored.
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bank_path: std::env::var_os("QUIZ_BANK_PATH")
                .map_or(defaults.bank_path, PathBuf::from),
            db_url: std::env::var("QUIZ_DB_URL")
                .ok()
                .map_or(defaults.db_url, normalize_sqlite_url),
            seed: std::env::var("QUIZ_SEED")
                .ok()
                .and_then(|value| value.parse().ok()),
            auto_advance: std::env::var("QUIZ_AUTO_ADVANCE_MS")
                .ok()
                .and_then(|value| value.parse().ok())
                .map_or(defaults.auto_advance, Duration::from_millis),
            help: false,
        }
    }

    /// Apply command-line flags on top of `self`.
    fn parse(mut self, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--bank" => {
                    self.bank_path = PathBuf::from(require_value(args, "--bank")?);
                }
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    self.db_url = normalize_sqlite_url(value);
                }
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    let seed = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                    self.seed = Some(seed);
                }
                "--auto-advance-ms" => {
                    let value = require_value(args, "--auto-advance-ms")?;
                    let millis = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDelay { raw: value.clone() })?;
                    self.auto_advance = Duration::from_millis(millis);
                }
                "--help" | "-h" => self.help = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(self)
    }

    /// Generators for question selection and option shuffling.
    fn rngs(&self) -> (StdRng, StdRng) {
        match self.seed {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (StdRng::from_os_rng(), StdRng::from_os_rng()),
        }
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::from_env()
        .parse(&mut std::env::args().skip(1))
        .inspect_err(|e| {
            eprintln!("{e}");
            print_usage();
        })?;
    if args.help {
        print_usage();
        return Ok(());
    }

    init_tracing();
    tracing::debug!(?args, "starting quiz");

    // Open + migrate SQLite before the corpus is read so a bad --db fails fast.
    prepare_sqlite_file(&args.db_url)?;
    let services = AppServices::new_sqlite(&args.db_url, Clock::default_clock()).await?;

    let (selection_rng, shuffle_rng) = args.rngs();
    let source = FileCorpus::new(&args.bank_path);
    let session = match services
        .open_quiz(&source, selection_rng, shuffle_rng)
        .await?
    {
        QuizLaunch::Ready(session) => session,
        QuizLaunch::LoadFailed(reason) => {
            return Err(format!("question bank unavailable: {reason}").into());
        }
    };

    terminal::run(session, args.auto_advance).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
