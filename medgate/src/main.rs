use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use medgate::{LOCKED_MESSAGE, LoginOutcome, MedgateBuilder, MedgateConfig, MedgateError};

const EXIT_OK: u8 = 0;
const EXIT_REJECTED: u8 = 1;
const EXIT_FAILED: u8 = 2;

/// Command line interface for medgate
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, env = "DB_PATH")]
    db_path: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(clap::Subcommand)]
enum Commands {
    /// Create the user and patient tables
    Migrate,
    /// Log in and search patients by surname
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// Surname search term
        #[arg(long)]
        surname: Option<String>,
    },
    /// Print version information
    Version,
}

/// What a finished command reports: an exit code and the text to print.
///
/// Text goes to stdout on success and to stderr otherwise.
#[derive(Debug, PartialEq, Eq)]
struct Report {
    code: u8,
    message: String,
}

impl Report {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            code: EXIT_OK,
            message: message.into(),
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            code: EXIT_REJECTED,
            message: message.into(),
        }
    }
}

fn load_config(db_path: Option<PathBuf>) -> Result<MedgateConfig, MedgateError> {
    MedgateConfig::from_lookup(|key| match (key, &db_path) {
        ("DB_PATH", Some(path)) => Some(path.display().to_string()),
        _ => std::env::var(key).ok(),
    })
}

fn render(outcome: LoginOutcome) -> Result<Report, MedgateError> {
    match outcome {
        LoginOutcome::Authenticated(records) => serde_json::to_string_pretty(&records)
            .map(Report::ok)
            .map_err(|e| MedgateError::StorageError(e.to_string())),
        LoginOutcome::InvalidCredentials(_) => Ok(Report::rejected("Invalid credentials")),
        LoginOutcome::Locked(_) => Ok(Report::rejected(LOCKED_MESSAGE)),
    }
}

async fn run(cli: Cli) -> Result<Report, MedgateError> {
    match cli.command {
        Commands::Version => Ok(Report::ok(format!(
            "medgate v{}",
            env!("CARGO_PKG_VERSION")
        ))),
        Commands::Migrate => {
            let config = load_config(cli.db_path)?;
            MedgateBuilder::from_config(&config)
                .await
                .map_err(|e| MedgateError::StorageError(e.to_string()))?
                .apply_migrations(true)
                .build()
                .await
                .map_err(|e| MedgateError::StorageError(e.to_string()))?;
            Ok(Report::ok("Migrations applied"))
        }
        Commands::Login {
            username,
            password,
            surname,
        } => {
            let config = load_config(cli.db_path)?;
            let medgate = MedgateBuilder::from_config(&config)
                .await
                .map_err(|e| MedgateError::StorageError(e.to_string()))?
                .build()
                .await
                .map_err(|e| MedgateError::ConfigError(e.to_string()))?;

            let outcome = medgate
                .login(&username, &password, surname.as_deref())
                .await?;
            render(outcome)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(report) if report.code == EXIT_OK => {
            println!("{}", report.message);
            ExitCode::SUCCESS
        }
        Ok(report) => {
            eprintln!("{}", report.message);
            ExitCode::from(report.code)
        }
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            eprintln!("{}", err.user_message());
            ExitCode::from(EXIT_FAILED)
        }
    }
}
