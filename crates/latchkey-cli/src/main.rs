//! `latchkey`: badge reader door controller.
//!
//! ```text
//! latchkey --config /etc/latchkey.toml run
//! latchkey init-db --reset
//! latchkey enroll Ada Lovelace ada@example.org 0004132154
//! latchkey set-enabled 0004132154 off
//! latchkey check 0004132154
//! latchkey list
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, builder::BoolishValueParser};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use latchkey_core::{CredentialCode, LatchkeyConfig};
use latchkey_door::{CredentialGate, DoorController, DoorTimings};
use latchkey_hardware::{GpioPanel, SerialTransport};
use latchkey_storage::{
    Database, DatabaseConfig, KeyCodeRepository, NewUser, SqliteCredentialStore,
    SqliteKeyCodeRepository, SqliteUserRepository, UserRepository, transaction,
};

/// Badge reader door controller
#[derive(Parser, Debug)]
#[command(name = "latchkey", version, author, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "latchkey.toml")]
    config: PathBuf,

    /// Serial device of the badge reader (overrides serial.port)
    #[arg(long, global = true)]
    port: Option<String>,

    /// SQLite database file (overrides database.path)
    #[arg(long, global = true)]
    database: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Run the door controller until interrupted or a hardware fault
    Run,

    /// Create the database schema
    InitDb {
        /// Drop every table first
        #[arg(long)]
        reset: bool,
    },

    /// Enroll a user with a new key code
    Enroll {
        first_name: String,
        last_name: String,
        email: String,
        code: String,

        /// Store the key code disabled
        #[arg(long)]
        disabled: bool,
    },

    /// Enable or disable a key code
    SetEnabled {
        code: String,

        #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        enabled: bool,
    },

    /// Show whether a key code would open the door
    Check { code: String },

    /// List enrolled users and key codes
    List,
}

impl Cli {
    /// Load the configuration file, then apply flag overrides.
    fn load_config(&self) -> Result<LatchkeyConfig> {
        let mut config = LatchkeyConfig::load(&self.config)
            .with_context(|| format!("Failed to load config from {}", self.config.display()))?;
        self.apply_flags(&mut config)?;
        Ok(config)
    }

    fn apply_flags(&self, config: &mut LatchkeyConfig) -> Result<()> {
        if let Some(port) = &self.port {
            config.serial.port = port.clone();
        }
        if let Some(database) = &self.database {
            config.database.path = database.clone();
        }
        config.validate().context("Invalid configuration")?;
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.load_config()?;

    match cli.command {
        Command::Run => run(&config).await?,
        Command::InitDb { reset } => init_db(&config, reset).await?,
        Command::Enroll {
            first_name,
            last_name,
            email,
            code,
            disabled,
        } => {
            let user = NewUser::new(first_name, last_name, email);
            enroll(&config, user, &code, !disabled).await?
        }
        Command::SetEnabled { code, enabled } => set_enabled(&config, &code, enabled).await?,
        Command::Check { code } => return check(&config, &code).await,
        Command::List => list(&config).await?,
    }

    Ok(ExitCode::SUCCESS)
}

/// `RUST_LOG` wins unless `--verbose` is given; the fallback is `info`.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn open_database(config: &LatchkeyConfig) -> Result<Database> {
    Database::new(DatabaseConfig::from_section(&config.database))
        .await
        .with_context(|| format!("Failed to open database {}", config.database.path))
}

fn parse_code(code: &str) -> Result<CredentialCode> {
    CredentialCode::new(code).with_context(|| format!("Invalid key code {:?}", code))
}

async fn run(config: &LatchkeyConfig) -> Result<()> {
    let db = open_database(config).await?;

    let transport = SerialTransport::open(&config.serial)
        .with_context(|| format!("Failed to open badge reader on {}", config.serial.port))?;
    let panel = GpioPanel::from_sysfs(&config.gpio).context("Failed to set up door GPIO")?;
    let gate = CredentialGate::new(SqliteCredentialStore::new(db.pool().clone()));

    let mut door = DoorController::new(transport, panel, gate, DoorTimings::from(&config.timing))
        .context("Failed to start door controller")?;

    let fault = tokio::select! {
        result = door.run() => match result {
            Ok(never) => match never {},
            Err(e) => Some(e),
        },
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "Failed to listen for interrupt");
            }
            info!("Interrupted, shutting down");
            None
        }
    };

    if let Err(e) = door.shutdown() {
        error!(error = %e, "Failed to lock door on shutdown");
    }
    db.close().await;

    match fault {
        Some(e) => Err(e).context("Door controller stopped"),
        None => Ok(()),
    }
}

async fn init_db(config: &LatchkeyConfig, reset: bool) -> Result<()> {
    let db = open_database(config).await?;
    if reset {
        db.reset().await.context("Failed to reset database")?;
        println!("Database {} reset", config.database.path);
    } else {
        println!("Database {} ready", config.database.path);
    }
    db.close().await;
    Ok(())
}

async fn enroll(config: &LatchkeyConfig, user: NewUser, code: &str, enabled: bool) -> Result<()> {
    let code = parse_code(code)?;
    let db = open_database(config).await?;

    let mut tx = db.pool().begin().await?;
    let enrollment = transaction::enroll_user(&mut tx, &user, &code, enabled)
        .await
        .with_context(|| format!("Failed to enroll {}", user.email))?;
    tx.commit().await?;

    println!(
        "Enrolled {} {} <{}> with key code {} (user {}, key code {}{})",
        user.first_name,
        user.last_name,
        user.email,
        code,
        enrollment.user_id,
        enrollment.key_code_id,
        if enabled { "" } else { ", disabled" }
    );
    db.close().await;
    Ok(())
}

async fn set_enabled(config: &LatchkeyConfig, code: &str, enabled: bool) -> Result<()> {
    let code = parse_code(code)?;
    let db = open_database(config).await?;

    SqliteKeyCodeRepository::new(db.pool().clone())
        .set_enabled(&code, enabled)
        .await
        .with_context(|| format!("Failed to update key code {}", code))?;

    println!("Key code {} {}", code, if enabled { "enabled" } else { "disabled" });
    db.close().await;
    Ok(())
}

async fn check(config: &LatchkeyConfig, code: &str) -> Result<ExitCode> {
    let code = parse_code(code)?;
    let db = open_database(config).await?;

    let gate = CredentialGate::new(SqliteCredentialStore::new(db.pool().clone()));
    let verdict = gate.check(&code).await;
    println!("{}: {}", code, verdict);

    db.close().await;
    Ok(if verdict.is_granted() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn list(config: &LatchkeyConfig) -> Result<()> {
    let db = open_database(config).await?;
    let users = SqliteUserRepository::new(db.pool().clone()).find_all().await?;
    let key_codes = SqliteKeyCodeRepository::new(db.pool().clone()).find_all().await?;

    let owners: HashMap<i64, String> = users
        .iter()
        .filter_map(|user| user.key_code_id.map(|id| (id, user.full_name())))
        .collect();

    println!("{:<28} {:<8} HOLDER", "KEY CODE", "ENABLED");
    for key_code in &key_codes {
        println!(
            "{:<28} {:<8} {}",
            key_code.code,
            if key_code.enabled { "yes" } else { "no" },
            owners.get(&key_code.id).map(String::as_str).unwrap_or("-")
        );
    }

    let without_code = users.iter().filter(|user| !user.has_key_code()).count();
    println!(
        "{} key codes, {} users ({} without a key code)",
        key_codes.len(),
        users.len(),
        without_code
    );

    db.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_enroll() {
        let cli = Cli::try_parse_from([
            "latchkey",
            "enroll",
            "Ada",
            "Lovelace",
            "ada@example.org",
            "12345",
            "--disabled",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("latchkey.toml"));
        assert_eq!(
            cli.command,
            Command::Enroll {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.org".to_string(),
                code: "12345".to_string(),
                disabled: true,
            }
        );
    }

    #[rstest]
    #[case("true", true)]
    #[case("on", true)]
    #[case("yes", true)]
    #[case("false", false)]
    #[case("off", false)]
    #[case("0", false)]
    fn test_parse_set_enabled(#[case] value: &str, #[case] expected: bool) {
        let cli = Cli::try_parse_from(["latchkey", "set-enabled", "12345", value]).unwrap();

        assert_eq!(
            cli.command,
            Command::SetEnabled {
                code: "12345".to_string(),
                enabled: expected,
            }
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "latchkey",
            "init-db",
            "--reset",
            "-v",
            "--config",
            "/etc/latchkey.toml",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("/etc/latchkey.toml"));
        assert_eq!(cli.command, Command::InitDb { reset: true });
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["latchkey"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "latchkey",
            "--port",
            "/dev/ttyUSB1",
            "--database",
            "/tmp/door.db",
            "run",
        ])
        .unwrap();
        let mut config = LatchkeyConfig::with_relock_settle_ms(5_000);

        cli.apply_flags(&mut config).unwrap();

        assert_eq!(config.serial.port, "/dev/ttyUSB1");
        assert_eq!(config.database.path, "/tmp/door.db");
    }

    #[test]
    fn test_example_config_is_valid() {
        let config =
            LatchkeyConfig::from_toml_str(include_str!("../../../latchkey.example.toml")).unwrap();

        assert_eq!(config, LatchkeyConfig::with_relock_settle_ms(5_000));
    }

    #[test]
    fn test_empty_port_flag_fails_validation() {
        let cli = Cli::try_parse_from(["latchkey", "--port", "", "run"]).unwrap();
        let mut config = LatchkeyConfig::with_relock_settle_ms(5_000);

        assert!(cli.apply_flags(&mut config).is_err());
    }
}
