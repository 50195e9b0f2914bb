//! Keyward - local access control CLI

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

use keyward_access::{
    AccessConfig, AuthenticationMethod, AuthenticationRequest, AuthenticationResult,
    AuthenticationService, PolicyConfig, SystemClock,
};
use keyward_core::types::{duration_as_secs_f64, duration_from_secs_f64};
use keyward_core::AuthenticationPolicy;

/// Keyward - password login with brute-force lockout
#[derive(Parser)]
#[command(name = "keyward")]
#[command(about = "Local access control with session expiry and brute-force lockout")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the keyward data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Default,
    Strict,
    Lenient,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the authentication policy (from config.json unless a preset is given)
    Init {
        #[arg(long, value_enum)]
        preset: Option<Preset>,
    },

    /// Register the primary user
    Register {
        /// Password (read from stdin if omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Authenticate with the password and start a session
    Unlock {
        /// Password (read from stdin if omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Show authentication status
    Status {
        /// Also check whether this session id grants access
        #[arg(long)]
        session: Option<String>,
    },

    /// Renew the current session
    Touch,

    /// End the current session
    Lock,

    /// Change the authentication policy (resets lockout and session)
    Configure {
        /// Session duration in seconds
        #[arg(long)]
        session_secs: Option<f64>,

        /// Failed attempts before blocking
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Block duration in seconds
        #[arg(long)]
        block_secs: Option<f64>,
    },

    /// Remove the registered user and clear lockout state
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keyward=info,keyward_access=info,keyward_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(AccessConfig::default_data_dir);
    let mut config = AccessConfig::load_or_create(&data_dir)?;
    let service = AuthenticationService::from_config(&config, Arc::new(SystemClock))?;

    match cli.command {
        Commands::Init { preset } => {
            if service.is_configured()? {
                error!(
                    "Authentication policy already exists. Use 'keyward configure' to change it."
                );
                return Ok(());
            }

            let policy = match preset {
                None => config.policy.to_policy()?,
                Some(Preset::Default) => AuthenticationPolicy::default(),
                Some(Preset::Strict) => AuthenticationPolicy::strict(),
                Some(Preset::Lenient) => AuthenticationPolicy::lenient(),
            };
            service.create_authentication_policy(&policy)?;

            config.policy = PolicyConfig::from(&policy);
            config.save(&config.config_path())?;

            println!("\n=== Keyward Initialized ===\n");
            print_policy(&policy);
            println!("\nData directory: {}", config.data_dir.display());
        }

        Commands::Register { password } => {
            let password = read_password(password, "New password: ")?;
            let user_id = service.register_user(&password)?;
            println!("Registered user {}", user_id.short());
        }

        Commands::Unlock { password } => {
            if service.is_authentication_blocked()? {
                bail!("Authentication blocked: {}", lockout_message(&service)?);
            }
            let password = read_password(password, "Password: ")?;
            let request = AuthenticationRequest::Password(password);
            match service.authenticate_user(&request)? {
                AuthenticationResult::Success { session_id, .. } => {
                    println!("Unlocked. Session: {}", session_id);
                    println!(
                        "Expires in {:.0}s unless renewed with 'keyward touch'",
                        duration_as_secs_f64(service.session_duration()?)
                    );
                }
                AuthenticationResult::Failure => {
                    bail!(
                        "Wrong password ({} attempts remaining)",
                        service.remaining_attempts()?
                    );
                }
                AuthenticationResult::Blocked => {
                    bail!("Wrong password. Authentication blocked: {}", lockout_message(&service)?);
                }
            }
        }

        Commands::Status { session } => {
            println!("\n=== Keyward Status ===\n");
            if !service.is_configured()? {
                println!("Not initialized. Run 'keyward init' first.");
                return Ok(());
            }
            print_policy(&service.policy()?);
            println!();
            println!("Registered:    {}", service.is_user_registered()?);
            println!("Authenticated: {}", service.is_user_authenticated()?);
            println!("Blocked:       {}", service.is_authentication_blocked()?);
            if service.is_authentication_blocked()? {
                println!("Block lifts:   {}", lockout_message(&service)?);
            } else {
                println!("Attempts left: {}", service.remaining_attempts()?);
            }
            println!(
                "Methods:       password{}",
                if service.is_authentication_method_possible(AuthenticationMethod::TouchId)?
                    || service.is_authentication_method_possible(AuthenticationMethod::FaceId)?
                {
                    ", biometry"
                } else {
                    ""
                }
            );
            if let Some(session) = session {
                println!("Session valid: {}", service.has_access(&session)?);
            }
        }

        Commands::Touch => {
            service.use_access()?;
            info!("Session renewed");
            println!("Session renewed");
        }

        Commands::Lock => {
            if service.end_session()? {
                println!("Locked");
            } else {
                println!("No active session");
            }
        }

        Commands::Configure {
            session_secs,
            max_attempts,
            block_secs,
        } => {
            if session_secs.is_none() && max_attempts.is_none() && block_secs.is_none() {
                warn!("Nothing to configure");
                return Ok(());
            }
            if let Some(secs) = session_secs {
                service.configure_session(parse_secs(secs)?)?;
            }
            if let Some(count) = max_attempts {
                service.configure_max_password_attempts(count)?;
            }
            if let Some(secs) = block_secs {
                service.configure_block_duration(parse_secs(secs)?)?;
            }

            let policy = service.policy()?;
            config.policy = PolicyConfig::from(&policy);
            config.save(&config.config_path())?;

            println!("\n=== Policy Updated ===\n");
            print_policy(&policy);
        }

        Commands::Reset { yes } => {
            if !yes {
                warn!("This removes the registered user. Re-run with --yes to confirm.");
                return Ok(());
            }
            service.reset()?;
            println!("Reset complete. Register a new user with 'keyward register'.");
        }
    }

    Ok(())
}

fn print_policy(policy: &AuthenticationPolicy) {
    println!("Session duration: {}s", duration_as_secs_f64(policy.session_duration()));
    println!("Max attempts:     {}", policy.max_failed_attempts());
    println!("Block duration:   {}s", duration_as_secs_f64(policy.block_duration()));
}

fn lockout_message(service: &AuthenticationService) -> anyhow::Result<String> {
    Ok(match service.lockout_remaining()? {
        Some(remaining) => format!("try again in {:.1}s", duration_as_secs_f64(remaining)),
        None => "blocked indefinitely".to_string(),
    })
}

fn parse_secs(secs: f64) -> anyhow::Result<chrono::Duration> {
    duration_from_secs_f64(secs).ok_or_else(|| anyhow!("Duration out of range: {}", secs))
}

/// Take the password from the argument or read one line from stdin
fn read_password(arg: Option<String>, prompt: &str) -> anyhow::Result<Zeroizing<String>> {
    if let Some(password) = arg {
        return Ok(Zeroizing::new(password));
    }
    eprint!("{}", prompt);
    io::stderr().flush()?;

    let mut line = Zeroizing::new(String::new());
    io::stdin().lock().read_line(&mut line)?;
    let trimmed = line.trim_end_matches(['\r', '\n']);
    Ok(Zeroizing::new(trimmed.to_string()))
}
