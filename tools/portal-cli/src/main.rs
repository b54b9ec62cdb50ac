//! portal-cli: Feedback Portal command line
//!
//! Drives the portal session from a terminal. The session lives in the data
//! directory between invocations, so `login`, `verify` and `submit` can be
//! run as separate commands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use portal_session::{
    FeedbackCategory, FileBackedKVStore, PortalApiClient, PortalConfig, Screen, SessionApi,
    SessionDependencies, SessionError, SessionService, SessionState,
};

/// Feedback portal session from the command line
#[derive(Parser, Debug)]
#[command(name = "portal-cli")]
#[command(about = "Sign in, verify a meter and send feedback to the customer portal")]
struct Args {
    /// Backend API base URL (overrides PORTAL_API_BASE_URL)
    #[arg(long, global = true)]
    api_base_url: Option<String>,

    /// Directory holding the session file (overrides PORTAL_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Skip the meter verification stage
    #[arg(long, global = true, conflicts_with = "require_verification")]
    no_verification: bool,

    /// Require meter verification before feedback
    #[arg(long, global = true)]
    require_verification: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current session
    Status,
    /// Sign in with an identity provider credential
    Login {
        /// Compact JWT issued by the identity provider
        #[arg(long, env = "PORTAL_CREDENTIAL")]
        credential: String,
    },
    /// Verify a meter number for the signed-in user
    Verify {
        /// Meter number as printed on the meter
        meter: String,
    },
    /// Send feedback
    Submit {
        /// complaint, suggestion, compliment, inquiry or other
        #[arg(long, default_value = "other")]
        category: FeedbackCategory,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        message: String,
        #[arg(long)]
        phone: Option<String>,
        /// Contact name, defaults to the signed-in user's name
        #[arg(long)]
        name: Option<String>,
        /// Contact email, defaults to the signed-in user's email
        #[arg(long)]
        email: Option<String>,
    },
    /// Sign out and forget the session
    Logout,
}

type CliSession = SessionService<FileBackedKVStore, PortalApiClient, PortalApiClient>;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = load_config(&args)?;
    let session = open_session(config)?;

    match args.command {
        Command::Status => print_status(&session),
        Command::Login { credential } => {
            let identity = session.login(&credential).map_err(user_error)?;
            println!("Signed in as {}", identity.greeting_name());
            print_next_step(&session);
        }
        Command::Verify { meter } => {
            let record = session
                .submit_identifier(&meter)
                .await
                .map_err(user_error)?;
            println!("Meter {} verified for {}", record.account_id, record.owner_name);
            if let Some(address) = &record.owner_address {
                println!("Address: {address}");
            }
        }
        Command::Submit {
            category,
            subject,
            message,
            phone,
            name,
            email,
        } => {
            let Some(mut draft) = session.feedback_draft() else {
                bail!(not_ready_message(session.screen()));
            };
            draft.category = category;
            draft.subject = subject;
            draft.message = message;
            draft.phone = phone;
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(email) = email {
                draft.email = email;
            }

            session.submit_feedback(&draft).await.map_err(user_error)?;
            println!("Thank you! Your {} has been received.", draft.category.label());
        }
        Command::Logout => {
            session.logout();
            println!("Signed out");
        }
    }

    Ok(())
}

/// Environment first, then command-line overrides.
fn load_config(args: &Args) -> Result<PortalConfig> {
    let mut config = PortalConfig::from_env();

    if let Some(url) = &args.api_base_url {
        config.api.base_url = url.clone();
    }
    if let Some(dir) = &args.data_dir {
        config.session.data_dir = dir.clone();
    }
    if args.no_verification {
        config.session.require_verification = false;
    }
    if args.require_verification {
        config.session.require_verification = true;
    }

    config.validate()?;
    Ok(config)
}

fn open_session(config: PortalConfig) -> Result<CliSession> {
    let client = Arc::new(PortalApiClient::new(&config.api)?);
    let store = FileBackedKVStore::new(config.session.store_path());
    debug!("Session file: {}", store.path().display());

    let deps = SessionDependencies {
        kv_store: store,
        verification: client.clone(),
        submission: client,
    };
    Ok(SessionService::restore(deps, config.session))
}

fn print_status(session: &CliSession) {
    match session.state() {
        SessionState::Unauthenticated => println!("Not signed in"),
        SessionState::Authenticated(identity) => {
            println!("Signed in as {} <{}>", identity.greeting_name(), identity.email);
        }
        SessionState::Verified(identity, record) => {
            println!("Signed in as {} <{}>", identity.greeting_name(), identity.email);
            println!("Meter {} ({})", record.account_id, record.owner_name);
        }
    }
    print_next_step(session);
}

fn print_next_step(session: &CliSession) {
    match session.screen() {
        Screen::Login => println!("Next: portal-cli login --credential <token>"),
        Screen::Verification => println!("Next: portal-cli verify <meter-number>"),
        Screen::Feedback => {
            println!("Next: portal-cli submit --subject <subject> --message <message>")
        }
    }
}

fn not_ready_message(screen: Screen) -> &'static str {
    match screen {
        Screen::Login => "Please sign in before sending feedback.",
        Screen::Verification => "Please verify your meter number before sending feedback.",
        Screen::Feedback => "Feedback form is not available.",
    }
}

fn user_error(e: SessionError) -> anyhow::Error {
    debug!("Session error: {:?}", e);
    anyhow!(e.user_message())
}
