use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;

use jobsuggest::config::{ClientConfig, ConfigError};
use jobsuggest::net::{Entry, HttpTransport, SurveyAnswers, SurveyApi, Transport, TransportError};
use jobsuggest::speech::{ConsoleNarrator, RequestId, SpeechBackend, SpeechController, UtteranceOutcome};
use jobsuggest::state::{AppShell, MemoryPreferences, PreferenceStore, ShellError, View};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("http client setup failed: {0}")]
    Transport(#[from] TransportError),
    #[error("{0}")]
    Shell(#[from] ShellError),
    #[error("not signed in; pass --username and --password or set JOBSUGGEST_USERNAME / JOBSUGGEST_PASSWORD")]
    MissingCredentials,
    #[error("no entry with id {0}")]
    UnknownEntry(i64),
    #[error("entry {0} has no {1}")]
    EmptyField(i64, &'static str),
    #[error("refusing to delete entry {0} without --yes")]
    Unconfirmed(i64),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "jobsuggest", about = "Job suggestions client")]
struct Cli {
    /// Overrides JOBSUGGEST_BASE_URL.
    #[arg(long)]
    base_url: Option<String>,

    #[command(flatten)]
    auth: AuthArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct AuthArgs {
    #[arg(long, global = true, env = "JOBSUGGEST_USERNAME")]
    username: Option<String>,

    #[arg(long, global = true, env = "JOBSUGGEST_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show who the server thinks we are.
    Me,
    Login,
    Register,
    Logout,
    /// List saved entries.
    List,
    /// Submit the survey and print the generated suggestions.
    Submit(SurveyArgs),
    Delete {
        id: i64,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Read part of an entry aloud in the terminal.
    Read {
        id: i64,
        #[arg(long, value_enum, default_value_t = ReadField::Suggestions)]
        field: ReadField,
    },
}

#[derive(Args, Debug)]
struct SurveyArgs {
    #[arg(long, default_value = "")]
    work_history: String,
    #[arg(long, default_value = "")]
    skills: String,
    #[arg(long, default_value = "")]
    personality: String,
    #[arg(long, default_value = "")]
    location: String,
    #[arg(long, default_value = "")]
    role_preference: String,
}

impl From<SurveyArgs> for SurveyAnswers {
    fn from(args: SurveyArgs) -> Self {
        Self {
            work_history: args.work_history,
            skills: args.skills,
            personality: args.personality,
            location: args.location,
            role_preference: args.role_preference,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReadField {
    Suggestions,
    Answers,
    External,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }

    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config)?);
    let narrator: Arc<dyn SpeechBackend> = Arc::new(ConsoleNarrator::new(config.speech_wpm));
    let prefs: Arc<dyn PreferenceStore> = MemoryPreferences::new();
    let shell = AppShell::new(SurveyApi::new(transport), &config, SpeechController::new(narrator), prefs);

    match cli.command {
        Command::Me => run_me(&shell).await,
        Command::Login => {
            let (username, password) = credentials(&cli.auth)?;
            let session = shell.sign_in(username, password).await?;
            println!("signed in as {}", session.username().unwrap_or(username));
            Ok(())
        }
        Command::Register => {
            let (username, password) = credentials(&cli.auth)?;
            let session = shell.register(username, password).await?;
            println!("registered and signed in as {}", session.username().unwrap_or(username));
            Ok(())
        }
        Command::Logout => {
            ensure_signed_in(&shell, &cli.auth).await?;
            shell.logout().await;
            println!("signed out");
            Ok(())
        }
        Command::List => {
            ensure_signed_in(&shell, &cli.auth).await?;
            shell.refresh_entries().await?;
            print_entries(&shell);
            Ok(())
        }
        Command::Submit(args) => {
            ensure_signed_in(&shell, &cli.auth).await?;
            run_submit(&shell, args.into()).await
        }
        Command::Delete { id, yes } => {
            if !yes {
                return Err(CliError::Unconfirmed(id));
            }
            ensure_signed_in(&shell, &cli.auth).await?;
            shell.delete_entry(id).await?;
            println!("deleted entry {id}");
            Ok(())
        }
        Command::Read { id, field } => {
            ensure_signed_in(&shell, &cli.auth).await?;
            run_read(&shell, id, field).await
        }
    }
}

async fn run_me(shell: &AppShell) -> Result<(), CliError> {
    let view = shell.boot().await;
    match shell.session().current().username() {
        Some(username) => println!("{username}"),
        None => println!("anonymous ({view:?})"),
    }
    Ok(())
}

fn credentials(auth: &AuthArgs) -> Result<(&str, &str), CliError> {
    match (&auth.username, &auth.password) {
        (Some(username), Some(password)) => Ok((username, password)),
        _ => Err(CliError::MissingCredentials),
    }
}

/// Reuse the session cookie if the server already knows us, otherwise
/// sign in with the supplied credentials.
async fn ensure_signed_in(shell: &AppShell, auth: &AuthArgs) -> Result<(), CliError> {
    if let View::Page(page) = shell.boot().await {
        if shell.session().is_authenticated() {
            tracing::debug!(?page, "reusing existing session");
            return Ok(());
        }
    }
    let (username, password) = credentials(auth)?;
    shell.sign_in(username, password).await?;
    Ok(())
}

async fn run_submit(shell: &AppShell, mut answers: SurveyAnswers) -> Result<(), CliError> {
    eprintln!("submitting survey; this can take a while (ctrl-c to cancel)");
    let submit = shell.submit_survey(&mut answers);
    tokio::pin!(submit);

    let entry = tokio::select! {
        result = &mut submit => result?,
        _ = tokio::signal::ctrl_c() => {
            shell.submission().cancel();
            submit.await?
        }
    };
    print_json(&serde_json::to_value(&entry)?)
}

fn print_entries(shell: &AppShell) {
    let snapshot = shell.entries().snapshot();
    if snapshot.items.is_empty() {
        println!("no entries yet");
        return;
    }
    for (number, entry) in snapshot.numbered() {
        println!("#{number} (id {})", entry.id);
        println!("  suggestions: {}", entry.suggestions_text());
        if let Some(created_at) = &entry.created_at {
            println!("  created: {created_at}");
        }
    }
}

async fn run_read(shell: &AppShell, id: i64, field: ReadField) -> Result<(), CliError> {
    let entries = shell.refresh_entries().await?;
    let entry = entries.iter().find(|e| e.id == id).ok_or(CliError::UnknownEntry(id))?;
    let text = read_text(entry, field)?;

    let speech = shell.speech();
    let utterance = speech.speak(text, RequestId::new(format!("entry-{id}")));
    let outcome = tokio::select! {
        outcome = utterance.finished() => outcome,
        _ = tokio::signal::ctrl_c() => {
            speech.stop();
            UtteranceOutcome::Cancelled
        }
    };
    tracing::debug!(?outcome, "read aloud ended");
    Ok(())
}

fn read_text(entry: &Entry, field: ReadField) -> Result<String, CliError> {
    match field {
        ReadField::Suggestions => entry
            .suggestions
            .clone()
            .ok_or(CliError::EmptyField(entry.id, "suggestions")),
        ReadField::Answers => Ok(entry.answers_text()),
        ReadField::External => entry
            .external_api_data
            .as_ref()
            .map(jobsuggest::net::ExternalData::to_display_text)
            .ok_or(CliError::EmptyField(entry.id, "external data")),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
