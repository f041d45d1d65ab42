use std::{
    io::Write as _,
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, Result};
use clap::Parser;
use client_core::{
    Attachment, ClientEvent, DirectorySink, HttpIntakeBackend, SubmissionOrchestrator,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::TryRecvError},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod screen;
mod settings;

use commands::Command;
use settings::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(name = "intake", about = "Fill and submit the OTP-verified intake form")]
struct Args {
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    download_dir: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn apply_args(settings: &mut Settings, args: &Args) {
    if let Some(v) = &args.server_url {
        settings.server_url = v.clone();
    }
    if let Some(v) = &args.download_dir {
        settings.download_dir = v.clone();
    }
    if let Some(v) = args.timeout_secs {
        settings.request_timeout_secs = v;
    }
}

fn init_tracing(log_filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_filter)
            .map_err(|e| anyhow!("invalid log filter '{log_filter}': {e}"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    apply_args(&mut settings, &args);
    init_tracing(&settings.log_filter)?;

    let timeout = Duration::from_secs(settings.request_timeout_secs);
    let backend = HttpIntakeBackend::new(&settings.server_url, Some(timeout))?;
    let sink = DirectorySink::new(&settings.download_dir);
    info!(
        "intake: server={} downloads={}",
        backend.base_url(),
        sink.dir().display()
    );

    let orchestrator = SubmissionOrchestrator::new(Arc::new(backend), Arc::new(sink));
    run(orchestrator).await
}

fn drain_downloads(events: &mut broadcast::Receiver<ClientEvent>) {
    loop {
        match events.try_recv() {
            Ok(ClientEvent::DocumentSaved { path }) => {
                println!("Downloaded {}", path.display());
            }
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return,
        }
    }
}

async fn execute(orchestrator: &SubmissionOrchestrator, command: Command) {
    match command {
        Command::Set { field, value } => orchestrator.set_field(field, value).await,
        Command::Attach { slot, path } => match Attachment::from_path(&path).await {
            Ok(attachment) => orchestrator.set_attachment(slot, Some(attachment)).await,
            Err(err) => println!("{err:#}"),
        },
        Command::Detach { slot } => orchestrator.set_attachment(slot, None).await,
        Command::SendOtp => {
            orchestrator.request_otp().await;
        }
        Command::Verify => {
            orchestrator.verify_otp().await;
        }
        Command::Submit => {
            orchestrator.submit().await;
        }
        Command::Dismiss => orchestrator.dismiss_notification().await,
        Command::Help => println!("{}", commands::HELP),
        Command::Status | Command::Quit => {}
    }
}

async fn run(orchestrator: Arc<SubmissionOrchestrator>) -> Result<()> {
    let mut events = orchestrator.subscribe_events();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", screen::render(&orchestrator.snapshot().await));
    println!("type 'help' for commands");
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match commands::parse(&line) {
            Ok(command) => command,
            Err(commands::CommandError::Empty) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        if let Err(refusal) = screen::check(&command, &orchestrator.snapshot().await) {
            println!("{refusal}");
            continue;
        }
        let show_form = !matches!(command, Command::Help);
        execute(&orchestrator, command).await;
        drain_downloads(&mut events);
        if show_form {
            println!("{}", screen::render(&orchestrator.snapshot().await));
        }
    }
    Ok(())
}
