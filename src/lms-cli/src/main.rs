use anyhow::Result;
use clap::{Parser, Subcommand};
use lms_client::{install, LmsClient};
use lms_core::{
    init_logging, AlbumImport, AppDirs, Config, EventDispatcher, ImportEvent, LmsSection,
    RelativePath, RescanListener, RescanOutcome, ServerConfig,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "lms-notify",
    version,
    about = "Ask a Lyrion Music Server to rescan its library"
)]
struct Cli {
    /// Directory holding config.toml and logs (defaults to the platform config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    /// LMS host override (takes precedence over config)
    #[arg(long, global = true)]
    host: Option<String>,
    /// LMS port override (takes precedence over config)
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Talk to LMS over https (`--secure=false` forces plain http)
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    secure: Option<bool>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Issue a rescan command to the LMS
    #[command(name = "lmsrescan")]
    Rescan {
        /// Rescan even if a scan is already running
        #[arg(long)]
        force: bool,
    },
    /// Rescan a single directory below the LMS library root
    #[command(name = "lmspathscan")]
    PathScan {
        /// Path relative to library_root, or an absolute directory with --library-dir
        path: String,
        /// Local music directory that PATH is resolved against
        #[arg(long)]
        library_dir: Option<PathBuf>,
    },
    /// Is LMS currently scanning?
    #[command(name = "lmsstatus")]
    Status,
    /// Notify the configured listener that an import session finished
    ImportCompleted,
    /// Notify the configured listener that an album was imported
    AlbumImported {
        /// Absolute directory of the imported album
        #[arg(long)]
        item_dir: PathBuf,
        /// Local music directory
        #[arg(long)]
        library_dir: PathBuf,
    },
    /// Print the effective LMS settings
    Config,
}

impl Cli {
    fn apply_overrides(&self, section: &mut LmsSection) {
        if let Some(host) = &self.host {
            section.host = host.clone();
        }
        if let Some(port) = self.port {
            section.port = port;
        }
        if let Some(secure) = self.secure {
            section.secure = secure;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let dirs = match &cli.config_dir {
        Some(dir) => AppDirs::rooted_at(dir),
        None => AppDirs::discover()?,
    };
    let mut config = Config::load_or_default(&dirs)?;
    let _logging = init_logging(&config.logging, dirs.log_dir())?;
    cli.apply_overrides(&mut config.lms);

    match cli.command {
        Command::Config => {
            let server = config.server()?;
            print_config(&server, &Config::config_path(&dirs));
        }
        Command::ImportCompleted => {
            emit(&config.lms, ImportEvent::ImportCompleted).await?;
        }
        Command::AlbumImported {
            item_dir,
            library_dir,
        } => {
            let event = ImportEvent::AlbumImported(AlbumImport {
                item_dir,
                library_dir,
            });
            emit(&config.lms, event).await?;
        }
        command => {
            let server = config.server()?;
            let listener = RescanListener::new(
                server.listener_method,
                Arc::new(LmsClient::new(server)?),
            );
            run_command(&listener, command).await;
        }
    }

    Ok(())
}

async fn run_command(listener: &RescanListener, command: Command) {
    match command {
        Command::Rescan { force: true } => report(listener.trigger(None).await),
        Command::Rescan { force: false } => report(listener.rescan_library().await),
        Command::PathScan { path, library_dir } => {
            let outcome = match library_dir {
                Some(library_dir) => {
                    let album = AlbumImport {
                        item_dir: PathBuf::from(path),
                        library_dir,
                    };
                    listener.rescan_album(&album).await
                }
                None => listener.trigger(Some(RelativePath::new(path))).await,
            };
            report(outcome);
        }
        Command::Status => {
            if listener.scan_in_progress().await {
                tracing::info!("LMS library scan in progress");
                println!("LMS library scan in progress");
            } else {
                tracing::info!("LMS not currently scanning");
                println!("LMS not currently scanning");
            }
        }
        Command::ImportCompleted | Command::AlbumImported { .. } | Command::Config => {}
    }
}

/// Install the configured listener and deliver one event to it, as the
/// library manager would.
async fn emit(section: &LmsSection, event: ImportEvent) -> Result<()> {
    let mut dispatcher = EventDispatcher::new();
    let listener = install(section, &mut dispatcher)?;
    let delivered = dispatcher.emit(&event).await;
    if delivered == 0 {
        println!(
            "{} ignored: listener_method is '{}'",
            event.kind().as_str(),
            listener.method()
        );
    }
    Ok(())
}

fn report(outcome: RescanOutcome) {
    println!("{}", describe(&outcome));
}

fn describe(outcome: &RescanOutcome) -> String {
    match outcome {
        RescanOutcome::Triggered { path: None } => "LMS library rescan triggered.".to_string(),
        RescanOutcome::Triggered { path: Some(path) } => {
            format!("LMS rescan triggered for '{path}'.")
        }
        RescanOutcome::Skipped => {
            "LMS library scan already in progress. Skipping rescan.".to_string()
        }
        RescanOutcome::Ignored => "Nothing to rescan.".to_string(),
        RescanOutcome::Failed { reason } => format!("LMS rescan failed: {reason}"),
    }
}

fn print_config(server: &ServerConfig, path: &std::path::Path) {
    println!("Config file: {}", path.display());
    println!("  server url:      {}", server.server_url());
    println!("  library root:    {}", server.library_root);
    println!("  listener method: {}", server.listener_method);
    println!("  timeout:         {}s", server.timeout.as_secs());
}
