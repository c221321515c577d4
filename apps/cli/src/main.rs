mod logging;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use hrm_omero::{
    summarize, Credentials, OmeroBridge, ProcessAdapter, TransferReport, TreeNodeId,
    UploadRequest, UserFolders,
};
use hrm_settings::{Settings, SettingsStore};
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "hrm-cli",
    about = "Exchange images between the Huygens Remote Manager and OMERO",
    author,
    version
)]
struct Cli {
    /// Settings file for the connector and image folders.
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "HRM_OMERO_CONFIG",
        default_value = "hrm-omero.json"
    )]
    config: PathBuf,

    /// OMERO user name.
    #[arg(long, global = true, env = "OMERO_USER", default_value = "")]
    user: String,

    /// OMERO password.
    #[arg(
        long,
        global = true,
        env = "OMERO_PASSWORD",
        hide_env_values = true,
        default_value = ""
    )]
    password: String,

    /// Increase log output (-v progress, -vv connector commands).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify the OMERO credentials.
    Check,
    /// Print the raw child listing of one or more tree nodes.
    Children(ChildrenArgs),
    /// Retrieve images from OMERO into the user's source folder.
    Download(DownloadArgs),
    /// Attach result files from the user's destination folder to a dataset.
    Upload(UploadArgs),
    /// Inspect or create the settings file.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args)]
struct ChildrenArgs {
    /// Nodes in Kind:Id form, e.g. Project:12 or Dataset:23.
    #[arg(required = true, value_name = "NODE")]
    nodes: Vec<String>,
}

#[derive(Args)]
struct DownloadArgs {
    /// JSON list of selected images: [{"id":"Image:5","name":"a.tif"}, ...]
    #[arg(long, value_name = "JSON")]
    images: String,
}

#[derive(Args)]
struct UploadArgs {
    /// Destination dataset id.
    #[arg(long, value_name = "ID")]
    dataset: Option<String>,

    /// JSON array of file names, as posted by the file browser.
    #[arg(long, value_name = "JSON", conflicts_with = "files")]
    selected_files: Option<String>,

    /// File names relative to the destination folder.
    #[arg(value_name = "FILE")]
    files: Vec<String>,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective settings as JSON.
    Show,
    /// Write a settings file populated with defaults.
    Init(ConfigInitArgs),
}

#[derive(Args)]
struct ConfigInitArgs {
    /// Replace an existing settings file.
    #[arg(long)]
    force: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli {
        config,
        user,
        password,
        verbose,
        command,
    } = Cli::parse();
    logging::init_logging(verbose);

    let credentials = Credentials::new(user, password);
    match command {
        Commands::Config(subcommand) => execute_config_command(subcommand, &config),
        Commands::Check => {
            let session = open_session(&config, credentials)?;
            println!("Logged in to OMERO as {}", session.bridge.user());
            Ok(())
        }
        Commands::Children(args) => {
            let mut session = open_session(&config, credentials)?;
            list_children(&mut session.bridge, &args.nodes)
        }
        Commands::Download(args) => {
            let mut session = open_session(&config, credentials)?;
            download(&mut session.bridge, &args, &session.folders)
        }
        Commands::Upload(args) => {
            let mut session = open_session(&config, credentials)?;
            upload(&mut session.bridge, args, &session.folders)
        }
    }
}

/// A logged-in bridge together with the user's image folders.
struct Session {
    bridge: OmeroBridge<ProcessAdapter>,
    folders: UserFolders,
}

fn build_adapter(settings: &Settings) -> ProcessAdapter {
    let mut adapter = ProcessAdapter::new(settings.adapter.program.clone());
    if let Some(dir) = &settings.adapter.working_dir {
        adapter = adapter.with_working_dir(dir);
    }
    if let Some(timeout) = settings.adapter.timeout() {
        adapter = adapter.with_timeout(timeout);
    }
    adapter
}

fn open_session(config: &Path, credentials: Credentials) -> Result<Session> {
    let store = SettingsStore::load(config)?;
    let settings = store.settings();
    debug!(config = %config.display(), "settings loaded");

    credentials.validate()?;
    let user = credentials.user().to_string();
    let folders = UserFolders::new(
        settings.folders.source_for(&user)?,
        settings.folders.destination_for(&user)?,
    );
    let bridge = OmeroBridge::connect(build_adapter(settings), credentials);
    if !bridge.logged_in() {
        bail!("could not log in to OMERO as '{user}'");
    }
    Ok(Session { bridge, folders })
}

fn list_children(bridge: &mut OmeroBridge<ProcessAdapter>, nodes: &[String]) -> Result<()> {
    let mut failed = Vec::new();
    for raw in nodes {
        let node: TreeNodeId = raw.parse()?;
        match bridge.get_children(&node) {
            Some(listing) => println!("{node}\t{listing}"),
            None => failed.push(node.key()),
        }
    }
    if !failed.is_empty() {
        bail!("failed retrieving children of {}", failed.join(" "));
    }
    Ok(())
}

fn download(
    bridge: &mut OmeroBridge<ProcessAdapter>,
    args: &DownloadArgs,
    folders: &UserFolders,
) -> Result<()> {
    ensure_dir(&folders.source)?;
    let report = bridge.download_from_omero(&args.images, folders)?;
    finish_transfer(&report)
}

fn upload(
    bridge: &mut OmeroBridge<ProcessAdapter>,
    args: UploadArgs,
    folders: &UserFolders,
) -> Result<()> {
    let request = match args.selected_files {
        Some(json) => UploadRequest::from_posted(&json, args.dataset.as_deref())?,
        None => UploadRequest::new(args.files, args.dataset),
    };
    let report = bridge.upload_to_omero(&request, folders)?;
    finish_transfer(&report)
}

fn finish_transfer(report: &TransferReport) -> Result<()> {
    let message = summarize(report);
    if !message.is_empty() {
        println!("{message}");
    }
    let failures = report.failed().count();
    if failures > 0 {
        return Err(anyhow!("{failures} of {} transfers failed", report.len()));
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("failed to create {}", path.display()))
}

fn execute_config_command(command: ConfigCommand, path: &Path) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let store = SettingsStore::load(path)?;
            println!("{}", store.to_json_string()?);
            Ok(())
        }
        ConfigCommand::Init(args) => {
            if path.exists() && !args.force {
                bail!(
                    "settings file '{}' already exists; pass --force to replace it",
                    path.display()
                );
            }
            SettingsStore::new(path, Settings::default())
                .save()
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote default settings to {}", path.display());
            Ok(())
        }
    }
}
