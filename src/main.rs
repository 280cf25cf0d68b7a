use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dicom_windowing::{Config, Error, UploadedFile, Viewer, viewer::ErrorPayload};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(version, about = "Render DICOM series through upload sessions")]
struct Cli {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the upload root of the config
    #[arg(long)]
    upload_root: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload every file below a directory into a new session and list it
    Scan {
        dir: PathBuf,
        /// Session to replace
        #[arg(long)]
        previous: Option<String>,
        /// Where to write the first rendered image
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Render a stored file with a custom window
    Render {
        file: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        center: f64,
        #[arg(long)]
        width: f64,
        #[arg(long, default_value = "result.png")]
        out: PathBuf,
    },
    /// Remove a session and its files
    Cleanup { upload_id: String },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            println!(
                "{}",
                serde_json::to_string(&ErrorPayload::from(&err)).unwrap_or_default()
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    if let Some(root) = cli.upload_root {
        config = config.with_upload_root(root);
    }
    let viewer = Viewer::new(&config)?;

    match cli.command {
        Command::Scan { dir, previous, out } => {
            let mut files = Vec::new();
            for entry in WalkDir::new(&dir) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!("Skipping unreadable entry below {}: {err}", dir.display());
                        continue;
                    }
                };
                if entry.file_type().is_file() {
                    let name = entry
                        .path()
                        .strip_prefix(&dir)
                        .unwrap_or(entry.path())
                        .to_string_lossy()
                        .into_owned();
                    files.push(UploadedFile::new(name, std::fs::read(entry.path())?));
                }
            }

            let response = viewer.scan_upload(previous.as_deref(), &files)?;
            if let Some(out) = out {
                std::fs::write(out, base64_decode(&response.image)?)?;
            }
            println!("{}", to_json(&response, true)?);
        }
        Command::Render {
            file,
            center,
            width,
            out,
        } => {
            let encoded = viewer.pipeline().render(&file, center, width)?;
            std::fs::write(&out, encoded)?;
            println!("Saved {}", out.display());
        }
        Command::Cleanup { upload_id } => {
            let response = viewer.cleanup(&upload_id)?;
            println!("{}", to_json(&response, false)?);
        }
    }
    Ok(())
}

/// Serialize a response for stdout
fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, Error> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    text.map_err(|err| Error::Io(std::io::Error::from(err)))
}

fn base64_decode(text: &str) -> Result<Vec<u8>, Error> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(text)
        .map_err(|err| Error::Decode(err.to_string()))
}
