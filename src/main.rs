//! tethercam command-line demo.
//!
//! Drives the camera engine against the bundled mock SDK:
//!
//! ```text
//! tethercam identity
//! tethercam get iso
//! tethercam set tv 1/250
//! tethercam capture --af --out shot.jpg
//! tethercam focus
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tethercam::camera::TetheredCamera;
use tethercam::config::{TetherConfig, DEFAULT_CONFIG_PATH};
use tethercam::hardware::MockCameraSdk;
use tethercam::{CameraEngine, CameraProperty};

/// Tethered camera control over a serialized SDK worker
#[derive(Parser)]
#[command(name = "tethercam")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print model, serial number and firmware
    Identity,

    /// Show a property's value and supported values
    Get {
        /// Property (iso, av, tv, ev, ae-mode, wb, metering, drive, af-mode)
        property: CameraProperty,
    },

    /// Set a property by label
    Set {
        /// Property (iso, av, tv, ev, ae-mode, wb, metering, drive, af-mode)
        property: CameraProperty,

        /// Label, e.g. "400" for ISO or "1/250" for Tv
        label: String,
    },

    /// Show every known property
    Props,

    /// Take a picture
    Capture {
        /// Autofocus before releasing the shutter
        #[arg(long)]
        af: bool,

        /// Write the image here instead of the camera's file name
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Run an autofocus cycle
    Focus,

    /// Grab one live-view frame
    LiveView {
        /// Output file
        #[arg(short, long, default_value = "liveview.jpg")]
        out: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = TetherConfig::load_from(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.application.log_level)),
        )
        .init();

    if let Commands::Config = cli.command {
        print!(
            "{}",
            toml::to_string_pretty(&config).context("Failed to render configuration")?
        );
        return Ok(());
    }

    let engine = CameraEngine::new(Box::new(MockCameraSdk::new()), &config)
        .context("Failed to start camera engine")?;

    let result = run(&engine, cli.command).await;
    engine.shutdown().await;
    result
}

async fn run(camera: &dyn TetheredCamera, command: Commands) -> Result<()> {
    match command {
        Commands::Identity => {
            let identity = camera.identity().await.context("Failed to read identity")?;
            println!("{}", serde_json::to_string_pretty(&identity)?);
        }
        Commands::Get { property } => {
            let snapshot = camera
                .get_property(property.descriptor())
                .await
                .with_context(|| format!("Failed to read {property}"))?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Commands::Set { property, label } => {
            camera
                .set_property(property.descriptor(), &label)
                .await
                .with_context(|| format!("Failed to set {property}"))?;
            let snapshot = camera.get_property(property.descriptor()).await?;
            println!("{property} = {}", snapshot.value);
        }
        Commands::Props => {
            for property in CameraProperty::ALL {
                let snapshot = camera.get_property(property.descriptor()).await?;
                println!(
                    "{:<10} {:<12} [{}]",
                    property.as_str(),
                    snapshot.value,
                    snapshot.supported.join(", ")
                );
            }
        }
        Commands::Capture { af, out } => {
            let image = camera.take_picture(af).await.context("Capture failed")?;
            let path = out.unwrap_or_else(|| PathBuf::from(&image.file_name));
            std::fs::write(&path, &image.bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} ({} bytes) captured at {} -> {}",
                image.file_name,
                image.bytes.len(),
                image.captured_at.to_rfc3339(),
                path.display()
            );
        }
        Commands::Focus => {
            camera.autofocus().await.context("Autofocus failed")?;
            println!("Focus complete");
        }
        Commands::LiveView { out } => {
            camera.start_live_view().await?;
            let frame = camera.live_view_frame().await;
            camera.stop_live_view().await?;
            match frame.context("Live view failed")? {
                Some(bytes) => {
                    std::fs::write(&out, &bytes)
                        .with_context(|| format!("Failed to write {}", out.display()))?;
                    println!("{} bytes -> {}", bytes.len(), out.display());
                }
                None => println!("No frame available"),
            }
        }
        Commands::Config => {}
    }
    Ok(())
}
