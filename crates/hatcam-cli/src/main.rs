use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use hatcam_core::adapter::FaceDetectorAdapter;
use hatcam_core::controller::CaptureController;
use hatcam_core::detector::SlimFaceDetector;
use hatcam_core::hats::HatKind;
use hatcam_core::selector::DeviceSelector;
use hatcam_core::types::StreamConstraints;
use hatcam_hw::V4lMedia;

mod config;
mod term_overlay;

use config::Config;
use term_overlay::TermOverlay;

#[derive(Parser)]
#[command(name = "hatcam", about = "Overlay an emoji hat on a detected face from a live camera feed")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the capture loop until Ctrl-C
    Run {
        /// Capture device id (e.g., /dev/video0); defaults to the first
        /// enumerated device
        #[arg(short, long)]
        device: Option<String>,
        /// Hat to wear (see `hatcam hats`)
        #[arg(long, default_value = "tophat")]
        hat: String,
    },
    /// List available capture devices
    Devices {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List available hats
    Hats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Run { device, hat } => run(config, device, hat).await,
        Commands::Devices { json } => list_devices(json).await,
        Commands::Hats => {
            for hat in HatKind::ALL {
                println!("{:<16} {}", hat.id(), hat.glyph());
            }
            Ok(())
        }
    }
}

async fn run(config: Config, device: Option<String>, hat: String) -> Result<()> {
    let hat = HatKind::from_id(&hat)?;

    let media = Arc::new(V4lMedia);
    let model_path = config.model_path.clone();
    let threshold = config.confidence_threshold;
    let detector = FaceDetectorAdapter::new(move || {
        SlimFaceDetector::load_with_threshold(&model_path, threshold)
    });
    let overlay = Arc::new(TermOverlay::new(config.frame_width, config.frame_height));

    let controller = CaptureController::new(
        media,
        detector,
        overlay,
        config.tick_interval,
        StreamConstraints {
            width: config.frame_width,
            height: config.frame_height,
            device_id: device,
        },
    );

    controller.set_hat(hat).await;
    controller.start().await?;
    tracing::info!("capture loop running; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    controller.stop().await;
    Ok(())
}

async fn list_devices(json: bool) -> Result<()> {
    let selector = DeviceSelector::new(Arc::new(V4lMedia));
    let devices = selector.enumerate().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
    } else if devices.is_empty() {
        println!("no capture devices found");
    } else {
        for device in devices {
            println!("{:<16} {}", device.id, device.label);
        }
    }
    Ok(())
}
