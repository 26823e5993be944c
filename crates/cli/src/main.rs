use std::path::PathBuf;
use std::process;

use clap::Parser;

use facetask_core::detection::domain::detector_options::DetectorOptions;
use facetask_core::detection::domain::model_provider::ModelEntry;
use facetask_core::detection::infrastructure::http_model_provider::HttpModelProvider;
use facetask_core::detection::infrastructure::rustface_detector::RustfaceDetectorFactory;
use facetask_core::shared::constants::{DETECTOR_MODEL_NAME, DETECTOR_MODEL_URL};
use facetask_core::shared::image_buffer::ImageBuffer;
use facetask_core::worker::{self, Command, Response};

/// Detect faces in an image on a background worker thread.
#[derive(Parser)]
#[command(name = "facetask")]
struct Cli {
    /// Input image file.
    input: PathBuf,

    /// Directory with pre-downloaded models (skips the network).
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    score_threshold: f64,

    /// Smallest face side length to search for, in pixels.
    #[arg(long, default_value = "20")]
    min_face_size: u32,

    /// Downscale ratio between image pyramid levels (0.1-0.99).
    #[arg(long, default_value = "0.8")]
    pyramid_scale_factor: f32,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let options = DetectorOptions {
        score_threshold: cli.score_threshold,
        min_face_size: cli.min_face_size,
        pyramid_scale_factor: cli.pyramid_scale_factor,
    };
    options.validate()?;

    let rgb = image::open(&cli.input)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    let buffer = ImageBuffer::new(rgb.into_raw(), width, height, 3)?;

    let provider = HttpModelProvider::new(cli.model_dir)?;
    let factory = RustfaceDetectorFactory::new(DETECTOR_MODEL_NAME);
    let manifest = vec![ModelEntry::new(DETECTOR_MODEL_NAME, DETECTOR_MODEL_URL)];

    let handle = worker::spawn(Box::new(provider), Box::new(factory), manifest);

    handle.send(Command::LoadModels);
    handle.send(Command::DetectFaces {
        image: buffer,
        options,
    });

    match handle.recv().ok_or("worker exited before responding")? {
        Response::ModelsLoaded => log::info!("models ready"),
        Response::LoadError { message } => return Err(message.into()),
        other => return Err(format!("unexpected response: {other:?}").into()),
    }

    match handle.recv().ok_or("worker exited before responding")? {
        Response::DetectionResult { detections, .. } => {
            println!("{} face(s) found", detections.len());
            for (i, d) in detections.iter().enumerate() {
                println!(
                    "  #{i}: x={} y={} {}x{} score={:.2}",
                    d.region.x, d.region.y, d.region.width, d.region.height, d.region.score
                );
            }
        }
        Response::DetectionFailed { message } | Response::InvalidOptions { message } => {
            return Err(message.into())
        }
        Response::ModelsNotReady { state } => {
            return Err(format!("models not ready: {state}").into())
        }
        other => return Err(format!("unexpected response: {other:?}").into()),
    }

    Ok(())
}
