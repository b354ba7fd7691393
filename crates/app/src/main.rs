use std::sync::Arc;

use blurmill_app::{spawn_ui_observer, AppConfig, BlurContext, UiState};
use blurmill_core::request::WorkerKind;
use blurmill_core::types::ImageRef;
use blurmill_events::StatusEvent;
use blurmill_runtime::ChainRuntime;
use blurmill_workers::{BlurWorker, CleanupWorker, SaveWorker};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "blurmill_app=debug,blurmill_runtime=debug,blurmill_workers=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = AppConfig::from_env();
    tracing::info!(
        root = %config.work_root.display(),
        blur_level = config.blur_level,
        "Loaded configuration",
    );
    std::fs::create_dir_all(&config.work_root).expect("Failed to create work root");

    // --- Source image ---
    let source = match &config.source_image {
        Some(image) => image.clone(),
        None => generate_sample_image(&config.work_root),
    };
    tracing::info!(source = %source, "Source image resolved");

    // --- Runtime ---
    let runtime = ChainRuntime::builder()
        .register(
            WorkerKind::Cleanup,
            Arc::new(CleanupWorker::new(&config.work_root)),
        )
        .register(
            WorkerKind::Blur,
            Arc::new(BlurWorker::new(&config.work_root)),
        )
        .register(
            WorkerKind::Save,
            Arc::new(SaveWorker::new(&config.work_root)),
        )
        .build();

    // Log every status transition while the demo runs.
    let logger = spawn_status_logger(runtime.subscribe());

    // --- Blur context ---
    let mut context = BlurContext::new(Arc::clone(&runtime), source);
    let output_watch = context.output_watch().await;
    let (mut ui_states, observer) = spawn_ui_observer(output_watch.clone());

    context
        .apply_blur(config.blur_level)
        .await
        .expect("Failed to enqueue blur chain");

    // Follow the observer until the pipeline reaches a terminal state.
    loop {
        if ui_states.changed().await.is_err() {
            break;
        }
        let state = *ui_states.borrow_and_update();
        tracing::info!(state = ?state, "Pipeline state");
        if state == UiState::Finished {
            break;
        }
    }

    context.absorb_output(output_watch.borrow().as_slice());
    match context.output() {
        Some(output) => tracing::info!(output = %output, "Saved blurred image"),
        None => tracing::warn!("Pipeline finished without a saved output"),
    }

    runtime.shutdown().await;
    observer.abort();
    logger.abort();
}

/// Write a small gradient sample under the work root, standing in for a
/// bundled source image.
fn generate_sample_image(root: &std::path::Path) -> ImageRef {
    let path = root.join("sample-source.png");
    image::RgbaImage::from_fn(256, 256, |x, y| image::Rgba([x as u8, y as u8, 160, 255]))
        .save(&path)
        .expect("Failed to write sample image");
    ImageRef::from_path(&path)
}

/// Log every status transition until the bus closes.
fn spawn_status_logger(
    mut receiver: broadcast::Receiver<StatusEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    tracing::info!(
                        chain = %event.chain,
                        kind = %event.kind,
                        status = %event.status,
                        "Status transition",
                    );
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Status logger lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
