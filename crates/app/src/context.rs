//! Request-scoped context wiring chain building to the runtime.

use std::sync::Arc;

use blurmill_core::constants::{IMAGE_MANIPULATION_WORK_NAME, KEY_IMAGE_URI, TAG_OUTPUT};
use blurmill_core::status::WorkStatus;
use blurmill_core::types::ImageRef;
use blurmill_runtime::{ChainHandle, ChainRuntime, ExistingChainPolicy, RuntimeError, WorkInfo};
use tokio::sync::watch;

use crate::chain::build_blur_chain;

/// Holds the source image and drives the blur pipeline for one session.
///
/// Constructed explicitly, torn down by dropping it. All pipeline
/// operations funnel through the fixed unique name, so two contexts
/// sharing a runtime also share the single pipeline slot.
pub struct BlurContext {
    runtime: Arc<ChainRuntime>,
    image: ImageRef,
    output: Option<ImageRef>,
}

impl BlurContext {
    pub fn new(runtime: Arc<ChainRuntime>, image: ImageRef) -> Self {
        Self {
            runtime,
            image,
            output: None,
        }
    }

    /// The source image the pipeline reads.
    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    /// Locator of the last absorbed saved output, if any.
    pub fn output(&self) -> Option<&ImageRef> {
        self.output.as_ref()
    }

    /// Build and enqueue the blur chain, replacing any active run under
    /// the fixed pipeline name.
    pub async fn apply_blur(&self, blur_level: u32) -> Result<ChainHandle, RuntimeError> {
        let requests = build_blur_chain(blur_level, &self.image);
        self.runtime
            .enqueue_unique(
                IMAGE_MANIPULATION_WORK_NAME,
                ExistingChainPolicy::Replace,
                requests,
            )
            .await
    }

    /// Cancel the pipeline, if it is running.
    pub async fn cancel_work(&self) {
        self.runtime
            .cancel_unique(IMAGE_MANIPULATION_WORK_NAME)
            .await;
    }

    /// Watch the tagged save unit's snapshot list.
    pub async fn output_watch(&self) -> watch::Receiver<Vec<WorkInfo>> {
        self.runtime.watch_tag(TAG_OUTPUT).await
    }

    /// Record the saved output locator from an observed snapshot list.
    ///
    /// Mirrors the observer contract: only the first element is
    /// consulted, and only a succeeded unit carries a usable locator.
    pub fn absorb_output(&mut self, infos: &[WorkInfo]) {
        let Some(info) = infos.first() else {
            return;
        };
        if info.status == WorkStatus::Succeeded {
            if let Some(locator) = info.output.get_str(KEY_IMAGE_URI) {
                self.output = Some(ImageRef::new(locator));
            }
        }
    }
}
