//! Builds the cleanup -> blur xN -> save work chain.

use blurmill_core::constants::{KEY_IMAGE_URI, TAG_OUTPUT};
use blurmill_core::data::InputData;
use blurmill_core::request::{WorkRequest, WorkerKind};
use blurmill_core::types::ImageRef;

/// Compose the image manipulation chain for `blur_level` passes.
///
/// Always starts with a cleanup unit and ends with one save unit tagged
/// for observation. Only the first blur unit declares the source image;
/// every later unit consumes its predecessor's output. `blur_level == 0`
/// yields the degenerate cleanup -> save chain.
pub fn build_blur_chain(blur_level: u32, image: &ImageRef) -> Vec<WorkRequest> {
    let mut requests = Vec::with_capacity(blur_level as usize + 2);

    requests.push(WorkRequest::from_kind(WorkerKind::Cleanup));

    for i in 0..blur_level {
        let mut builder = WorkRequest::builder(WorkerKind::Blur);
        if i == 0 {
            builder = builder.input(
                InputData::builder()
                    .put_str(KEY_IMAGE_URI, image.as_str())
                    .build(),
            );
        }
        requests.push(builder.build());
    }

    requests.push(
        WorkRequest::builder(WorkerKind::Save)
            .tag(TAG_OUTPUT)
            .build(),
    );

    requests
}
