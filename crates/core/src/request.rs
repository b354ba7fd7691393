//! Work requests: one unit of background work plus its input and tags.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data::InputData;

/// Identifier assigned to a work request when it is built.
pub type RequestId = Uuid;

/// The built-in worker a request is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    /// Delete stale temporary files before a new run.
    Cleanup,
    /// Apply one blur pass to the input image.
    Blur,
    /// Persist the final image to the output directory.
    Save,
}

impl std::fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Cleanup => "cleanup",
            Self::Blur => "blur",
            Self::Save => "save",
        };
        f.write_str(name)
    }
}

/// A single unit of background work.
///
/// Created when a chain is built and consumed by the runtime. The id is
/// assigned up front so observers can correlate status events with the
/// requests they enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkRequest {
    pub id: RequestId,
    pub kind: WorkerKind,
    /// Input declared on the request itself; the runtime merges the
    /// previous unit's output over it before dispatch.
    pub input: InputData,
    pub tags: Vec<String>,
}

impl WorkRequest {
    /// Start building a request for `kind` with empty input and no tags.
    pub fn builder(kind: WorkerKind) -> WorkRequestBuilder {
        WorkRequestBuilder {
            kind,
            input: InputData::default(),
            tags: Vec::new(),
        }
    }

    /// Shorthand for a request with no input and no tags.
    pub fn from_kind(kind: WorkerKind) -> WorkRequest {
        Self::builder(kind).build()
    }

    /// True when the request carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Builder for [`WorkRequest`].
#[derive(Debug)]
pub struct WorkRequestBuilder {
    kind: WorkerKind,
    input: InputData,
    tags: Vec<String>,
}

impl WorkRequestBuilder {
    /// Declare the input bag for the request.
    pub fn input(mut self, input: InputData) -> Self {
        self.input = input;
        self
    }

    /// Add an observation tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Finish the request, assigning a fresh id.
    pub fn build(self) -> WorkRequest {
        WorkRequest {
            id: Uuid::new_v4(),
            kind: self.kind,
            input: self.input,
            tags: self.tags,
        }
    }
}
