use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::{PreviewEntry, TaskId};

/// Downloadable output of a successful task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// Postman request collection (JSON).
    RequestCollection,
    /// Pytest project archive (zip).
    TestSuite,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 2] = [ArtifactKind::RequestCollection, ArtifactKind::TestSuite];

    /// Name used in status responses and download paths.
    pub fn wire_name(self) -> &'static str {
        match self {
            ArtifactKind::RequestCollection => "postman",
            ArtifactKind::TestSuite => "pytest",
        }
    }

    /// File name used when the download response does not suggest one.
    pub fn default_file_name(self) -> &'static str {
        match self {
            ArtifactKind::RequestCollection => "postman_collection.json",
            ArtifactKind::TestSuite => "pytest_suite.zip",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown artifact kind '{0}'")]
pub struct UnknownArtifactKind(pub String);

impl FromStr for ArtifactKind {
    type Err = UnknownArtifactKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ArtifactKind::ALL
            .into_iter()
            .find(|kind| kind.wire_name() == value)
            .ok_or_else(|| UnknownArtifactKind(value.to_string()))
    }
}

/// Builds `{base}/{segments...}`, percent-encoding each segment.
///
/// Any path already present on `base` is kept as a prefix. Returns `None` for
/// URLs that cannot carry a path (e.g. `mailto:`).
pub fn api_url(base: &Url, segments: &[&str]) -> Option<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(segments);
    Some(url)
}

/// Terminal snapshot of what a successful task produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRegistry {
    task_id: TaskId,
    kinds: BTreeSet<ArtifactKind>,
    preview: Vec<PreviewEntry>,
}

impl ArtifactRegistry {
    pub fn new(
        task_id: TaskId,
        kinds: impl IntoIterator<Item = ArtifactKind>,
        preview: Vec<PreviewEntry>,
    ) -> Self {
        Self {
            task_id,
            kinds: kinds.into_iter().collect(),
            preview,
        }
    }

    /// Ready kinds in stable order.
    pub fn kinds(&self) -> impl Iterator<Item = ArtifactKind> + '_ {
        self.kinds.iter().copied()
    }

    pub fn contains(&self, kind: ArtifactKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn preview(&self) -> &[PreviewEntry] {
        &self.preview
    }

    /// `{base}/api/download/{task_id}/{kind}`, or `None` when `kind` is not ready.
    pub fn download_link(&self, base: &Url, kind: ArtifactKind) -> Option<Url> {
        if !self.contains(kind) {
            return None;
        }
        api_url(
            base,
            &["api", "download", self.task_id.as_str(), kind.wire_name()],
        )
    }
}
