//! API factory core: pure task state machine, artifact registry and view model.
mod artifact;
mod effect;
mod error;
mod msg;
mod state;
mod task;
mod update;
mod view_model;

pub use artifact::{api_url, ArtifactKind, ArtifactRegistry, UnknownArtifactKind};
pub use effect::Effect;
pub use error::{PollError, ProcessingFailure, SurfacedError, UploadError};
pub use msg::Msg;
pub use state::{TaskMachine, TaskPhase};
pub use task::{
    HttpMethod, PreviewEntry, StatusSnapshot, SubmissionId, Task, TaskId, TaskStatus,
    UnknownTaskStatus,
};
pub use update::update;
pub use view_model::{PhaseLabel, TaskView};
