pub mod artifact;
pub mod backend;
pub mod error;
pub mod notification;
pub mod orchestrator;
pub mod store;
pub mod workflow;

pub use artifact::{ArtifactSink, DirectorySink};
pub use backend::{HttpIntakeBackend, IntakeBackend, SubmissionPayload, VerifyOutcome};
pub use error::{ArtifactError, BackendError};
pub use notification::NotificationState;
pub use orchestrator::{
    ClientEvent, FormSnapshot, Operation, OperationOutcome, SubmissionOrchestrator,
};
pub use store::{Attachment, Attachments, FormRecord, FormStore};
pub use workflow::{TransitionError, WorkflowState, WorkflowTransition};
