use std::{collections::HashMap, path::PathBuf, sync::Arc};

use shared::{
    domain::{AttachmentSlot, FieldName, RequestSeq, Step, WorkflowEpoch},
    protocol::{SendOtpRequest, VerifyOtpRequest, DOCUMENT_FILENAME},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

use crate::{
    artifact::ArtifactSink,
    backend::{IntakeBackend, SubmissionPayload, VerifyOutcome},
    notification::{self, NotificationState},
    store::{Attachment, Attachments, FormRecord, FormStore},
    workflow::{WorkflowState, WorkflowTransition},
};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    RequestOtp,
    VerifyOtp,
    Submit,
}

impl Operation {
    const ALL: [Operation; 3] = [Operation::RequestOtp, Operation::VerifyOtp, Operation::Submit];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationOutcome {
    Succeeded,
    Failed,
    /// A local guard refused the action; no request was issued.
    Blocked,
    /// The workflow was reset while the request was in flight.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    NotificationShown { message: String },
    StepChanged { step: Step },
    DocumentSaved { path: PathBuf },
    WorkflowReset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSnapshot {
    pub record: FormRecord,
    pub attachments: Attachments,
    pub workflow: WorkflowState,
    pub notification: NotificationState,
    pub in_flight: Vec<Operation>,
}

#[derive(Debug, Clone, Copy)]
struct Ticket {
    operation: Operation,
    epoch: WorkflowEpoch,
    seq: RequestSeq,
}

#[derive(Default)]
struct SessionState {
    store: FormStore,
    notification: NotificationState,
    epoch: WorkflowEpoch,
    last_seq: RequestSeq,
    in_flight: HashMap<Operation, usize>,
}

impl SessionState {
    fn begin(&mut self, operation: Operation) -> Ticket {
        self.last_seq = self.last_seq.next();
        *self.in_flight.entry(operation).or_default() += 1;
        Ticket {
            operation,
            epoch: self.epoch,
            seq: self.last_seq,
        }
    }

    /// Returns whether the ticket still belongs to the current workflow instance.
    fn finish(&mut self, ticket: &Ticket) -> bool {
        if let Some(count) = self.in_flight.get_mut(&ticket.operation) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.in_flight.remove(&ticket.operation);
            }
        }
        ticket.epoch == self.epoch
    }

    fn in_flight(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|operation| self.in_flight.contains_key(operation))
            .collect()
    }
}

pub struct SubmissionOrchestrator {
    backend: Arc<dyn IntakeBackend>,
    sink: Arc<dyn ArtifactSink>,
    inner: Mutex<SessionState>,
    events: broadcast::Sender<ClientEvent>,
}

impl SubmissionOrchestrator {
    pub fn new(backend: Arc<dyn IntakeBackend>, sink: Arc<dyn ArtifactSink>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            backend,
            sink,
            inner: Mutex::new(SessionState::default()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> FormSnapshot {
        let state = self.inner.lock().await;
        FormSnapshot {
            record: state.store.record().clone(),
            attachments: state.store.attachments().clone(),
            workflow: state.store.workflow(),
            notification: state.notification.clone(),
            in_flight: state.in_flight(),
        }
    }

    pub async fn workflow(&self) -> WorkflowState {
        self.inner.lock().await.store.workflow()
    }

    pub async fn notification(&self) -> NotificationState {
        self.inner.lock().await.notification.clone()
    }

    pub async fn dismiss_notification(&self) {
        self.inner.lock().await.notification.dismiss();
    }

    pub async fn set_field(&self, field: FieldName, value: impl Into<String>) {
        self.inner.lock().await.store.set_field(field, value);
    }

    pub async fn set_attachment(&self, slot: AttachmentSlot, attachment: Option<Attachment>) {
        self.inner.lock().await.store.set_attachment(slot, attachment);
    }

    fn notify(&self, state: &mut SessionState, message: impl Into<String>) {
        let message = message.into();
        state.notification.show(message.clone());
        let _ = self.events.send(ClientEvent::NotificationShown { message });
    }

    pub async fn request_otp(&self) -> OperationOutcome {
        let (ticket, request) = {
            let mut state = self.inner.lock().await;
            if !state.store.workflow().can_request_otp() {
                self.notify(&mut state, notification::OTP_ALREADY_SENT);
                return OperationOutcome::Blocked;
            }
            let request = SendOtpRequest {
                email: state.store.record().email.clone(),
            };
            (state.begin(Operation::RequestOtp), request)
        };

        let result = self.backend.send_otp(request).await;

        let mut state = self.inner.lock().await;
        if !state.finish(&ticket) {
            warn!(
                "otp: discarding send response seq={} from epoch {}",
                ticket.seq.0, ticket.epoch.0
            );
            return OperationOutcome::Stale;
        }
        match result {
            Ok(()) => {
                if let Err(err) = state.store.apply(WorkflowTransition::OtpDelivered) {
                    error!("otp: unexpected transition failure after send: {err}");
                }
                info!("otp: code sent seq={}", ticket.seq.0);
                self.notify(&mut state, notification::OTP_SENT);
                OperationOutcome::Succeeded
            }
            Err(err) => {
                warn!("otp: send failed seq={}: {err}", ticket.seq.0);
                self.notify(&mut state, notification::OTP_SEND_FAILED);
                OperationOutcome::Failed
            }
        }
    }

    pub async fn verify_otp(&self) -> OperationOutcome {
        let (ticket, request) = {
            let mut state = self.inner.lock().await;
            if !state.store.workflow().otp_sent() {
                self.notify(&mut state, notification::OTP_NOT_REQUESTED);
                return OperationOutcome::Blocked;
            }
            let record = state.store.record();
            let request = VerifyOtpRequest {
                email: record.email.clone(),
                code: record.otp_code.clone(),
            };
            (state.begin(Operation::VerifyOtp), request)
        };

        let result = self.backend.verify_otp(request).await;

        let mut state = self.inner.lock().await;
        if !state.finish(&ticket) {
            warn!(
                "otp: discarding verify response seq={} from epoch {}",
                ticket.seq.0, ticket.epoch.0
            );
            return OperationOutcome::Stale;
        }
        match result {
            Ok(VerifyOutcome::Verified(body)) => {
                let previous = state.store.workflow().step();
                match state.store.apply(WorkflowTransition::OtpVerified) {
                    Ok(workflow) => {
                        info!(
                            "otp: verified seq={} server_message={:?}",
                            ticket.seq.0,
                            body.message()
                        );
                        if workflow.step() != previous {
                            let _ = self.events.send(ClientEvent::StepChanged {
                                step: workflow.step(),
                            });
                        }
                        self.notify(&mut state, notification::OTP_VERIFIED);
                        OperationOutcome::Succeeded
                    }
                    Err(err) => {
                        error!("otp: cannot advance after verification: {err}");
                        self.notify(&mut state, notification::verify_failed(Some(&err.to_string())));
                        OperationOutcome::Failed
                    }
                }
            }
            Ok(VerifyOutcome::Rejected { detail }) => {
                warn!(
                    "otp: code rejected seq={} detail={}",
                    ticket.seq.0,
                    detail.as_deref().unwrap_or("-")
                );
                self.notify(&mut state, notification::OTP_REJECTED);
                OperationOutcome::Failed
            }
            Err(err) => {
                warn!("otp: verify failed seq={}: {err}", ticket.seq.0);
                self.notify(&mut state, notification::verify_failed(err.detail()));
                OperationOutcome::Failed
            }
        }
    }

    pub async fn submit(&self) -> OperationOutcome {
        let (ticket, payload) = {
            let mut state = self.inner.lock().await;
            if !state.store.workflow().can_submit() {
                self.notify(&mut state, notification::VERIFY_BEFORE_SUBMIT);
                return OperationOutcome::Blocked;
            }
            let payload =
                SubmissionPayload::from_form(state.store.record(), state.store.attachments());
            (state.begin(Operation::Submit), payload)
        };

        info!(
            "submit: sending seq={} fields={} attachments={}",
            ticket.seq.0,
            payload.fields.len(),
            payload.attachments.len()
        );
        let saved = match self.backend.submit(payload).await {
            Ok(document) => match self.sink.materialize(DOCUMENT_FILENAME, &document).await {
                Ok(path) => Some(path),
                Err(err) => {
                    error!("submit: could not save document seq={}: {err}", ticket.seq.0);
                    None
                }
            },
            Err(err) => {
                warn!("submit: failed seq={}: {err}", ticket.seq.0);
                None
            }
        };

        let mut state = self.inner.lock().await;
        let current = state.finish(&ticket);
        let Some(path) = saved else {
            self.notify(&mut state, notification::SUBMIT_FAILED);
            if !current {
                warn!(
                    "submit: seq={} from epoch {} failed after the workflow was reset",
                    ticket.seq.0, ticket.epoch.0
                );
                return OperationOutcome::Stale;
            }
            return OperationOutcome::Failed;
        };

        let _ = self.events.send(ClientEvent::DocumentSaved { path });
        if !current {
            // the form already belongs to a newer workflow, leave it alone
            warn!(
                "submit: document from epoch {} saved after the workflow was reset",
                ticket.epoch.0
            );
            self.notify(&mut state, notification::SUBMITTED);
            return OperationOutcome::Stale;
        }

        let previous = state.store.workflow().step();
        if let Err(err) = state.store.apply(WorkflowTransition::SubmissionAccepted) {
            error!("submit: accepted submission without verification: {err}");
        }
        state.store.reset();
        state.epoch = state.epoch.next();
        info!("submit: accepted seq={}, workflow reset", ticket.seq.0);

        self.notify(&mut state, notification::SUBMITTED);
        if previous != Step::CollectingIdentity {
            let _ = self.events.send(ClientEvent::StepChanged {
                step: Step::CollectingIdentity,
            });
        }
        let _ = self.events.send(ClientEvent::WorkflowReset);
        OperationOutcome::Succeeded
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
