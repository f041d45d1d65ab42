use shared::domain::{FieldName, Step};
use thiserror::Error;

/// Step and OTP flags of one workflow instance.
///
/// `step == CollectingDetails` implies `otp_verified`, which implies
/// `otp_sent`. Values only change through [`WorkflowState::apply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkflowState {
    step: Step,
    otp_sent: bool,
    otp_verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowTransition {
    OtpDelivered,
    OtpVerified,
    SubmissionAccepted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("an OTP must be sent before it can be verified")]
    OtpNotSent,
    #[error("the OTP must be verified before a submission is accepted")]
    OtpNotVerified,
}

impl WorkflowState {
    pub fn step(&self) -> Step {
        self.step
    }

    pub fn otp_sent(&self) -> bool {
        self.otp_sent
    }

    pub fn otp_verified(&self) -> bool {
        self.otp_verified
    }

    pub fn apply(self, transition: WorkflowTransition) -> Result<Self, TransitionError> {
        match transition {
            WorkflowTransition::OtpDelivered => Ok(Self {
                otp_sent: true,
                ..self
            }),
            WorkflowTransition::OtpVerified => {
                if !self.otp_sent {
                    return Err(TransitionError::OtpNotSent);
                }
                Ok(Self {
                    step: Step::CollectingDetails,
                    otp_sent: true,
                    otp_verified: true,
                })
            }
            WorkflowTransition::SubmissionAccepted => {
                if !self.otp_verified {
                    return Err(TransitionError::OtpNotVerified);
                }
                Ok(Self::default())
            }
        }
    }

    // No resend path: the request stays disabled once an OTP went out.
    pub fn can_request_otp(&self) -> bool {
        !self.otp_sent
    }

    pub fn can_verify_otp(&self) -> bool {
        self.otp_sent && self.step == Step::CollectingIdentity
    }

    pub fn can_submit(&self) -> bool {
        self.otp_verified
    }

    pub fn editable_fields(&self) -> Vec<FieldName> {
        self.step
            .fields()
            .iter()
            .copied()
            .filter(|field| *field != FieldName::OtpCode || self.otp_sent)
            .collect()
    }

    pub fn accepts_attachments(&self) -> bool {
        self.step == Step::CollectingDetails
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
