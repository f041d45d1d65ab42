//! Terminal rendering of the form and the checks a browser form would apply
//! before an action reaches the orchestrator.

use std::fmt::Write as _;

use client_core::{FormSnapshot, NotificationState, WorkflowState};
use shared::domain::{AttachmentSlot, FieldName, Step};
use thiserror::Error;

use crate::commands::Command;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Refusal {
    #[error("{field} is not shown in {step}")]
    HiddenField { field: &'static str, step: &'static str },
    #[error("Send the OTP before entering the code")]
    CodeNotRequested,
    #[error("Attachments are collected in step 2")]
    AttachmentsUnavailable,
    #[error("Send OTP is disabled once an OTP has been sent")]
    OtpAlreadySent,
    #[error("Verify OTP is only available in step 1 after an OTP was sent")]
    VerifyUnavailable,
    #[error("Please fill in: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

fn require(snapshot: &FormSnapshot, fields: &[FieldName]) -> Result<(), Refusal> {
    let missing = snapshot.record.missing(fields);
    if missing.is_empty() {
        return Ok(());
    }
    Err(Refusal::Missing(
        missing.into_iter().map(FieldName::label).collect(),
    ))
}

/// Required-field and visibility checks; the orchestrator still applies its
/// own workflow guards.
pub fn check(command: &Command, snapshot: &FormSnapshot) -> Result<(), Refusal> {
    let workflow = snapshot.workflow;
    match command {
        Command::Set { field, .. } => {
            if workflow.editable_fields().contains(field) {
                Ok(())
            } else if *field == FieldName::OtpCode && workflow.step() == Step::CollectingIdentity {
                Err(Refusal::CodeNotRequested)
            } else {
                Err(Refusal::HiddenField {
                    field: field.label(),
                    step: workflow.step().title(),
                })
            }
        }
        Command::Attach { .. } | Command::Detach { .. } => {
            if workflow.accepts_attachments() {
                Ok(())
            } else {
                Err(Refusal::AttachmentsUnavailable)
            }
        }
        Command::SendOtp => {
            if !workflow.can_request_otp() {
                return Err(Refusal::OtpAlreadySent);
            }
            require(snapshot, &[FieldName::Name, FieldName::Email])
        }
        Command::Verify => {
            if !workflow.can_verify_otp() {
                return Err(Refusal::VerifyUnavailable);
            }
            require(snapshot, &[FieldName::OtpCode])
        }
        Command::Submit => require(snapshot, &workflow.editable_fields()),
        Command::Status | Command::Dismiss | Command::Help | Command::Quit => Ok(()),
    }
}

fn actions(workflow: WorkflowState) -> Vec<&'static str> {
    let mut actions = Vec::new();
    if workflow.can_request_otp() {
        actions.push("send-otp");
    }
    if workflow.can_verify_otp() {
        actions.push("verify");
    }
    actions.push("submit");
    actions
}

pub fn render(snapshot: &FormSnapshot) -> String {
    let workflow = snapshot.workflow;
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", workflow.step().title());

    for field in workflow.editable_fields() {
        let value = snapshot.record.get(field);
        let shown = if value.is_empty() { "-" } else { value };
        let _ = writeln!(out, "  {:<14} {}", field.label(), shown);
    }

    if workflow.accepts_attachments() {
        for slot in AttachmentSlot::ALL {
            let shown = snapshot
                .attachments
                .get(slot)
                .map(|attachment| format!("{} ({} bytes)", attachment.filename, attachment.bytes.len()))
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(out, "  {:<14} {}", slot.label(), shown);
        }
    } else if workflow.otp_sent() {
        let _ = writeln!(out, "  OTP sent, check your inbox");
    }

    let _ = write!(out, "actions: {}", actions(workflow).join(", "));
    if !snapshot.in_flight.is_empty() {
        let _ = write!(out, "  (waiting: {:?})", snapshot.in_flight);
    }

    if let Some(message) = render_notification(&snapshot.notification) {
        let _ = write!(out, "\n{message}");
    }
    out
}

pub fn render_notification(notification: &NotificationState) -> Option<String> {
    if !notification.visible() {
        return None;
    }
    let width = notification.message().chars().count() + 4;
    let border = "-".repeat(width);
    Some(format!(
        "{border}\n| {} |\n{border}\n(type 'ok' to close)",
        notification.message()
    ))
}

#[cfg(test)]
#[path = "tests/screen_tests.rs"]
mod tests;
