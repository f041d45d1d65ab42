use std::path::Path;

use anyhow::{Context, Result};
use shared::domain::{AttachmentSlot, FieldName};

use crate::workflow::{TransitionError, WorkflowState, WorkflowTransition};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub age: String,
    pub department: String,
    pub designation: String,
    pub place_of_work: String,
    pub otp_code: String,
}

impl FormRecord {
    pub fn get(&self, field: FieldName) -> &str {
        match field {
            FieldName::Name => &self.name,
            FieldName::Email => &self.email,
            FieldName::Phone => &self.phone,
            FieldName::Address => &self.address,
            FieldName::Age => &self.age,
            FieldName::Department => &self.department,
            FieldName::Designation => &self.designation,
            FieldName::PlaceOfWork => &self.place_of_work,
            FieldName::OtpCode => &self.otp_code,
        }
    }

    fn slot_mut(&mut self, field: FieldName) -> &mut String {
        match field {
            FieldName::Name => &mut self.name,
            FieldName::Email => &mut self.email,
            FieldName::Phone => &mut self.phone,
            FieldName::Address => &mut self.address,
            FieldName::Age => &mut self.age,
            FieldName::Department => &mut self.department,
            FieldName::Designation => &mut self.designation,
            FieldName::PlaceOfWork => &mut self.place_of_work,
            FieldName::OtpCode => &mut self.otp_code,
        }
    }

    /// Replaces exactly one field.
    pub fn set(&mut self, field: FieldName, value: impl Into<String>) {
        *self.slot_mut(field) = value.into();
    }

    pub fn with_field(mut self, field: FieldName, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = (FieldName, &str)> + '_ {
        FieldName::ALL
            .into_iter()
            .map(move |field| (field, self.get(field)))
    }

    pub fn missing(&self, fields: &[FieldName]) -> Vec<FieldName> {
        fields
            .iter()
            .copied()
            .filter(|field| self.get(*field).trim().is_empty())
            .collect()
    }

    pub fn is_blank(&self) -> bool {
        self.entries().all(|(_, value)| value.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: None,
            bytes,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read attachment '{}'", path.display()))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| format!("attachment path '{}' has no file name", path.display()))?;
        let mime_type = mime_guess::from_path(path)
            .first()
            .map(|mime| mime.essence_str().to_string());
        Ok(Self {
            filename,
            mime_type,
            bytes,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachments {
    pub image: Option<Attachment>,
    pub signature: Option<Attachment>,
}

impl Attachments {
    pub fn get(&self, slot: AttachmentSlot) -> Option<&Attachment> {
        match slot {
            AttachmentSlot::Image => self.image.as_ref(),
            AttachmentSlot::Signature => self.signature.as_ref(),
        }
    }

    pub fn set(&mut self, slot: AttachmentSlot, attachment: Option<Attachment>) {
        match slot {
            AttachmentSlot::Image => self.image = attachment,
            AttachmentSlot::Signature => self.signature = attachment,
        }
    }

    pub fn present(&self) -> impl Iterator<Item = (AttachmentSlot, &Attachment)> + '_ {
        AttachmentSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|attachment| (slot, attachment)))
    }
}

/// Field values, attachments and workflow flags for one workflow instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormStore {
    record: FormRecord,
    attachments: Attachments,
    workflow: WorkflowState,
}

impl FormStore {
    pub fn record(&self) -> &FormRecord {
        &self.record
    }

    pub fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    pub fn workflow(&self) -> WorkflowState {
        self.workflow
    }

    pub fn set_field(&mut self, field: FieldName, value: impl Into<String>) {
        self.record.set(field, value);
    }

    pub fn set_attachment(&mut self, slot: AttachmentSlot, attachment: Option<Attachment>) {
        self.attachments.set(slot, attachment);
    }

    pub fn apply(&mut self, transition: WorkflowTransition) -> Result<WorkflowState, TransitionError> {
        self.workflow = self.workflow.apply(transition)?;
        Ok(self.workflow)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
