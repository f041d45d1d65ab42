use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use shared::{
    domain::{AttachmentSlot, FieldName},
    error::ApiError,
    protocol::{
        SendOtpRequest, VerifyOtpRequest, VerifyOtpResponse, SEND_OTP_PATH, SUBMIT_PATH,
        VERIFY_OTP_PATH,
    },
};
use url::Url;

use crate::{
    error::BackendError,
    store::{Attachment, Attachments, FormRecord},
};

#[derive(Debug, Clone, PartialEq)]
pub enum VerifyOutcome {
    Verified(VerifyOtpResponse),
    Rejected { detail: Option<String> },
}

/// Everything the submission collaborator receives: all nine fields, even
/// when empty, and only the attachments that are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub fields: Vec<(FieldName, String)>,
    pub attachments: Vec<(AttachmentSlot, Attachment)>,
}

impl SubmissionPayload {
    pub fn from_form(record: &FormRecord, attachments: &Attachments) -> Self {
        Self {
            fields: record
                .entries()
                .map(|(field, value)| (field, value.to_string()))
                .collect(),
            attachments: attachments
                .present()
                .map(|(slot, attachment)| (slot, attachment.clone()))
                .collect(),
        }
    }

    pub fn into_multipart(self) -> Result<Form, BackendError> {
        let mut form = Form::new();
        for (field, value) in self.fields {
            form = form.text(field.wire_name(), value);
        }
        for (slot, attachment) in self.attachments {
            let mut part = Part::bytes(attachment.bytes).file_name(attachment.filename);
            if let Some(mime_type) = attachment.mime_type {
                part = part.mime_str(&mime_type).map_err(|e| BackendError::Encode {
                    endpoint: SUBMIT_PATH,
                    message: format!("invalid mime type for {slot}: {e}"),
                })?;
            }
            form = form.part(slot.wire_name(), part);
        }
        Ok(form)
    }
}

#[async_trait]
pub trait IntakeBackend: Send + Sync {
    async fn send_otp(&self, request: SendOtpRequest) -> Result<(), BackendError>;
    async fn verify_otp(&self, request: VerifyOtpRequest) -> Result<VerifyOutcome, BackendError>;
    /// Returns the generated document.
    async fn submit(&self, payload: SubmissionPayload) -> Result<Vec<u8>, BackendError>;
}

pub struct HttpIntakeBackend {
    http: Client,
    base_url: Url,
}

impl HttpIntakeBackend {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self::with_client(builder.build()?, base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("invalid server url '{base_url}': {e}"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("server url '{base_url}' cannot be used as a base");
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url
    }

    async fn read_error_detail(response: Response) -> Option<String> {
        let bytes = response.bytes().await.ok()?;
        serde_json::from_slice::<ApiError>(&bytes)
            .ok()
            .and_then(|body| body.detail().map(str::to_string))
    }
}

#[async_trait]
impl IntakeBackend for HttpIntakeBackend {
    async fn send_otp(&self, request: SendOtpRequest) -> Result<(), BackendError> {
        let response = self
            .http
            .post(self.endpoint(SEND_OTP_PATH))
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::transport(SEND_OTP_PATH, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                endpoint: SEND_OTP_PATH,
                status: status.as_u16(),
                detail: Self::read_error_detail(response).await,
            });
        }
        Ok(())
    }

    async fn verify_otp(&self, request: VerifyOtpRequest) -> Result<VerifyOutcome, BackendError> {
        let response = self
            .http
            .post(self.endpoint(VERIFY_OTP_PATH))
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::transport(VERIFY_OTP_PATH, e))?;

        if !response.status().is_success() {
            let detail = Self::read_error_detail(response).await;
            return Ok(VerifyOutcome::Rejected { detail });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::transport(VERIFY_OTP_PATH, e))?;
        let body = serde_json::from_slice::<VerifyOtpResponse>(&bytes).map_err(|e| {
            BackendError::Decode {
                endpoint: VERIFY_OTP_PATH,
                message: e.to_string(),
            }
        })?;
        Ok(VerifyOutcome::Verified(body))
    }

    async fn submit(&self, payload: SubmissionPayload) -> Result<Vec<u8>, BackendError> {
        let form = payload.into_multipart()?;
        let response = self
            .http
            .post(self.endpoint(SUBMIT_PATH))
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::transport(SUBMIT_PATH, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                endpoint: SUBMIT_PATH,
                status: status.as_u16(),
                detail: Self::read_error_detail(response).await,
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::transport(SUBMIT_PATH, e))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
