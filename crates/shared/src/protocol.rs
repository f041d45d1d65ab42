use serde::{Deserialize, Serialize};

pub const SEND_OTP_PATH: &str = "/api/send-otp";
pub const VERIFY_OTP_PATH: &str = "/api/verify-otp";
pub const SUBMIT_PATH: &str = "/api/submit";

/// File name offered for the document returned by a successful submission.
pub const DOCUMENT_FILENAME: &str = "user_details.pdf";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOtpRequest {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerifyOtpResponse(pub serde_json::Value);

impl VerifyOtpResponse {
    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(serde_json::Value::as_str)
    }
}
