pub const OTP_SENT: &str = "OTP has been sent to your email.";
pub const OTP_SEND_FAILED: &str = "Error sending OTP.";
pub const OTP_ALREADY_SENT: &str = "OTP has already been sent to your email.";
pub const OTP_VERIFIED: &str = "OTP verified successfully! Now you can fill the rest of the form";
pub const OTP_REJECTED: &str = "Invalid OTP. Please try again.";
pub const OTP_NOT_REQUESTED: &str = "Please request an OTP before verifying.";
pub const VERIFY_BEFORE_SUBMIT: &str = "Please verify your OTP before submitting.";
pub const SUBMITTED: &str = "Your data has been submitted successfully!";
pub const SUBMIT_FAILED: &str = "Error submitting your data.";

pub fn verify_failed(detail: Option<&str>) -> String {
    let detail = detail
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or("Unknown error");
    format!("Error verifying OTP: {detail}")
}

/// The single user-facing outcome channel. Readable by the presentation
/// layer, written only by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationState {
    visible: bool,
    message: String,
}

impl NotificationState {
    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn show(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.visible = true;
    }

    pub(crate) fn dismiss(&mut self) {
        self.visible = false;
    }
}
