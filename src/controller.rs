use crate::client::{FormValidation, FormValidator};
use crate::intake::IntakeHandler;
use crate::outcome::Resolution;

pub const SUBMIT_LABEL: &str = "送信";
pub const BUSY_LABEL: &str = "送信中...";
pub const CONFIRMATION_TITLE: &str = "送信完了";
pub const CONFIRMATION_TEXT: &str =
    "お問い合わせありがとうございます。3営業日以内にご連絡いたします。";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Editing,
    Submitting,
    Confirmed,
}

/// Drives one form from editing through submission. Nothing is posted until
/// the validator passes, and the submit control stays disabled while a
/// request is in flight.
#[derive(Debug, Clone)]
pub struct SubmissionController {
    validator: FormValidator,
    state: SubmissionState,
}

impl SubmissionController {
    pub fn new(validator: FormValidator) -> Self {
        Self {
            validator,
            state: SubmissionState::Editing,
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn validator(&self) -> &FormValidator {
        &self.validator
    }

    pub fn validator_mut(&mut self) -> &mut FormValidator {
        &mut self.validator
    }

    pub fn submit_label(&self) -> &'static str {
        match self.state {
            SubmissionState::Submitting => BUSY_LABEL,
            _ => SUBMIT_LABEL,
        }
    }

    pub fn submit_enabled(&self) -> bool {
        self.state == SubmissionState::Editing
    }

    /// Title and text of the panel shown in place of the form once confirmed.
    pub fn confirmation(&self) -> Option<(&'static str, &'static str)> {
        (self.state == SubmissionState::Confirmed).then_some((CONFIRMATION_TITLE, CONFIRMATION_TEXT))
    }

    /// Validates the form and, when it passes, enters `Submitting` and
    /// returns the field map to post.
    pub fn begin_submit(&mut self) -> Result<Vec<(String, String)>, FormValidation> {
        if self.state != SubmissionState::Editing {
            return Err(FormValidation {
                ok: false,
                first_invalid: None,
            });
        }

        let validation = self.validator.validate_form();
        if !validation.ok {
            return Err(validation);
        }

        self.state = SubmissionState::Submitting;
        Ok(self.validator.values())
    }

    /// Applies the server's answer. A redirect to the thanks page confirms; a
    /// redirect back to the form returns to editing.
    pub fn finish(&mut self, resolution: &Resolution) {
        self.state = if resolution.outcome.accepted() {
            SubmissionState::Confirmed
        } else {
            SubmissionState::Editing
        };
    }

    pub async fn submit(&mut self, handler: &IntakeHandler) -> Option<Resolution> {
        let values = match self.begin_submit() {
            Ok(values) => values,
            Err(validation) => {
                log::debug!(
                    "Submission blocked on the client, first invalid field: {:?}",
                    validation.first_invalid
                );
                return None;
            }
        };

        let resolution = handler
            .handle(self.validator.kind(), "POST", &values)
            .await;
        self.finish(&resolution);
        Some(resolution)
    }
}
