//! Headless model of the in-browser form validator.
//!
//! Holds the field values the visitor has typed, the error mark attached to
//! each field, and which field currently has focus. All checks come from
//! [`crate::rules`], the same rule set the intake handler uses.

use crate::form::FormKind;
use crate::rules::{check_field, FieldSpec, RuleViolation};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldState {
    pub spec: &'static FieldSpec,
    pub value: String,
    pub error: Option<RuleViolation>,
}

impl FieldState {
    pub fn invalid(&self) -> bool {
        self.error.is_some()
    }

    /// Value for the `aria-invalid` attribute.
    pub fn aria_invalid(&self) -> &'static str {
        if self.invalid() {
            "true"
        } else {
            "false"
        }
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.error.as_ref().map(RuleViolation::message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormValidation {
    pub ok: bool,
    pub first_invalid: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct FormValidator {
    kind: FormKind,
    today: NaiveDate,
    fields: Vec<FieldState>,
    focused: Option<&'static str>,
}

impl FormValidator {
    pub fn for_kind(kind: FormKind, today: NaiveDate) -> Self {
        let fields = kind
            .fields()
            .iter()
            .map(|spec| FieldState {
                spec,
                value: String::new(),
                error: None,
            })
            .collect();

        Self {
            kind,
            today,
            fields,
            focused: None,
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn field(&self, name: &str) -> Option<&FieldState> {
        self.fields.iter().find(|f| f.spec.name == name)
    }

    pub fn focused(&self) -> Option<&'static str> {
        self.focused
    }

    /// Editing a field clears its error mark. Returns false for names the form
    /// does not declare.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.fields.iter_mut().find(|f| f.spec.name == name) {
            Some(state) => {
                state.value = value.into();
                state.error = None;
                true
            }
            None => false,
        }
    }

    /// Checks one field and updates its mark. Running it again on an unchanged
    /// value gives the same result and leaves the same state.
    pub fn validate_field(&mut self, name: &str) -> bool {
        let today = self.today;
        match self.fields.iter_mut().find(|f| f.spec.name == name) {
            Some(state) => {
                state.error = check_field(state.spec, &state.value, today).err();
                state.error.is_none()
            }
            None => {
                log::debug!("No field named {name} on the {} form", self.kind);
                false
            }
        }
    }

    /// Validates every field in document order and moves focus to the first
    /// invalid one.
    pub fn validate_form(&mut self) -> FormValidation {
        let today = self.today;
        let mut first_invalid = None;

        for state in &mut self.fields {
            state.error = check_field(state.spec, &state.value, today).err();
            if state.error.is_some() && first_invalid.is_none() {
                first_invalid = Some(state.spec.name);
            }
        }

        if first_invalid.is_some() {
            self.focused = first_invalid;
        }

        FormValidation {
            ok: first_invalid.is_none(),
            first_invalid,
        }
    }

    /// The field map as it would be posted.
    pub fn values(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|f| (f.spec.name.to_string(), f.value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 12).unwrap()
    }

    fn filled_contact() -> FormValidator {
        let mut v = FormValidator::for_kind(FormKind::Contact, today());
        v.set_value("name", "田中");
        v.set_value("email", "a@b.co");
        v.set_value("inquiry-type", "general");
        v.set_value("subject", "Hello!!");
        v.set_value("message", "0123456789");
        v
    }

    #[test]
    fn test_valid_field_is_idempotent() {
        let mut v = filled_contact();
        assert!(v.validate_field("email"));
        let before = v.field("email").cloned();
        assert!(v.validate_field("email"));
        assert_eq!(v.field("email").cloned(), before);
        assert_eq!(v.field("email").unwrap().aria_invalid(), "false");
    }

    #[test]
    fn test_only_first_failing_rule_is_reported() {
        let mut v = filled_contact();
        v.set_value("subject", "  ");
        assert!(!v.validate_field("subject"));
        assert_eq!(
            v.field("subject").unwrap().error_message(),
            Some("この項目は必須です。")
        );

        v.set_value("subject", "Hi");
        assert!(!v.validate_field("subject"));
        assert_eq!(
            v.field("subject").unwrap().error_message(),
            Some("件名は3文字以上で入力してください。")
        );
    }

    #[test]
    fn test_short_message_blocks_submission() {
        let mut v = filled_contact();
        v.set_value("message", "short");

        let result = v.validate_form();
        assert!(!result.ok);
        assert_eq!(result.first_invalid, Some("message"));
        assert_eq!(v.focused(), Some("message"));
        assert_eq!(
            v.field("message").unwrap().error_message(),
            Some("内容は10文字以上で入力してください。")
        );
    }

    #[test]
    fn test_focus_goes_to_first_invalid_in_document_order() {
        let mut v = FormValidator::for_kind(FormKind::Contact, today());
        v.set_value("message", "0123456789");

        let result = v.validate_form();
        assert_eq!(result.first_invalid, Some("name"));
        assert_eq!(
            v.field("inquiry-type").unwrap().error_message(),
            Some("この項目は必須です。")
        );
        assert!(v.field("phone").unwrap().error.is_none());
        assert!(v.field("message").unwrap().error.is_none());
    }

    #[test]
    fn test_input_clears_error() {
        let mut v = filled_contact();
        v.set_value("phone", "123");
        assert!(!v.validate_field("phone"));
        assert_eq!(v.field("phone").unwrap().aria_invalid(), "true");

        v.set_value("phone", "03-1234-5678");
        assert!(!v.field("phone").unwrap().invalid());
        assert!(v.validate_field("phone"));
        assert!(v.validate_form().ok);
    }

    #[test]
    fn test_commission_deadline_and_lengths() {
        let mut v = FormValidator::for_kind(FormKind::Order, today());
        v.set_value("name", "田中");
        v.set_value("email", "a@b.co");
        v.set_value("project-type", "icon");
        v.set_value("project-title", "ロゴ");
        v.set_value("project-description", "カフェのロゴ制作をお願いします");
        v.set_value("deadline", "2025-10-11");

        let result = v.validate_form();
        assert_eq!(result.first_invalid, Some("deadline"));
        assert_eq!(
            v.field("deadline").unwrap().error_message(),
            Some("今日以降の日付を選択してください。")
        );

        v.set_value("deadline", "2025-10-12");
        assert!(v.validate_form().ok);
    }

    #[test]
    fn test_unknown_field_is_ignored() {
        let mut v = filled_contact();
        assert!(!v.set_value("company", "x"));
        assert!(!v.validate_field("company"));
        assert_eq!(v.values().len(), 6);
    }
}
