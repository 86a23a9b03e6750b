//! Field rule set shared by the client-side validator and the intake handler.
//!
//! Every check here is a pure function of the field declaration and its value.
//! The rule data is fixed at compile time.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Dot-atom local part, dotted hostname with at least two labels.
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$"
    )
    .unwrap();
}

const MAX_EMAIL_LENGTH: usize = 254;

/// Semantic type of a form control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextArea,
    Email,
    Tel,
    Select,
    Date,
}

/// A field declaration with the constraints attached to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub not_before_today: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            not_before_today: false,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            not_before_today: false,
        }
    }

    pub const fn today_or_later(self) -> Self {
        Self {
            not_before_today: true,
            ..self
        }
    }

    /// Free-text values are markup-escaped on intake; email and coded values
    /// are kept verbatim for exact-match lookups.
    pub fn is_free_text(&self) -> bool {
        !matches!(self.kind, FieldKind::Email | FieldKind::Select)
    }
}

/// Minimum-length rule keyed by field name.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub applies_to: &'static [&'static str],
    pub min_chars: usize,
    pub message: &'static str,
}

impl FieldRule {
    pub fn accepts(&self, value: &str) -> bool {
        value.trim().chars().count() >= self.min_chars
    }
}

pub static LENGTH_RULES: &[FieldRule] = &[
    FieldRule {
        applies_to: &["name"],
        min_chars: 1,
        message: "お名前を入力してください。",
    },
    FieldRule {
        applies_to: &["subject"],
        min_chars: 3,
        message: "件名は3文字以上で入力してください。",
    },
    FieldRule {
        applies_to: &["message", "project-description"],
        min_chars: 10,
        message: "内容は10文字以上で入力してください。",
    },
];

pub fn length_rule(field_name: &str) -> Option<&'static FieldRule> {
    LENGTH_RULES
        .iter()
        .find(|rule| rule.applies_to.contains(&field_name))
}

/// The first rule a value failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleViolation {
    Required,
    InvalidEmail,
    InvalidPhone,
    PastDate,
    TooShort {
        min_chars: usize,
        message: &'static str,
    },
}

impl RuleViolation {
    pub fn message(&self) -> &'static str {
        match self {
            RuleViolation::Required => "この項目は必須です。",
            RuleViolation::InvalidEmail => "正しいメールアドレスを入力してください。",
            RuleViolation::InvalidPhone => "正しい電話番号を入力してください。",
            RuleViolation::PastDate => "今日以降の日付を選択してください。",
            RuleViolation::TooShort { message, .. } => message,
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    value.len() <= MAX_EMAIL_LENGTH && EMAIL_REGEX.is_match(value)
}

/// Domestic numbers carry 10 or 11 digits once separators are dropped.
pub fn is_valid_phone(value: &str) -> bool {
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    (10..=11).contains(&digits)
}

/// Unparseable dates fail the check.
pub fn is_today_or_later(value: &str, today: NaiveDate) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date >= today)
        .unwrap_or(false)
}

/// Run every rule that applies to `spec` in precedence order and report the
/// first failure: required, then the type-specific check, then minimum length.
pub fn check_field(spec: &FieldSpec, value: &str, today: NaiveDate) -> Result<(), RuleViolation> {
    let value = value.trim();

    if value.is_empty() {
        if !spec.required {
            return Ok(());
        }
        return Err(RuleViolation::Required);
    }

    match spec.kind {
        FieldKind::Email if !is_valid_email(value) => return Err(RuleViolation::InvalidEmail),
        FieldKind::Tel if !is_valid_phone(value) => return Err(RuleViolation::InvalidPhone),
        FieldKind::Date if spec.not_before_today && !is_today_or_later(value, today) => {
            return Err(RuleViolation::PastDate)
        }
        _ => {}
    }

    if matches!(spec.kind, FieldKind::Text | FieldKind::TextArea) {
        if let Some(rule) = length_rule(spec.name) {
            if !rule.accepts(value) {
                return Err(RuleViolation::TooShort {
                    min_chars: rule.min_chars,
                    message: rule.message,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 12).unwrap()
    }

    #[test]
    fn test_email_grammar() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last+tag@mail.example.jp"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email(".a@example.com"));
        assert!(!is_valid_email("a..b@example.com"));
        assert!(!is_valid_email("a@-example.com"));
        assert!(!is_valid_email("a@example.com\nBcc: x@example.com"));
    }

    #[test]
    fn test_phone_digit_count() {
        assert!(is_valid_phone("090-1234-5678"));
        assert!(is_valid_phone("03 1234 5678"));
        assert!(!is_valid_phone("123-4567"));
        assert!(!is_valid_phone("090-1234-5678-9"));
    }

    #[test]
    fn test_required_short_circuits() {
        let spec = FieldSpec::required("email", FieldKind::Email);
        assert_eq!(check_field(&spec, "   ", today()), Err(RuleViolation::Required));

        let select = FieldSpec::required("inquiry-type", FieldKind::Select);
        assert_eq!(check_field(&select, "", today()), Err(RuleViolation::Required));
    }

    #[test]
    fn test_empty_optional_field_passes() {
        let spec = FieldSpec::optional("phone", FieldKind::Tel);
        assert_eq!(check_field(&spec, "", today()), Ok(()));
        assert_eq!(
            check_field(&spec, "12345", today()),
            Err(RuleViolation::InvalidPhone)
        );
    }

    #[test]
    fn test_minimum_length_counts_characters() {
        let subject = FieldSpec::required("subject", FieldKind::Text);
        assert!(check_field(&subject, "件名です", today()).is_ok());
        let err = check_field(&subject, "件名", today()).unwrap_err();
        assert_eq!(err.message(), "件名は3文字以上で入力してください。");

        let message = FieldSpec::required("message", FieldKind::TextArea);
        assert!(check_field(&message, "0123456789", today()).is_ok());
        assert!(matches!(
            check_field(&message, "short", today()),
            Err(RuleViolation::TooShort { min_chars: 10, .. })
        ));
    }

    #[test]
    fn test_deadline_must_not_be_in_the_past() {
        let spec = FieldSpec::optional("deadline", FieldKind::Date).today_or_later();
        assert!(check_field(&spec, "2025-10-12", today()).is_ok());
        assert!(check_field(&spec, "2026-01-01", today()).is_ok());
        assert_eq!(
            check_field(&spec, "2025-10-11", today()),
            Err(RuleViolation::PastDate)
        );
        assert_eq!(
            check_field(&spec, "someday", today()),
            Err(RuleViolation::PastDate)
        );
    }

    #[test]
    fn test_length_rule_lookup() {
        assert_eq!(length_rule("project-description").unwrap().min_chars, 10);
        assert!(length_rule("project-title").is_none());
    }
}
