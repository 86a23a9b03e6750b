use crate::rules::RuleViolation;
use std::fmt;

/// Why a submission did not reach both recipients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("Both notifications failed: {0}")]
    TransportUnreachable(String),
    #[error("Validation failed: {}", describe(.0))]
    ValidationFailed(Vec<FieldIssue>),
    #[error("Abuse detected: {0}")]
    AbuseDetected(AbuseSignal),
    #[error("Unexpected request method: {0}")]
    MalformedRequest(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub violation: RuleViolation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbuseSignal {
    HeaderInjectionSuspected(&'static str),
    HoneypotTriggered,
}

impl fmt::Display for AbuseSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbuseSignal::HeaderInjectionSuspected(field) => {
                write!(f, "header injection suspected in {field}")
            }
            AbuseSignal::HoneypotTriggered => f.write_str("honeypot triggered"),
        }
    }
}

fn describe(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{} ({:?})", issue.field, issue.violation))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown form kind: {0}")]
pub struct UnknownFormKind(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::ValidationFailed(vec![
            FieldIssue {
                field: "name",
                violation: RuleViolation::Required,
            },
            FieldIssue {
                field: "email",
                violation: RuleViolation::InvalidEmail,
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: name (Required), email (InvalidEmail)"
        );

        let err = PipelineError::AbuseDetected(AbuseSignal::HeaderInjectionSuspected("subject"));
        assert_eq!(
            err.to_string(),
            "Abuse detected: header injection suspected in subject"
        );
    }
}
