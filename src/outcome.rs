use crate::config::Config;
use crate::dispatch::DispatchOutcome;
use crate::error::PipelineError;
use crate::form::FormKind;
use crate::oplog::OperationalLog;
use serde::Serialize;
use url::form_urlencoded;

/// Terminal classification of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Success,
    PartialSuccess,
    Rejected,
    Failed,
}

impl Outcome {
    pub fn accepted(&self) -> bool {
        matches!(self, Outcome::Success | Outcome::PartialSuccess)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectTarget {
    pub location: String,
    pub reason: Option<String>,
}

impl RedirectTarget {
    /// The `Location` value, with the reason appended as an `error` query
    /// parameter when one is carried.
    pub fn href(&self) -> String {
        match &self.reason {
            None => self.location.clone(),
            Some(reason) => {
                let separator = if self.location.contains('?') { '&' } else { '?' };
                let encoded: String = form_urlencoded::byte_serialize(reason.as_bytes()).collect();
                format!("{}{separator}error={encoded}", self.location)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub outcome: Outcome,
    pub redirect: RedirectTarget,
}

/// Maps a pipeline result to the redirect the visitor sees. Rejections and
/// failures look the same from outside; only the operational log tells them
/// apart.
#[derive(Debug, Clone)]
pub struct OutcomeReporter {
    config: Config,
}

impl OutcomeReporter {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn resolve(
        &self,
        kind: FormKind,
        result: &Result<DispatchOutcome, PipelineError>,
        oplog: &OperationalLog,
    ) -> Resolution {
        let form = self.config.form(kind);
        let thanks = || RedirectTarget {
            location: form.thanks_location.clone(),
            reason: None,
        };
        let back = |reason: Option<String>| RedirectTarget {
            location: form.form_location.clone(),
            reason,
        };

        let (outcome, redirect) = match result {
            Ok(sent) if sent.owner_notified && sent.submitter_notified => {
                oplog.write("all mail sent - redirecting to thanks page");
                (Outcome::Success, thanks())
            }
            Ok(sent) if sent.owner_notified => {
                oplog.write("owner mail only - redirecting to thanks page");
                (Outcome::PartialSuccess, thanks())
            }
            Ok(sent) if sent.submitter_notified => {
                oplog.write("acknowledgement only - redirecting to thanks page");
                (Outcome::PartialSuccess, thanks())
            }
            Ok(_) => {
                oplog.write("mail sending failed - redirecting to form");
                (Outcome::Failed, back(None))
            }
            Err(PipelineError::TransportUnreachable(detail)) => {
                oplog.write(format!("mail sending failed ({detail}) - redirecting to form"));
                (Outcome::Failed, back(None))
            }
            Err(err @ PipelineError::ValidationFailed(issues)) => {
                oplog.write(format!("{err} - redirecting to form"));
                let reason = self.config.report_validation_reasons.then(|| {
                    let mut messages: Vec<&str> = Vec::new();
                    for issue in issues {
                        let message = issue.violation.message();
                        if !messages.contains(&message) {
                            messages.push(message);
                        }
                    }
                    messages.join(" ")
                });
                (Outcome::Rejected, back(reason))
            }
            Err(err) => {
                oplog.write(format!("{err} - redirecting to form"));
                (Outcome::Rejected, back(None))
            }
        };

        Resolution { outcome, redirect }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AbuseSignal, FieldIssue};
    use crate::rules::RuleViolation;

    fn resolve(config: &Config, result: Result<DispatchOutcome, PipelineError>) -> Resolution {
        OutcomeReporter::new(config).resolve(
            FormKind::Contact,
            &result,
            &OperationalLog::disabled("TEST"),
        )
    }

    fn sent(owner: bool, submitter: bool) -> Result<DispatchOutcome, PipelineError> {
        Ok(DispatchOutcome {
            owner_notified: owner,
            submitter_notified: submitter,
        })
    }

    #[test]
    fn test_dispatch_buckets() {
        let config = Config::default();
        let thanks = &config.contact.thanks_location;
        let form = &config.contact.form_location;

        let r = resolve(&config, sent(true, true));
        assert_eq!(r.outcome, Outcome::Success);
        assert_eq!(&r.redirect.location, thanks);

        let r = resolve(&config, sent(true, false));
        assert_eq!(r.outcome, Outcome::PartialSuccess);
        assert_eq!(&r.redirect.location, thanks);

        let r = resolve(&config, sent(false, true));
        assert_eq!(r.outcome, Outcome::PartialSuccess);
        assert_eq!(&r.redirect.location, thanks);

        let r = resolve(
            &config,
            Err(PipelineError::TransportUnreachable("declined".to_string())),
        );
        assert_eq!(r.outcome, Outcome::Failed);
        assert_eq!(&r.redirect.location, form);
        assert_eq!(r.redirect.reason, None);
    }

    #[test]
    fn test_reason_only_for_validation_failures() {
        let mut config = Config::default();
        config.report_validation_reasons = true;

        let r = resolve(
            &config,
            Err(PipelineError::ValidationFailed(vec![
                FieldIssue {
                    field: "name",
                    violation: RuleViolation::Required,
                },
                FieldIssue {
                    field: "subject",
                    violation: RuleViolation::Required,
                },
            ])),
        );
        assert_eq!(r.outcome, Outcome::Rejected);
        assert_eq!(r.redirect.reason.as_deref(), Some("この項目は必須です。"));
        assert!(r.redirect.href().starts_with("/contact/index.html?error="));

        let r = resolve(
            &config,
            Err(PipelineError::AbuseDetected(AbuseSignal::HoneypotTriggered)),
        );
        assert_eq!(r.outcome, Outcome::Rejected);
        assert_eq!(r.redirect.reason, None);
        assert_eq!(r.redirect.href(), "/contact/index.html");

        let r = resolve(
            &config,
            Err(PipelineError::MalformedRequest("GET".to_string())),
        );
        assert_eq!(r.redirect.reason, None);
    }

    #[test]
    fn test_reasons_are_off_by_default() {
        let r = resolve(
            &Config::default(),
            Err(PipelineError::ValidationFailed(vec![FieldIssue {
                field: "email",
                violation: RuleViolation::InvalidEmail,
            }])),
        );
        assert_eq!(r.redirect.reason, None);
    }

    #[test]
    fn test_href_appends_to_existing_query() {
        let target = RedirectTarget {
            location: "/contact/?lang=ja".to_string(),
            reason: Some("a b".to_string()),
        };
        assert_eq!(target.href(), "/contact/?lang=ja&error=a+b");
    }
}
