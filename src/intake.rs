//! Server-side entry point for posted forms.
//!
//! Client-side validation is never trusted: every submission is sanitized and
//! re-checked here before anything is sent.

use crate::codes::TABLE_VERSION;
use crate::compose::NotificationComposer;
use crate::config::Config;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::error::{AbuseSignal, FieldIssue, PipelineError};
use crate::form::{field, FormKind, SubmissionForm, ValidatedSubmission};
use crate::oplog::OperationalLog;
use crate::outcome::{OutcomeReporter, Resolution};
use crate::rules::{is_valid_email, length_rule, RuleViolation};
use crate::sanitize::{contains_line_break, SanitizedFields};
use crate::transport::MailTransport;
use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub struct IntakeHandler {
    config: Config,
    composer: NotificationComposer,
    dispatcher: Dispatcher,
    reporter: OutcomeReporter,
    oplog: OperationalLog,
}

impl IntakeHandler {
    pub fn new(config: Config, transport: Arc<dyn MailTransport>) -> Self {
        let dispatcher = Dispatcher::new(
            transport,
            Duration::from_secs(config.transport.timeout_seconds),
        );
        let oplog = OperationalLog::new(config.oplog_path.as_ref().map(PathBuf::from), "INTAKE");

        Self {
            composer: NotificationComposer::new(&config),
            reporter: OutcomeReporter::new(&config),
            dispatcher,
            oplog,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process one submission end to end. Every path ends in a redirect.
    pub async fn handle(&self, kind: FormKind, method: &str, raw: &[(String, String)]) -> Resolution {
        let oplog = self.oplog.with_tag(&self.config.form(kind).log_tag);
        oplog.write(format!("{kind} form processing started - code tables {TABLE_VERSION}"));

        let result = self.process(kind, method, raw, &oplog).await;
        self.reporter.resolve(kind, &result, &oplog)
    }

    /// Resolve a request whose body could not be read. It is treated like any
    /// other malformed request and sent back to the form.
    pub fn refuse(&self, kind: FormKind, detail: impl Into<String>) -> Resolution {
        let oplog = self.oplog.with_tag(&self.config.form(kind).log_tag);
        let result = Err(PipelineError::MalformedRequest(detail.into()));
        self.reporter.resolve(kind, &result, &oplog)
    }

    async fn process(
        &self,
        kind: FormKind,
        method: &str,
        raw: &[(String, String)],
        oplog: &OperationalLog,
    ) -> Result<DispatchOutcome, PipelineError> {
        if !method.eq_ignore_ascii_case("POST") {
            return Err(PipelineError::MalformedRequest(method.to_string()));
        }

        let fields = SanitizedFields::from_raw(kind, raw, &self.config.honeypot_field);
        oplog.write(format!(
            "received: name=[{}] email=[{}] type=[{}]",
            fields.get(field::NAME),
            fields.get(field::EMAIL),
            match kind {
                FormKind::Contact => fields.get(field::INQUIRY_TYPE),
                FormKind::Order => fields.get(field::PROJECT_TYPE),
            }
        ));

        let form = self.screen(kind, &fields)?;
        let submission = ValidatedSubmission::translate(form);
        let messages = self
            .composer
            .compose(&submission, Local::now().naive_local());

        let outcome = self
            .dispatcher
            .dispatch(&messages.owner, &messages.submitter, oplog)
            .await;

        if !outcome.any_sent() {
            return Err(PipelineError::TransportUnreachable(format!(
                "neither {} nor {} accepted",
                messages.owner.to, messages.submitter.to
            )));
        }
        Ok(outcome)
    }

    /// Required fields, address grammar, then abuse signals, in that order.
    fn screen(&self, kind: FormKind, fields: &SanitizedFields) -> Result<SubmissionForm, PipelineError> {
        let missing: Vec<FieldIssue> = kind
            .fields()
            .iter()
            .filter(|spec| spec.required && fields.get(spec.name).is_empty())
            .map(|spec| FieldIssue {
                field: spec.name,
                violation: RuleViolation::Required,
            })
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::ValidationFailed(missing));
        }

        if !is_valid_email(fields.get(field::EMAIL)) {
            return Err(PipelineError::ValidationFailed(vec![FieldIssue {
                field: field::EMAIL,
                violation: RuleViolation::InvalidEmail,
            }]));
        }

        if self.config.enforce_min_length {
            let too_short: Vec<FieldIssue> = kind
                .fields()
                .iter()
                .filter_map(|spec| {
                    let rule = length_rule(spec.name)?;
                    (!rule.accepts(fields.unescaped(spec.name))).then_some(FieldIssue {
                        field: spec.name,
                        violation: RuleViolation::TooShort {
                            min_chars: rule.min_chars,
                            message: rule.message,
                        },
                    })
                })
                .collect();
            if !too_short.is_empty() {
                return Err(PipelineError::ValidationFailed(too_short));
            }
        }

        if let Some(signal) = detect_abuse(kind, fields) {
            return Err(PipelineError::AbuseDetected(signal));
        }

        Ok(SubmissionForm::from_fields(kind, fields))
    }
}

pub fn detect_abuse(kind: FormKind, fields: &SanitizedFields) -> Option<AbuseSignal> {
    if let Some(name) = kind
        .header_fields()
        .into_iter()
        .find(|name| contains_line_break(fields.get(name)))
    {
        return Some(AbuseSignal::HeaderInjectionSuspected(name));
    }

    if !fields.honeypot().is_empty() {
        return Some(AbuseSignal::HoneypotTriggered);
    }

    None
}
