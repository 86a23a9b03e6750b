use crate::form::FormKind;
use crate::rules::is_valid_email;
use crate::sanitize::contains_line_break;
use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub listen_address: String,
    pub site: SiteConfig,
    pub contact: FormConfig,
    pub order: FormConfig,
    pub transport: TransportConfig,
    /// Append-only diagnostic log; `None` keeps diagnostics in the process log only.
    #[serde(default)]
    pub oplog_path: Option<String>,
    #[serde(default = "default_honeypot_field")]
    pub honeypot_field: String,
    /// Append a human-readable reason to the form redirect on validation failures.
    #[serde(default)]
    pub report_validation_reasons: bool,
    /// Re-apply the minimum-length rules on the server side.
    #[serde(default)]
    pub enforce_min_length: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub owner_address: String,
    pub from_address: String,
    pub envelope_sender: String,
    pub signature: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    pub endpoint: String,
    pub thanks_location: String,
    pub form_location: String,
    pub owner_subject: String,
    pub acknowledgement_subject: String,
    pub log_tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    pub sendmail_path: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub dry_run: bool,
}

fn default_honeypot_field() -> String {
    "company".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        let site_name = "Example Illustration".to_string();
        Config {
            listen_address: "127.0.0.1:8080".to_string(),
            contact: FormConfig {
                endpoint: "/contact/send".to_string(),
                thanks_location: "/contact/thanks.html".to_string(),
                form_location: "/contact/index.html".to_string(),
                owner_subject: format!("【お問い合わせ】{site_name}"),
                acknowledgement_subject: "[自動返信] お問い合わせを受付いたしました".to_string(),
                log_tag: "CONTACT_FORM".to_string(),
            },
            order: FormConfig {
                endpoint: "/order/send".to_string(),
                thanks_location: "/order/thanks.html".to_string(),
                form_location: "/order/index.html".to_string(),
                owner_subject: format!("【制作依頼】{site_name}"),
                acknowledgement_subject: "[自動返信] 制作依頼を受付いたしました".to_string(),
                log_tag: "ORDER_FORM".to_string(),
            },
            site: SiteConfig {
                signature: vec![site_name.clone(), "Email: owner@example.com".to_string()],
                name: site_name,
                owner_address: "owner@example.com".to_string(),
                from_address: "noreply@example.com".to_string(),
                envelope_sender: "noreply@example.com".to_string(),
            },
            transport: TransportConfig {
                sendmail_path: "/usr/sbin/sendmail".to_string(),
                timeout_seconds: default_timeout_seconds(),
                dry_run: false,
            },
            oplog_path: None,
            honeypot_field: default_honeypot_field(),
            report_validation_reasons: false,
            enforce_min_length: false,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn form(&self, kind: FormKind) -> &FormConfig {
        match kind {
            FormKind::Contact => &self.contact,
            FormKind::Order => &self.order,
        }
    }

    /// Collect every problem instead of stopping at the first one.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for (label, address) in [
            ("site.owner_address", &self.site.owner_address),
            ("site.from_address", &self.site.from_address),
            ("site.envelope_sender", &self.site.envelope_sender),
        ] {
            if !is_valid_email(address) {
                problems.push(format!("{label} is not a valid address: {address}"));
            }
        }

        for kind in FormKind::ALL {
            let form = self.form(kind);
            if !form.endpoint.starts_with('/') {
                problems.push(format!("{kind}.endpoint must start with '/': {}", form.endpoint));
            }
            for (label, location) in [
                ("thanks_location", &form.thanks_location),
                ("form_location", &form.form_location),
            ] {
                if location.is_empty() || HeaderValue::from_str(location).is_err() {
                    problems.push(format!(
                        "{kind}.{label} is not usable as a Location header: {location:?}"
                    ));
                }
            }
            for (label, value) in [
                ("owner_subject", &form.owner_subject),
                ("acknowledgement_subject", &form.acknowledgement_subject),
            ] {
                if contains_line_break(value) {
                    problems.push(format!("{kind}.{label} contains a line break"));
                }
            }
        }

        if self.contact.endpoint == self.order.endpoint {
            problems.push(format!(
                "contact and order share the endpoint {}",
                self.contact.endpoint
            ));
        }

        if self.transport.timeout_seconds == 0 {
            problems.push("transport.timeout_seconds must be greater than zero".to_string());
        }

        if self.honeypot_field.trim().is_empty() {
            problems.push("honeypot_field must not be empty".to_string());
        }

        problems
    }
}
