use crate::compose::OutgoingMessage;
use crate::sanitize::contains_line_break;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use std::process::{ExitStatus, Stdio};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

// Keeps each encoded word within the 75 character limit.
const ENCODED_WORD_CHUNK: usize = 45;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to start mailer {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("I/O error while handing message to mailer: {0}")]
    Io(#[from] std::io::Error),
    #[error("Mailer exited with {0}")]
    Exit(ExitStatus),
    #[error("Refusing to send: line break in {0} header")]
    UnsafeHeader(&'static str),
    #[error("Transport declined message to {0}")]
    Declined(String),
}

/// Mail hand-off. `Ok(())` means the transport accepted the message; there is
/// no delivery receipt beyond that.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError>;
    fn name(&self) -> &str;
}

/// RFC 2047 encoded words for non-ASCII header text.
pub fn encode_header_value(value: &str) -> String {
    if value.is_ascii() {
        return value.to_string();
    }

    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in value.chars() {
        if chunk.len() + c.len_utf8() > ENCODED_WORD_CHUNK {
            words.push(encoded_word(&chunk));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() {
        words.push(encoded_word(&chunk));
    }
    words.join("\n ")
}

fn encoded_word(text: &str) -> String {
    format!("=?UTF-8?B?{}?=", general_purpose::STANDARD.encode(text))
}

/// Render the message as handed to a `sendmail -t` style mailer.
pub fn render(message: &OutgoingMessage) -> Result<String, TransportError> {
    let mut header_values = vec![
        ("To", message.to.as_str()),
        ("From", message.from.as_str()),
        ("Subject", message.subject.as_str()),
    ];
    if let Some(reply_to) = &message.reply_to {
        header_values.push(("Reply-To", reply_to.as_str()));
    }
    for (name, value) in &header_values {
        if contains_line_break(value) {
            return Err(TransportError::UnsafeHeader(*name));
        }
    }

    let mut rendered = String::new();
    rendered.push_str(&format!("To: {}\n", message.to));
    rendered.push_str(&format!(
        "Subject: {}\n",
        encode_header_value(&message.subject)
    ));
    rendered.push_str(&format!("From: {}\n", message.from));
    if let Some(reply_to) = &message.reply_to {
        rendered.push_str(&format!("Reply-To: {reply_to}\n"));
    }
    rendered.push_str("MIME-Version: 1.0\n");
    rendered.push_str("Content-Type: text/plain; charset=UTF-8\n");
    rendered.push_str("Content-Transfer-Encoding: 8bit\n");
    rendered.push_str(&format!(
        "X-Mailer: inquiry-relay/{}\n",
        env!("CARGO_PKG_VERSION")
    ));
    rendered.push('\n');
    rendered.push_str(&message.body);
    Ok(rendered)
}

/// Pipes rendered messages into a local sendmail-compatible binary.
pub struct SendmailTransport {
    program: String,
    args: Vec<String>,
}

impl SendmailTransport {
    pub fn new(sendmail_path: &str, envelope_sender: &str) -> Self {
        Self::with_command(
            sendmail_path,
            vec![
                "-t".to_string(),
                "-i".to_string(),
                "-f".to_string(),
                envelope_sender.to_string(),
            ],
        )
    }

    pub fn with_command(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_string(),
            args,
        }
    }
}

#[async_trait]
impl MailTransport for SendmailTransport {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        let rendered = render(message)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TransportError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(rendered.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                log::warn!("{} stderr: {}", self.program, stderr.trim());
            }
            Err(TransportError::Exit(output.status))
        }
    }

    fn name(&self) -> &str {
        "sendmail"
    }
}

/// Records messages instead of sending them. Addresses listed as failing are
/// declined, which makes partial-delivery paths reproducible.
#[derive(Debug, Default)]
pub struct DryRunTransport {
    attempts: Mutex<Vec<OutgoingMessage>>,
    failing: Vec<String>,
    delay: Option<Duration>,
}

impl DryRunTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(addresses: &[&str]) -> Self {
        Self {
            failing: addresses.iter().map(|a| a.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn attempts(&self) -> Vec<OutgoingMessage> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn delivered(&self) -> Vec<OutgoingMessage> {
        self.attempts()
            .into_iter()
            .filter(|m| !self.failing.contains(&m.to))
            .collect()
    }
}

#[async_trait]
impl MailTransport for DryRunTransport {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        render(message)?;
        if self.failing.contains(&message.to) {
            return Err(TransportError::Declined(message.to.clone()));
        }
        log::debug!("Dry run: accepted message to {}", message.to);
        Ok(())
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}
