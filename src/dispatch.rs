use crate::compose::OutgoingMessage;
use crate::oplog::OperationalLog;
use crate::transport::MailTransport;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub owner_notified: bool,
    pub submitter_notified: bool,
}

impl DispatchOutcome {
    pub fn any_sent(&self) -> bool {
        self.owner_notified || self.submitter_notified
    }
}

/// Sends the owner notification and the acknowledgement independently. A
/// failure on one side never cancels or rolls back the other, and nothing is
/// retried.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn MailTransport>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn MailTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub async fn dispatch(
        &self,
        owner: &OutgoingMessage,
        submitter: &OutgoingMessage,
        oplog: &OperationalLog,
    ) -> DispatchOutcome {
        let (owner_notified, submitter_notified) = tokio::join!(
            self.attempt("owner", owner, oplog),
            self.attempt("submitter", submitter, oplog),
        );

        DispatchOutcome {
            owner_notified,
            submitter_notified,
        }
    }

    async fn attempt(&self, role: &str, message: &OutgoingMessage, oplog: &OperationalLog) -> bool {
        oplog.write(format!(
            "{role} mail via {}: To={}, Subject={}",
            self.transport.name(),
            message.to,
            message.subject
        ));

        let sent = match tokio::time::timeout(self.timeout, self.transport.send(message)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                oplog.write(format!("{role} mail failed: {e}"));
                false
            }
            Err(_) => {
                oplog.write(format!(
                    "{role} mail timed out after {}s",
                    self.timeout.as_secs_f32()
                ));
                false
            }
        };

        oplog.write(format!(
            "{role} mail result: {}",
            if sent { "success" } else { "failure" }
        ));
        sent
    }
}
