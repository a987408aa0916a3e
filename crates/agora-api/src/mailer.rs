//! Outbound mail.
//!
//! Delivery itself is somebody else's problem: the server ships with a
//! [`LogMailer`] that records each message in the trace log. Deployments that
//! need real delivery implement [`Mailer`] over their transport.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("mail delivery failed: {0}")]
pub struct MailError(pub String);

/// A single outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
  pub to:      String,
  pub subject: String,
  pub body:    String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
  async fn send(&self, mail: Mail) -> Result<(), MailError>;
}

/// Writes every message to the `tracing` log at `info`.
#[derive(Debug, Clone)]
pub struct LogMailer {
  pub from: String,
}

#[async_trait]
impl Mailer for LogMailer {
  async fn send(&self, mail: Mail) -> Result<(), MailError> {
    tracing::info!(
      from = %self.from,
      to = %mail.to,
      subject = %mail.subject,
      body = %mail.body,
      "outbound mail",
    );
    Ok(())
  }
}

/// Keeps sent mail in memory; handy for tests and local tooling.
#[derive(Debug, Default)]
pub struct RecordingMailer {
  sent: Mutex<Vec<Mail>>,
}

impl RecordingMailer {
  pub fn sent(&self) -> Vec<Mail> {
    self.sent.lock().map(|s| s.clone()).unwrap_or_default()
  }

  pub fn last_to(&self, to: &str) -> Option<Mail> {
    self.sent().into_iter().rev().find(|m| m.to == to)
  }
}

#[async_trait]
impl Mailer for RecordingMailer {
  async fn send(&self, mail: Mail) -> Result<(), MailError> {
    self
      .sent
      .lock()
      .map_err(|_| MailError("outbox lock poisoned".into()))?
      .push(mail);
    Ok(())
  }
}
