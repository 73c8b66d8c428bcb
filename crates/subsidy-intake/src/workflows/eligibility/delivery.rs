use std::fmt::{Debug, Write as _};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::Serialize;

use super::render::RenderedDocument;

/// Outbound report message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryEnvelope {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachment: RenderedDocument,
}

impl DeliveryEnvelope {
    pub fn recipients(&self) -> impl Iterator<Item = &str> {
        self.to.iter().chain(self.cc.iter()).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub recipients: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("no recipients for report delivery")]
    NoRecipients,
    #[error("delivery transport unavailable: {0}")]
    Transport(String),
    #[error("failed to spool report: {0}")]
    Io(#[from] std::io::Error),
}

pub trait DeliverySink: Debug + Send + Sync {
    fn deliver(&self, envelope: &DeliveryEnvelope) -> Result<DeliveryReceipt, DeliveryError>;
}

/// Routing rule applied to every outbound report: the applicant receives it
/// and the oversight address, when configured, is always copied.
#[derive(Debug, Clone, Default)]
pub struct DeliveryRouting {
    oversight_address: Option<String>,
}

impl DeliveryRouting {
    pub fn new(oversight_address: Option<String>) -> Self {
        Self { oversight_address }
    }

    pub fn oversight_address(&self) -> Option<&str> {
        self.oversight_address.as_deref()
    }

    pub fn envelope(
        &self,
        recipient: &str,
        company: &str,
        body: String,
        attachment: RenderedDocument,
    ) -> DeliveryEnvelope {
        let to = vec![recipient.to_string()];
        let cc = self
            .oversight_address
            .iter()
            .filter(|address| !address.eq_ignore_ascii_case(recipient))
            .cloned()
            .collect();

        DeliveryEnvelope {
            to,
            cc,
            subject: format!("Subsidy Eligibility Report - {company}"),
            body,
            attachment,
        }
    }
}

static OUTBOX_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Spools each envelope into its own directory for a mail relay to pick up.
#[derive(Debug, Clone)]
pub struct OutboxDelivery {
    root: PathBuf,
}

impl OutboxDelivery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn next_message_id() -> String {
        let sequence = OUTBOX_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        format!("{}-{sequence:04}", Utc::now().format("%Y%m%dT%H%M%S%3f"))
    }
}

impl DeliverySink for OutboxDelivery {
    fn deliver(&self, envelope: &DeliveryEnvelope) -> Result<DeliveryReceipt, DeliveryError> {
        if envelope.to.is_empty() {
            return Err(DeliveryError::NoRecipients);
        }

        let message_id = Self::next_message_id();
        let dir = self.root.join(&message_id);
        fs::create_dir_all(&dir)?;

        let mut message = String::new();
        let to = header_value(&envelope.to.join(", "));
        writeln!(message, "To: {to}").expect("write to header");
        if !envelope.cc.is_empty() {
            let cc = header_value(&envelope.cc.join(", "));
            writeln!(message, "Cc: {cc}").expect("write cc header");
        }
        writeln!(message, "Subject: {}", header_value(&envelope.subject)).expect("write subject");
        writeln!(
            message,
            "X-Attachment: {} ({})",
            header_value(&envelope.attachment.file_name),
            envelope.attachment.content_type
        )
        .expect("write attachment header");
        message.push('\n');
        message.push_str(&envelope.body);

        fs::write(dir.join("message.txt"), message)?;
        fs::write(
            dir.join(sanitize_file_name(&envelope.attachment.file_name)),
            &envelope.attachment.bytes,
        )?;

        Ok(DeliveryReceipt {
            message_id,
            recipients: envelope.recipients().map(str::to_string).collect(),
        })
    }
}

/// Header values stay on one line: control characters become spaces.
fn header_value(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

fn sanitize_file_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "attachment.bin".to_string()
    } else {
        cleaned
    }
}
