use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client as SesClient;

/// Outbound email delivery. Every send either fully succeeds or
/// returns an error; the caller decides whether that error matters.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()>;
}

/// SES-backed mailer.
pub struct SesMailer {
    client: SesClient,
    from: String,
}

impl SesMailer {
    pub fn new(client: SesClient, from: String) -> Self {
        Self { client, from }
    }

    /// Build a mailer from the ambient AWS environment.
    pub async fn from_env(from: String) -> Self {
        let config =
            aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: SesClient::new(&config),
            from,
        }
    }
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        let subject = Content::builder()
            .data(subject)
            .build()
            .context("building subject")?;
        let body = Body::builder()
            .html(Content::builder().data(html).build().context("building body")?)
            .build();
        let message = Message::builder().subject(subject).body(body).build();

        self.client
            .send_email()
            .from_email_address(&self.from)
            .destination(Destination::builder().to_addresses(to).build())
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .map_err(|err| anyhow!("ses send failed: {}", err))?;

        tracing::info!(to = to, "Email sent");
        Ok(())
    }
}

/// Mailer used when no sender address is configured. Logs the send
/// and drops it, so lifecycle operations stay usable without SMTP
/// credentials.
pub struct NullMailer;

#[async_trait]
impl Mailer for NullMailer {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> Result<()> {
        tracing::warn!(to = to, subject = subject, "Mail disabled, dropping email");
        Ok(())
    }
}

/// In-memory mailer for tests. Records every delivery and can be
/// told to fail for a single recipient or for everyone.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: std::sync::Mutex<Vec<(String, String)>>,
    pub fail_for: Option<String>,
    pub fail_all: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn failing_for(recipient: &str) -> Self {
        Self {
            fail_for: Some(recipient.to_string()),
            ..Self::default()
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> Result<()> {
        if self.fail_all || self.fail_for.as_deref() == Some(to) {
            return Err(anyhow!("simulated delivery failure to {}", to));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}
