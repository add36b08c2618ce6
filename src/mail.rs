//! Outbound mail. The only caller is verification-code delivery; a send
//! failure is reported to the caller but never unwinds work already
//! persisted.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::config::MailConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Delivers through an HTTP mail API endpoint.
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_token: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_token: Option<String>, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_token,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let mut request = self.client.post(&self.api_url).json(&json!({
            "from": self.from,
            "to": to,
            "subject": subject,
            "text": body,
        }));
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            anyhow::bail!("mail API returned {}", response.status());
        }
        tracing::debug!("Sent mail to {}", to);
        Ok(())
    }
}

/// Logs instead of sending. Used when no mail API is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        tracing::info!("Mail (not configured, logging only) to={} subject={:?}", to, subject);
        tracing::debug!("Mail body: {}", body);
        Ok(())
    }
}

pub fn from_config(config: &MailConfig) -> Arc<dyn Mailer> {
    match (&config.api_url, &config.from) {
        (Some(api_url), Some(from)) => Arc::new(HttpMailer::new(
            api_url.clone(),
            config.api_token.clone(),
            from.clone(),
        )),
        _ => {
            tracing::warn!("Mail API not configured; verification codes will be logged only");
            Arc::new(LogMailer)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_mail_falls_back_to_logging() {
        let mailer = from_config(&MailConfig::default());
        // LogMailer always reports success
        tokio_test::block_on(async {
            assert!(mailer.send("a@x.com", "Hi", "body").await.is_ok());
        });
    }

    #[test]
    fn recording_mailer_captures_messages() {
        let mailer = testing::RecordingMailer::default();
        tokio_test::block_on(async {
            mailer.send("a@x.com", "Your Login Code", "483920").await.unwrap();
        });
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "a@x.com");
    }
}
