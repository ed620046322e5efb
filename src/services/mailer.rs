use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use uuid::Uuid;

use crate::core::ports::MatchNotifier;

/// Errors that can occur when talking to the mail API
#[derive(Debug, Error)]
pub enum MailError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),
}

/// Mailgun-style mail API client
///
/// New-match notifications are strictly best-effort: the public surface
/// returns a bool and every failure is logged and swallowed, so a mail
/// outage can never fail or delay a reconcile.
pub struct Mailer {
    endpoint: String,
    domain: String,
    api_key: String,
    from: String,
    client: Client,
}

impl Mailer {
    /// Create a new mail client
    pub fn new(
        endpoint: String,
        domain: String,
        api_key: String,
        from_email: String,
        from_name: String,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint,
            domain,
            api_key,
            from: format!("{} <{}>", from_name, from_email),
            client,
        }
    }

    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let url = format!(
            "{}/v3/{}/messages",
            self.endpoint.trim_end_matches('/'),
            self.domain
        );

        let params = [
            ("from", self.from.as_str()),
            ("to", to),
            ("subject", subject),
            ("html", html),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth("api", Some(&self.api_key))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MailError::ApiError(format!(
                "Mail API returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl MatchNotifier for Mailer {
    async fn send_match_notification(
        &self,
        recipient: &str,
        project_id: Uuid,
        vendor_name: &str,
        details: &str,
    ) -> bool {
        let subject = format!("New Match for Project: {}", project_id);
        let html = format!(
            "<h2>New vendor match</h2>\
             <p>Your project <strong>{}</strong> has a new matching vendor: \
             <strong>{}</strong>.</p>\
             <p>{}</p>",
            project_id, vendor_name, details
        );

        match self.send(recipient, &subject, &html).await {
            Ok(()) => {
                tracing::debug!("Sent match notification to {}", recipient);
                true
            }
            Err(err) => {
                tracing::warn!("Error sending match notification: {}", err);
                false
            }
        }
    }
}
