//! Notification Delivery
//!
//! Outbound delivery of credential-setup links through a transactional
//! mail HTTP API. Delivery is best-effort: callers log failures and
//! never roll provisioning back.

use serde::Serialize;

use crate::domain::repository::Notifier;
use crate::domain::value_object::Email;
use crate::error::{TenancyError, TenancyResult};

/// Mail-API-backed notifier
#[derive(Clone)]
pub struct MailApiNotifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    /// Base URL for the credential-setup page the links point at
    link_base: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MailRequest<'a> {
    to: &'a str,
    template: &'a str,
    name: &'a str,
    link: &'a str,
}

impl MailApiNotifier {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        link_base: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            link_base: link_base.into(),
        }
    }

    async fn deliver(
        &self,
        email: &Email,
        template: &'static str,
        name: &str,
        path: &str,
        raw_token: &str,
    ) -> TenancyResult<()> {
        let link = format!("{}/{}?token={}", self.link_base, path, raw_token);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&MailRequest {
                to: email.as_str(),
                template,
                name,
                link: &link,
            })
            .send()
            .await
            .map_err(|e| TenancyError::Internal(format!("Mail API request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TenancyError::Internal(format!(
                "Mail API returned status: {}",
                response.status()
            )));
        }

        tracing::debug!(email = %email, template, "Notification delivered");
        Ok(())
    }
}

impl Notifier for MailApiNotifier {
    async fn send_invite(
        &self,
        email: &Email,
        name_hint: &str,
        raw_token: &str,
    ) -> TenancyResult<()> {
        self.deliver(email, "account-invite", name_hint, "activate", raw_token)
            .await
    }

    async fn send_reset(&self, email: &Email, raw_token: &str) -> TenancyResult<()> {
        self.deliver(email, "credential-reset", "", "reset", raw_token)
            .await
    }
}

/// Notifier that drops every delivery on the floor
///
/// For deployments without an outbound mail service; invite tokens stay
/// valid and can be handed out through another channel.
#[derive(Clone, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    async fn send_invite(
        &self,
        email: &Email,
        _name_hint: &str,
        _raw_token: &str,
    ) -> TenancyResult<()> {
        tracing::debug!(email = %email, "Notifier disabled; invite not delivered");
        Ok(())
    }

    async fn send_reset(&self, email: &Email, _raw_token: &str) -> TenancyResult<()> {
        tracing::debug!(email = %email, "Notifier disabled; reset not delivered");
        Ok(())
    }
}
