use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use rumbo_core::{
    BackendError, BackendResult, GatewayConfirmation, PaymentGateway, PaymentStatus,
};

use crate::config::GatewayConfig;

/// Card gateway client authenticated with the publishable key.
pub struct HttpPaymentGateway {
    http: reqwest::Client,
    base_url: String,
    publishable_key: String,
}

impl HttpPaymentGateway {
    /// Fails with `NotConfigured` when the publishable key is absent; the
    /// payment step turns that into its configuration error.
    pub fn from_config(cfg: &GatewayConfig) -> BackendResult<Self> {
        let publishable_key = cfg
            .publishable_key
            .clone()
            .ok_or_else(|| {
                BackendError::NotConfigured("payment gateway publishable key is not set".to_string())
            })?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BackendError::NotConfigured(e.to_string()))?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            publishable_key,
        })
    }
}

#[derive(Deserialize)]
struct ConfirmResponse {
    #[serde(default)]
    id: Option<String>,
    status: PaymentStatus,
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        payment_method_id: &str,
    ) -> BackendResult<GatewayConfirmation> {
        // The intent id is the prefix of its client secret (pi_..._secret_...)
        let intent_id = intent_id_from_secret(client_secret)?;
        debug!(intent_id, "confirming card payment");

        let url = format!("{}/v1/payment_intents/{}/confirm", self.base_url, intent_id);
        let resp = self
            .http
            .post(url)
            .basic_auth(&self.publishable_key, None::<&str>)
            .form(&[
                ("client_secret", client_secret),
                ("payment_method", payment_method_id),
            ])
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                code: status.as_u16(),
                message,
            });
        }

        let confirmed: ConfirmResponse = resp
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        Ok(GatewayConfirmation {
            transaction_id: confirmed.id,
            status: confirmed.status,
        })
    }
}

fn intent_id_from_secret(client_secret: &str) -> BackendResult<&str> {
    let intent_id = client_secret.split("_secret").next().unwrap_or_default();
    if intent_id.is_empty() {
        return Err(BackendError::NotConfigured(format!(
            "malformed client secret: {}",
            client_secret
        )));
    }
    Ok(intent_id)
}
