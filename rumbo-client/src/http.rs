use std::time::Duration;

use reqwest::header::{ACCEPT_LANGUAGE, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use rumbo_core::{BackendError, BackendResult, RequestContext};

/// Thin wrapper over `reqwest::Client` carrying the backend base URL.
///
/// Maps transport, non-2xx and decode failures onto [`BackendError`] so
/// callers always have an explicit failure branch. Timeouts are the
/// transport's; no extra deadline is layered on top.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> BackendResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BackendError::NotConfigured(e.to_string()))?;
        Ok(Self::with_http_client(http, base_url))
    }

    /// Build around an existing `reqwest::Client`.
    pub fn with_http_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        path: &str,
        query: &[(&str, &str)],
    ) -> BackendResult<T> {
        let req = self.http.get(self.url(path)).query(query);
        self.send_json(ctx, req).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        path: &str,
        body: &B,
    ) -> BackendResult<T> {
        let req = self.http.post(self.url(path)).json(body);
        self.send_json(ctx, req).await
    }

    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        path: &str,
        body: &B,
    ) -> BackendResult<T> {
        let req = self.http.put(self.url(path)).json(body);
        self.send_json(ctx, req).await
    }

    /// POST where the response body is irrelevant.
    pub async fn post_unit<B: Serialize + ?Sized>(
        &self,
        ctx: &RequestContext,
        path: &str,
        body: &B,
    ) -> BackendResult<()> {
        let req = self.http.post(self.url(path)).json(body);
        self.send(ctx, req).await.map(|_| ())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        req: RequestBuilder,
    ) -> BackendResult<T> {
        let resp = self.send(ctx, req).await?;
        resp.json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn send(
        &self,
        ctx: &RequestContext,
        mut req: RequestBuilder,
    ) -> BackendResult<reqwest::Response> {
        if let Some(bearer) = ctx.bearer() {
            req = req.header(AUTHORIZATION, bearer);
        }
        if let Some(locale) = &ctx.locale {
            req = req.header(ACCEPT_LANGUAGE, locale);
        }

        let resp = req
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

        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_join() {
        let client = ApiClient::with_http_client(Client::new(), "https://api.rumbo.test/");
        assert_eq!(
            client.url("/booking-sessions/s-1"),
            "https://api.rumbo.test/booking-sessions/s-1"
        );
    }
}
