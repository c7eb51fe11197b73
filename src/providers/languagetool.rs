use futures::future::BoxFuture;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};

use super::{GrammarProvider, ProviderError};

const PROVIDER: &str = "languagetool";

/// Grammar provider backed by a LanguageTool server (`/v2/check`).
///
/// The issue count is the number of entries in the response's `matches`
/// array. Connect failures, timeouts and 5xx responses are retried with
/// exponential backoff; anything else fails on the first attempt.
#[derive(Debug, Clone)]
pub struct LanguageToolClient {
    client: reqwest::Client,
    endpoint: String,
    language: String,
}

impl LanguageToolClient {
    pub fn new(base_url: &str, language: &str) -> Self {
        install_crypto_provider();
        Self {
            client: reqwest::Client::new(),
            endpoint: check_endpoint(base_url),
            language: language.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn check(&self, text: &str) -> Result<usize, ProviderError> {
        // 100ms, then 1s
        let retry_strategy = ExponentialBackoff::from_millis(10)
            .factor(10)
            .max_delay(Duration::from_secs(1))
            .take(2);

        let attempt = || async move {
            let response = self
                .client
                .post(&self.endpoint)
                .form(&[("text", text), ("language", self.language.as_str())])
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| Attempt {
                    transient: is_transient(&e),
                    error: ProviderError::Unavailable {
                        provider: PROVIDER,
                        reason: e.to_string(),
                    },
                })?;

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| Attempt {
                    transient: false,
                    error: ProviderError::InvalidResponse {
                        provider: PROVIDER,
                        reason: e.to_string(),
                    },
                })
        };

        let body = RetryIf::spawn(retry_strategy, attempt, |a: &Attempt| a.transient)
            .await
            .map_err(|a| a.error)?;

        count_matches(&body)
    }
}

/// A failed request and whether a later attempt could succeed
struct Attempt {
    error: ProviderError,
    transient: bool,
}

fn is_transient(error: &reqwest::Error) -> bool {
    error.is_connect()
        || error.is_timeout()
        || error.status().is_some_and(|status| status.is_server_error())
}

/// rustls 0.23+ needs a process-level crypto provider before any TLS client
/// is built. Installing twice is harmless.
fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Normalize a base URL to its `/v2/check` endpoint
fn check_endpoint(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/v2/check") {
        base.to_string()
    } else if base.ends_with("/v2") {
        format!("{}/check", base)
    } else {
        format!("{}/v2/check", base)
    }
}

fn count_matches(body: &serde_json::Value) -> Result<usize, ProviderError> {
    body.get("matches")
        .and_then(|m| m.as_array())
        .map(|matches| matches.len())
        .ok_or_else(|| ProviderError::InvalidResponse {
            provider: PROVIDER,
            reason: "missing 'matches' array".to_string(),
        })
}

impl GrammarProvider for LanguageToolClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn issue_count<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<usize, ProviderError>> {
        Box::pin(self.check(text))
    }
}
