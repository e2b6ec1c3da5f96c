//! The reqwest transport.

use crate::config::TransportConfig;
use async_trait::async_trait;
use http::header::AUTHORIZATION;
use http::request::Parts;
use http::{HeaderMap, HeaderName, HeaderValue};
use opal_core::{Body, Context, Transport, TransportError};
use std::sync::Arc;
use tracing::{debug, trace};
use url::Url;

/// [`Transport`] over a pooled `reqwest` client.
///
/// Request URIs are origin-form (`/index/_search?q=..`) and resolved against
/// the configured base URL. Response bodies are streamed back unread.
#[derive(Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
    base_url: Url,
    config: Arc<TransportConfig>,
}

impl ReqwestTransport {
    /// Create a transport with the given configuration.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(config.base_url.clone()));
        }

        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let name = HeaderName::try_from(name.as_str()).map_err(TransportError::other)?;
            let value = HeaderValue::try_from(value.as_str()).map_err(TransportError::other)?;
            default_headers.append(name, value);
        }

        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .default_headers(default_headers)
            .gzip(config.gzip)
            .brotli(config.brotli)
            .danger_accept_invalid_certs(config.danger_accept_invalid_certs)
            .build()
            .map_err(TransportError::other)?;

        Ok(Self {
            inner,
            base_url,
            config: Arc::new(config),
        })
    }

    /// Create a transport for `url` with default settings.
    pub fn from_url(url: impl Into<String>) -> Result<Self, TransportError> {
        Self::new(TransportConfig::builder().base_url(url).build())
    }

    /// The transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// The parsed base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an origin-form URI against the base URL, keeping any base
    /// path prefix.
    pub fn resolve(&self, uri: &http::Uri) -> Url {
        let mut url = self.base_url.clone();
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{prefix}{}", uri.path()));
        url.set_query(uri.query());
        url
    }

    fn build(
        &self,
        parts: &Parts,
        url: Url,
        body: Option<reqwest::Body>,
    ) -> reqwest::RequestBuilder {
        let mut builder = self
            .inner
            .request(parts.method.clone(), url)
            .headers(parts.headers.clone());
        if let Some(username) = &self.config.username
            && !parts.headers.contains_key(AUTHORIZATION)
        {
            builder = builder.basic_auth(username, self.config.password.as_deref());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }
        builder
    }

    async fn execute_once(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<http::Response<Body>, TransportError> {
        let response = request.send().await.map_err(classify)?;

        let mut mapped = http::Response::new(Body::empty());
        *mapped.status_mut() = response.status();
        *mapped.version_mut() = response.version();
        *mapped.headers_mut() = response.headers().clone();
        *mapped.body_mut() = Body::from_stream(response.bytes_stream());
        Ok(mapped)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn perform(
        &self,
        request: http::Request<Body>,
    ) -> Result<http::Response<Body>, TransportError> {
        let (parts, body) = request.into_parts();
        let url = self.resolve(&parts.uri);
        let ctx = parts.extensions.get::<Context>().cloned().unwrap_or_default();
        trace!(method = %parts.method, url = %url, "Sending request");

        if body.is_stream() {
            let body = reqwest::Body::wrap_stream(body.into_stream());
            return self.execute_once(self.build(&parts, url, Some(body))).await;
        }

        let buffered = body.as_bytes().cloned();
        let Some(retry) = &self.config.retry else {
            let body = buffered.map(reqwest::Body::from);
            return self.execute_once(self.build(&parts, url, body)).await;
        };

        let mut attempt = 0;
        loop {
            let body = buffered.clone().map(reqwest::Body::from);
            match self.execute_once(self.build(&parts, url.clone(), body)).await {
                Ok(response)
                    if attempt < retry.max_retries
                        && retry.should_retry_status(response.status().as_u16()) =>
                {
                    debug!(
                        attempt = attempt + 1,
                        status = %response.status(),
                        url = %url,
                        "Retrying request due to status code"
                    );
                }
                Err(e) if attempt < retry.max_retries && retry.should_retry_error(&e) => {
                    debug!(
                        attempt = attempt + 1,
                        error = %e,
                        url = %url,
                        "Retrying request due to error"
                    );
                }
                result => return result,
            }

            let delay = retry.delay_for_attempt(attempt);
            attempt += 1;
            ctx.run(tokio::time::sleep(delay)).await?;
        }
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.base_url.as_str())
            .field("retry", &self.config.retry)
            .finish_non_exhaustive()
    }
}

/// Map a reqwest failure onto the transport taxonomy.
fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(Box::new(error))
    } else if error.is_connect() {
        TransportError::Connect(Box::new(error))
    } else {
        TransportError::Other(Box::new(error))
    }
}
