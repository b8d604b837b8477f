use crate::config::FetchConfig;
use crate::error::InferenceError;
use bytes::Bytes;
use std::time::Duration;
use tracing::debug;

/// Downloads images over HTTP with one shared connection pool.
#[derive(Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
}

impl ImageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, InferenceError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// GETs `url` and returns the body. Non-2xx responses are errors.
    pub async fn fetch(&self, url: &str) -> Result<Bytes, InferenceError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        debug!(url, bytes = body.len(), "fetched image");
        Ok(body)
    }
}
