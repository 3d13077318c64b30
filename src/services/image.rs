use async_trait::async_trait;

use crate::error::TransportError;

/// Source of the decorative picture attached to reminders.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, TransportError>;
}

/// Downloads a fresh image from a URL on every call.
pub struct HttpImageSource {
    client: reqwest::Client,
    url: String,
}

impl HttpImageSource {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .unwrap_or_default();

        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| TransportError::ImageFetch(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::ImageFetch(e.to_string()))?;

        if bytes.is_empty() {
            return Err(TransportError::ImageFetch(format!("{} returned no data", self.url)));
        }

        Ok(bytes.to_vec())
    }
}
