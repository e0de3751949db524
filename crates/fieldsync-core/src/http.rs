//! Blocking HTTP requests on a libcurl easy handle.
//!
//! Shared by the routing adapter and the job collaborators. Transport failures
//! and non-2xx statuses come back as `FetchError` so callers can classify them.

use std::time::Duration;

use crate::retry::FetchError;

/// Completed response with a success status.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Timeouts applied to every request.
#[derive(Debug, Clone, Copy)]
pub struct HttpClient {
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(60),
        }
    }
}

impl HttpClient {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    pub fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.perform(url, None)
    }

    /// POST `body` with the given content type.
    pub fn post(&self, url: &str, content_type: &str, body: &[u8]) -> Result<HttpResponse, FetchError> {
        self.perform(url, Some((content_type, body)))
    }

    fn perform(&self, url: &str, post: Option<(&str, &[u8])>) -> Result<HttpResponse, FetchError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;

        let mut headers = curl::easy::List::new();
        headers.append("Accept: application/json")?;
        if let Some((content_type, body)) = post {
            easy.post(true)?;
            easy.post_fields_copy(body)?;
            headers.append(&format!("Content-Type: {}", content_type))?;
        }
        easy.http_headers(headers)?;

        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        if !(200..300).contains(&status) {
            let message = String::from_utf8_lossy(&body);
            let message = message.trim();
            let message = if message.is_empty() {
                "empty response body".to_string()
            } else {
                message.chars().take(200).collect()
            };
            return Err(FetchError::from_status(status, message));
        }
        Ok(HttpResponse { status, body })
    }
}
