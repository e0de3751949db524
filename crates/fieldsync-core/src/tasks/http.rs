//! HTTP collaborators for the reference jobs.

use std::time::Duration;

use url::Url;

use crate::error::ConfigurationError;
use crate::http::HttpClient;
use crate::job::Session;
use crate::retry::FetchError;
use crate::sync::SubTask;

use super::location::{LocationFix, LocationReporter};
use super::upload::Uploader;

fn parse_endpoint(key: &str, raw: &str) -> Result<Url, ConfigurationError> {
    Url::parse(raw).map_err(|e| ConfigurationError::InvalidInput {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Sync sub-task that GETs one endpoint. A success status is `true`; an error
/// status is a reported failure (`false`); transport errors are raised.
#[derive(Debug, Clone)]
pub struct HttpSubTask {
    name: String,
    url: String,
    client: HttpClient,
}

impl HttpSubTask {
    pub fn new(name: &str, url: &str, timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            client: HttpClient::with_timeout(timeout),
        }
    }
}

impl SubTask for HttpSubTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self) -> anyhow::Result<bool> {
        match self.client.get(&self.url) {
            Ok(resp) => {
                tracing::debug!(subtask = %self.name, bytes = resp.body.len(), "sub-task fetched");
                Ok(true)
            }
            Err(FetchError::Client { status, .. } | FetchError::Server { status, .. }) => {
                tracing::warn!(subtask = %self.name, status, "sub-task endpoint returned an error status");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// POSTs each fix as JSON.
#[derive(Debug, Clone)]
pub struct HttpLocationReporter {
    endpoint: Url,
    client: HttpClient,
}

impl HttpLocationReporter {
    pub fn new(endpoint: &str) -> Result<Self, ConfigurationError> {
        Ok(Self {
            endpoint: parse_endpoint("location_endpoint", endpoint)?,
            client: HttpClient::default(),
        })
    }
}

impl LocationReporter for HttpLocationReporter {
    fn send(&self, fix: &LocationFix) -> Result<(), FetchError> {
        let body = serde_json::to_vec(fix)
            .map_err(|e| FetchError::InvalidResponse(format!("encoding location: {e}")))?;
        self.client
            .post(self.endpoint.as_str(), "application/json", &body)?;
        Ok(())
    }
}

/// POSTs raw file bytes to `{endpoint}?name=..&user=..`. The response body,
/// if non-empty, is taken as the stored name.
#[derive(Debug, Clone)]
pub struct HttpUploader {
    endpoint: Url,
    client: HttpClient,
}

impl HttpUploader {
    pub fn new(endpoint: &str) -> Result<Self, ConfigurationError> {
        Ok(Self {
            endpoint: parse_endpoint("upload_endpoint", endpoint)?,
            client: HttpClient::with_timeout(Duration::from_secs(300)),
        })
    }

    pub fn request_url(&self, file_name: &str, owner: &Session) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("name", file_name)
            .append_pair("user", &owner.user_id);
        url
    }
}

impl Uploader for HttpUploader {
    fn upload(
        &self,
        file_name: &str,
        contents: &[u8],
        owner: &Session,
    ) -> Result<String, FetchError> {
        let url = self.request_url(file_name, owner);
        let resp = self
            .client
            .post(url.as_str(), "application/octet-stream", contents)?;
        let stored = resp.text().trim().to_string();
        Ok(if stored.is_empty() {
            file_name.to_string()
        } else {
            stored
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploader_url_carries_name_and_owner() {
        let up = HttpUploader::new("https://files.example.com/upload").unwrap();
        let owner = Session {
            user_id: "crew 4".into(),
        };
        assert_eq!(
            up.request_url("report.pdf", &owner).as_str(),
            "https://files.example.com/upload?name=report.pdf&user=crew+4"
        );
    }

    #[test]
    fn bad_endpoints_are_configuration_errors() {
        assert!(matches!(
            HttpLocationReporter::new("not a url"),
            Err(ConfigurationError::InvalidInput { .. })
        ));
        assert!(HttpUploader::new("::").is_err());
    }
}
