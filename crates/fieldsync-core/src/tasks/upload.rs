//! File upload job and its uploader seam.

use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::error::ConfigurationError;
use crate::job::{
    keys, now_millis, Job, JobContext, JobError, JobOutput, Payload, PayloadValue, ProgressSink,
    Session,
};
use crate::retry::{FetchError, RetryPolicy};

/// Sends file contents to remote storage. Returns the stored name.
pub trait Uploader: Send + Sync {
    fn upload(&self, file_name: &str, contents: &[u8], owner: &Session)
        -> Result<String, FetchError>;
}

impl<F> Uploader for F
where
    F: Fn(&str, &[u8], &Session) -> Result<String, FetchError> + Send + Sync,
{
    fn upload(
        &self,
        file_name: &str,
        contents: &[u8],
        owner: &Session,
    ) -> Result<String, FetchError> {
        self(file_name, contents, owner)
    }
}

/// Uploads one local file on behalf of the signed-in user.
pub struct UploadJob<U> {
    uploader: U,
    policy: RetryPolicy,
}

impl<U: Uploader> UploadJob<U> {
    pub const NAME: &'static str = super::names::FILE_UPLOAD;

    pub fn new(uploader: U) -> Self {
        Self {
            uploader,
            policy: RetryPolicy::with_max_attempts(5),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl<U: Uploader> Job for UploadJob<U> {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.policy
    }

    fn execute(
        &mut self,
        ctx: &JobContext,
        progress: &dyn ProgressSink,
    ) -> Result<JobOutput, JobError> {
        let owner = ctx.require_session(Self::NAME)?;
        let path = Path::new(ctx.input.require_str(keys::FILE_PATH)?);
        if !path.is_file() {
            return Err(ConfigurationError::InvalidInput {
                key: keys::FILE_PATH.to_string(),
                reason: format!("{} is not a readable file", path.display()),
            }
            .into());
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let contents = fs::read(path)
            .with_context(|| format!("reading {}", path.display()))
            .map_err(JobError::Permanent)?;

        if ctx.cancel.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        progress.report(&format!("Uploading {file_name}"), None);
        let stored = self.uploader.upload(&file_name, &contents, owner)?;
        tracing::info!(file = %file_name, stored = %stored, bytes = contents.len(), "upload complete");

        let payload = Payload::new()
            .with(keys::UPLOADED_FILE, PayloadValue::Text(stored))
            .with(keys::UPLOAD_TIMESTAMP, PayloadValue::Timestamp(now_millis()));
        Ok(JobOutput::new(payload))
    }
}
