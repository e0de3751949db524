//! Reference background jobs and their HTTP collaborators.

mod http;
mod location;
mod sync;
mod upload;

/// Job names; also the keys of the attempt store.
pub mod names {
    pub const DATA_SYNC: &str = "data_sync";
    pub const LOCATION_REPORT: &str = "location_report";
    pub const FILE_UPLOAD: &str = "file_upload";
}

pub use http::{HttpLocationReporter, HttpSubTask, HttpUploader};
pub use location::{LocationFix, LocationJob, LocationReporter};
pub use sync::SyncJob;
pub use upload::{UploadJob, Uploader};
