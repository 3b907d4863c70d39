pub mod notification;
pub mod state;
pub mod submission_ctx;
pub mod upload_flow;

pub use notification::{
    DownloadAction, Notification, NotificationController, SubmissionSummary, SuccessNotice,
};
pub use state::{SubmitOutcome, UploadState};
pub use submission_ctx::SubmissionCtx;
pub use upload_flow::UploadFlow;
