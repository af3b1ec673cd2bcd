pub mod activity_log;
pub mod catalog_service;
pub mod option_resolver;
pub mod result_presenter;
pub mod submission_reconciler;

pub use activity_log::{ActivityKind, ActivityLogger};
pub use catalog_service::CatalogService;
pub use option_resolver::{OptionResolver, Resolution, ResolutionSource};
pub use result_presenter::{summarize, ResultSummary, Verdict};
pub use submission_reconciler::{SubmissionDraft, SubmissionReconciler};
