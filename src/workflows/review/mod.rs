//! Application review: loading submitted applications, rendering answers, validating
//! reviewer scores, and submitting them to the review service.

pub mod api;
pub mod applications;
pub mod domain;
pub mod render;
pub mod schema;
pub mod session;

#[cfg(test)]
mod tests;

pub use api::{ApiError, HttpReviewApi, ReviewApi, ReviewRequest, ServiceResponse};
pub use applications::{ApplicationEvent, ApplicationLookupError, ApplicationStore};
pub use domain::{
    Application, ApplicationId, FieldKind, ReviewForm, ReviewId, ReviewRecord, ReviewType,
    Submission, SubmittedField,
};
pub use render::{
    application_overview, overview, render, ApplicationHeader, ApplicationOverview, DisplayValue,
    RenderedField,
};
pub use schema::{
    membership_schema, FieldRule, ReviewField, ReviewSchema, ReviewSchemaRegistry,
    SchemaLookupError, ValidationErrors,
};
pub use session::{
    PendingSubmission, ReviewSession, SessionState, SubmissionKind, SubmissionNotice,
    SubmissionOutcome, SubmitError,
};
