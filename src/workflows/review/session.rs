//! Reviewer session: selection, draft editing, and the create-or-update submission flow.
//!
//! Submission moves through `Idle -> Validating -> Submitting -> Success | Error`, and the
//! terminal states fall back to `Idle` once acknowledged. Only a response for the
//! application that is still selected drives the session; a late record for another
//! application is attached to it quietly.

use tracing::{info, warn};

use super::api::{ApiError, ReviewApi, ReviewRequest};
use super::applications::{ApplicationLookupError, ApplicationStore};
use super::domain::{Application, ApplicationId, ReviewForm, ReviewId, ReviewRecord, ReviewType};
use super::render::{application_overview, ApplicationOverview};
use super::schema::{ReviewSchema, ReviewSchemaRegistry, SchemaLookupError, ValidationErrors};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Validating,
    Submitting {
        application_id: ApplicationId,
        kind: SubmissionKind,
    },
    Success {
        review: ReviewRecord,
        kind: SubmissionKind,
    },
    Error {
        application_id: ApplicationId,
        kind: SubmissionKind,
        message: String,
    },
}

/// Whether a submission creates a review or updates a known record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionKind {
    Create,
    Update(ReviewId),
}

impl SubmissionKind {
    pub fn notice(&self) -> SubmissionNotice {
        match self {
            SubmissionKind::Create => SubmissionNotice {
                loading: "Submitting review",
                success: "Successfully submitted review",
                error: "Failed to submit review",
            },
            SubmissionKind::Update(_) => SubmissionNotice {
                loading: "Updating review",
                success: "Successfully updated review",
                error: "Failed to update review",
            },
        }
    }
}

/// User-facing messages for each stage of one submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionNotice {
    pub loading: &'static str,
    pub success: &'static str,
    pub error: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("no application is selected for review")]
    NoActiveApplication,
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
}

/// Result of applying a service response to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Saved {
        review: ReviewRecord,
        kind: SubmissionKind,
    },
    Failed {
        kind: SubmissionKind,
        message: String,
    },
    /// The response belonged to an application that is no longer selected. A saved record
    /// is still attached to that application; selection, draft and state are untouched.
    Discarded { application_id: ApplicationId },
}

impl SubmissionOutcome {
    /// Message to surface, if any UI is still interested in this attempt.
    pub fn headline(&self) -> Option<&'static str> {
        match self {
            SubmissionOutcome::Saved { kind, .. } => Some(kind.notice().success),
            SubmissionOutcome::Failed { kind, .. } => Some(kind.notice().error),
            SubmissionOutcome::Discarded { .. } => None,
        }
    }
}

/// A validated submission waiting for its network round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    application_id: ApplicationId,
    kind: SubmissionKind,
    request: ReviewRequest,
}

impl PendingSubmission {
    pub fn application_id(&self) -> &ApplicationId {
        &self.application_id
    }

    pub fn kind(&self) -> &SubmissionKind {
        &self.kind
    }

    pub fn request(&self) -> &ReviewRequest {
        &self.request
    }

    pub fn notice(&self) -> SubmissionNotice {
        self.kind.notice()
    }

    /// Issue exactly one create or update call.
    pub async fn send<A: ReviewApi>(&self, api: &A) -> Result<ReviewRecord, ApiError> {
        match &self.kind {
            SubmissionKind::Create => api.create_review(&self.request).await,
            SubmissionKind::Update(id) => api.update_review(id, &self.request).await,
        }
    }
}

pub struct ReviewSession<A> {
    api: A,
    schema: ReviewSchema,
    applications: ApplicationStore,
    state: SessionState,
    draft: ReviewForm,
}

impl<A: ReviewApi> ReviewSession<A> {
    pub fn new(
        api: A,
        registry: &ReviewSchemaRegistry,
        review_type: &ReviewType,
    ) -> Result<Self, SchemaLookupError> {
        let schema = registry.schema_for(review_type)?.clone();
        Ok(Self {
            api,
            schema,
            applications: ApplicationStore::new(),
            state: SessionState::Idle,
            draft: ReviewForm::new(),
        })
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn schema(&self) -> &ReviewSchema {
        &self.schema
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn applications(&self) -> &ApplicationStore {
        &self.applications
    }

    pub fn applications_mut(&mut self) -> &mut ApplicationStore {
        &mut self.applications
    }

    pub fn draft(&self) -> &ReviewForm {
        &self.draft
    }

    /// Replace the application list with the service's current view.
    pub async fn fetch_applications(&mut self) -> Result<usize, ApiError> {
        let applications = self.api.fetch_applications().await?;
        let count = applications.len();
        self.applications.replace_all(applications);
        info!(count, "applications loaded");
        Ok(count)
    }

    pub fn search(&mut self, query: &str) -> usize {
        self.applications.search(query)
    }

    /// Put an application on review and seed the draft from its existing review.
    pub fn select(&mut self, id: &ApplicationId) -> Result<&Application, ApplicationLookupError> {
        let mut draft = self.schema.initial_values();
        let application = self.applications.select(id)?;
        if let Some(review) = &application.review {
            draft.merge(review.form.clone());
        }
        self.draft = draft;
        Ok(application)
    }

    pub fn deselect(&mut self) {
        self.applications.clear_selection();
        self.draft = ReviewForm::new();
    }

    pub fn update_draft(&mut self, change: ReviewForm) {
        self.draft.merge(change);
    }

    pub fn overview(&self) -> Option<ApplicationOverview> {
        self.applications.selected().map(application_overview)
    }

    /// Return to `Idle` after the outcome of the last attempt has been shown.
    pub fn acknowledge(&mut self) {
        if matches!(
            self.state,
            SessionState::Success { .. } | SessionState::Error { .. }
        ) {
            self.state = SessionState::Idle;
        }
    }

    /// Validate `payload` against the schema and, if it passes, enter `Submitting`.
    ///
    /// The payload becomes the draft before validation so it survives a rejected or
    /// failed attempt.
    pub fn begin_submit(&mut self, payload: ReviewForm) -> Result<PendingSubmission, SubmitError> {
        self.acknowledge();

        let Some(application) = self.applications.selected() else {
            return Err(SubmitError::NoActiveApplication);
        };
        let application_id = application.id.clone();
        let kind = match application.review_id() {
            Some(id) => SubmissionKind::Update(id.clone()),
            None => SubmissionKind::Create,
        };

        self.draft = payload.clone();
        let resume = std::mem::replace(&mut self.state, SessionState::Validating);
        if let Err(errors) = self.schema.validate(&payload) {
            self.state = match resume {
                submitting @ SessionState::Submitting { .. } => submitting,
                _ => SessionState::Idle,
            };
            return Err(SubmitError::Invalid(errors));
        }

        info!(%application_id, ?kind, "submitting review");
        self.state = SessionState::Submitting {
            application_id: application_id.clone(),
            kind: kind.clone(),
        };

        Ok(PendingSubmission {
            request: ReviewRequest::new(
                payload,
                self.schema.review_type().clone(),
                application_id.clone(),
            ),
            application_id,
            kind,
        })
    }

    /// Apply the service response for `pending`.
    pub fn complete(
        &mut self,
        pending: PendingSubmission,
        result: Result<ReviewRecord, ApiError>,
    ) -> SubmissionOutcome {
        let PendingSubmission {
            application_id,
            kind,
            ..
        } = pending;

        if matches!(
            &self.state,
            SessionState::Submitting { application_id: current, .. } if current == &application_id
        ) {
            self.state = SessionState::Idle;
        }

        if self.applications.selected_id() != Some(&application_id) {
            // The record exists server-side; keep its id so the next submit is an update.
            if let Ok(review) = result {
                self.applications.merge_review(&application_id, review);
            }
            warn!(%application_id, "review response arrived after the application was deselected");
            return SubmissionOutcome::Discarded { application_id };
        }

        match result {
            Ok(review) => {
                info!(%application_id, review_id = %review.id, "review saved");
                self.applications
                    .merge_review(&application_id, review.clone());
                self.applications.clear_selection();
                self.draft = ReviewForm::new();
                self.state = SessionState::Success {
                    review: review.clone(),
                    kind: kind.clone(),
                };
                SubmissionOutcome::Saved { review, kind }
            }
            Err(err) => {
                warn!(%application_id, error = %err, "review submission failed");
                let message = err.to_string();
                self.state = SessionState::Error {
                    application_id,
                    kind: kind.clone(),
                    message: message.clone(),
                };
                SubmissionOutcome::Failed { kind, message }
            }
        }
    }

    /// Validate, send, and apply the response in one step.
    pub async fn submit(&mut self, payload: ReviewForm) -> Result<SubmissionOutcome, SubmitError> {
        let pending = self.begin_submit(payload)?;
        let result = pending.send(&self.api).await;
        Ok(self.complete(pending, result))
    }
}
