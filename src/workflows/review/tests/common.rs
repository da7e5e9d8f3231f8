use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::{json, Value};

use crate::workflows::opportunity::{FieldType, OptionId, QuestionOption};
use crate::workflows::review::api::{ApiError, ReviewApi, ReviewRequest};
use crate::workflows::review::domain::{
    Application, ApplicationId, ReviewForm, ReviewId, ReviewRecord, ReviewType, Submission,
    SubmittedField,
};

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Call {
    Fetch,
    Create(ReviewRequest),
    Update(ReviewId, ReviewRequest),
}

/// Records every call and answers create/update by minting sequential review ids,
/// unless a failure has been queued.
#[derive(Debug, Default)]
pub(super) struct MemoryReviewApi {
    applications: Mutex<Vec<Application>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<VecDeque<String>>,
    next_review: Mutex<u64>,
}

impl MemoryReviewApi {
    pub(super) fn with_applications(applications: Vec<Application>) -> Self {
        let api = Self::default();
        *api.applications.lock().expect("applications lock") = applications;
        api
    }

    pub(super) fn fail_next(&self, message: &str) {
        self.failures
            .lock()
            .expect("failures lock")
            .push_back(message.to_string());
    }

    pub(super) fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn acknowledge(
        &self,
        id: Option<&ReviewId>,
        request: &ReviewRequest,
    ) -> Result<ReviewRecord, ApiError> {
        if let Some(message) = self.failures.lock().expect("failures lock").pop_front() {
            return Err(ApiError::Rejected(message));
        }

        let id = match id {
            Some(id) => id.clone(),
            None => {
                let mut next = self.next_review.lock().expect("counter lock");
                *next += 1;
                ReviewId(format!("review-{next}"))
            }
        };
        Ok(ReviewRecord {
            id,
            review_type: request.data.review_type.clone(),
            reviewee_id: request.data.reviewee_id.clone(),
            form: request.data.form.clone(),
        })
    }
}

impl ReviewApi for MemoryReviewApi {
    async fn fetch_applications(&self) -> Result<Vec<Application>, ApiError> {
        self.calls.lock().expect("calls lock").push(Call::Fetch);
        Ok(self.applications.lock().expect("applications lock").clone())
    }

    async fn create_review(&self, request: &ReviewRequest) -> Result<ReviewRecord, ApiError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(Call::Create(request.clone()));
        self.acknowledge(None, request)
    }

    async fn update_review(
        &self,
        id: &ReviewId,
        request: &ReviewRequest,
    ) -> Result<ReviewRecord, ApiError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(Call::Update(id.clone(), request.clone()));
        self.acknowledge(Some(id), request)
    }
}

pub(super) fn department_options() -> Vec<QuestionOption> {
    vec![
        QuestionOption::new(OptionId::Number(1), "Software"),
        QuestionOption::new(OptionId::Number(2), "Marketing"),
        QuestionOption::new(OptionId::Text("ops".to_string()), "Operations"),
    ]
}

pub(super) fn application(id: &str, name: &str) -> Application {
    Application::new(
        id,
        Submission {
            form_name: Some("Membership Application".to_string()),
            created_at: Some("2026-10-19T08:30:00Z".to_string()),
            fields: vec![
                SubmittedField::new("Name", FieldType::Text, json!(name)),
                SubmittedField::new("Motivation", FieldType::Textarea, json!("I like building")),
                SubmittedField::new("Department", FieldType::Dropdown, json!([1]))
                    .with_options(department_options()),
                SubmittedField::new("Newsletter", FieldType::Checkboxes, json!(true)),
            ],
        },
    )
}

pub(super) fn applicants() -> Vec<Application> {
    vec![
        application("1", "Jane Doe"),
        application("2", "John Smith"),
        application("3", "Alex Miller"),
    ]
}

pub(super) fn reviewed(mut application: Application, review_id: &str) -> Application {
    application.review = Some(ReviewRecord {
        id: ReviewId(review_id.to_string()),
        review_type: ReviewType::membership(),
        reviewee_id: application.id.clone(),
        form: valid_review().with("comment_fit_tumai", "strong candidate"),
    });
    application
}

pub(super) fn valid_review() -> ReviewForm {
    ReviewForm::new()
        .with("motivation", 3)
        .with("skill", 4)
        .with("fit", 2)
        .with("in_tumai", "YES")
        .with("dept1_score", 4)
        .with("dept2_score", 4)
        .with("dept3_score", 4)
}

pub(super) fn id(raw: &str) -> ApplicationId {
    ApplicationId(raw.to_string())
}

pub(super) fn field(kind: FieldType, value: Value) -> SubmittedField {
    SubmittedField::new("Answer", kind, value)
}
