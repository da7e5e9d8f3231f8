use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::workflows::opportunity::{FieldType, QuestionOption};

/// Ids arrive as numbers from some endpoints and as strings from others.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(i64),
    Text(String),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Number(id) => id.to_string(),
            WireId::Text(id) => id,
        }
    }
}

/// Identifier of a submitted application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ApplicationId(pub String);

impl<'de> Deserialize<'de> for ApplicationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        WireId::deserialize(deserializer).map(|id| Self(id.into_string()))
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a persisted review record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ReviewId(pub String);

impl<'de> Deserialize<'de> for ReviewId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        WireId::deserialize(deserializer).map(|id| Self(id.into_string()))
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tag selecting which scoring schema a review follows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewType(pub String);

impl ReviewType {
    pub const MEMBERSHIP: &'static str = "MEMBERSHIP";

    pub fn membership() -> Self {
        Self(Self::MEMBERSHIP.to_string())
    }
}

impl fmt::Display for ReviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reviewer input keyed by schema field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewForm(BTreeMap<String, Value>);

impl ReviewForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Shallow merge: keys in `change` overwrite existing entries.
    pub fn merge(&mut self, change: ReviewForm) {
        self.0.extend(change.0);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for ReviewForm {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Review as acknowledged by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: ReviewId,
    pub review_type: ReviewType,
    pub reviewee_id: ApplicationId,
    #[serde(default)]
    pub form: ReviewForm,
}

/// Declared type of a submitted field. Tags outside the known set are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldKind {
    Known(FieldType),
    Unrecognized(String),
}

impl Default for FieldKind {
    fn default() -> Self {
        FieldKind::Unrecognized(String::new())
    }
}

impl<'de> Deserialize<'de> for FieldKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(tag) => match FieldType::from_tag(&tag) {
                Some(field_type) => FieldKind::Known(field_type),
                None => FieldKind::Unrecognized(tag),
            },
            Value::Null => FieldKind::default(),
            other => FieldKind::Unrecognized(other.to_string()),
        })
    }
}

impl FieldKind {
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            FieldKind::Known(field_type) => Some(*field_type),
            FieldKind::Unrecognized(_) => None,
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            FieldKind::Known(field_type) => field_type.tag(),
            FieldKind::Unrecognized(tag) => tag,
        }
    }
}

impl From<FieldType> for FieldKind {
    fn from(value: FieldType) -> Self {
        FieldKind::Known(value)
    }
}

/// One answered field inside a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedField {
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<QuestionOption>>,
}

impl SubmittedField {
    pub fn new(label: impl Into<String>, kind: impl Into<FieldKind>, value: Value) -> Self {
        Self {
            label: label.into(),
            kind: kind.into(),
            value,
            options: None,
        }
    }

    pub fn with_options(mut self, options: Vec<QuestionOption>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn options(&self) -> &[QuestionOption] {
        self.options.as_deref().unwrap_or_default()
    }

    pub fn is_boolean(&self) -> bool {
        self.value.is_boolean()
    }
}

/// Applicant-filled instance of an opportunity form. Field order is the submission's own.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Submission {
    #[serde(rename = "formName", default, skip_serializing_if = "Option::is_none")]
    pub form_name: Option<String>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub fields: Vec<SubmittedField>,
}

/// Wire wrapper: applications carry their submission under `submission.data`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubmissionEnvelope {
    #[serde(default)]
    pub data: Submission,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    #[serde(default)]
    pub submission: SubmissionEnvelope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewRecord>,
}

impl Application {
    pub fn new(id: impl Into<String>, submission: Submission) -> Self {
        Self {
            id: ApplicationId(id.into()),
            submission: SubmissionEnvelope { data: submission },
            review: None,
        }
    }

    pub fn submission(&self) -> &Submission {
        &self.submission.data
    }

    pub fn review_id(&self) -> Option<&ReviewId> {
        self.review.as_ref().map(|review| &review.id)
    }
}
