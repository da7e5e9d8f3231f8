//! Review-type specific scoring schemas and the client-side validation that gates submission.

mod membership;

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use super::domain::{ReviewForm, ReviewType};

pub use membership::{membership_schema, FIT_IN_ORGANIZATION};

/// Constraint applied to one review field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// Whole number within an inclusive range.
    Score { min: i64, max: i64 },
    /// One of a fixed set of tags.
    OneOf(Vec<String>),
    FreeText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewField {
    pub key: String,
    pub label: String,
    pub rule: FieldRule,
    pub required: bool,
    required_message: Option<String>,
}

impl ReviewField {
    pub fn score(key: &str, label: &str, min: i64, max: i64) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            rule: FieldRule::Score { min, max },
            required: true,
            required_message: None,
        }
    }

    pub fn one_of(key: &str, label: &str, allowed: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            rule: FieldRule::OneOf(allowed.iter().map(|value| value.to_string()).collect()),
            required: true,
            required_message: None,
        }
    }

    pub fn free_text(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            rule: FieldRule::FreeText,
            required: false,
            required_message: None,
        }
    }

    pub fn required_with(mut self, message: &str) -> Self {
        self.required = true;
        self.required_message = Some(message.to_string());
        self
    }

    /// Empty form value: text fields start blank, everything else unset.
    pub fn initial_value(&self) -> Value {
        match self.rule {
            FieldRule::FreeText => Value::String(String::new()),
            FieldRule::Score { .. } | FieldRule::OneOf(_) => Value::Null,
        }
    }

    fn check(&self, value: Option<&Value>) -> Result<(), String> {
        let value = match value {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) if text.trim().is_empty() => None,
            Some(other) => Some(other),
        };

        let Some(value) = value else {
            if self.required {
                return Err(self
                    .required_message
                    .clone()
                    .unwrap_or_else(|| format!("{} is a required field", self.key)));
            }
            return Ok(());
        };

        match &self.rule {
            FieldRule::Score { min, max } => {
                let score = parse_score(value).map_err(|problem| match problem {
                    ScoreProblem::NotANumber => format!("{} must be a number", self.key),
                    ScoreProblem::Fractional => format!("{} must be an integer", self.key),
                })?;
                if score < *min {
                    return Err(format!(
                        "{} must be greater than or equal to {}",
                        self.key, min
                    ));
                }
                if score > *max {
                    return Err(format!("{} must be less than or equal to {}", self.key, max));
                }
                Ok(())
            }
            FieldRule::OneOf(allowed) => match value.as_str() {
                Some(tag) if allowed.iter().any(|candidate| candidate == tag) => Ok(()),
                _ => Err(format!(
                    "{} must be one of the following values: {}",
                    self.key,
                    allowed.join(", ")
                )),
            },
            FieldRule::FreeText => match value {
                Value::String(_) => Ok(()),
                _ => Err(format!("{} must be text", self.key)),
            },
        }
    }
}

enum ScoreProblem {
    NotANumber,
    Fractional,
}

/// Form inputs deliver numbers as text, so numeric strings are accepted.
fn parse_score(value: &Value) -> Result<i64, ScoreProblem> {
    let number = match value {
        Value::Number(number) => {
            if let Some(whole) = number.as_i64() {
                return Ok(whole);
            }
            number.as_f64().ok_or(ScoreProblem::NotANumber)?
        }
        Value::String(text) => {
            let text = text.trim();
            if let Ok(whole) = text.parse::<i64>() {
                return Ok(whole);
            }
            text.parse::<f64>().map_err(|_| ScoreProblem::NotANumber)?
        }
        _ => return Err(ScoreProblem::NotANumber),
    };

    if !number.is_finite() {
        return Err(ScoreProblem::NotANumber);
    }
    if number.fract() != 0.0 {
        return Err(ScoreProblem::Fractional);
    }
    Ok(number as i64)
}

/// Per-field validation messages, keyed by field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, message)| (key.as_str(), message.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "review failed validation: ")?;
        let mut first = true;
        for message in self.0.values() {
            if !first {
                f.write_str("; ")?;
            }
            f.write_str(message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Recognized fields and rules for one review type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSchema {
    review_type: ReviewType,
    fields: Vec<ReviewField>,
}

impl ReviewSchema {
    pub fn new(review_type: ReviewType, fields: Vec<ReviewField>) -> Self {
        Self {
            review_type,
            fields,
        }
    }

    pub fn review_type(&self) -> &ReviewType {
        &self.review_type
    }

    pub fn fields(&self) -> &[ReviewField] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&ReviewField> {
        self.fields.iter().find(|field| field.key == key)
    }

    pub fn initial_values(&self) -> ReviewForm {
        self.fields
            .iter()
            .map(|field| (field.key.clone(), field.initial_value()))
            .collect()
    }

    /// Check every recognized field and reject keys the schema does not know.
    pub fn validate(&self, payload: &ReviewForm) -> Result<(), ValidationErrors> {
        let mut errors = BTreeMap::new();

        for field in &self.fields {
            if let Err(message) = field.check(payload.get(&field.key)) {
                errors.insert(field.key.clone(), message);
            }
        }

        for key in payload.keys() {
            if self.field(key).is_none() {
                errors.insert(key.to_string(), format!("{key} is not a recognized field"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaLookupError {
    #[error("no review schema registered for review type '{0}'")]
    UnknownReviewType(ReviewType),
}

/// Review-type tag to schema mapping. `default()` carries the built-in schemas.
#[derive(Debug, Clone)]
pub struct ReviewSchemaRegistry {
    schemas: BTreeMap<ReviewType, ReviewSchema>,
}

impl ReviewSchemaRegistry {
    pub fn empty() -> Self {
        Self {
            schemas: BTreeMap::new(),
        }
    }

    /// Returns the schema previously registered for the same review type, if any.
    pub fn register(&mut self, schema: ReviewSchema) -> Option<ReviewSchema> {
        self.schemas.insert(schema.review_type.clone(), schema)
    }

    pub fn schema_for(&self, review_type: &ReviewType) -> Result<&ReviewSchema, SchemaLookupError> {
        self.schemas
            .get(review_type)
            .ok_or_else(|| SchemaLookupError::UnknownReviewType(review_type.clone()))
    }

    pub fn review_types(&self) -> impl Iterator<Item = &ReviewType> {
        self.schemas.keys()
    }
}

impl Default for ReviewSchemaRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(membership_schema());
        registry
    }
}
