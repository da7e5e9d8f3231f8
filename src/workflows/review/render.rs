//! Display mapping for applicant answers.
//!
//! Rendering never fails: stale option ids, missing links and unrecognized field tags all
//! degrade to sentinel text so one malformed answer cannot hide the rest of a submission.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

use super::domain::{Application, ApplicationId, FieldKind, SubmittedField};
use crate::workflows::opportunity::{FieldType, QuestionOption};

/// Shown for a choice id that no longer matches any of the field's options.
pub const UNKNOWN_OPTION: &str = "UNKNOWN";
/// Shown in place of a link when the answer carries no URL.
pub const MISSING_LINK: &str = "–";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayValue {
    Checkbox { checked: bool },
    Link { href: String },
    Placeholder,
    Choices { entries: Vec<String> },
    Text { text: String },
}

impl DisplayValue {
    /// Plain-text rendition for terminals and logs.
    pub fn to_plain_text(&self) -> String {
        match self {
            DisplayValue::Checkbox { checked: true } => "[x]".to_string(),
            DisplayValue::Checkbox { checked: false } => "[ ]".to_string(),
            DisplayValue::Link { href } => href.clone(),
            DisplayValue::Placeholder => MISSING_LINK.to_string(),
            DisplayValue::Choices { entries } => entries.join(", "),
            DisplayValue::Text { text } => text.clone(),
        }
    }
}

pub fn render(field: &SubmittedField) -> DisplayValue {
    if let Value::Bool(checked) = field.value {
        return DisplayValue::Checkbox { checked };
    }

    let FieldKind::Known(field_type) = &field.kind else {
        return text(&field.value);
    };

    match field_type {
        FieldType::FileUpload => link(&field.value, false),
        FieldType::InputLink => link(&field.value, true),
        FieldType::Checkboxes | FieldType::Dropdown | FieldType::MultipleChoice => {
            choices(&field.value, field.options())
        }
        FieldType::Text | FieldType::Textarea | FieldType::Number => text(&field.value),
    }
}

fn text(value: &Value) -> DisplayValue {
    let text = match value {
        Value::String(text) => text.clone(),
        other => other.to_string().replace('"', ""),
    };
    DisplayValue::Text { text }
}

fn link(value: &Value, scheme_relative: bool) -> DisplayValue {
    let Some(url) = resolve_url(value) else {
        return DisplayValue::Placeholder;
    };

    let href = if scheme_relative && !has_scheme(url) {
        format!("//{url}")
    } else {
        url.to_string()
    };
    DisplayValue::Link { href }
}

/// Uploads are stored as `[{url, ..}]`; links as a bare string or `{url}`.
fn resolve_url(value: &Value) -> Option<&str> {
    match value {
        Value::String(url) => Some(url.trim()).filter(|url| !url.is_empty()),
        Value::Object(map) => map.get("url").and_then(resolve_url),
        Value::Array(items) => items.first().and_then(resolve_url),
        _ => None,
    }
}

fn has_scheme(url: &str) -> bool {
    if url.starts_with("//") {
        return true;
    }

    let Some((scheme, rest)) = url.split_once(':') else {
        return false;
    };
    let well_formed = scheme
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    // `host:port/path` has the same shape as a scheme; only trust `scheme://` or opaque schemes.
    well_formed
        && (rest.starts_with("//")
            || matches!(scheme.to_ascii_lowercase().as_str(), "mailto" | "tel"))
}

fn choices(value: &Value, options: &[QuestionOption]) -> DisplayValue {
    let ids: &[Value] = match value {
        Value::Array(ids) => ids.as_slice(),
        Value::Null => &[],
        single => std::slice::from_ref(single),
    };

    let entries = ids
        .iter()
        .map(|id| {
            options
                .iter()
                .find(|option| option.id.matches(id))
                .and_then(QuestionOption::display)
                .unwrap_or(UNKNOWN_OPTION)
                .to_string()
        })
        .collect();
    DisplayValue::Choices { entries }
}

/// One row of the application overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedField {
    pub label: String,
    pub display: DisplayValue,
    /// Long-form answers span the full overview width.
    pub wide: bool,
}

/// Fields shown in the simple overview listing.
///
/// Unanswered fields and `CHECKBOXES` fields are left out. Boolean answers are moved to
/// the front; everything else keeps submission order.
pub fn overview(fields: &[SubmittedField]) -> Vec<RenderedField> {
    let mut visible: Vec<&SubmittedField> = fields
        .iter()
        .filter(|field| !field.value.is_null())
        .filter(|field| field.kind != FieldKind::Known(FieldType::Checkboxes))
        .collect();
    visible.sort_by_key(|field| !field.is_boolean());

    visible
        .into_iter()
        .map(|field| RenderedField {
            label: field.label.clone(),
            display: render(field),
            wide: field.kind == FieldKind::Known(FieldType::Textarea),
        })
        .collect()
}

/// Heading information for an application under review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationHeader {
    pub id: ApplicationId,
    pub form_name: Option<String>,
    /// Submission date as `Mon Oct 19 2026`.
    pub created_on: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationOverview {
    pub header: ApplicationHeader,
    pub fields: Vec<RenderedField>,
}

pub fn application_overview(application: &Application) -> ApplicationOverview {
    let submission = application.submission();
    ApplicationOverview {
        header: ApplicationHeader {
            id: application.id.clone(),
            form_name: submission.form_name.clone(),
            created_on: submission
                .created_at
                .as_deref()
                .and_then(parse_created_at)
                .map(|date| date.format("%a %b %d %Y").to_string()),
        },
        fields: overview(&submission.fields),
    }
}

fn parse_created_at(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive());
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(timestamp.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
