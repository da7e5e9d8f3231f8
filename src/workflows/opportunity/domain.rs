use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Closed set of input kinds a question can declare. The tag strings are wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Checkboxes,
    Dropdown,
    MultipleChoice,
    FileUpload,
    InputLink,
}

impl FieldType {
    pub const ALL: [FieldType; 8] = [
        FieldType::Text,
        FieldType::Textarea,
        FieldType::Number,
        FieldType::Checkboxes,
        FieldType::Dropdown,
        FieldType::MultipleChoice,
        FieldType::FileUpload,
        FieldType::InputLink,
    ];

    pub const fn tag(self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Textarea => "TEXTAREA",
            FieldType::Number => "NUMBER",
            FieldType::Checkboxes => "CHECKBOXES",
            FieldType::Dropdown => "DROPDOWN",
            FieldType::MultipleChoice => "MULTIPLE_CHOICE",
            FieldType::FileUpload => "FILE_UPLOAD",
            FieldType::InputLink => "INPUT_LINK",
        }
    }

    /// Choice fields store option ids rather than literal answers.
    pub const fn is_choice(self) -> bool {
        matches!(
            self,
            FieldType::Checkboxes | FieldType::Dropdown | FieldType::MultipleChoice
        )
    }

    pub const fn is_link(self) -> bool {
        matches!(self, FieldType::FileUpload | FieldType::InputLink)
    }

    /// Parse a wire tag; `None` for tags outside the closed set.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field_type| field_type.tag() == tag)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Option identifier; the form builder has emitted both numeric and string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum OptionId {
    Number(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for OptionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(number) => match number.as_i64() {
                Some(id) => OptionId::Number(id),
                None => OptionId::Text(number.to_string()),
            },
            Value::String(id) => OptionId::Text(id),
            other => OptionId::Text(other.to_string()),
        })
    }
}

impl OptionId {
    /// Loose equality against a stored answer entry, so `1` and `"1"` refer to the same option.
    pub fn matches(&self, candidate: &Value) -> bool {
        match (self, candidate) {
            (OptionId::Number(id), Value::Number(number)) => number.as_i64() == Some(*id),
            (OptionId::Text(id), Value::String(text)) => id == text,
            (OptionId::Number(id), Value::String(text)) => text.trim() == id.to_string(),
            (OptionId::Text(id), Value::Number(number)) => id.trim() == number.to_string(),
            _ => false,
        }
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionId::Number(id) => write!(f, "{id}"),
            OptionId::Text(id) => f.write_str(id),
        }
    }
}

/// Selectable answer for choice-type questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: OptionId,
    #[serde(
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<String>,
}

/// Older forms stored option labels as numbers or booleans; keep them as their text.
fn scalar_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string().replace('"', "")),
    })
}

impl QuestionOption {
    pub fn new(id: OptionId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: Some(text.into()),
            value: None,
        }
    }

    /// The stored value wins over the display text.
    pub fn display(&self) -> Option<&str> {
        self.value
            .as_deref()
            .filter(|value| !value.is_empty())
            .or_else(|| self.text.as_deref().filter(|text| !text.is_empty()))
    }
}

/// Single labeled input slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,
}

impl Question {
    pub fn new(label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            label: label.into(),
            field_type,
            options: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: Vec<QuestionOption>) -> Self {
        self.options = options;
        self
    }
}

/// Token-free questionnaire shape exchanged with the save collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestionnaireDefinition {
    pub name: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Token-free phase shape exchanged with the save collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseDefinition {
    pub name: String,
    #[serde(default)]
    pub questionnaires: Vec<QuestionnaireDefinition>,
}

/// Complete opportunity form as persisted by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OpportunityDefinition {
    #[serde(default)]
    pub phases: Vec<PhaseDefinition>,
}

/// Editor-issued identity of a phase; stable across sibling insertions and removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhaseToken(pub(crate) u64);

/// Editor-issued identity of a questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionnaireToken(pub(crate) u64);

impl fmt::Display for PhaseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "phase-{}", self.0)
    }
}

impl fmt::Display for QuestionnaireToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "questionnaire-{}", self.0)
    }
}

/// Questionnaire as held by an open editor session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Questionnaire {
    pub token: QuestionnaireToken,
    pub name: String,
    pub questions: Vec<Question>,
}

impl Questionnaire {
    pub fn question(&self, label: &str) -> Option<&Question> {
        self.questions.iter().find(|question| question.label == label)
    }

    pub fn definition(&self) -> QuestionnaireDefinition {
        QuestionnaireDefinition {
            name: self.name.clone(),
            questions: self.questions.clone(),
        }
    }
}

/// Phase as held by an open editor session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    pub token: PhaseToken,
    pub name: String,
    pub questionnaires: Vec<Questionnaire>,
}

impl Phase {
    pub fn questionnaire(&self, token: QuestionnaireToken) -> Option<&Questionnaire> {
        self.questionnaires
            .iter()
            .find(|questionnaire| questionnaire.token == token)
    }

    pub fn definition(&self) -> PhaseDefinition {
        PhaseDefinition {
            name: self.name.clone(),
            questionnaires: self
                .questionnaires
                .iter()
                .map(Questionnaire::definition)
                .collect(),
        }
    }
}
