//! Opportunity form editing: phases, questionnaires, and questions with stable identities.

pub mod domain;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    FieldType, OpportunityDefinition, OptionId, Phase, PhaseDefinition, PhaseToken, Question,
    QuestionOption, Questionnaire, QuestionnaireDefinition, QuestionnaireToken,
};
pub use store::{SchemaError, SchemaEvent, SchemaStore};
