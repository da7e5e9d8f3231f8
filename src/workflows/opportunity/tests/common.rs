use crate::workflows::opportunity::domain::{
    FieldType, OptionId, PhaseDefinition, Question, QuestionOption, QuestionnaireDefinition,
};

pub(super) fn questionnaire(name: &str) -> QuestionnaireDefinition {
    QuestionnaireDefinition {
        name: name.to_string(),
        questions: vec![
            Question::new("Full name", FieldType::Text),
            Question::new("Department", FieldType::Dropdown).with_options(vec![
                QuestionOption::new(OptionId::Number(1), "Software"),
                QuestionOption::new(OptionId::Number(2), "Marketing"),
            ]),
        ],
    }
}

pub(super) fn phase(name: &str) -> PhaseDefinition {
    PhaseDefinition {
        name: name.to_string(),
        questionnaires: vec![questionnaire(&format!("{name} basics"))],
    }
}
