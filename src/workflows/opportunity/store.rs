use std::collections::BTreeSet;

use tracing::debug;

use super::domain::{
    OpportunityDefinition, Phase, PhaseDefinition, PhaseToken, Question, Questionnaire,
    QuestionnaireDefinition, QuestionnaireToken,
};
use crate::workflows::notify::{ListenerId, Listeners};

/// Structural failures. Removing something that is already gone is not one of them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("phase index {index} is out of range ({len} phases)")]
    OutOfRange { index: usize, len: usize },
    #[error("questionnaire {token} does not belong to phase {phase_index}")]
    UnknownQuestionnaire {
        phase_index: usize,
        token: QuestionnaireToken,
    },
    #[error("question label '{label}' is already used in questionnaire '{questionnaire}'")]
    DuplicateLabel { questionnaire: String, label: String },
}

/// Emitted after every applied mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaEvent {
    PhaseAppended {
        token: PhaseToken,
        index: usize,
    },
    PhaseRemoved {
        token: PhaseToken,
        index: usize,
    },
    PhaseRenamed {
        token: PhaseToken,
    },
    QuestionnaireAppended {
        phase: PhaseToken,
        token: QuestionnaireToken,
    },
    QuestionnaireRemoved {
        phase: PhaseToken,
        token: QuestionnaireToken,
    },
    QuestionAppended {
        questionnaire: QuestionnaireToken,
        label: String,
    },
    QuestionRemoved {
        questionnaire: QuestionnaireToken,
        label: String,
    },
}

/// Editable opportunity tree owned by a single editor session.
///
/// Tokens come from one counter per store, so a token is never handed out twice even
/// after the node it named has been removed.
#[derive(Debug, Default)]
pub struct SchemaStore {
    phases: Vec<Phase>,
    next_token: u64,
    listeners: Listeners<SchemaEvent>,
}

impl SchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an editor session over a saved definition, minting fresh tokens.
    pub fn open(definition: OpportunityDefinition) -> Result<Self, SchemaError> {
        let mut store = Self::new();
        for phase in definition.phases {
            let phase = store.build_phase(phase)?;
            store.phases.push(phase);
        }
        Ok(store)
    }

    /// Token-free snapshot handed to the save collaborator.
    pub fn definition(&self) -> OpportunityDefinition {
        OpportunityDefinition {
            phases: self.phases.iter().map(Phase::definition).collect(),
        }
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn phase(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    pub fn phase_index(&self, token: PhaseToken) -> Option<usize> {
        self.phases.iter().position(|phase| phase.token == token)
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&SchemaEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn append_phase(&mut self, definition: PhaseDefinition) -> Result<PhaseToken, SchemaError> {
        let phase = self.build_phase(definition)?;
        let token = phase.token;
        self.phases.push(phase);
        let index = self.phases.len() - 1;
        debug!(%token, index, "phase appended");
        self.listeners.emit(&SchemaEvent::PhaseAppended { token, index });
        Ok(token)
    }

    /// Remove a phase by identity. Absent tokens leave the tree untouched.
    pub fn remove_phase(&mut self, token: PhaseToken) -> Option<Phase> {
        let index = self.phase_index(token)?;
        Some(self.take_phase(index))
    }

    /// Positional removal for callers that only hold an index.
    pub fn remove_phase_at(&mut self, index: usize) -> Result<Phase, SchemaError> {
        self.check_phase_index(index)?;
        Ok(self.take_phase(index))
    }

    pub fn rename_phase(
        &mut self,
        index: usize,
        name: impl Into<String>,
    ) -> Result<(), SchemaError> {
        self.check_phase_index(index)?;
        let phase = &mut self.phases[index];
        phase.name = name.into();
        let token = phase.token;
        debug!(%token, index, name = %phase.name, "phase renamed");
        self.listeners.emit(&SchemaEvent::PhaseRenamed { token });
        Ok(())
    }

    pub fn append_questionnaire(
        &mut self,
        phase_index: usize,
        definition: QuestionnaireDefinition,
    ) -> Result<QuestionnaireToken, SchemaError> {
        self.check_phase_index(phase_index)?;
        let questionnaire = self.build_questionnaire(definition)?;
        let token = questionnaire.token;

        let phase = &mut self.phases[phase_index];
        phase.questionnaires.push(questionnaire);
        let phase_token = phase.token;
        debug!(phase = %phase_token, %token, "questionnaire appended");
        self.listeners.emit(&SchemaEvent::QuestionnaireAppended {
            phase: phase_token,
            token,
        });
        Ok(token)
    }

    /// Remove a questionnaire by identity. `Ok(None)` when it is already gone.
    pub fn remove_questionnaire(
        &mut self,
        phase_index: usize,
        token: QuestionnaireToken,
    ) -> Result<Option<Questionnaire>, SchemaError> {
        self.check_phase_index(phase_index)?;
        let phase = &mut self.phases[phase_index];
        let Some(position) = phase
            .questionnaires
            .iter()
            .position(|questionnaire| questionnaire.token == token)
        else {
            return Ok(None);
        };

        let removed = phase.questionnaires.remove(position);
        let phase_token = phase.token;
        debug!(phase = %phase_token, %token, "questionnaire removed");
        self.listeners.emit(&SchemaEvent::QuestionnaireRemoved {
            phase: phase_token,
            token,
        });
        Ok(Some(removed))
    }

    pub fn append_question(
        &mut self,
        phase_index: usize,
        token: QuestionnaireToken,
        question: Question,
    ) -> Result<(), SchemaError> {
        let questionnaire = self.questionnaire_mut(phase_index, token)?;
        if questionnaire.question(&question.label).is_some() {
            return Err(SchemaError::DuplicateLabel {
                questionnaire: questionnaire.name.clone(),
                label: question.label,
            });
        }

        let label = question.label.clone();
        questionnaire.questions.push(question);
        debug!(questionnaire = %token, %label, "question appended");
        self.listeners.emit(&SchemaEvent::QuestionAppended {
            questionnaire: token,
            label,
        });
        Ok(())
    }

    /// Remove a question by label; a missing label is a no-op.
    pub fn remove_question(
        &mut self,
        phase_index: usize,
        token: QuestionnaireToken,
        label: &str,
    ) -> Result<Option<Question>, SchemaError> {
        let questionnaire = self.questionnaire_mut(phase_index, token)?;
        let Some(position) = questionnaire
            .questions
            .iter()
            .position(|question| question.label == label)
        else {
            return Ok(None);
        };

        let removed = questionnaire.questions.remove(position);
        debug!(questionnaire = %token, label = %removed.label, "question removed");
        self.listeners.emit(&SchemaEvent::QuestionRemoved {
            questionnaire: token,
            label: removed.label.clone(),
        });
        Ok(Some(removed))
    }
}

impl SchemaStore {
    fn check_phase_index(&self, index: usize) -> Result<(), SchemaError> {
        if index < self.phases.len() {
            Ok(())
        } else {
            Err(SchemaError::OutOfRange {
                index,
                len: self.phases.len(),
            })
        }
    }

    fn take_phase(&mut self, index: usize) -> Phase {
        let phase = self.phases.remove(index);
        debug!(token = %phase.token, index, "phase removed");
        self.listeners.emit(&SchemaEvent::PhaseRemoved {
            token: phase.token,
            index,
        });
        phase
    }

    fn questionnaire_mut(
        &mut self,
        phase_index: usize,
        token: QuestionnaireToken,
    ) -> Result<&mut Questionnaire, SchemaError> {
        self.check_phase_index(phase_index)?;
        self.phases[phase_index]
            .questionnaires
            .iter_mut()
            .find(|questionnaire| questionnaire.token == token)
            .ok_or(SchemaError::UnknownQuestionnaire { phase_index, token })
    }

    fn mint(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    fn build_phase(&mut self, definition: PhaseDefinition) -> Result<Phase, SchemaError> {
        // Rejected definitions must not consume tokens.
        for questionnaire in &definition.questionnaires {
            ensure_unique_labels(questionnaire)?;
        }

        let token = PhaseToken(self.mint());
        let mut questionnaires = Vec::with_capacity(definition.questionnaires.len());
        for questionnaire in definition.questionnaires {
            questionnaires.push(self.build_questionnaire(questionnaire)?);
        }

        Ok(Phase {
            token,
            name: definition.name,
            questionnaires,
        })
    }

    fn build_questionnaire(
        &mut self,
        definition: QuestionnaireDefinition,
    ) -> Result<Questionnaire, SchemaError> {
        ensure_unique_labels(&definition)?;
        Ok(Questionnaire {
            token: QuestionnaireToken(self.mint()),
            name: definition.name,
            questions: definition.questions,
        })
    }
}

fn ensure_unique_labels(definition: &QuestionnaireDefinition) -> Result<(), SchemaError> {
    let mut seen = BTreeSet::new();
    for question in &definition.questions {
        if !seen.insert(question.label.as_str()) {
            return Err(SchemaError::DuplicateLabel {
                questionnaire: definition.name.clone(),
                label: question.label.clone(),
            });
        }
    }
    Ok(())
}
