use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use super::common::*;
use crate::workflows::opportunity::domain::{
    FieldType, OpportunityDefinition, PhaseToken, Question, QuestionnaireToken,
};
use crate::workflows::opportunity::store::{SchemaError, SchemaEvent, SchemaStore};

fn tokens(store: &SchemaStore) -> Vec<PhaseToken> {
    store.phases().iter().map(|phase| phase.token).collect()
}

#[test]
fn append_phase_issues_distinct_tokens() {
    let mut store = SchemaStore::new();
    let first = store.append_phase(phase("Screening")).expect("valid phase");
    let second = store.append_phase(phase("Interview")).expect("valid phase");

    assert_ne!(first, second);
    assert_eq!(tokens(&store), vec![first, second]);
    assert_eq!(store.phase_index(second), Some(1));
}

#[test]
fn removing_a_phase_keeps_sibling_tokens() {
    let mut store = SchemaStore::new();
    let a = store.append_phase(phase("A")).expect("valid");
    let b = store.append_phase(phase("B")).expect("valid");
    let c = store.append_phase(phase("C")).expect("valid");

    let removed = store.remove_phase(a).expect("phase present");
    assert_eq!(removed.name, "A");
    assert_eq!(tokens(&store), vec![b, c]);
    assert_eq!(store.phase_index(c), Some(1));

    let d = store.append_phase(phase("D")).expect("valid");
    assert!(![a, b, c].contains(&d), "tokens are never reused");
}

#[test]
fn interleaved_phase_edits_keep_tokens_unique_and_stable() {
    let mut store = SchemaStore::new();
    let mut names: BTreeMap<PhaseToken, String> = BTreeMap::new();
    let mut ever_issued = BTreeSet::new();
    let mut seed: u64 = 0x5eed;

    for step in 0..400 {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let roll = (seed >> 33) % 3;

        if roll == 0 && !store.phases().is_empty() {
            let index = (seed >> 40) as usize % store.phases().len();
            let token = store.phases()[index].token;
            let removed = store.remove_phase(token).expect("token was present");
            assert_eq!(names.remove(&token), Some(removed.name));
        } else {
            let name = format!("phase {step}");
            let token = store.append_phase(phase(&name)).expect("valid");
            assert!(ever_issued.insert(token), "token {token} issued twice");
            names.insert(token, name);
        }

        let live: BTreeSet<_> = tokens(&store).into_iter().collect();
        assert_eq!(live.len(), store.phases().len());
        for existing in store.phases() {
            assert_eq!(names.get(&existing.token), Some(&existing.name));
        }
    }
}

#[test]
fn remove_phase_is_idempotent() {
    let mut store = SchemaStore::new();
    let a = store.append_phase(phase("A")).expect("valid");
    store.append_phase(phase("B")).expect("valid");

    assert!(store.remove_phase(a).is_some());
    let before = store.definition();
    assert!(store.remove_phase(a).is_none());
    assert_eq!(store.definition(), before);
}

#[test]
fn remove_phase_at_reports_out_of_range() {
    let mut store = SchemaStore::new();
    store.append_phase(phase("A")).expect("valid");

    assert_eq!(
        store.remove_phase_at(3),
        Err(SchemaError::OutOfRange { index: 3, len: 1 })
    );
    assert_eq!(store.remove_phase_at(0).expect("in range").name, "A");
    assert!(store.phases().is_empty());
}

#[test]
fn append_questionnaire_lands_at_the_end() {
    let mut store = SchemaStore::new();
    store.append_phase(phase("Screening")).expect("valid");

    let token = store
        .append_questionnaire(0, questionnaire("Motivation"))
        .expect("phase exists");

    let phase = store.phase(0).expect("phase");
    assert_eq!(phase.questionnaires.len(), 2);
    assert_eq!(phase.questionnaires[1].token, token);
    assert_eq!(phase.questionnaires[1].name, "Motivation");
}

#[test]
fn append_questionnaire_rejects_invalid_phase_index() {
    let mut store = SchemaStore::new();
    match store.append_questionnaire(0, questionnaire("Orphan")) {
        Err(SchemaError::OutOfRange { index: 0, len: 0 }) => {}
        other => panic!("expected out of range, got {other:?}"),
    }
}

#[test]
fn remove_questionnaire_targets_identity_not_position() {
    let mut store = SchemaStore::new();
    store.append_phase(phase("Screening")).expect("valid");
    let second = store
        .append_questionnaire(0, questionnaire("Second"))
        .expect("phase exists");
    let third = store
        .append_questionnaire(0, questionnaire("Third"))
        .expect("phase exists");
    let first = store.phase(0).expect("phase").questionnaires[0].token;

    store
        .remove_questionnaire(0, first)
        .expect("phase exists")
        .expect("questionnaire present");

    let removed = store
        .remove_questionnaire(0, third)
        .expect("phase exists")
        .expect("questionnaire present");
    assert_eq!(removed.name, "Third");

    let remaining: Vec<QuestionnaireToken> = store
        .phase(0)
        .expect("phase")
        .questionnaires
        .iter()
        .map(|questionnaire| questionnaire.token)
        .collect();
    assert_eq!(remaining, vec![second]);
}

#[test]
fn removing_unknown_questionnaire_leaves_tree_unchanged() {
    let mut store = SchemaStore::new();
    store.append_phase(phase("Screening")).expect("valid");
    let token = store
        .append_questionnaire(0, questionnaire("Temporary"))
        .expect("phase exists");
    store.remove_questionnaire(0, token).expect("phase exists");

    let before = store.definition();
    let result = store.remove_questionnaire(0, token).expect("phase exists");
    assert!(result.is_none());
    assert_eq!(store.definition(), before);

    assert_eq!(
        store.remove_questionnaire(4, token),
        Err(SchemaError::OutOfRange { index: 4, len: 1 })
    );
}

#[test]
fn question_labels_are_unique_per_questionnaire() {
    let mut store = SchemaStore::new();
    store.append_phase(phase("Screening")).expect("valid");
    let token = store.phase(0).expect("phase").questionnaires[0].token;

    store
        .append_question(0, token, Question::new("LinkedIn", FieldType::InputLink))
        .expect("new label");
    match store.append_question(0, token, Question::new("Full name", FieldType::Text)) {
        Err(SchemaError::DuplicateLabel { label, .. }) => assert_eq!(label, "Full name"),
        other => panic!("expected duplicate label, got {other:?}"),
    }

    let removed = store
        .remove_question(0, token, "LinkedIn")
        .expect("questionnaire exists");
    assert!(removed.is_some());
    assert!(store
        .remove_question(0, token, "LinkedIn")
        .expect("questionnaire exists")
        .is_none());
}

#[test]
fn duplicate_labels_in_definition_are_rejected_without_consuming_tokens() {
    let mut store = SchemaStore::new();
    let mut broken = questionnaire("Broken");
    broken
        .questions
        .push(Question::new("Full name", FieldType::Textarea));

    let mut definition = phase("Broken phase");
    definition.questionnaires.push(broken);
    assert!(matches!(
        store.append_phase(definition),
        Err(SchemaError::DuplicateLabel { .. })
    ));
    assert!(store.phases().is_empty());

    let token = store.append_phase(phase("Fine")).expect("valid");
    assert_eq!(token, PhaseToken(1));
}

#[test]
fn open_and_definition_preserve_order() {
    let definition = OpportunityDefinition {
        phases: vec![phase("Application"), phase("Interview"), phase("Offer")],
    };
    let store = SchemaStore::open(definition.clone()).expect("valid definition");

    assert_eq!(store.definition(), definition);
    let unique: BTreeSet<_> = tokens(&store).into_iter().collect();
    assert_eq!(unique.len(), 3);
}

#[test]
fn listeners_observe_applied_mutations_only() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut store = SchemaStore::new();
    {
        let events = events.clone();
        store.subscribe(move |event| events.lock().expect("lock").push(event.clone()));
    }

    let token = store.append_phase(phase("Screening")).expect("valid");
    store.rename_phase(0, "Screening round").expect("in range");
    store.remove_phase(token);
    store.remove_phase(token);

    let events = events.lock().expect("lock").clone();
    assert_eq!(
        events,
        vec![
            SchemaEvent::PhaseAppended { token, index: 0 },
            SchemaEvent::PhaseRenamed { token },
            SchemaEvent::PhaseRemoved { token, index: 0 },
        ]
    );
}

mod logging {
    use std::fmt;
    use std::sync::{Arc, Mutex};

    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    use super::super::common::*;
    use crate::workflows::opportunity::domain::{FieldType, OpportunityDefinition, Question};
    use crate::workflows::opportunity::store::SchemaStore;

    #[derive(Clone, Default)]
    struct Messages(Arc<Mutex<Vec<String>>>);

    struct MessageField(String);

    impl Visit for MessageField {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    impl<S: Subscriber> Layer<S> for Messages {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut message = MessageField(String::new());
            event.record(&mut message);
            self.0.lock().expect("messages lock").push(message.0);
        }
    }

    #[test]
    fn every_mutation_is_logged() {
        let messages = Messages::default();
        let subscriber = tracing_subscriber::registry().with(messages.clone());

        tracing::subscriber::with_default(subscriber, || {
            let mut store = SchemaStore::open(OpportunityDefinition {
                phases: vec![phase("Screening")],
            })
            .expect("valid definition");
            let token = store.phases()[0].questionnaires[0].token;

            store.rename_phase(0, "Interview").expect("valid phase");
            store
                .append_question(0, token, Question::new("Semester", FieldType::Number))
                .expect("new label");
            store
                .remove_question(0, token, "Semester")
                .expect("valid phase");
        });

        let logged = messages.0.lock().expect("messages lock").clone();
        for expected in ["phase renamed", "question appended", "question removed"] {
            assert!(
                logged.iter().any(|message| message == expected),
                "missing '{expected}' in {logged:?}"
            );
        }
    }
}
