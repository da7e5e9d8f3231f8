use serde_json::Value;
use tracing::debug;

use super::domain::{Application, ApplicationId, ReviewRecord};
use crate::workflows::notify::{ListenerId, Listeners};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplicationLookupError {
    #[error("application {0} is not loaded")]
    Unknown(ApplicationId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplicationEvent {
    Replaced { count: usize },
    Filtered { query: String, matches: usize },
    Selected(ApplicationId),
    SelectionCleared,
    ReviewMerged(ReviewRecord),
}

/// Loaded applications, the search-filtered view over them, and the current selection.
#[derive(Debug, Default)]
pub struct ApplicationStore {
    applications: Vec<Application>,
    filtered: Vec<usize>,
    query: String,
    selected: Option<ApplicationId>,
    listeners: Listeners<ApplicationEvent>,
}

impl ApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&ApplicationEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn get(&self, id: &ApplicationId) -> Option<&Application> {
        self.applications
            .iter()
            .find(|application| &application.id == id)
    }

    /// Applications matching the current search, in list order.
    pub fn filtered(&self) -> Vec<&Application> {
        self.filtered
            .iter()
            .map(|index| &self.applications[*index])
            .collect()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selected_id(&self) -> Option<&ApplicationId> {
        self.selected.as_ref()
    }

    pub fn selected(&self) -> Option<&Application> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    /// Swap in a freshly fetched list. The search is re-applied and a selection that no
    /// longer exists is dropped.
    pub fn replace_all(&mut self, applications: Vec<Application>) {
        self.applications = applications;
        self.refilter();
        debug!(count = self.applications.len(), "applications replaced");
        self.listeners.emit(&ApplicationEvent::Replaced {
            count: self.applications.len(),
        });

        let stale = self
            .selected
            .as_ref()
            .is_some_and(|id| self.get(id).is_none());
        if stale {
            self.clear_selection();
        }
    }

    /// Recompute the filtered view; returns the number of matches.
    pub fn search(&mut self, query: &str) -> usize {
        self.query = query.to_string();
        self.refilter();
        let matches = self.filtered.len();
        self.listeners.emit(&ApplicationEvent::Filtered {
            query: self.query.clone(),
            matches,
        });
        matches
    }

    pub fn select(&mut self, id: &ApplicationId) -> Result<&Application, ApplicationLookupError> {
        let index = self
            .applications
            .iter()
            .position(|application| &application.id == id)
            .ok_or_else(|| ApplicationLookupError::Unknown(id.clone()))?;

        self.selected = Some(id.clone());
        self.listeners.emit(&ApplicationEvent::Selected(id.clone()));
        Ok(&self.applications[index])
    }

    pub fn clear_selection(&mut self) {
        if self.selected.take().is_some() {
            self.listeners.emit(&ApplicationEvent::SelectionCleared);
        }
    }

    /// Attach an acknowledged review to its application. Returns `false` when the
    /// application is no longer loaded.
    pub fn merge_review(&mut self, application_id: &ApplicationId, review: ReviewRecord) -> bool {
        let Some(application) = self
            .applications
            .iter_mut()
            .find(|application| &application.id == application_id)
        else {
            return false;
        };

        application.review = Some(review.clone());
        self.refilter();
        self.listeners.emit(&ApplicationEvent::ReviewMerged(review));
        true
    }

    fn refilter(&mut self) {
        let needle = self.query.to_lowercase();
        self.filtered = self
            .applications
            .iter()
            .enumerate()
            .filter(|(_, application)| needle.is_empty() || matches_query(application, &needle))
            .map(|(index, _)| index)
            .collect();
    }
}

/// Substring match over the application's JSON form with the id blanked, so id values
/// never match a search term on their own.
fn matches_query(application: &Application, needle: &str) -> bool {
    let Ok(mut document) = serde_json::to_value(application) else {
        return false;
    };
    if let Value::Object(map) = &mut document {
        map.insert("id".to_string(), Value::String(String::new()));
    }
    document.to_string().to_lowercase().contains(needle)
}
