use serde_json::Value;
use tracing::{debug, error, info, trace};

use crate::app::AppError;
use crate::card::{self, CardMode, EditField, EditSession};
use crate::domain::series::{Document, SeriesFields, SeriesRecord, STATUS, WATCHED_EPISODES};
use crate::domain::status::WatchStatus;
use crate::listing::{self, ListParams, SortOrder};
use crate::store::{DocumentStore, StoreError};

/// Owns the visible list and reconciles it with the store by re-querying
/// after every completed mutation.
pub struct ListController<S> {
    store: S,
    params: ListParams,
    visible: Vec<SeriesRecord>,
    editing: Option<EditSession>,
}

impl<S: DocumentStore> ListController<S> {
    pub fn new(store: S, params: ListParams) -> Self {
        Self {
            store,
            params,
            visible: Vec::new(),
            editing: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn params(&self) -> &ListParams {
        &self.params
    }

    pub fn visible(&self) -> &[SeriesRecord] {
        &self.visible
    }

    pub fn editing(&self) -> Option<&EditSession> {
        self.editing.as_ref()
    }

    pub fn find(&self, id: &str) -> Option<&SeriesRecord> {
        self.visible.iter().find(|record| record.id == id)
    }

    pub fn card_mode(&self, id: &str) -> CardMode {
        match &self.editing {
            Some(session) if session.id() == id => CardMode::Editing,
            _ => CardMode::Viewing,
        }
    }

    /// Re-queries the store with the current parameters. On failure the
    /// visible list keeps its previous contents.
    pub fn fetch(&mut self) -> Result<&[SeriesRecord], AppError> {
        let documents = logged("query", self.store.query(self.params.status))?;
        let records = documents
            .iter()
            .map(|doc| {
                trace!(
                    id = %doc.id,
                    created_at = %doc.created_at,
                    updated_at = %doc.updated_at,
                    "loaded series document"
                );
                SeriesRecord::from_document(&doc.id, &doc.data)
            })
            .collect();
        self.visible = listing::arrange(records, &self.params);
        debug!(
            count = self.visible.len(),
            status = self.params.status.map(WatchStatus::as_str),
            search = self.params.search.as_deref(),
            sort = self.params.sort.as_str(),
            "fetched series"
        );
        Ok(&self.visible)
    }

    /// Replaces all list parameters at once and re-queries a single time.
    pub fn set_params(&mut self, mut params: ListParams) -> Result<&[SeriesRecord], AppError> {
        params.search = params.search.filter(|term| !term.is_empty());
        self.params = params;
        self.fetch()
    }

    pub fn set_status_filter(
        &mut self,
        status: Option<WatchStatus>,
    ) -> Result<&[SeriesRecord], AppError> {
        self.params.status = status;
        self.fetch()
    }

    pub fn set_search(&mut self, term: Option<String>) -> Result<&[SeriesRecord], AppError> {
        let params = ListParams {
            search: term,
            ..self.params.clone()
        };
        self.set_params(params)
    }

    pub fn set_sort(&mut self, order: SortOrder) -> Result<&[SeriesRecord], AppError> {
        self.params.sort = order;
        self.fetch()
    }

    pub fn toggle_sort(&mut self) -> Result<&[SeriesRecord], AppError> {
        self.set_sort(self.params.sort.toggled())
    }

    pub fn create(&mut self, fields: &Document) -> Result<String, AppError> {
        let id = logged("create", self.store.create(fields))?;
        info!(id = %id, "series created");
        self.refresh();
        Ok(id)
    }

    pub fn update(&mut self, id: &str, fields: &Document) -> Result<(), AppError> {
        logged("update", self.store.update(id, fields))?;
        info!(
            id,
            fields = ?fields.keys().collect::<Vec<_>>(),
            "series updated"
        );
        self.refresh();
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<(), AppError> {
        logged("delete", self.store.delete(id))?;
        info!(id, "series deleted");
        if self.editing.as_ref().is_some_and(|session| session.id() == id) {
            self.editing = None;
        }
        self.refresh();
        Ok(())
    }

    /// Opens `id` for editing. Any other open session is discarded.
    pub fn begin_edit(&mut self, id: &str) -> Result<&EditSession, AppError> {
        let record = self
            .find(id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        let session = EditSession::begin(record);
        if let Some(previous) = self.editing.as_ref().filter(|s| s.id() != id) {
            debug!(previous = previous.id(), next = id, "switching edited series");
        }
        Ok(&*self.editing.insert(session))
    }

    pub fn stage(&mut self, field: EditField, raw: &str) -> Result<&EditSession, AppError> {
        let session = self.editing.as_mut().ok_or_else(no_session)?;
        session.set_field(field, raw)?;
        Ok(&*session)
    }

    /// Commits the whole staging buffer as one update. The session stays open
    /// when the store rejects the write.
    pub fn save_edit(&mut self) -> Result<SeriesRecord, AppError> {
        let session = self.editing.take().ok_or_else(no_session)?;
        let id = session.id().to_string();
        if let Err(err) = self.update(&id, &session.buffer().to_document()) {
            self.editing = Some(session);
            return Err(err);
        }
        Ok(session.staged_record())
    }

    pub fn cancel_edit(&mut self) -> Option<SeriesRecord> {
        let session = self.editing.take()?;
        let id = session.id().to_string();
        self.find(&id).cloned()
    }

    /// Moves watched episodes one step towards the total and commits only
    /// that field. Returns the resulting values; nothing is written when the
    /// count is already at the total.
    pub fn increment(&mut self, id: &str) -> Result<SeriesFields, AppError> {
        let mut current = self.current_fields(id)?;
        let Some(next) = card::next_watched(&current) else {
            debug!(id, watched = current.watched_episodes, "increment is a no-op");
            return Ok(current);
        };

        let mut patch = Document::new();
        patch.insert(WATCHED_EPISODES.to_string(), Value::from(next));
        self.update(id, &patch)?;

        current.watched_episodes = next;
        if let Some(session) = self.editing.as_mut().filter(|s| s.id() == id) {
            session.mirror_watched(next);
        }
        Ok(current)
    }

    /// Commits only the status field, independent of any open edit.
    pub fn change_status(
        &mut self,
        id: &str,
        status: WatchStatus,
    ) -> Result<SeriesFields, AppError> {
        let mut current = self.current_fields(id)?;
        let mut patch = Document::new();
        patch.insert(STATUS.to_string(), Value::from(status.as_str()));
        self.update(id, &patch)?;

        current.status = status;
        if let Some(session) = self.editing.as_mut().filter(|s| s.id() == id) {
            session.mirror_status(status);
        }
        Ok(current)
    }

    /// Follow-up fetch after a completed mutation. A failure is already
    /// logged and leaves the previous list in place.
    pub(crate) fn refresh(&mut self) {
        let _ = self.fetch();
    }

    fn current_fields(&self, id: &str) -> Result<SeriesFields, AppError> {
        if let Some(session) = self.editing.as_ref().filter(|s| s.id() == id) {
            return Ok(session.buffer().clone());
        }
        self.find(id)
            .map(|record| record.fields.clone())
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }
}

fn logged<T>(operation: &'static str, result: Result<T, StoreError>) -> Result<T, StoreError> {
    if let Err(err) = &result {
        error!(operation, error = %err, "store call failed");
    }
    result
}

fn no_session() -> AppError {
    AppError::InvalidArgument("no series is being edited".to_string())
}
