use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use crate::card::EditField;
use crate::config::{Config, ConfigError};
use crate::controller::ListController;
use crate::domain::series::{SeriesFields, SeriesRecord};
use crate::domain::status::{ParseWatchStatusError, WatchStatus};
use crate::listing::ListParams;
use crate::store::{DocumentStore, SqliteStore, StoreError};
use crate::transfer::{self, ExportSummary, ImportSummary, TransferError};

pub struct App<S = SqliteStore> {
    controller: ListController<S>,
    export_file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    File(PathBuf),
    Stdout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub record: SeriesRecord,
    pub saved: bool,
}

impl App<SqliteStore> {
    pub fn open(db_path: &str, config: &Config) -> Result<Self, AppError> {
        ensure_parent_dir(db_path)?;
        let store = SqliteStore::open_series(db_path)?;
        Self::with_store(store, config)
    }
}

impl<S: DocumentStore> App<S> {
    /// Builds the controller and loads the initial list.
    pub fn with_store(store: S, config: &Config) -> Result<Self, AppError> {
        let params = ListParams {
            sort: config.sort_order(),
            ..ListParams::default()
        };
        let mut controller = ListController::new(store, params);
        controller.fetch()?;
        Ok(Self {
            controller,
            export_file_name: config.export.file_name.trim().to_string(),
        })
    }

    pub fn controller(&self) -> &ListController<S> {
        &self.controller
    }

    /// Applies the list parameters with a single re-query. `reverse` flips
    /// the requested order.
    pub fn list(
        &mut self,
        mut params: ListParams,
        reverse: bool,
    ) -> Result<&[SeriesRecord], AppError> {
        if reverse {
            params.sort = params.sort.toggled();
        }
        self.controller.set_params(params)
    }

    pub fn add(&mut self, fields: SeriesFields) -> Result<SeriesRecord, AppError> {
        if fields.title.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "title cannot be empty".to_string(),
            ));
        }
        let id = self.controller.create(&fields.to_document())?;
        Ok(SeriesRecord { id, fields })
    }

    pub fn show(&self, id: &str) -> Result<SeriesRecord, AppError> {
        self.controller
            .find(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    /// Opens the card for editing, stages each change in order, then saves.
    /// With `dry_run` the staged card is returned and the edit cancelled.
    pub fn edit(
        &mut self,
        id: &str,
        changes: &[(EditField, String)],
        dry_run: bool,
    ) -> Result<EditOutcome, AppError> {
        if changes.is_empty() && !dry_run {
            return Err(AppError::InvalidArgument(
                "edit requires at least one field change".to_string(),
            ));
        }

        self.controller.begin_edit(id)?;
        for (field, raw) in changes {
            let staged = self.controller.stage(*field, raw).map(|_| ());
            if let Err(err) = staged {
                self.controller.cancel_edit();
                return Err(err);
            }
        }

        if dry_run {
            let record = self
                .controller
                .editing()
                .map(|session| session.staged_record())
                .ok_or_else(|| AppError::NotFound(id.to_string()))?;
            self.controller.cancel_edit();
            return Ok(EditOutcome {
                record,
                saved: false,
            });
        }

        let record = self.controller.save_edit()?;
        Ok(EditOutcome {
            record,
            saved: true,
        })
    }

    pub fn increment(&mut self, id: &str) -> Result<SeriesRecord, AppError> {
        let fields = self.controller.increment(id)?;
        Ok(SeriesRecord {
            id: id.to_string(),
            fields,
        })
    }

    pub fn set_status(&mut self, id: &str, status: WatchStatus) -> Result<SeriesRecord, AppError> {
        let fields = self.controller.change_status(id, status)?;
        Ok(SeriesRecord {
            id: id.to_string(),
            fields,
        })
    }

    pub fn remove(&mut self, id: &str) -> Result<(), AppError> {
        self.controller.delete(id)
    }

    pub fn import_csv(&mut self, path: &Path) -> Result<ImportSummary, AppError> {
        let file = File::open(path).map_err(|err| {
            tracing::error!(path = %path.display(), error = %err, "cannot open import file");
            AppError::Io(err)
        })?;
        Ok(transfer::import_csv(
            &mut self.controller,
            BufReader::new(file),
        ))
    }

    pub fn default_export_path(&self) -> PathBuf {
        PathBuf::from(&self.export_file_name)
    }

    pub fn export_csv(&self, target: &ExportTarget) -> Result<ExportSummary, AppError> {
        let store = self.controller.store();
        let summary = match target {
            ExportTarget::Stdout => {
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                let summary = transfer::export_csv(store, &mut handle)?;
                handle.flush()?;
                summary
            }
            ExportTarget::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                let file = File::create(path)?;
                transfer::export_csv(store, file)?
            }
        };
        Ok(summary)
    }
}

fn ensure_parent_dir(path: &str) -> Result<(), AppError> {
    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Store(StoreError),
    Transfer(TransferError),
    Config(ConfigError),
    ParseStatus(ParseWatchStatusError),
    InvalidArgument(String),
    NotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Store(err) => write!(f, "store error: {}", err),
            AppError::Transfer(err) => write!(f, "transfer error: {}", err),
            AppError::Config(err) => write!(f, "{}", err),
            AppError::ParseStatus(err) => write!(f, "{}", err),
            AppError::InvalidArgument(message) => write!(f, "{}", message),
            AppError::NotFound(id) => write!(f, "series '{}' not found", id),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Transfer(err) => Some(err),
            AppError::Config(err) => Some(err),
            AppError::ParseStatus(err) => Some(err),
            AppError::InvalidArgument(_) => None,
            AppError::NotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        AppError::Store(value)
    }
}

impl From<TransferError> for AppError {
    fn from(value: TransferError) -> Self {
        AppError::Transfer(value)
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Config(value)
    }
}

impl From<ParseWatchStatusError> for AppError {
    fn from(value: ParseWatchStatusError) -> Self {
        AppError::ParseStatus(value)
    }
}

#[cfg(test)]
mod tests;
