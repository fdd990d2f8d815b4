//! Durable storage for the filter snapshot.
//!
//! The dashboard stores exactly one value: the serialized filter state under
//! [`FILTER_STORAGE_KEY`]. [`LmdbFilterStorage`] keeps it in an LMDB
//! environment at `<name>.lmdb/`; [`MemoryFilterStorage`] keeps it in process
//! memory and can simulate storage that is unavailable (quota exceeded,
//! private browsing).

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use lmdb::{Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{debug, info};

use crate::app_response::AppResponse;
use crate::local_db_model::FILTER_STORAGE_KEY;

/// Default LMDB map size: the snapshot is a few hundred bytes, 1 MiB is ample.
pub const DEFAULT_MAP_SIZE: usize = 1024 * 1024;

const FILTERS_DB_NAME: &str = "filters";

/// Key-value access to the persisted filter snapshot.
///
/// Implementations report failures through `AppResponse`; the filter store
/// decides whether a failure matters (it never does for `save`).
pub trait PersistenceAdapter {
    /// `SerializationError` means a value is stored but cannot be decoded as text.
    fn load(&self) -> Result<Option<String>, AppResponse>;

    fn save(&self, payload: &str) -> Result<(), AppResponse>;

    fn remove(&self) -> Result<(), AppResponse>;
}

pub struct LmdbFilterStorage {
    env: Environment,
    db: Database,
    key: String,
    path: PathBuf,
}

impl LmdbFilterStorage {
    /// Opens (creating if needed) `<name>.lmdb/` with the default key and map size.
    pub fn init(name: &str) -> Result<Self, AppResponse> {
        Self::open(name, FILTER_STORAGE_KEY, DEFAULT_MAP_SIZE)
    }

    pub fn open(name: &str, key: &str, map_size: usize) -> Result<Self, AppResponse> {
        if name.trim().is_empty() {
            return Err(AppResponse::BadRequest("Database name must not be empty".to_string()));
        }
        if key.is_empty() {
            return Err(AppResponse::BadRequest("Storage key must not be empty".to_string()));
        }

        let path = PathBuf::from(format!("{name}.lmdb"));
        std::fs::create_dir_all(&path)?;

        let env = Environment::new()
            .set_max_dbs(1)
            .set_map_size(map_size)
            .open(&path)?;
        let db = env.create_db(Some(FILTERS_DB_NAME), DatabaseFlags::empty())?;

        info!("Filter storage opened at {}", path.display());
        Ok(Self {
            env,
            db,
            key: key.to_string(),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the whole LMDB directory. The storage is unusable afterwards.
    pub fn destroy(self) -> Result<(), AppResponse> {
        let path = self.path.clone();
        drop(self);
        if path.exists() {
            std::fs::remove_dir_all(&path)?;
        }
        info!("Filter storage at {} removed", path.display());
        Ok(())
    }
}

impl PersistenceAdapter for LmdbFilterStorage {
    fn load(&self) -> Result<Option<String>, AppResponse> {
        let txn = self.env.begin_ro_txn()?;
        let payload = match txn.get(self.db, &self.key) {
            Ok(bytes) => match std::str::from_utf8(bytes) {
                Ok(s) => Some(s.to_string()),
                Err(e) => {
                    return Err(AppResponse::SerializationError(format!(
                        "Stored filters are not valid UTF-8: {e}"
                    )))
                }
            },
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        txn.commit()?;
        Ok(payload)
    }

    fn save(&self, payload: &str) -> Result<(), AppResponse> {
        let mut txn = self.env.begin_rw_txn()?;
        txn.put(self.db, &self.key, &payload, WriteFlags::empty())?;
        txn.commit()?;
        debug!("Saved {} bytes of filter state", payload.len());
        Ok(())
    }

    fn remove(&self) -> Result<(), AppResponse> {
        let mut txn = self.env.begin_rw_txn()?;
        match txn.del(self.db, &self.key, None) {
            Ok(()) | Err(lmdb::Error::NotFound) => {}
            Err(e) => return Err(e.into()),
        }
        txn.commit()?;
        Ok(())
    }
}

/// In-process storage, used by hosts without a writable directory and by tests.
#[derive(Debug, Default)]
pub struct MemoryFilterStorage {
    value: RefCell<Option<String>>,
    unavailable: bool,
}

impl MemoryFilterStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            value: RefCell::new(Some(payload.into())),
            unavailable: false,
        }
    }

    /// Storage that fails every call, like a browser in private mode.
    pub fn unavailable() -> Self {
        Self {
            value: RefCell::new(None),
            unavailable: true,
        }
    }

    pub fn stored(&self) -> Option<String> {
        self.value.borrow().clone()
    }

    fn check(&self) -> Result<(), AppResponse> {
        if self.unavailable {
            Err(AppResponse::DatabaseError("Storage is unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl PersistenceAdapter for MemoryFilterStorage {
    fn load(&self) -> Result<Option<String>, AppResponse> {
        self.check()?;
        Ok(self.value.borrow().clone())
    }

    fn save(&self, payload: &str) -> Result<(), AppResponse> {
        self.check()?;
        *self.value.borrow_mut() = Some(payload.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), AppResponse> {
        self.check()?;
        self.value.borrow_mut().take();
        Ok(())
    }
}

impl<P: PersistenceAdapter + ?Sized> PersistenceAdapter for std::rc::Rc<P> {
    fn load(&self) -> Result<Option<String>, AppResponse> {
        (**self).load()
    }

    fn save(&self, payload: &str) -> Result<(), AppResponse> {
        (**self).save(payload)
    }

    fn remove(&self) -> Result<(), AppResponse> {
        (**self).remove()
    }
}
