use std::{
    fs,
    path::{Path, PathBuf},
    sync::mpsc::Receiver,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{watchers::WatcherRegistry, PersistenceProvider, SnapshotUpdate};
use crate::{
    errors::{LedgerError, Result},
    ledger::TransactionRecord,
    session::UserId,
    utils::persistence::{load_json, save_json_atomic},
};

pub const RECORDS_SCHEMA_VERSION: u8 = 1;

const USERS_DIR: &str = "users";
const RECORDS_EXTENSION: &str = "json";

/// On-disk document holding one user's record set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredRecords {
    #[serde(default = "StoredRecords::schema_version_default")]
    pub schema_version: u8,
    #[serde(default)]
    pub records: Vec<TransactionRecord>,
}

impl StoredRecords {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self {
            schema_version: RECORDS_SCHEMA_VERSION,
            records,
        }
    }

    pub fn schema_version_default() -> u8 {
        RECORDS_SCHEMA_VERSION
    }
}

/// Filesystem-backed JSON persistence, one document per user under `<root>/users/`.
pub struct JsonRecordStore {
    users_dir: PathBuf,
    watchers: WatcherRegistry,
}

impl JsonRecordStore {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let users_dir = root.as_ref().join(USERS_DIR);
        fs::create_dir_all(&users_dir)?;
        Ok(Self {
            users_dir,
            watchers: WatcherRegistry::default(),
        })
    }

    pub fn user_path(&self, user: &UserId) -> PathBuf {
        self.users_dir
            .join(format!("{}.{}", canonical_name(user), RECORDS_EXTENSION))
    }

    fn read(&self, user: &UserId) -> Result<Vec<TransactionRecord>> {
        let path = self.user_path(user);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let stored: StoredRecords = load_json(&path)?;
        if stored.schema_version > RECORDS_SCHEMA_VERSION {
            return Err(LedgerError::Persistence(format!(
                "`{}` uses schema version {}, newer than supported {}",
                path.display(),
                stored.schema_version,
                RECORDS_SCHEMA_VERSION
            )));
        }
        Ok(stored.records)
    }
}

impl PersistenceProvider for JsonRecordStore {
    fn load_snapshot(&self, user: &UserId) -> Result<Vec<TransactionRecord>> {
        self.read(user)
    }

    fn watch(&self, user: &UserId) -> Result<Receiver<SnapshotUpdate>> {
        self.watchers.subscribe(user)
    }

    fn store_records(&self, user: &UserId, records: &[TransactionRecord]) -> Result<()> {
        let path = self.user_path(user);
        save_json_atomic(&StoredRecords::new(records.to_vec()), &path)?;
        debug!(user = %user, count = records.len(), path = %path.display(), "records stored");

        // Watchers always receive what is on disk now, not what the caller believes it wrote.
        let update = match self.read(user) {
            Ok(current) => SnapshotUpdate::Replaced(current),
            Err(err) => {
                warn!(user = %user, error = %err, "stored records could not be re-read");
                SnapshotUpdate::Failed(err.to_string())
            }
        };
        self.watchers.notify(user, update)?;
        Ok(())
    }
}

/// File stem for a user id. Lowercase ASCII letters, digits and `-` are kept; every
/// other byte of the UTF-8 id becomes `_` plus two hex digits, so distinct ids never
/// share a file, even on case-insensitive filesystems. The empty id is `_`.
fn canonical_name(user: &UserId) -> String {
    let id = user.as_str();
    if id.is_empty() {
        return "_".into();
    }
    let mut name = String::with_capacity(id.len());
    for byte in id.bytes() {
        match byte {
            b'a'..=b'z' | b'0'..=b'9' | b'-' => name.push(char::from(byte)),
            _ => name.push_str(&format!("_{byte:02x}")),
        }
    }
    name
}
