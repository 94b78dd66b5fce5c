//! Contact directory
//!
//! Process-wide record table mapping contact names to field addresses, plus
//! blacklist entries and group bindings. Every operation runs as a single
//! transaction under one lock; mutations are written through to a
//! `DirectoryStore` before the lock is released.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::errors::{DirectoryError, DirectoryResult};
use crate::types::{normalize_name, ChannelId, ContactEntry, ContactRecord};

// ----------------------------------------------------------------------------
// Storage Trait
// ----------------------------------------------------------------------------

/// Backing store for the record table
pub trait DirectoryStore: Send + Sync {
    /// Load every persisted record
    fn load(&self) -> DirectoryResult<Vec<ContactRecord>>;

    /// Replace the persisted table with `records`
    fn save(&self, records: &[ContactRecord]) -> DirectoryResult<()>;
}

// ----------------------------------------------------------------------------
// Memory Storage Implementation
// ----------------------------------------------------------------------------

/// In-memory store for tests and dry runs
///
/// Clones share the same table, so a directory reopened on a clone sees
/// earlier writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<Vec<ContactRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DirectoryStore for MemoryStore {
    fn load(&self) -> DirectoryResult<Vec<ContactRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, records: &[ContactRecord]) -> DirectoryResult<()> {
        *self.records.lock().unwrap_or_else(PoisonError::into_inner) = records.to_vec();
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// JSON File Storage Implementation
// ----------------------------------------------------------------------------

/// Record table persisted as a pretty-printed JSON array
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "directory.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl DirectoryStore for JsonFileStore {
    fn load(&self) -> DirectoryResult<Vec<ContactRecord>> {
        if !self.path.exists() {
            debug!("Directory file {} not found, starting empty", self.path.display());
            return Ok(Vec::new());
        }

        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            DirectoryError::Storage(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            DirectoryError::Storage(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn save(&self, records: &[ContactRecord]) -> DirectoryResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DirectoryError::Storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let serialized = serde_json::to_string_pretty(records)
            .map_err(|e| DirectoryError::Storage(format!("Failed to serialize directory: {}", e)))?;

        // Replace the file in one rename.
        let temp = self.temp_path();
        std::fs::write(&temp, serialized).map_err(|e| {
            DirectoryError::Storage(format!("Failed to write {}: {}", temp.display(), e))
        })?;
        std::fs::rename(&temp, &self.path).map_err(|e| {
            DirectoryError::Storage(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }
}

// ----------------------------------------------------------------------------
// Contact Directory
// ----------------------------------------------------------------------------

struct DirectoryInner {
    records: RwLock<Vec<ContactRecord>>,
    store: Box<dyn DirectoryStore>,
}

/// Shared handle to the contact directory
///
/// Cloning is cheap; all clones see the same table.
#[derive(Clone)]
pub struct ContactDirectory {
    inner: Arc<DirectoryInner>,
}

impl core::fmt::Debug for ContactDirectory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContactDirectory")
            .field("records", &self.read().len())
            .finish()
    }
}

impl ContactDirectory {
    /// Open a directory over the given store, loading its current contents
    pub fn open<S: DirectoryStore + 'static>(store: S) -> DirectoryResult<Self> {
        let records = store.load()?;
        debug!("Loaded {} directory records", records.len());

        Ok(Self {
            inner: Arc::new(DirectoryInner {
                records: RwLock::new(records),
                store: Box::new(store),
            }),
        })
    }

    /// Open a directory persisted at `path`
    pub fn open_file(path: impl Into<PathBuf>) -> DirectoryResult<Self> {
        Self::open(JsonFileStore::new(path))
    }

    /// Empty, non-persistent directory
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(DirectoryInner {
                records: RwLock::new(Vec::new()),
                store: Box::new(MemoryStore::new()),
            }),
        }
    }

    // ------------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------------

    /// Contact name for an address, ignoring blacklist entries
    pub fn lookup_name_by_address(&self, address: &str) -> Option<String> {
        self.read()
            .iter()
            .find(|r| r.is_contact() && r.address == address)
            .and_then(|r| r.name.clone())
    }

    /// Address for a contact name (case-insensitive)
    pub fn lookup_address_by_name(&self, name: &str) -> Option<String> {
        let name = normalize_name(name);
        self.read()
            .iter()
            .find(|r| r.has_name(&name))
            .map(|r| r.address.clone())
    }

    pub fn is_blacklisted(&self, address: &str) -> bool {
        self.read()
            .iter()
            .any(|r| r.blacklisted && r.address == address)
    }

    /// Group bound to a contact
    pub fn get_group(&self, name: &str) -> Option<ChannelId> {
        let name = normalize_name(name);
        self.read()
            .iter()
            .find(|r| r.has_name(&name))
            .and_then(|r| r.group)
    }

    /// Contact bound to a group
    pub fn lookup_name_by_group(&self, group: ChannelId) -> Option<String> {
        self.read()
            .iter()
            .find(|r| r.is_contact() && r.group == Some(group))
            .and_then(|r| r.name.clone())
    }

    pub fn list_contacts(&self) -> Vec<ContactEntry> {
        self.read()
            .iter()
            .filter(|r| r.is_contact())
            .filter_map(|r| {
                r.name.as_ref().map(|name| ContactEntry {
                    name: name.clone(),
                    address: r.address.clone(),
                    group: r.group,
                })
            })
            .collect()
    }

    pub fn list_blacklist(&self) -> Vec<String> {
        self.read()
            .iter()
            .filter(|r| r.blacklisted)
            .map(|r| r.address.clone())
            .collect()
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    pub fn add_contact(&self, name: &str, address: &str) -> DirectoryResult<()> {
        let record = ContactRecord::contact(name, address);
        self.mutate(|records| {
            let duplicate = records
                .iter()
                .filter(|r| r.is_contact())
                .any(|r| r.address == record.address || r.name == record.name);
            if duplicate {
                return Err(DirectoryError::DuplicateContact);
            }
            records.push(record);
            Ok(())
        })
    }

    pub fn remove_contact(&self, name: &str) -> DirectoryResult<()> {
        let name = normalize_name(name);
        self.mutate(|records| {
            let index = records
                .iter()
                .position(|r| r.has_name(&name))
                .ok_or(DirectoryError::NotFound)?;
            records.remove(index);
            Ok(())
        })
    }

    pub fn add_blacklist(&self, address: &str) -> DirectoryResult<()> {
        self.mutate(|records| {
            if records.iter().any(|r| r.blacklisted && r.address == address) {
                return Err(DirectoryError::DuplicateBlacklist);
            }
            records.push(ContactRecord::blacklist_entry(address));
            Ok(())
        })
    }

    pub fn remove_blacklist(&self, address: &str) -> DirectoryResult<()> {
        self.mutate(|records| {
            let index = records
                .iter()
                .position(|r| r.blacklisted && r.address == address)
                .ok_or(DirectoryError::NotFound)?;
            records.remove(index);
            Ok(())
        })
    }

    /// Overwrite a contact's group binding.
    ///
    /// Group uniqueness is the caller's precondition.
    pub fn set_group(&self, name: &str, group: Option<ChannelId>) -> DirectoryResult<()> {
        let name = normalize_name(name);
        self.mutate(|records| {
            let record = records
                .iter_mut()
                .find(|r| r.has_name(&name))
                .ok_or(DirectoryError::NotFound)?;
            record.group = group;
            Ok(())
        })
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn read(&self) -> RwLockReadGuard<'_, Vec<ContactRecord>> {
        self.inner
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<ContactRecord>> {
        self.inner
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `op` and persist the result, rolling back if the store rejects it
    ///
    /// The table is reloaded from the store first so edits made by another
    /// process on the same file are kept rather than overwritten.
    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut Vec<ContactRecord>) -> DirectoryResult<T>,
    ) -> DirectoryResult<T> {
        let mut records = self.write();
        match self.inner.store.load() {
            Ok(fresh) => *records = fresh,
            Err(e) => warn!("Directory reload failed, using cached table: {}", e),
        }
        let snapshot = records.clone();
        let value = op(&mut records)?;

        if let Err(e) = self.inner.store.save(&records) {
            warn!("Directory write failed, rolling back: {}", e);
            *records = snapshot;
            return Err(e);
        }

        Ok(value)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
