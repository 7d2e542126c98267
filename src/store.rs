// Record store: namespaced collections over a key-value backend

use crate::backend::{Backend, SqliteBackend};
use crate::dates::DateKey;
use crate::error::{Result, StoreError};
use crate::models::{Appointment, Contact, NewAppointment, NewContact, NewTask, Task};
use crate::record::{DatedRecord, Namespace, Record};
use crate::sequence::{Counter, Reservation, SequenceAllocator};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

const CURRENT_VERSION: u32 = 1;
const DB_FILE: &str = "agenda.db";

/// Appointments and tasks filed under one day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayView {
    pub date: DateKey,
    pub appointments: Vec<Appointment>,
    pub tasks: Vec<Task>,
}

impl DayView {
    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty() && self.tasks.is_empty()
    }
}

/// Persistent store of contacts, appointments and tasks
///
/// Each namespace is one serialized sequence; every mutation rewrites it
/// whole. Read-modify-write cycles on a namespace are serialized by an
/// in-process mutex and an exclusive lock file, so the store can be shared
/// between threads and processes.
pub struct Store {
    base_path: PathBuf,
    backend: Arc<dyn Backend>,
    sequences: SequenceAllocator,
    contacts_lock: Mutex<()>,
    appointments_lock: Mutex<()>,
    tasks_lock: Mutex<()>,
}

impl Store {
    /// Open or create a store in the given directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        let backend = SqliteBackend::open(base_path.join(DB_FILE))?;
        let store = Self::with_backend(&base_path, Arc::new(backend))?;

        info!(path = ?store.base_path, "Opened store");
        Ok(store)
    }

    /// Build a store over an existing backend
    ///
    /// `path` holds the version marker and the namespace lock files.
    pub fn with_backend<P: AsRef<Path>>(path: P, backend: Arc<dyn Backend>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        let store = Self {
            sequences: SequenceAllocator::new(backend.clone()),
            base_path,
            backend,
            contacts_lock: Mutex::new(()),
            appointments_lock: Mutex::new(()),
            tasks_lock: Mutex::new(()),
        };
        store.write_version()?;
        Ok(store)
    }

    /// Get the base path of this store
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn write_version(&self) -> Result<()> {
        let version_path = self.base_path.join(".version");
        if !version_path.exists() {
            fs::write(version_path, CURRENT_VERSION.to_string())?;
        }
        Ok(())
    }

    // ========================================================================
    // Generic record API
    // ========================================================================

    /// Allocate the next id from a counter and persist it
    pub fn allocate_id(&self, counter: Counter) -> Result<u64> {
        self.with_lock(counter.namespace(), || self.sequences.allocate(counter))
    }

    /// All records of a namespace, in stored order
    pub fn list_all<T: Record>(&self) -> Result<Vec<T>> {
        self.load()
    }

    /// Like `list_all`, but a corrupt namespace reads as empty
    pub fn list_or_empty<T: Record>(&self) -> Result<Vec<T>> {
        match self.load() {
            Ok(records) => Ok(records),
            Err(StoreError::CorruptData { key, reason }) => {
                warn!(namespace = %key, reason = %reason, "Stored collection is corrupt, showing it as empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Get a record by id
    pub fn get<T: Record>(&self, id: &str) -> Result<Option<T>> {
        Ok(self.load::<T>()?.into_iter().find(|r| r.id() == id))
    }

    /// Append a record to its namespace
    pub fn save<T: Record>(&self, record: T) -> Result<()> {
        self.with_lock(T::NAMESPACE, || self.insert_locked(record, None))
    }

    /// Replace the record with the given id by `updater(old)`
    ///
    /// The updater may not change the identity field.
    pub fn update<T, F>(&self, id: &str, updater: F) -> Result<T>
    where
        T: Record,
        F: FnOnce(T) -> T,
    {
        self.with_lock(T::NAMESPACE, || {
            let mut records = self.load::<T>()?;
            let pos = records
                .iter()
                .position(|r| r.id() == id)
                .ok_or_else(|| Self::not_found(T::NAMESPACE, id))?;

            let updated = updater(records[pos].clone());
            if updated.id() != id {
                return Err(StoreError::Validation(format!(
                    "Update may not change id '{}' to '{}'",
                    id,
                    updated.id()
                )));
            }

            records[pos] = updated.clone();
            self.persist(&records, None)?;
            debug!(namespace = %T::NAMESPACE, id, "Updated record");
            Ok(updated)
        })
    }

    /// Remove the record with the given id
    pub fn delete_by_id<T: Record>(&self, id: &str) -> Result<()> {
        self.with_lock(T::NAMESPACE, || {
            let mut records = self.load::<T>()?;
            let before = records.len();
            records.retain(|r| r.id() != id);

            if records.len() == before {
                return Err(Self::not_found(T::NAMESPACE, id));
            }

            self.persist(&records, None)?;
            debug!(namespace = %T::NAMESPACE, id, "Deleted record");
            Ok(())
        })
    }

    /// Records filed under the given day
    ///
    /// `date` may be any accepted date form; it is normalized to
    /// `YYYY-MM-DD` and compared for exact equality.
    pub fn filter_by_date<T: DatedRecord>(&self, date: &str) -> Result<Vec<T>> {
        let key = DateKey::parse(date)?;
        self.records_on(key)
    }

    /// Like `filter_by_date`, but a corrupt namespace reads as empty
    pub fn filter_or_empty<T: DatedRecord>(&self, date: &str) -> Result<Vec<T>> {
        let key = DateKey::parse(date)?.to_string();
        Ok(self
            .list_or_empty::<T>()?
            .into_iter()
            .filter(|r| r.date_key() == key)
            .collect())
    }

    pub fn records_on<T: DatedRecord>(&self, date: DateKey) -> Result<Vec<T>> {
        let key = date.to_string();
        Ok(self
            .load::<T>()?
            .into_iter()
            .filter(|r| r.date_key() == key)
            .collect())
    }

    // ========================================================================
    // Contacts
    // ========================================================================

    /// Validate and store a new contact, keyed by the creation timestamp
    pub fn create_contact(&self, draft: NewContact) -> Result<Contact> {
        let draft = draft.normalize()?;

        self.with_lock(Namespace::Contacts, || {
            let existing = self.load::<Contact>()?;
            let mut stamp = now_ms();
            while existing.iter().any(|c| c.id == stamp.to_string()) {
                stamp += 1;
            }

            let contact = draft.into_record(stamp.to_string());
            self.insert_into(existing, contact.clone(), None)?;
            info!(id = %contact.id, "Created contact");
            Ok(contact)
        })
    }

    pub fn edit_contact(&self, id: &str, draft: NewContact) -> Result<Contact> {
        let draft = draft.normalize()?;
        self.update::<Contact, _>(id, |old| draft.into_record(old.id))
    }

    // ========================================================================
    // Appointments
    // ========================================================================

    /// Store a new appointment under the next `lastId` value
    ///
    /// The counter and the collection are committed together.
    pub fn create_appointment(&self, draft: NewAppointment) -> Result<Appointment> {
        let draft = draft.normalize()?;

        self.with_lock(Namespace::Appointments, || {
            let existing = self.load::<Appointment>()?;
            let reservation = self.reserve(Counter::Appointments, &existing)?;

            let appointment = draft.into_record(reservation.value.to_string());
            self.insert_into(existing, appointment.clone(), Some(reservation))?;
            info!(id = %appointment.id, date = %appointment.date, "Created appointment");
            Ok(appointment)
        })
    }

    pub fn edit_appointment(&self, id: &str, draft: NewAppointment) -> Result<Appointment> {
        let draft = draft.normalize()?;
        self.update::<Appointment, _>(id, |old| draft.into_record(old.id))
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    /// Store a new pending task under the next `lastTaskId` value
    pub fn create_task(&self, draft: NewTask) -> Result<Task> {
        let draft = draft.normalize()?;

        self.with_lock(Namespace::Tasks, || {
            let existing = self.load::<Task>()?;
            let reservation = self.reserve(Counter::Tasks, &existing)?;

            let task = draft.into_record(reservation.value.to_string());
            self.insert_into(existing, task.clone(), Some(reservation))?;
            info!(id = %task.id, date = %task.date, "Created task");
            Ok(task)
        })
    }

    /// Replace the editable fields of a task; its finished flag is kept
    pub fn edit_task(&self, id: &str, draft: NewTask) -> Result<Task> {
        let draft = draft.normalize()?;
        self.update::<Task, _>(id, |old| Task {
            finished: old.finished,
            ..draft.into_record(old.id)
        })
    }

    /// Persist a task's done/pending state
    pub fn set_task_finished(&self, id: &str, finished: bool) -> Result<Task> {
        self.update::<Task, _>(id, |mut task| {
            task.finished = finished;
            task
        })
    }

    // ========================================================================
    // Calendar views
    // ========================================================================

    /// Appointments and tasks of one day; corrupt collections read as empty
    pub fn day(&self, date: DateKey) -> Result<DayView> {
        let key = date.to_string();
        let on_day = |d: &str| d == key;

        Ok(DayView {
            date,
            appointments: self
                .list_or_empty::<Appointment>()?
                .into_iter()
                .filter(|a| on_day(a.date_key()))
                .collect(),
            tasks: self
                .list_or_empty::<Task>()?
                .into_iter()
                .filter(|t| on_day(t.date_key()))
                .collect(),
        })
    }

    /// Monday-to-Sunday views of the week containing `date`
    pub fn week(&self, date: DateKey) -> Result<Vec<DayView>> {
        let appointments = self.list_or_empty::<Appointment>()?;
        let tasks = self.list_or_empty::<Task>()?;

        Ok(date
            .week()
            .into_iter()
            .map(|day| {
                let key = day.to_string();
                DayView {
                    date: day,
                    appointments: appointments.iter().filter(|a| a.date == key).cloned().collect(),
                    tasks: tasks.iter().filter(|t| t.date == key).cloned().collect(),
                }
            })
            .collect())
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    fn load<T: Record>(&self) -> Result<Vec<T>> {
        let key = T::NAMESPACE.key();
        match self.backend.get(key)? {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(|e| StoreError::corrupt(key, e)),
        }
    }

    fn persist<T: Record>(&self, records: &[T], reservation: Option<Reservation>) -> Result<()> {
        let json = serde_json::to_string(records)
            .map_err(|e| StoreError::StorageUnavailable(format!("Failed to serialize {}: {}", T::NAMESPACE, e)))?;

        let mut entries = vec![(T::NAMESPACE.key(), json)];
        if let Some(reservation) = reservation {
            entries.push(reservation.entry());
        }

        self.backend.put_all(&entries)
    }

    /// Append to the current collection; caller holds the namespace lock
    fn insert_locked<T: Record>(&self, record: T, reservation: Option<Reservation>) -> Result<()> {
        let existing = self.load::<T>()?;
        self.insert_into(existing, record, reservation)
    }

    fn insert_into<T: Record>(&self, mut records: Vec<T>, record: T, reservation: Option<Reservation>) -> Result<()> {
        Self::validate_id(record.id())?;

        if records.iter().any(|r| r.id() == record.id()) {
            return Err(StoreError::DuplicateId {
                namespace: T::NAMESPACE.key(),
                id: record.id().to_string(),
            });
        }

        records.push(record);
        self.persist(&records, reservation)
    }

    fn reserve<T: Record>(&self, counter: Counter, existing: &[T]) -> Result<Reservation> {
        self.sequences
            .reserve(counter, |value| existing.iter().any(|r| r.id() == value.to_string()))
    }

    /// Run `f` holding the namespace's mutex and lock file
    fn with_lock<R>(&self, namespace: Namespace, f: impl FnOnce() -> Result<R>) -> Result<R> {
        let mutex = match namespace {
            Namespace::Contacts => &self.contacts_lock,
            Namespace::Appointments => &self.appointments_lock,
            Namespace::Tasks => &self.tasks_lock,
        };
        let _guard = mutex
            .lock()
            .map_err(|_| StoreError::StorageUnavailable(format!("{} lock poisoned", namespace)))?;

        let lock_path = self.base_path.join(format!("{}.lock", namespace.key()));
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        lock_file.lock_exclusive()?;

        // File lock is released when lock_file is dropped
        f()
    }

    fn not_found(namespace: Namespace, id: &str) -> StoreError {
        warn!(namespace = %namespace, id, "Record not found");
        StoreError::NotFound {
            namespace: namespace.key(),
            id: id.to_string(),
        }
    }

    /// Validate record ID
    fn validate_id(id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(StoreError::Validation(
                "Record ID cannot be empty or whitespace-only".to_string(),
            ));
        }

        if id.len() > 256 {
            return Err(StoreError::Validation(format!(
                "Record ID too long: {} chars (max 256)",
                id.len()
            )));
        }

        Ok(())
    }
}

// Helper function for timestamps
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
