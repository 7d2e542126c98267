// Generic record traits for anything kept in a namespace

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three record namespaces of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Contacts,
    Appointments,
    Tasks,
}

impl Namespace {
    /// Storage key holding the serialized sequence for this namespace
    pub fn key(self) -> &'static str {
        match self {
            Namespace::Contacts => "contacts",
            Namespace::Appointments => "appointments",
            Namespace::Tasks => "tasks",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Core trait that any storable record must implement
pub trait Record: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync + 'static {
    /// Namespace this record type lives in
    const NAMESPACE: Namespace;

    /// Identity field, unique within the namespace
    fn id(&self) -> &str;
}

/// Records filed under a day key (`dia`)
pub trait DatedRecord: Record {
    /// Canonical `YYYY-MM-DD` day this record belongs to
    fn date_key(&self) -> &str;
}
