// Data models for the organizer
//
// Serialized field names follow the stored layout (`id_cita`, `hora_inicio`,
// `dia`, ...) so existing blobs load unchanged.

use crate::dates::{DateKey, TimeOfDay};
use crate::error::{Result, StoreError};
use crate::record::{DatedRecord, Namespace, Record};
use serde::{Deserialize, Deserializer, Serialize};

/// Address book entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Creation timestamp in milliseconds, as a string
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub notes: String,
}

/// Calendar appointment on a given day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(rename = "id_cita")]
    pub id: String,
    #[serde(rename = "hora_inicio")]
    pub start: String,
    #[serde(rename = "hora_fin")]
    pub end: String,
    #[serde(rename = "sujetos", default)]
    pub subjects: Vec<String>,
    #[serde(rename = "direccion", default)]
    pub address: String,
    #[serde(rename = "notas", default)]
    pub notes: String,
    #[serde(rename = "dia")]
    pub date: String,
}

/// To-do item due on a given day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "id_tarea")]
    pub id: String,
    #[serde(rename = "dia")]
    pub date: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "notas", default)]
    pub notes: String,
    #[serde(rename = "finalizado", default, deserialize_with = "bool_or_int")]
    pub finished: bool,
}

impl Record for Contact {
    const NAMESPACE: Namespace = Namespace::Contacts;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Appointment {
    const NAMESPACE: Namespace = Namespace::Appointments;

    fn id(&self) -> &str {
        &self.id
    }
}

impl DatedRecord for Appointment {
    fn date_key(&self) -> &str {
        &self.date
    }
}

impl Record for Task {
    const NAMESPACE: Namespace = Namespace::Tasks;

    fn id(&self) -> &str {
        &self.id
    }
}

impl DatedRecord for Task {
    fn date_key(&self) -> &str {
        &self.date
    }
}

impl Appointment {
    /// Start time combined with today's date, for display
    pub fn start_today(&self) -> Result<chrono::NaiveDateTime> {
        Ok(TimeOfDay::parse(&self.start)?.on_today())
    }

    /// End time combined with today's date, for display
    pub fn end_today(&self) -> Result<chrono::NaiveDateTime> {
        Ok(TimeOfDay::parse(&self.end)?.on_today())
    }

    /// `HH:MM-HH:MM` for display; a time that does not parse is shown as stored
    pub fn time_span(&self) -> String {
        let show = |parsed: Result<chrono::NaiveDateTime>, raw: &str| match parsed {
            Ok(dt) => dt.format("%H:%M").to_string(),
            Err(_) => raw.to_string(),
        };
        format!(
            "{}-{}",
            show(self.start_today(), &self.start),
            show(self.end_today(), &self.end)
        )
    }
}

impl Task {
    pub fn status_label(&self) -> &'static str {
        if self.finished { "done" } else { "pending" }
    }
}

/// `finalizado` was historically written as 0/1; accept either form
fn bool_or_int<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}

// ============================================================================
// Drafts: user-entered fields, before the store assigns an identity
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewContact {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub notes: String,
}

impl NewContact {
    /// Trim fields and check that name, phone and email are present
    pub fn normalize(self) -> Result<Self> {
        let draft = Self {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            address: self.address.trim().to_string(),
            notes: self.notes.trim().to_string(),
        };

        let missing: Vec<&str> = [("name", &draft.name), ("phone", &draft.phone), ("email", &draft.email)]
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(field, _)| field)
            .collect();

        if !missing.is_empty() {
            return Err(StoreError::Validation(format!(
                "Contact requires {}",
                missing.join(", ")
            )));
        }

        Ok(draft)
    }

    pub(crate) fn into_record(self, id: String) -> Contact {
        Contact {
            id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            address: self.address,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewAppointment {
    /// Any accepted date form; stored as `YYYY-MM-DD`
    pub date: String,
    /// Any accepted time form; stored as `HH:MM`
    pub start: String,
    pub end: String,
    pub subjects: Vec<String>,
    pub address: String,
    pub notes: String,
}

impl NewAppointment {
    /// Canonicalize date and times, drop blank subjects
    pub fn normalize(self) -> Result<Self> {
        Ok(Self {
            date: DateKey::parse(&self.date)?.to_string(),
            start: TimeOfDay::parse(&self.start)?.to_string(),
            end: TimeOfDay::parse(&self.end)?.to_string(),
            subjects: clean_subjects(self.subjects),
            address: self.address,
            notes: self.notes,
        })
    }

    pub(crate) fn into_record(self, id: String) -> Appointment {
        Appointment {
            id,
            start: self.start,
            end: self.end,
            subjects: self.subjects,
            address: self.address,
            notes: self.notes,
            date: self.date,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    /// Any accepted date form; stored as `YYYY-MM-DD`
    pub date: String,
    pub description: String,
    pub notes: String,
}

impl NewTask {
    pub fn normalize(self) -> Result<Self> {
        Ok(Self {
            date: DateKey::parse(&self.date)?.to_string(),
            description: self.description,
            notes: self.notes,
        })
    }

    /// New tasks always start pending
    pub(crate) fn into_record(self, id: String) -> Task {
        Task {
            id,
            date: self.date,
            description: self.description,
            notes: self.notes,
            finished: false,
        }
    }
}

/// Drop blank subject entries, keeping order
pub fn clean_subjects(subjects: Vec<String>) -> Vec<String> {
    subjects
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
