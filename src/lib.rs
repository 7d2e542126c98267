// agendastore - contacts, appointments and tasks in a local record store

pub mod backend;
pub mod dates;
pub mod error;
pub mod models;
pub mod record;
pub mod sequence;
pub mod store;

// Re-export main types for convenience
pub use backend::{Backend, SqliteBackend};
pub use dates::{DateKey, TimeOfDay};
pub use error::{Result, StoreError};
pub use models::{Appointment, Contact, NewAppointment, NewContact, NewTask, Task};
pub use record::{DatedRecord, Namespace, Record};
pub use sequence::{Counter, SequenceAllocator};
pub use store::{DayView, Store, now_ms};
