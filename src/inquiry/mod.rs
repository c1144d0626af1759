//! Patient, sponsor and physician inquiry capture.
//!
//! The form state, validation rules and submission log live here with no
//! HTTP in sight; `routes::inquiry` puts them behind the session API.

pub mod form;
pub mod session;
pub mod status;
pub mod store;
pub mod validate;

pub use form::{FieldMap, FormType, Inquiry};
pub use session::{InquirySession, SessionSnapshot, SubmitOutcome};
pub use status::{ErrorKind, StatusReporter, SubmitStatus};
pub use store::{FileStore, MemoryStore, PersistenceError, Submission, SubmissionLog, SubmissionStore};
pub use validate::{validate, FieldErrors};
