use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::form::{FieldMap, FormType, Inquiry};
use super::status::{ErrorKind, StatusReporter, SubmitStatus};
use super::store::{PersistenceError, Submission, SubmissionLog, SubmissionStore};
use super::validate::{self, FieldErrors};

#[derive(Debug)]
pub enum SubmitOutcome {
    Accepted(Submission),
    Rejected(FieldErrors),
    Failed(PersistenceError),
}

/// What a client needs to redraw the inquiry form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub form_type: FormType,
    pub fields: FieldMap,
    pub errors: FieldErrors,
    pub status: SubmitStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<&'static str>,
    pub submission_count: usize,
}

/// The tabbed patient / sponsor / physician form of one visitor.
pub struct InquirySession {
    form_type: FormType,
    fields: FieldMap,
    errors: FieldErrors,
    status: StatusReporter,
    log: SubmissionLog,
}

impl InquirySession {
    /// Opens on the sponsor tab with the persisted submissions loaded.
    pub async fn open(store: Arc<dyn SubmissionStore>, success_reset: Duration) -> Self {
        Self {
            form_type: FormType::Sponsor,
            fields: FieldMap::new(),
            errors: FieldErrors::new(),
            status: StatusReporter::new(success_reset),
            log: SubmissionLog::load(store).await,
        }
    }

    pub fn form_type(&self) -> FormType {
        self.form_type
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn status(&self) -> SubmitStatus {
        self.status.status()
    }

    pub fn submissions(&self) -> &[Submission] {
        self.log.entries()
    }

    /// Switch tabs. Whatever was typed, and any errors shown, are discarded.
    pub fn select_form_type(&mut self, form_type: FormType) {
        self.form_type = form_type;
        self.fields.clear();
        self.errors.clear();
        self.status.reset();
    }

    /// Store a value. A field's error is dropped as soon as it is edited,
    /// without re-validating.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.errors.remove(&name);
        self.fields.insert(name, value.into());
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        let inquiry = Inquiry::from_fields(self.form_type, &self.fields);

        let errors = validate::validate(&inquiry);
        if !errors.is_empty() {
            self.errors = errors.clone();
            self.status.fail(ErrorKind::Validation);
            return SubmitOutcome::Rejected(errors);
        }

        self.errors.clear();
        self.status.begin();

        match self.log.add(inquiry).await {
            Ok(submission) => {
                tracing::info!(
                    "Accepted {} inquiry {}",
                    submission.form_type(),
                    submission.id
                );
                self.fields.clear();
                self.status.succeed();
                SubmitOutcome::Accepted(submission)
            }
            Err(e) => {
                tracing::error!("Submission error: {e}");
                self.status.fail(ErrorKind::Persistence);
                SubmitOutcome::Failed(e)
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            form_type: self.form_type,
            fields: self.fields.clone(),
            errors: self.errors.clone(),
            status: self.status.status(),
            error_kind: self.status.error_kind(),
            banner: self.status.banner(),
            submission_count: self.log.len(),
        }
    }
}
