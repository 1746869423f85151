use chrono::{Local, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::models::{Field, FormData, JobDetails, MultiJobForm, UpdateError, Variant};
use super::submit::{DeliveryMode, Submission, SubmissionOutcome, SyncStatus};
use super::validation::{company_errors, job_errors, step_errors, ErrorMap};
use crate::sinks::{JobRequestRecord, Sinks};

pub const SUBMIT_FAILED_MESSAGE: &str =
    "We encountered an error while saving your request. Please try again or contact support.";

/// Source of "today" for deadline checks
pub type Clock = fn() -> NaiveDate;

pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Editing,
    Syncing,
    Submitted,
}

/// What the positions step is showing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "draft", rename_all = "lowercase")]
pub enum JobView {
    List,
    Editing(JobDetails),
}

/// Misuse of the controller. Field validation failures are not errors;
/// they land in the session's error map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("this operation needs a {expected:?} form")]
    WrongVariant { expected: Variant },

    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error("no position is being edited")]
    NoDraft,

    #[error("save or cancel the open position first")]
    DraftOpen,

    #[error("no position with id '{0}'")]
    UnknownJob(String),

    #[error("requests can only be submitted from the last step")]
    NotOnLastStep,

    #[error("a submission is already in progress")]
    SubmissionInProgress,

    #[error("this request has already been submitted")]
    AlreadySubmitted,

    #[error("no submission is in progress")]
    NotSyncing,

    #[error("this request has not been submitted yet")]
    NotSubmitted,
}

/// One hiring manager's pass through the intake form
#[derive(Debug, Clone)]
pub struct FormSession {
    form: FormData,
    step: usize,
    errors: ErrorMap,
    phase: Phase,
    sync_status: SyncStatus,
    job_view: JobView,
    today: Clock,
}

impl FormSession {
    pub fn new(variant: Variant) -> Self {
        Self::with_clock(variant, local_today)
    }

    pub fn with_clock(variant: Variant, today: Clock) -> Self {
        Self {
            form: FormData::empty(variant),
            step: 1,
            errors: ErrorMap::new(),
            phase: Phase::Editing,
            sync_status: SyncStatus::default(),
            job_view: JobView::List,
            today,
        }
    }

    pub fn variant(&self) -> Variant {
        self.form.variant()
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn total_steps(&self) -> usize {
        self.variant().total_steps()
    }

    pub fn step_title(&self) -> &'static str {
        self.variant().step_titles()[self.step - 1]
    }

    pub fn form(&self) -> &FormData {
        &self.form
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync_status
    }

    pub fn job_view(&self) -> &JobView {
        &self.job_view
    }

    pub fn ensure_editing(&self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Editing => Ok(()),
            Phase::Syncing => Err(SessionError::SubmissionInProgress),
            Phase::Submitted => Err(SessionError::AlreadySubmitted),
        }
    }

    fn multi(&self) -> Result<&MultiJobForm, SessionError> {
        match &self.form {
            FormData::Multi(form) => Ok(form),
            FormData::Single(_) => Err(SessionError::WrongVariant {
                expected: Variant::Multi,
            }),
        }
    }

    fn multi_mut(&mut self) -> Result<&mut MultiJobForm, SessionError> {
        match &mut self.form {
            FormData::Multi(form) => Ok(form),
            FormData::Single(_) => Err(SessionError::WrongVariant {
                expected: Variant::Multi,
            }),
        }
    }

    fn ensure_list_view(&self) -> Result<(), SessionError> {
        match self.job_view {
            JobView::List => Ok(()),
            JobView::Editing(_) => Err(SessionError::DraftOpen),
        }
    }

    fn replace_errors(&mut self, errors: ErrorMap) -> bool {
        self.errors = errors;
        self.errors.is_empty()
    }

    /// Write a form-level field and drop any message attached to it
    pub fn set_field(&mut self, field: Field, value: String) -> Result<(), SessionError> {
        self.ensure_editing()?;
        match &mut self.form {
            FormData::Single(form) => form.set(field, value)?,
            FormData::Multi(form) => form.company.set(field, value)?,
        }
        self.errors.clear_field(field);
        Ok(())
    }

    /// Recompute the error map for `step` alone and report whether it is clean
    pub fn validate_step(&mut self, step: usize) -> bool {
        let errors = step_errors(&self.form, step, (self.today)());
        self.replace_errors(errors)
    }

    pub fn validate_company_info(&mut self) -> Result<bool, SessionError> {
        let errors = company_errors(&self.multi()?.company);
        Ok(self.replace_errors(errors))
    }

    pub fn validate_job(&mut self, job: &JobDetails) -> bool {
        let errors = job_errors(job, (self.today)());
        self.replace_errors(errors)
    }

    /// Advance one step if the current one validates. Returns whether it did.
    pub fn next_step(&mut self) -> Result<bool, SessionError> {
        self.ensure_editing()?;
        if !self.validate_step(self.step) {
            debug!("Step {} has {} error(s)", self.step, self.errors.len());
            return Ok(false);
        }
        self.step = (self.step + 1).min(self.total_steps());
        Ok(true)
    }

    pub fn prev_step(&mut self) -> Result<(), SessionError> {
        self.ensure_editing()?;
        self.step = self.step.saturating_sub(1).max(1);
        Ok(())
    }

    /// Open a blank position as the draft
    pub fn add_job(&mut self) -> Result<(), SessionError> {
        self.ensure_editing()?;
        self.multi()?;
        self.ensure_list_view()?;
        let draft = JobDetails::new();
        debug!("Opened new position {}", draft.id);
        self.job_view = JobView::Editing(draft);
        Ok(())
    }

    /// Open a copy of an existing position as the draft
    pub fn edit_job(&mut self, id: &str) -> Result<(), SessionError> {
        self.ensure_editing()?;
        self.ensure_list_view()?;
        let job = self
            .multi()?
            .jobs
            .iter()
            .find(|job| job.id == id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownJob(id.to_string()))?;
        self.job_view = JobView::Editing(job);
        Ok(())
    }

    pub fn draft(&self) -> Option<&JobDetails> {
        match &self.job_view {
            JobView::Editing(draft) => Some(draft),
            JobView::List => None,
        }
    }

    pub fn set_draft_field(&mut self, field: Field, value: String) -> Result<(), SessionError> {
        self.ensure_editing()?;
        self.multi()?;
        match &mut self.job_view {
            JobView::Editing(draft) => draft.set(field, value)?,
            JobView::List => return Err(SessionError::NoDraft),
        }
        self.errors.clear_field(field);
        Ok(())
    }

    /// Commit the draft into the list if it validates. Returns whether it did.
    pub fn save_job(&mut self) -> Result<bool, SessionError> {
        self.ensure_editing()?;
        self.multi()?;
        let draft = self.draft().cloned().ok_or(SessionError::NoDraft)?;
        if !self.validate_job(&draft) {
            return Ok(false);
        }
        debug!("Saving position {}", draft.id);
        self.multi_mut()?.upsert(draft);
        self.job_view = JobView::List;
        Ok(true)
    }

    pub fn cancel_job(&mut self) -> Result<(), SessionError> {
        self.ensure_editing()?;
        self.multi()?;
        if self.draft().is_none() {
            return Err(SessionError::NoDraft);
        }
        self.job_view = JobView::List;
        Ok(())
    }

    /// Remove a position. Unknown ids are ignored.
    pub fn delete_job(&mut self, id: &str) -> Result<(), SessionError> {
        self.ensure_editing()?;
        self.ensure_list_view()?;
        if self.multi_mut()?.remove(id) {
            debug!("Deleted position {}", id);
        }
        Ok(())
    }

    /// Gate a submission and, if it passes, enter `Syncing` and hand back the
    /// records to deliver. `None` means gating failed and the error map says why.
    pub fn begin_submit(&mut self) -> Result<Option<Submission>, SessionError> {
        self.ensure_editing()?;
        if self.step != self.total_steps() {
            return Err(SessionError::NotOnLastStep);
        }
        self.ensure_list_view()?;
        if !self.validate_step(self.step) {
            info!("Submission blocked by {} validation error(s)", self.errors.len());
            return Ok(None);
        }

        let submission = match &self.form {
            FormData::Single(form) => Submission {
                mode: DeliveryMode::Parallel,
                records: vec![JobRequestRecord::from(form)],
            },
            FormData::Multi(form) => Submission {
                mode: DeliveryMode::Sequential,
                records: form
                    .jobs
                    .iter()
                    .map(|job| JobRequestRecord::for_job(&form.company, job))
                    .collect(),
            },
        };
        self.phase = Phase::Syncing;
        self.sync_status = SyncStatus::default();
        Ok(Some(submission))
    }

    pub fn finish_submit(&mut self, outcome: SubmissionOutcome) -> Result<Phase, SessionError> {
        if self.phase != Phase::Syncing {
            return Err(SessionError::NotSyncing);
        }
        self.sync_status = outcome.sync_status;
        if outcome.failed {
            warn!("Every delivery failed; returning to the last step");
            let mut errors = ErrorMap::new();
            errors.set_submit(SUBMIT_FAILED_MESSAGE);
            self.errors = errors;
            self.phase = Phase::Editing;
        } else {
            self.phase = Phase::Submitted;
        }
        Ok(self.phase)
    }

    /// Gate, deliver and settle in one call, for callers that own the session
    pub async fn submit(&mut self, sinks: &Sinks) -> Result<Phase, SessionError> {
        match self.begin_submit()? {
            Some(submission) => {
                let outcome = submission.deliver(sinks).await;
                self.finish_submit(outcome)
            }
            None => Ok(self.phase),
        }
    }

    /// Start a new request after a successful submission
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Submitted {
            return Err(match self.phase {
                Phase::Syncing => SessionError::SubmissionInProgress,
                _ => SessionError::NotSubmitted,
            });
        }
        *self = Self::with_clock(self.variant(), self.today);
        Ok(())
    }
}
