use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::intake::{ErrorMap, Field, FormData, FormSession, JobView, Phase, SyncStatus, Variant};

/// Query string for session creation, e.g. `POST /sessions?variant=single`
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionQuery {
    pub variant: Option<Variant>,
}

/// Body for writing one form or draft field
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFieldRequest {
    pub field: Field,
    #[validate(length(max = 10000, message = "Value must be at most 10000 characters"))]
    pub value: String,
}

/// Everything a front end needs to render the current screen
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub variant: Variant,
    pub step: usize,
    pub total_steps: usize,
    pub step_title: &'static str,
    pub phase: Phase,
    pub form: FormData,
    pub errors: ErrorMap,
    pub sync_status: SyncStatus,
    pub job_view: JobView,
}

impl SessionView {
    pub fn new(id: &str, session: &FormSession) -> Self {
        Self {
            id: id.to_string(),
            variant: session.variant(),
            step: session.step(),
            total_steps: session.total_steps(),
            step_title: session.step_title(),
            phase: session.phase(),
            form: session.form().clone(),
            errors: session.errors().clone(),
            sync_status: session.sync_status(),
            job_view: session.job_view().clone(),
        }
    }
}
