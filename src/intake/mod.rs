//! Recruitment intake form: data model, validation rules, the per-session
//! step controller and the submission policy.

pub mod models;
pub mod session;
pub mod submit;
pub mod validation;

pub use models::{Field, FormData, Variant};
pub use session::{FormSession, JobView, Phase, SessionError};
pub use submit::SyncStatus;
pub use validation::ErrorMap;
