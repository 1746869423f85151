use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::{HttpResponse, ResponseError};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::dto::SessionView;
use crate::api::validation::ErrorResponse;
use crate::intake::models::generate_id;
use crate::intake::submit::SubmissionOutcome;
use crate::intake::{FormSession, Phase, SessionError, SyncStatus, Variant};
use crate::sinks::Sinks;

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Service-level errors
#[derive(Debug)]
pub enum ServiceError {
    /// No session with this id
    NotFound(String),

    /// The controller refused the operation
    Session(SessionError),

    /// The delivery task died; the session was returned to editing
    DeliveryAborted(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::NotFound(id) => write!(f, "Session not found: {}", id),
            ServiceError::Session(e) => write!(f, "Session error: {}", e),
            ServiceError::DeliveryAborted(id) => write!(f, "Delivery aborted for session {}", id),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<SessionError> for ServiceError {
    fn from(e: SessionError) -> Self {
        ServiceError::Session(e)
    }
}

impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::NotFound(id) => {
                warn!("Session not found: {}", id);
                HttpResponse::NotFound().json(ErrorResponse::message(
                    "Not found",
                    format!("Session with id {} not found", id),
                ))
            }
            ServiceError::Session(SessionError::UnknownJob(id)) => {
                warn!("Position not found: {}", id);
                HttpResponse::NotFound().json(ErrorResponse::message(
                    "Not found",
                    format!("Position with id {} not found", id),
                ))
            }
            ServiceError::Session(e @ SessionError::Update(_)) => {
                warn!("Rejected field update: {}", e);
                HttpResponse::BadRequest()
                    .json(ErrorResponse::message("Invalid field update", e.to_string()))
            }
            ServiceError::DeliveryAborted(id) => {
                error!("Delivery aborted for session {}", id);
                HttpResponse::InternalServerError().json(ErrorResponse::message(
                    "Submission failed",
                    "Delivery was interrupted. Please try again or contact support.",
                ))
            }
            ServiceError::Session(e) => {
                warn!("Rejected session operation: {}", e);
                HttpResponse::Conflict()
                    .json(ErrorResponse::message("Operation not allowed", e.to_string()))
            }
        }
    }
}

/// A session plus the last time any request reached it
struct Tracked {
    session: FormSession,
    touched: Instant,
}

type SharedSession = Arc<Mutex<Tracked>>;

/// In-memory home of every open intake session
pub struct SessionService {
    sessions: RwLock<HashMap<String, SharedSession>>,
    sinks: Sinks,
    default_variant: Variant,
    idle_timeout: Duration,
}

impl SessionService {
    pub fn new(sinks: Sinks, default_variant: Variant) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            sinks,
            default_variant,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn sinks(&self) -> &Sinks {
        &self.sinks
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn create(&self, variant: Option<Variant>) -> SessionView {
        self.evict_idle().await;

        let variant = variant.unwrap_or(self.default_variant);
        let id = generate_id();
        let session = FormSession::new(variant);
        let view = SessionView::new(&id, &session);

        let tracked = Tracked {
            session,
            touched: Instant::now(),
        };
        self.sessions
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(tracked)));
        info!("Service: Created {:?} session id={}", variant, id);
        view
    }

    /// Drop sessions nobody has touched within the idle timeout. Sessions
    /// that are locked or still syncing are kept.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, shared| match shared.try_lock() {
            Ok(tracked) => {
                let keep = tracked.touched.elapsed() < self.idle_timeout
                    || tracked.session.phase() == Phase::Syncing;
                if !keep {
                    debug!("Service: Evicting idle session id={}", id);
                }
                keep
            }
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Service: Evicted {} idle session(s)", evicted);
        }
        evicted
    }

    async fn find(&self, id: &str) -> Result<SharedSession, ServiceError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    pub async fn view(&self, id: &str) -> Result<SessionView, ServiceError> {
        let shared = self.find(id).await?;
        let mut tracked = shared.lock().await;
        tracked.touched = Instant::now();
        Ok(SessionView::new(id, &tracked.session))
    }

    pub async fn discard(&self, id: &str) -> Result<(), ServiceError> {
        self.sessions
            .write()
            .await
            .remove(id)
            .map(|_| info!("Service: Discarded session id={}", id))
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    /// Run a synchronous controller operation and return the resulting view
    pub async fn apply<F>(&self, id: &str, operation: F) -> Result<SessionView, ServiceError>
    where
        F: FnOnce(&mut FormSession) -> Result<(), SessionError>,
    {
        let shared = self.find(id).await?;
        let mut tracked = shared.lock().await;
        tracked.touched = Instant::now();
        operation(&mut tracked.session)?;
        Ok(SessionView::new(id, &tracked.session))
    }

    /// Submit a session
    ///
    /// Delivery and the final status update run in their own task, so the
    /// session leaves `syncing` even if the caller stops waiting. The session
    /// lock is released while the sinks are being called; reads see
    /// `syncing` and any second submit is refused by the controller.
    pub async fn submit(&self, id: &str) -> Result<SessionView, ServiceError> {
        let shared = self.find(id).await?;

        let submission = {
            let mut tracked = shared.lock().await;
            tracked.touched = Instant::now();
            match tracked.session.begin_submit()? {
                Some(submission) => submission,
                None => return Ok(SessionView::new(id, &tracked.session)),
            }
        };

        info!(
            "Service: Session {} submitting {} record(s)",
            id,
            submission.records.len()
        );

        let sinks = self.sinks.clone();
        let task_session = shared.clone();
        let task_id = id.to_string();
        let delivery = tokio::spawn(async move {
            let outcome = submission.deliver(&sinks).await;

            let mut tracked = task_session.lock().await;
            tracked.touched = Instant::now();
            let phase = tracked.session.finish_submit(outcome)?;
            if outcome.failed {
                error!("Service: Session {} submission failed on every sink", task_id);
            } else {
                info!("Service: Session {} finished as {:?}", task_id, phase);
            }
            Ok::<_, SessionError>(SessionView::new(&task_id, &tracked.session))
        });

        match delivery.await {
            Ok(view) => Ok(view?),
            Err(e) => {
                error!("Service: Delivery task for session {} died: {}", id, e);
                let lost = SubmissionOutcome {
                    sync_status: SyncStatus::default(),
                    failed: true,
                };
                shared.lock().await.session.finish_submit(lost)?;
                Err(ServiceError::DeliveryAborted(id.to_string()))
            }
        }
    }
}
