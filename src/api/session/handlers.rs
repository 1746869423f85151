use actix_web::{
    delete, get, patch, post,
    web::{scope, Data, Path, Query, ServiceConfig},
    HttpResponse,
};
use actix_web_validator::Json;

use super::dto::{CreateSessionQuery, UpdateFieldRequest};
use super::service::{ServiceError, SessionService};

type HandlerResult = Result<HttpResponse, ServiceError>;

#[post("")]
async fn create_session(
    service: Data<SessionService>,
    query: Query<CreateSessionQuery>,
) -> HttpResponse {
    let view = service.create(query.into_inner().variant).await;
    HttpResponse::Created().json(view)
}

#[get("/{id}")]
async fn get_session(service: Data<SessionService>, id: Path<String>) -> HandlerResult {
    Ok(HttpResponse::Ok().json(service.view(&id).await?))
}

#[delete("/{id}")]
async fn discard_session(service: Data<SessionService>, id: Path<String>) -> HandlerResult {
    service.discard(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[patch("/{id}/fields")]
async fn update_field(
    service: Data<SessionService>,
    id: Path<String>,
    body: Json<UpdateFieldRequest>,
) -> HandlerResult {
    let UpdateFieldRequest { field, value } = body.into_inner();
    let view = service
        .apply(&id, |session| session.set_field(field, value))
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/{id}/next")]
async fn next_step(service: Data<SessionService>, id: Path<String>) -> HandlerResult {
    let view = service
        .apply(&id, |session| session.next_step().map(drop))
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Re-check the current step without moving
#[post("/{id}/validate")]
async fn validate_step(service: Data<SessionService>, id: Path<String>) -> HandlerResult {
    let view = service
        .apply(&id, |session| {
            session.ensure_editing()?;
            session.validate_step(session.step());
            Ok(())
        })
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/{id}/prev")]
async fn prev_step(service: Data<SessionService>, id: Path<String>) -> HandlerResult {
    let view = service.apply(&id, |session| session.prev_step()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/{id}/jobs")]
async fn add_job(service: Data<SessionService>, id: Path<String>) -> HandlerResult {
    let view = service.apply(&id, |session| session.add_job()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/{id}/jobs/{job_id}/edit")]
async fn edit_job(service: Data<SessionService>, path: Path<(String, String)>) -> HandlerResult {
    let (id, job_id) = path.into_inner();
    let view = service
        .apply(&id, |session| session.edit_job(&job_id))
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[delete("/{id}/jobs/{job_id}")]
async fn delete_job(service: Data<SessionService>, path: Path<(String, String)>) -> HandlerResult {
    let (id, job_id) = path.into_inner();
    let view = service
        .apply(&id, |session| session.delete_job(&job_id))
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[patch("/{id}/draft")]
async fn update_draft(
    service: Data<SessionService>,
    id: Path<String>,
    body: Json<UpdateFieldRequest>,
) -> HandlerResult {
    let UpdateFieldRequest { field, value } = body.into_inner();
    let view = service
        .apply(&id, |session| session.set_draft_field(field, value))
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/{id}/draft/save")]
async fn save_draft(service: Data<SessionService>, id: Path<String>) -> HandlerResult {
    let view = service
        .apply(&id, |session| session.save_job().map(drop))
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/{id}/draft/cancel")]
async fn cancel_draft(service: Data<SessionService>, id: Path<String>) -> HandlerResult {
    let view = service.apply(&id, |session| session.cancel_job()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/{id}/submit")]
async fn submit(service: Data<SessionService>, id: Path<String>) -> HandlerResult {
    Ok(HttpResponse::Ok().json(service.submit(&id).await?))
}

#[post("/{id}/reset")]
async fn reset(service: Data<SessionService>, id: Path<String>) -> HandlerResult {
    let view = service.apply(&id, |session| session.reset()).await?;
    Ok(HttpResponse::Ok().json(view))
}

pub fn session_config(config: &mut ServiceConfig) {
    config.service(
        scope("sessions")
            .service(create_session)
            .service(get_session)
            .service(discard_session)
            .service(update_field)
            .service(next_step)
            .service(validate_step)
            .service(prev_step)
            .service(add_job)
            .service(edit_job)
            .service(delete_job)
            .service(update_draft)
            .service(save_draft)
            .service(cancel_draft)
            .service(submit)
            .service(reset),
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    use super::*;
    use crate::api::validation::json_config;
    use crate::intake::Variant;
    use crate::sinks::fake::ScriptedSink;
    use crate::sinks::{Sink, SinkKind, Sinks};

    fn service_with(sinks: Sinks) -> Data<SessionService> {
        Data::new(SessionService::new(sinks, Variant::Multi))
    }

    fn succeeding_sinks() -> Sinks {
        Sinks::new(
            Some(Arc::new(ScriptedSink::succeeding(SinkKind::DataStore)) as Arc<dyn Sink>),
            Some(Arc::new(ScriptedSink::succeeding(SinkKind::Notification)) as Arc<dyn Sink>),
        )
    }

    fn tomorrow() -> String {
        (chrono::Local::now().date_naive() + chrono::Duration::days(1))
            .format("%Y-%m-%d")
            .to_string()
    }

    macro_rules! app {
        ($service:expr) => {
            test::init_service(
                App::new()
                    .app_data($service.clone())
                    .app_data(json_config(64 * 1024))
                    .configure(session_config),
            )
            .await
        };
    }

    macro_rules! call {
        ($app:expr, $req:expr) => {{
            let resp = test::call_service(&$app, $req.to_request()).await;
            let status = resp.status();
            let body: Value = test::read_body_json(resp).await;
            (status, body)
        }};
    }

    #[actix_web::test]
    async fn multi_job_request_end_to_end() {
        let service = service_with(succeeding_sinks());
        let app = app!(service);

        let (status, view) = call!(app, test::TestRequest::post().uri("/sessions"));
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(view["variant"], json!("multi"));
        assert_eq!(view["totalSteps"], json!(2));
        let id = view["id"].as_str().unwrap().to_string();

        for (field, value) in [
            ("email", "hr@acme.com"),
            ("companyName", "Acme"),
            ("contactPhone", "+251911223344"),
        ] {
            let (status, _) = call!(
                app,
                test::TestRequest::patch()
                    .uri(&format!("/sessions/{id}/fields"))
                    .set_json(json!({ "field": field, "value": value }))
            );
            assert_eq!(status, StatusCode::OK);
        }

        let (_, view) = call!(app, test::TestRequest::post().uri(&format!("/sessions/{id}/next")));
        assert_eq!(view["step"], json!(2));
        assert_eq!(view["stepTitle"], json!("Positions"));

        let (_, view) = call!(app, test::TestRequest::post().uri(&format!("/sessions/{id}/jobs")));
        assert_eq!(view["jobView"]["mode"], json!("editing"));

        let deadline = tomorrow();
        for (field, value) in [
            ("jobTitle", "Engineer"),
            ("workLocation", "Addis Ababa"),
            ("personnelCount", "2"),
            ("jobDescription", "Build things"),
            ("deadline", deadline.as_str()),
        ] {
            let (status, _) = call!(
                app,
                test::TestRequest::patch()
                    .uri(&format!("/sessions/{id}/draft"))
                    .set_json(json!({ "field": field, "value": value }))
            );
            assert_eq!(status, StatusCode::OK);
        }

        let (_, view) = call!(
            app,
            test::TestRequest::post().uri(&format!("/sessions/{id}/draft/save"))
        );
        assert_eq!(view["jobView"], json!({ "mode": "list" }));
        assert_eq!(view["form"]["jobs"].as_array().unwrap().len(), 1);

        let (status, view) = call!(
            app,
            test::TestRequest::post().uri(&format!("/sessions/{id}/submit"))
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["phase"], json!("submitted"));
        assert_eq!(
            view["syncStatus"],
            json!({ "supabase": "success", "telegram": "success" })
        );

        let (_, view) = call!(app, test::TestRequest::post().uri(&format!("/sessions/{id}/reset")));
        assert_eq!(view["phase"], json!("editing"));
        assert_eq!(view["step"], json!(1));
        assert_eq!(view["errors"], json!({}));
    }

    #[actix_web::test]
    async fn validation_errors_come_back_in_the_view() {
        let service = service_with(Sinks::default());
        let app = app!(service);
        let (_, view) = call!(app, test::TestRequest::post().uri("/sessions?variant=single"));
        let id = view["id"].as_str().unwrap().to_string();

        let (status, view) = call!(app, test::TestRequest::post().uri(&format!("/sessions/{id}/next")));

        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["step"], json!(1));
        assert_eq!(view["errors"]["email"], json!("Email is required"));
        assert_eq!(view["errors"]["jobTitle"], json!("Job title is required"));

        call!(
            app,
            test::TestRequest::patch()
                .uri(&format!("/sessions/{id}/fields"))
                .set_json(json!({ "field": "email", "value": "hr@acme.com" }))
        );
        let (status, view) = call!(
            app,
            test::TestRequest::post().uri(&format!("/sessions/{id}/validate"))
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["step"], json!(1));
        assert!(view["errors"].get("email").is_none());
        assert_eq!(view["errors"]["companyName"], json!("Company name is required"));
    }

    #[actix_web::test]
    async fn controller_misuse_maps_to_client_errors() {
        let service = service_with(Sinks::default());
        let app = app!(service);
        let (_, view) = call!(app, test::TestRequest::post().uri("/sessions?variant=single"));
        let id = view["id"].as_str().unwrap().to_string();

        let (status, body) = call!(app, test::TestRequest::post().uri(&format!("/sessions/{id}/jobs")));
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], json!("Operation not allowed"));

        let (status, _) = call!(
            app,
            test::TestRequest::patch()
                .uri(&format!("/sessions/{id}/fields"))
                .set_json(json!({ "field": "jobSite", "value": "Hybrid" }))
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call!(
            app,
            test::TestRequest::patch()
                .uri(&format!("/sessions/{id}/fields"))
                .set_json(json!({ "field": "salary", "value": "x" }))
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Request validation failed"));

        let (status, _) = call!(app, test::TestRequest::get().uri("/sessions/nope"));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn oversized_values_are_rejected() {
        let service = service_with(Sinks::default());
        let app = app!(service);
        let (_, view) = call!(app, test::TestRequest::post().uri("/sessions"));
        let id = view["id"].as_str().unwrap().to_string();

        let (status, body) = call!(
            app,
            test::TestRequest::patch()
                .uri(&format!("/sessions/{id}/fields"))
                .set_json(json!({ "field": "companyName", "value": "a".repeat(10001) }))
        );

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Validation failed"));
        assert!(body["fields"]["value"]["errors"].is_array());
    }

    #[actix_web::test]
    async fn discarded_sessions_are_gone() {
        let service = service_with(Sinks::default());
        let app = app!(service);
        let (_, view) = call!(app, test::TestRequest::post().uri("/sessions"));
        let id = view["id"].as_str().unwrap().to_string();

        let resp = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!("/sessions/{id}"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(service.session_count().await, 0);
    }
}
