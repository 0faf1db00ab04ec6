use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use aidx_core::{CaseProfile, Error};
use aidx_engine::{triage, DecisionEngine, EngineStatus, PredictionResponse, Triage};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    engine: EngineStatus,
    cases: usize,
    model_id: String,
}

#[derive(Serialize)]
struct TriageResponse {
    #[serde(flatten)]
    prediction: PredictionResponse,
    #[serde(flatten)]
    triage: Triage,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(engine: Arc<DecisionEngine>, port: u16) -> std::io::Result<()> {
        info!(port, "starting REST API");
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(engine.clone()))
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register the decision-support routes; the app must provide
/// `web::Data<Arc<DecisionEngine>>`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/corpus/stats", web::get().to(corpus_stats))
        .route("/predict", web::post().to(predict))
        .route("/triage", web::post().to(triage_case));
}

async fn health(engine: web::Data<Arc<DecisionEngine>>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        engine: engine.status(),
        cases: engine.case_count(),
        model_id: engine.model_id().to_string(),
    }))
}

async fn corpus_stats(engine: web::Data<Arc<DecisionEngine>>) -> ActixResult<HttpResponse> {
    match engine.stats() {
        Ok(stats) => Ok(HttpResponse::Ok().json(stats)),
        Err(e @ Error::NotTrained) => Ok(HttpResponse::Conflict().json(serde_json::json!({
            "error": e.to_string()
        }))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": e.to_string()
        }))),
    }
}

// Failures are reported in the body as ERROR recommendations, never as HTTP errors.
async fn predict(
    engine: web::Data<Arc<DecisionEngine>>,
    req: web::Json<CaseProfile>,
) -> ActixResult<HttpResponse> {
    let prediction = engine.predict(&req);
    Ok(HttpResponse::Ok().json(prediction.to_response()))
}

async fn triage_case(
    engine: web::Data<Arc<DecisionEngine>>,
    req: web::Json<CaseProfile>,
) -> ActixResult<HttpResponse> {
    let prediction = engine.predict(&req);
    let triage = triage(&prediction, engine.config().review_threshold);
    Ok(HttpResponse::Ok().json(TriageResponse {
        prediction: prediction.to_response(),
        triage,
    }))
}
