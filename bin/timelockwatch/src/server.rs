//! The `actix-web` server (`SPEC_FULL.md` §4.9, §4.10): `GET /metrics` for
//! Prometheus scraping, `GET /emergency-reply` for confirmation links.

use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use timelockwatch_storage::SendLogStore;

struct AppState {
    send_log_store: Arc<dyn SendLogStore>,
}

pub async fn serve(bind_addr: &str, send_log_store: Arc<dyn SendLogStore>) -> anyhow::Result<()> {
    let state = web::Data::new(AppState { send_log_store });
    HttpServer::new(move || {
        App::new().app_data(state.clone()).service(metrics).service(emergency_reply)
    })
    .bind(bind_addr)
    .map_err(|e| anyhow::anyhow!("failed to bind {bind_addr}: {e}"))?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!(e))
}

#[get("/metrics")]
async fn metrics() -> impl Responder {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "failed to encode prometheus metrics");
    }
    HttpResponse::Ok().content_type("text/plain; version=0.0.4").body(buffer)
}

#[derive(serde::Deserialize)]
struct EmergencyReplyQuery {
    token: String,
}

#[get("/emergency-reply")]
async fn emergency_reply(state: web::Data<AppState>, query: web::Query<EmergencyReplyQuery>) -> impl Responder {
    match timelockwatch_notify::confirm(&query.token, state.send_log_store.as_ref()).await {
        Ok(timelockwatch_notify::ConfirmOutcome::Confirmed { .. }) => {
            HttpResponse::Ok().body("Thanks, your reply has been recorded.")
        }
        Ok(timelockwatch_notify::ConfirmOutcome::AlreadyConfirmed { .. }) => {
            HttpResponse::Ok().body("This notification was already confirmed.")
        }
        Err(_) => HttpResponse::NotFound().body("invalid or expired confirmation link"),
    }
}
