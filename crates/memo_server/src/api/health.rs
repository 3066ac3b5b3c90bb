use actix_web::{web, HttpResponse};
use serde::Serialize;

use super::{ApiError, ApiResponse};
use crate::AppState;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health_check)));
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
}

/// Reports ok once a pooled connection answers a trivial query.
async fn health_check(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let state = data.clone();
    let probe = web::block(move || -> Result<(), String> {
        let conn = state.memos.repo().pool().get().map_err(|err| err.to_string())?;
        conn.query_row("SELECT 1;", [], |row| row.get::<_, i64>(0))
            .map(|_| ())
            .map_err(|err| err.to_string())
    })
    .await
    .map_err(|err| err.to_string())
    .and_then(|result| result);

    if let Err(err) = probe {
        log::error!("event=health_check module=api status=error error={}", err);
        return Err(ApiError::Database("Database connection failed"));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::ok(HealthStatus {
        status: "ok",
        version: VERSION,
    })))
}
