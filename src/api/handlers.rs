// HTTP request handlers for API endpoints

use actix_web::{web, HttpRequest, HttpResponse, Result};

use crate::api::models::*;
use crate::api::AppState;
use crate::error::RankingError;
use crate::model::RankingKey;

fn failure_response(err: &RankingError) -> HttpResponse {
    if err.is_client_error() {
        HttpResponse::BadRequest()
            .json(ErrorBody::new("Invalid ranking key").with_details(err.to_string()))
    } else {
        HttpResponse::InternalServerError()
            .json(ErrorBody::new("Failed to fetch rankings").with_details(err.to_string()))
    }
}

async fn lookup(state: &AppState, key: Result<RankingKey, RankingError>) -> HttpResponse {
    let key = match key {
        Ok(key) => key,
        Err(e) => {
            tracing::info!(error = %e, "rejected ranking lookup");
            return failure_response(&e);
        }
    };

    match state.orchestrator.resolve(&key).await {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(e) => {
            tracing::error!(key = %key, error = %e, "ranking lookup failed");
            failure_response(&e)
        }
    }
}

/// GET /api/rankings/{region}/{serviceType}/{year}/{month}
pub async fn get_rankings(
    path: web::Path<(String, String, String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (region, service_type, year, month) = path.into_inner();
    tracing::info!(%region, %service_type, %year, %month, "rankings requested");
    let key = RankingKey::parse(&region, &service_type, &year, &month);
    Ok(lookup(&state, key).await)
}

/// GET /api/rankings?region=&serviceType=&year=&month=
pub async fn get_rankings_by_query(
    query: web::Query<RankingQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let RankingQuery {
        region,
        service_type,
        year,
        month,
    } = query.into_inner();
    let (Some(region), Some(service_type), Some(year), Some(month)) = (region, service_type, year, month)
    else {
        return Ok(HttpResponse::BadRequest().json(ErrorBody::new("Missing required parameters")));
    };
    let key = RankingKey::parse(&region, &service_type, &year, &month);
    Ok(lookup(&state, key).await)
}

/// POST /api/rankings/update
pub async fn trigger_update(state: web::Data<AppState>) -> Result<HttpResponse> {
    tracing::info!("manual ranking update requested");
    let report = state.scheduler.run_current_period().await;
    Ok(HttpResponse::Ok().json(UpdateResponse::from(report)))
}

/// Health check endpoint
pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    let database = match state.orchestrator.store().ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "health check database ping failed");
            "disconnected"
        }
    };

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        database: database.to_string(),
    }))
}

/// JSON 404 for every unmatched route
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse> {
    tracing::info!(method = %req.method(), path = %req.path(), "route not found");
    Ok(HttpResponse::NotFound().json(ErrorBody::new("Route not found").with_path(req.uri().to_string())))
}
