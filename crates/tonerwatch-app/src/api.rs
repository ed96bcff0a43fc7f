// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON status API.
//
//   GET  /api/health           service liveness
//   GET  /api/printers         poll the whole fleet
//   GET  /api/printers/{name}  poll one printer
//   POST /api/printers/status  poll a selection ({"printerNames": [...]})
//
// Every request triggers a fresh poll; nothing is cached between requests.
// CORS is open so a dashboard served from another origin can call the API.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use tonerwatch_core::error::TonerwatchError;
use tonerwatch_core::types::DeviceHealth;
use tonerwatch_poll::{Fleet, FleetReport, MetricTransport};

type SharedFleet<T> = Arc<Fleet<T>>;

/// Build the API router around a fleet.
pub fn router<T: MetricTransport + 'static>(fleet: SharedFleet<T>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/printers", get(list_printers::<T>))
        .route("/api/printers/status", post(poll_selected::<T>))
        .route("/api/printers/{name}", get(printer_status::<T>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(fleet)
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: DateTime<Utc>,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "OK",
        service: "tonerwatch",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}

/// Fleet report wrapped with the `success` flag.
#[derive(Debug, Serialize)]
struct ReportBody {
    success: bool,
    #[serde(flatten)]
    report: FleetReport,
}

impl From<FleetReport> for ReportBody {
    fn from(report: FleetReport) -> Self {
        Self {
            success: true,
            report,
        }
    }
}

#[derive(Debug, Serialize)]
struct PrinterBody {
    success: bool,
    data: DeviceHealth,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    timestamp: DateTime<Utc>,
}

/// API-level failure, rendered as `{success: false, error, timestamp}`.
#[derive(Debug)]
struct ApiError(TonerwatchError);

impl From<TonerwatchError> for ApiError {
    fn from(err: TonerwatchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            TonerwatchError::UnknownDevice(_) => (StatusCode::NOT_FOUND, "Printer not found".to_string()),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        };
        let body = ErrorBody {
            success: false,
            error: message,
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}

async fn list_printers<T: MetricTransport + 'static>(
    State(fleet): State<SharedFleet<T>>,
) -> Json<ReportBody> {
    let report = fleet.poll_all().await;
    info!(online = report.online, count = report.count, "served fleet status");
    Json(report.into())
}

async fn printer_status<T: MetricTransport + 'static>(
    State(fleet): State<SharedFleet<T>>,
    Path(name): Path<String>,
) -> Result<Json<PrinterBody>, ApiError> {
    let data = fleet.poll_named(&name).await?;
    Ok(Json(PrinterBody {
        success: true,
        data,
        timestamp: Utc::now(),
    }))
}

/// Body of `POST /api/printers/status`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusRequest {
    #[serde(default)]
    printer_names: Option<Vec<String>>,
}

async fn poll_selected<T: MetricTransport + 'static>(
    State(fleet): State<SharedFleet<T>>,
    body: Option<Json<StatusRequest>>,
) -> Json<ReportBody> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let report = fleet.poll_selected(request.printer_names.as_deref()).await;
    Json(report.into())
}
