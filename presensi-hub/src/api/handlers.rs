//! HTTP request handlers
//!
//! Drives the scan sessions, the roster mutation path, and the read
//! endpoints the dashboard and export views consume.

use crate::aggregate::{self, stats, DashboardSnapshot};
use crate::roster as roster_mutation;
use crate::scan::{ScanOutcome, SessionPhase};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use presensi_common::db::roster;
use presensi_common::events::HubEvent;
use presensi_common::time::today;
use presensi_common::{
    AttendanceRecord, AttendanceStatus, Error, Gender, MasterStudent, RecordKey,
};
use serde::{Deserialize, Serialize};
use tracing::error;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub operator: String,
    pub operator_class: String,
    pub payload: String,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub phase: SessionPhase,
    #[serde(flatten)]
    pub outcome: ScanOutcome,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub operator: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub record: AttendanceRecord,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub operator: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct RosterAttendanceRequest {
    pub student_id: String,
    pub status: AttendanceStatus,
    pub admin: String,
}

#[derive(Debug, Deserialize)]
pub struct AddStudentRequest {
    /// Stable roster id; defaults to the student's derived record key
    pub id: Option<String>,
    pub name: String,
    pub class: String,
    pub gender: Gender,
}

#[derive(Debug, Serialize)]
pub struct RosterResponse {
    pub students: Vec<MasterStudent>,
}

#[derive(Debug, Serialize)]
pub struct PartitionResponse {
    pub day: NaiveDate,
    pub records: Vec<AttendanceRecord>,
}

#[derive(Debug, Serialize)]
pub struct DeleteRecordsResponse {
    pub deleted: u64,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_response(e: Error) -> HandlerError {
    let status = match &e {
        Error::InvalidPayload(_) => StatusCode::BAD_REQUEST,
        Error::InvalidState(_) => StatusCode::CONFLICT,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        _ => {
            error!("Request failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

// ============================================================================
// Scan Session Endpoints
// ============================================================================

/// POST /scan - decode a scanned payload and run the duplicate check
///
/// Returns the resolution the operator must act on: a fresh identity, or
/// the existing record's status/time/operator for the overwrite decision.
pub async fn scan(
    State(state): State<AppState>,
    Json(req): Json<ScanRequest>,
) -> Result<Json<ScanResponse>, HandlerError> {
    let session = state.session(&req.operator, &req.operator_class).await;
    let mut session = session.lock().await;

    let outcome = session
        .handle_scan(&req.payload)
        .await
        .map_err(error_response)?;

    Ok(Json(ScanResponse {
        phase: session.phase(),
        outcome,
    }))
}

/// POST /scan/confirm - persist the pending scan with a chosen status
pub async fn confirm_scan(
    State(state): State<AppState>,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<RecordResponse>, HandlerError> {
    let session = state
        .existing_session(&req.operator)
        .await
        .ok_or_else(|| {
            error_response(Error::InvalidState(
                "no scan session for this operator".to_string(),
            ))
        })?;
    let mut session = session.lock().await;

    let record = session.confirm(req.status).await.map_err(error_response)?;

    state.broadcast_event(HubEvent::RecordUpserted {
        record: record.clone(),
        timestamp: chrono::Utc::now(),
    });

    Ok(Json(RecordResponse { record }))
}

/// POST /scan/cancel - discard the pending scan, no ledger mutation
pub async fn cancel_scan(
    State(state): State<AppState>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<StatusResponse>, HandlerError> {
    let session = state
        .existing_session(&req.operator)
        .await
        .ok_or_else(|| {
            error_response(Error::InvalidState(
                "no scan session for this operator".to_string(),
            ))
        })?;
    let mut session = session.lock().await;

    session.cancel().map_err(error_response)?;
    Ok(Json(StatusResponse {
        status: "cancelled".to_string(),
    }))
}

// ============================================================================
// Roster Endpoints
// ============================================================================

/// POST /roster/attendance - administrator sets a status from the roster
pub async fn roster_attendance(
    State(state): State<AppState>,
    Json(req): Json<RosterAttendanceRequest>,
) -> Result<Json<RecordResponse>, HandlerError> {
    let student = roster::get_student(&state.pool, &req.student_id)
        .await
        .map_err(error_response)?
        .ok_or_else(|| {
            error_response(Error::NotFound(format!(
                "no roster entry {}",
                req.student_id
            )))
        })?;

    let record = roster_mutation::set_attendance(&state.ledger, &student, req.status, &req.admin)
        .await
        .map_err(error_response)?;

    state.broadcast_event(HubEvent::RecordUpserted {
        record: record.clone(),
        timestamp: chrono::Utc::now(),
    });

    Ok(Json(RecordResponse { record }))
}

/// GET /roster - list master students
pub async fn list_roster(
    State(state): State<AppState>,
) -> Result<Json<RosterResponse>, HandlerError> {
    let students = roster::list_students(&state.pool)
        .await
        .map_err(error_response)?;
    Ok(Json(RosterResponse { students }))
}

/// POST /roster - add or update a master student
pub async fn add_student(
    State(state): State<AppState>,
    Json(req): Json<AddStudentRequest>,
) -> Result<Json<MasterStudent>, HandlerError> {
    let id = req
        .id
        .clone()
        .unwrap_or_else(|| RecordKey::derive(&req.name, &req.class).to_string());
    let student = MasterStudent {
        id,
        name: req.name,
        class: req.class,
        gender: req.gender,
    };

    roster::upsert_student(&state.pool, &student)
        .await
        .map_err(error_response)?;
    Ok(Json(student))
}

// ============================================================================
// Read Endpoints
// ============================================================================

/// GET /attendance/:day - full record list for one day (export feed)
pub async fn get_partition(
    State(state): State<AppState>,
    Path(day): Path<String>,
) -> Result<Json<PartitionResponse>, HandlerError> {
    let day = NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(|_| {
        error_response(Error::InvalidPayload(format!(
            "invalid date: {} (expected YYYY-MM-DD)",
            day
        )))
    })?;

    let records = state.ledger.partition(day).await.map_err(error_response)?;
    Ok(Json(PartitionResponse { day, records }))
}

/// GET /dashboard - current aggregate snapshot for today
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardSnapshot>, HandlerError> {
    let snapshot = aggregate::compute_snapshot(&state.ledger, today())
        .await
        .map_err(error_response)?;
    Ok(Json(snapshot))
}

/// GET /stats - global officer stats grouped by class (admin view)
pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<stats::GlobalOfficerStats>, HandlerError> {
    let mut partitions = Vec::new();
    for day in state.ledger.days().await.map_err(error_response)? {
        partitions.push(state.ledger.partition(day).await.map_err(error_response)?);
    }

    let stats = stats::global_officer_stats(partitions.iter().map(|p| p.as_slice()));
    Ok(Json(stats))
}

// ============================================================================
// Admin Endpoints
// ============================================================================

/// DELETE /operators/:name/records - remove all records by one operator
pub async fn delete_operator_records(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DeleteRecordsResponse>, HandlerError> {
    let deleted = state
        .ledger
        .delete_operator_records(&name)
        .await
        .map_err(error_response)?;
    Ok(Json(DeleteRecordsResponse { deleted }))
}
