//! Records attached to a case: parties, movements, hearings, documents,
//! financial records and notes.
//!
//! Creating under a case outside the caller's firm is a 400 ("case not
//! found"); listing under one is a 404.

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    routing::{delete, get, put},
};
use chrono::Utc;

use juris_auth::{ANY_ROLE, LAWYER_OR_ADMIN};
use juris_core::{CaseId, CasePartyId, DocumentId, FinancialRecordId, HearingId, NoteId};
use juris_infra::CaseRecordStore;
use juris_records::{
    CaseMovement, CaseParty, Document, FinancialRecord, FinancialRecordUpdate, Hearing,
    NewCaseMovement, NewCaseParty, NewDocument, NewFinancialRecord, NewHearing, NewNote, Note,
};

use crate::app::routes::common::parse_id;
use crate::app::{AppState, errors::ApiError};
use crate::authz::guard;
use crate::context::Session;

type Created<T> = Result<(StatusCode, Json<T>), ApiError>;

pub fn router() -> Router {
    Router::new()
        .route("/:id/parties", get(list_parties).post(add_party))
        .route("/:id/parties/:record_id", delete(delete_party))
        .route("/:id/movements", get(list_movements).post(add_movement))
        .route("/:id/hearings", get(list_hearings).post(add_hearing))
        .route("/:id/hearings/:record_id", delete(delete_hearing))
        .route("/:id/documents", get(list_documents).post(add_document))
        .route("/:id/documents/:record_id", delete(delete_document))
        .route(
            "/:id/financial-records",
            get(list_financial_records).post(add_financial_record),
        )
        .route(
            "/:id/financial-records/:record_id",
            put(update_financial_record).delete(delete_financial_record),
        )
        .route("/:id/notes", get(list_notes).post(add_note))
        .route("/:id/notes/:record_id", delete(delete_note))
}

fn ids<T>(case_id: &str, record_id: &str) -> Result<(CaseId, T), ApiError>
where
    T: core::str::FromStr<Err = juris_core::DomainError>,
{
    Ok((parse_id(case_id)?, parse_id(record_id)?))
}

// -------------------------
// Parties
// -------------------------

pub async fn add_party(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(case_id): Path<String>,
    Json(body): Json<NewCaseParty>,
) -> Created<CaseParty> {
    guard(&session, ANY_ROLE)?;
    let party = CaseParty::create(session.scope(), parse_id(&case_id)?, body.validate()?);
    let party = state.store.add_party(session.scope(), party).await?;
    Ok((StatusCode::CREATED, Json(party)))
}

pub async fn list_parties(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(case_id): Path<String>,
) -> Result<Json<Vec<CaseParty>>, ApiError> {
    guard(&session, ANY_ROLE)?;
    let case_id: CaseId = parse_id(&case_id)?;
    Ok(Json(state.store.list_parties(session.scope(), case_id).await?))
}

pub async fn delete_party(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path((case_id, record_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    guard(&session, ANY_ROLE)?;
    let (case_id, id) = ids::<CasePartyId>(&case_id, &record_id)?;
    state.store.delete_party(session.scope(), case_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -------------------------
// Movements
// -------------------------

pub async fn add_movement(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(case_id): Path<String>,
    Json(body): Json<NewCaseMovement>,
) -> Created<CaseMovement> {
    guard(&session, ANY_ROLE)?;
    let movement = CaseMovement::create(
        session.scope(),
        parse_id(&case_id)?,
        body.validate()?,
        Utc::now(),
    );
    let movement = state.store.add_movement(session.scope(), movement).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// Most recent movement first.
pub async fn list_movements(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(case_id): Path<String>,
) -> Result<Json<Vec<CaseMovement>>, ApiError> {
    guard(&session, ANY_ROLE)?;
    let case_id: CaseId = parse_id(&case_id)?;
    Ok(Json(
        state.store.list_movements(session.scope(), case_id).await?,
    ))
}

// -------------------------
// Hearings
// -------------------------

pub async fn add_hearing(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(case_id): Path<String>,
    Json(body): Json<NewHearing>,
) -> Created<Hearing> {
    guard(&session, ANY_ROLE)?;
    let hearing = Hearing::create(session.scope(), parse_id(&case_id)?, body.validate()?);
    let hearing = state.store.add_hearing(session.scope(), hearing).await?;
    Ok((StatusCode::CREATED, Json(hearing)))
}

pub async fn list_hearings(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(case_id): Path<String>,
) -> Result<Json<Vec<Hearing>>, ApiError> {
    guard(&session, ANY_ROLE)?;
    let case_id: CaseId = parse_id(&case_id)?;
    Ok(Json(state.store.list_hearings(session.scope(), case_id).await?))
}

pub async fn delete_hearing(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path((case_id, record_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    guard(&session, ANY_ROLE)?;
    let (case_id, id) = ids::<HearingId>(&case_id, &record_id)?;
    state.store.delete_hearing(session.scope(), case_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -------------------------
// Documents
// -------------------------

/// The uploader is always the caller.
pub async fn add_document(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(case_id): Path<String>,
    Json(body): Json<NewDocument>,
) -> Created<Document> {
    guard(&session, ANY_ROLE)?;
    let document = Document::create(
        session.scope(),
        parse_id(&case_id)?,
        session.user_id(),
        body.validate()?,
        Utc::now(),
    );
    let document = state.store.add_document(session.scope(), document).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn list_documents(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(case_id): Path<String>,
) -> Result<Json<Vec<Document>>, ApiError> {
    guard(&session, ANY_ROLE)?;
    let case_id: CaseId = parse_id(&case_id)?;
    Ok(Json(
        state.store.list_documents(session.scope(), case_id).await?,
    ))
}

pub async fn delete_document(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path((case_id, record_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    guard(&session, ANY_ROLE)?;
    let (case_id, id) = ids::<DocumentId>(&case_id, &record_id)?;
    state.store.delete_document(session.scope(), case_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -------------------------
// Financial records (lawyer or admin only)
// -------------------------

pub async fn add_financial_record(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(case_id): Path<String>,
    Json(body): Json<NewFinancialRecord>,
) -> Created<FinancialRecord> {
    guard(&session, LAWYER_OR_ADMIN)?;
    let record = FinancialRecord::create(session.scope(), parse_id(&case_id)?, body.validate()?);
    let record = state
        .store
        .add_financial_record(session.scope(), record)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_financial_records(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(case_id): Path<String>,
) -> Result<Json<Vec<FinancialRecord>>, ApiError> {
    guard(&session, LAWYER_OR_ADMIN)?;
    let case_id: CaseId = parse_id(&case_id)?;
    Ok(Json(
        state
            .store
            .list_financial_records(session.scope(), case_id)
            .await?,
    ))
}

pub async fn update_financial_record(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path((case_id, record_id)): Path<(String, String)>,
    Json(body): Json<FinancialRecordUpdate>,
) -> Result<Json<FinancialRecord>, ApiError> {
    guard(&session, LAWYER_OR_ADMIN)?;
    let (case_id, id) = ids::<FinancialRecordId>(&case_id, &record_id)?;
    let record = state
        .store
        .update_financial_record(session.scope(), case_id, id, body.validate()?)
        .await?;
    Ok(Json(record))
}

pub async fn delete_financial_record(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path((case_id, record_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    guard(&session, LAWYER_OR_ADMIN)?;
    let (case_id, id) = ids::<FinancialRecordId>(&case_id, &record_id)?;
    state
        .store
        .delete_financial_record(session.scope(), case_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// -------------------------
// Notes
// -------------------------

/// The author is always the caller.
pub async fn add_note(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(case_id): Path<String>,
    Json(body): Json<NewNote>,
) -> Created<Note> {
    guard(&session, ANY_ROLE)?;
    let note = Note::create(
        session.scope(),
        parse_id(&case_id)?,
        session.user_id(),
        body.validate()?,
        Utc::now(),
    );
    let note = state.store.add_note(session.scope(), note).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn list_notes(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path(case_id): Path<String>,
) -> Result<Json<Vec<Note>>, ApiError> {
    guard(&session, ANY_ROLE)?;
    let case_id: CaseId = parse_id(&case_id)?;
    Ok(Json(state.store.list_notes(session.scope(), case_id).await?))
}

pub async fn delete_note(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<Session>,
    Path((case_id, record_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    guard(&session, ANY_ROLE)?;
    let (case_id, id) = ids::<NoteId>(&case_id, &record_id)?;
    state.store.delete_note(session.scope(), case_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
