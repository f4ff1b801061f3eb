// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Medical document routes: presigned uploads, listing, detail, delete.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::db::{NewDocument, NewMedicine};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{DocumentRecord, DocumentType, Medicine};
use crate::services::storage::PRESIGN_TTL_SECS;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/v1/documents/request_upload_url",
            post(request_upload_url),
        )
        .route("/api/v1/documents/complete_upload", post(complete_upload))
        .route("/api/v1/documents/upload", post(upload_document))
        .route("/api/v1/family/{id}/documents", get(list_documents))
        .route(
            "/api/v1/documents/{id}",
            get(get_document).delete(delete_document),
        )
}

/// Object key for a new document blob:
/// `documents/user_{owner}/member_{edge}/{type slug}/{uuid}{ext}`.
fn build_object_key(owner_id: i64, edge_id: i64, doc_type: DocumentType, file_name: &str) -> String {
    format!(
        "documents/user_{}/member_{}/{}/{}{}",
        owner_id,
        edge_id,
        doc_type.slug(),
        uuid::Uuid::new_v4(),
        file_extension(file_name)
    )
}

/// Extension of the uploaded file name (with leading dot), restricted to
/// ASCII alphanumerics so it is always safe inside an object key.
fn file_extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 8
                && ext.bytes().all(|b| b.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}

fn parse_document_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid date format. Use YYYY-MM-DD".to_string()))
}

// ─── Presigned Upload Flow ───────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct RequestUploadUrlRequest {
    #[validate(length(min = 1, message = "file_name is required"))]
    file_name: String,
    document_type: DocumentType,
    family_member_id: i64,
    #[serde(default = "default_content_type")]
    content_type: String,
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

#[derive(Serialize)]
pub struct RequestUploadUrlResponse {
    pub presigned_url: String,
    pub s3_key: String,
}

/// Hand out a presigned PUT URL for a direct-to-storage upload.
async fn request_upload_url(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RequestUploadUrlRequest>,
) -> Result<Json<RequestUploadUrlResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .db
        .resolve_edge(user.user_id, payload.family_member_id)
        .await?;

    let key = build_object_key(
        user.user_id,
        payload.family_member_id,
        payload.document_type,
        &payload.file_name,
    );
    let presigned_url = state.storage.presign("PUT", &key, PRESIGN_TTL_SECS)?;

    Ok(Json(RequestUploadUrlResponse {
        presigned_url,
        s3_key: state.storage.locator_for(&key),
    }))
}

#[derive(Deserialize)]
pub struct MedicineInput {
    name: String,
    #[serde(default)]
    dosage: Option<String>,
    #[serde(default)]
    frequency: Option<String>,
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct CompleteUploadRequest {
    #[validate(length(min = 1, message = "document_name is required"))]
    document_name: String,
    document_type: DocumentType,
    document_date: String,
    family_member_id: i64,
    #[serde(default)]
    description: Option<String>,
    #[validate(length(min = 1, message = "s3_key is required"))]
    s3_key: String,
    #[serde(default)]
    medicines: Vec<MedicineInput>,
}

#[derive(Serialize)]
pub struct DocumentCreatedResponse {
    pub message: String,
    pub document_id: i64,
}

/// Register metadata after a direct-to-storage upload completed.
async fn complete_upload(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CompleteUploadRequest>,
) -> Result<(StatusCode, Json<DocumentCreatedResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .db
        .resolve_edge(user.user_id, payload.family_member_id)
        .await?;

    let document_date = parse_document_date(&payload.document_date)?;

    // Locator must at least be well-formed before we store it
    crate::services::ObjectStore::parse_locator(&payload.s3_key)?;

    // Size check is best-effort; a storage hiccup here should not lose the
    // metadata the client just finished uploading
    let file_size = match state.storage.head(&payload.s3_key).await {
        Ok(size) => size,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read object size, storing 0");
            0
        }
    };

    let medicines: Vec<NewMedicine> = payload
        .medicines
        .into_iter()
        .map(|m| NewMedicine {
            name: m.name,
            dosage: m.dosage,
            frequency: m.frequency,
            duration: m.duration,
        })
        .collect();

    let record = state
        .db
        .insert_document(
            NewDocument {
                user_id: user.user_id,
                family_member_id: payload.family_member_id,
                document_name: payload.document_name,
                document_type: payload.document_type.as_str().to_string(),
                document_date,
                description: payload.description,
                file_path: payload.s3_key,
                file_size,
            },
            &medicines,
        )
        .await?;

    tracing::info!(
        user_id = user.user_id,
        document_id = record.id,
        "Document registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(DocumentCreatedResponse {
            message: "Document registered successfully".to_string(),
            document_id: record.id,
        }),
    ))
}

/// Direct multipart upload: the server stores the bytes itself, then
/// registers the metadata.
async fn upload_document(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentCreatedResponse>)> {
    let mut document_name = None;
    let mut document_type = None;
    let mut document_date = None;
    let mut family_member_id = None;
    let mut description = None;
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "document" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            "document_name" => document_name = Some(read_text_field(field).await?),
            "document_type" => document_type = Some(read_text_field(field).await?),
            "document_date" => document_date = Some(read_text_field(field).await?),
            "family_member_id" => family_member_id = Some(read_text_field(field).await?),
            "description" => description = Some(read_text_field(field).await?),
            _ => {}
        }
    }

    let (file_name, content_type, bytes) = file
        .filter(|(_, _, bytes)| !bytes.is_empty())
        .ok_or_else(|| AppError::BadRequest("No document file provided".to_string()))?;

    let (Some(document_name), Some(document_type), Some(document_date), Some(family_member_id)) =
        (document_name, document_type, document_date, family_member_id)
    else {
        return Err(AppError::BadRequest(
            "Missing required document information".to_string(),
        ));
    };

    let doc_type: DocumentType = serde_json::from_value(serde_json::Value::String(
        document_type.clone(),
    ))
    .map_err(|_| AppError::BadRequest(format!("Unknown document type: {}", document_type)))?;
    let family_member_id: i64 = family_member_id
        .parse()
        .map_err(|_| AppError::BadRequest("family_member_id must be an integer".to_string()))?;
    let document_date = parse_document_date(&document_date)?;

    state.db.resolve_edge(user.user_id, family_member_id).await?;

    let file_size = bytes.len() as i64;
    let key = build_object_key(user.user_id, family_member_id, doc_type, &file_name);
    state.storage.put(&key, bytes, &content_type).await?;

    let record = state
        .db
        .insert_document(
            NewDocument {
                user_id: user.user_id,
                family_member_id,
                document_name,
                document_type: doc_type.as_str().to_string(),
                document_date,
                description,
                file_path: state.storage.locator_for(&key),
                file_size,
            },
            &[],
        )
        .await?;

    tracing::info!(
        user_id = user.user_id,
        document_id = record.id,
        size = file_size,
        "Document uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(DocumentCreatedResponse {
            message: "Document uploaded successfully".to_string(),
            document_id: record.id,
        }),
    ))
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart field: {}", e)))
}

// ─── Listing / Detail / Delete ───────────────────────────────

#[derive(Serialize)]
pub struct DocumentSummary {
    pub id: i64,
    pub document_name: String,
    pub document_type: String,
    pub document_date: NaiveDate,
    pub description: Option<String>,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
    /// Presigned GET URL, absent if presigning failed
    pub download_url: Option<String>,
}

impl DocumentSummary {
    fn build(doc: DocumentRecord, state: &AppState) -> Self {
        let download_url = state
            .storage
            .presign_get_locator(&doc.file_path, PRESIGN_TTL_SECS)
            .ok();
        Self {
            id: doc.id,
            document_name: doc.document_name,
            document_type: doc.document_type,
            document_date: doc.document_date,
            description: doc.description,
            file_size: doc.file_size,
            created_at: doc.created_at,
            download_url,
        }
    }
}

#[derive(Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummary>,
    pub count: usize,
}

/// List documents for one family edge (0 = the caller's own), newest
/// document date first.
async fn list_documents(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(edge_id): Path<i64>,
) -> Result<Json<DocumentListResponse>> {
    state.db.resolve_edge(user.user_id, edge_id).await?;

    let documents: Vec<DocumentSummary> = state
        .db
        .list_documents(user.user_id, edge_id)
        .await?
        .into_iter()
        .map(|doc| DocumentSummary::build(doc, &state))
        .collect();
    let count = documents.len();

    Ok(Json(DocumentListResponse { documents, count }))
}

#[derive(Serialize)]
pub struct DocumentDetailResponse {
    #[serde(flatten)]
    pub document: DocumentSummary,
    pub medicines: Vec<Medicine>,
}

/// Get one document with its medicines.
async fn get_document(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(document_id): Path<i64>,
) -> Result<Json<DocumentDetailResponse>> {
    let doc = state
        .db
        .get_document(user.user_id, document_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    let medicines = state.db.list_medicines(doc.id).await?;

    Ok(Json(DocumentDetailResponse {
        document: DocumentSummary::build(doc, &state),
        medicines,
    }))
}

#[derive(Serialize)]
pub struct DeleteDocumentResponse {
    pub message: String,
}

/// Delete a document's metadata (and medicines). The storage object is
/// left in place.
async fn delete_document(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(document_id): Path<i64>,
) -> Result<Json<DeleteDocumentResponse>> {
    state.db.delete_document(user.user_id, document_id).await?;

    tracing::info!(user_id = user.user_id, document_id, "Document deleted");

    Ok(Json(DeleteDocumentResponse {
        message: "Document deleted successfully".to_string(),
    }))
}
