//! Document HTTP routes
//!
//! Endpoints for upload, retrieval (inline view and attachment download),
//! update, delete, search, and the audit surfaces. Actor identity comes
//! from `x-user-id`/`x-user-role`/`x-session-id` headers plus the source
//! address and user agent.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actor::Actor;
use crate::audit::{AuditLogEntry, OperationStats};
use crate::catalog::{DocumentType, DocumentTypeCatalog};
use crate::document::{
    DocumentError, DocumentPatch, DocumentStore, DocumentView, ReadPurpose, UploadRequest,
    UserAuditRecord,
};
use crate::search::{DocumentFilter, SearchError, SearchIndex, TypeStats};
use crate::storage::LocalBackend;

/// Upper bound on a multipart upload body; per-type policy is stricter
const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// State shared across document handlers
pub struct AppState {
    pub store: Arc<DocumentStore<LocalBackend>>,
    pub search: Arc<SearchIndex>,
    pub catalog: Arc<DocumentTypeCatalog>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn reply_error(message: String, code: u16) -> ErrorReply {
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ErrorResponse {
            error: message,
            code,
        }),
    )
}

fn document_error(e: DocumentError) -> ErrorReply {
    reply_error(e.to_string(), e.status_code())
}

fn search_error(e: SearchError) -> ErrorReply {
    reply_error(e.to_string(), e.status_code())
}

fn bad_request(message: impl Into<String>) -> ErrorReply {
    reply_error(message.into(), 400)
}

fn internal_error(message: impl Into<String>) -> ErrorReply {
    reply_error(message.into(), 500)
}

fn actor_from_headers(headers: &HeaderMap) -> Actor {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let mut actor = Actor::new(header("x-user-id").unwrap_or_else(|| "anonymous".to_string()));
    if let Some(role) = header("x-user-role") {
        actor = actor.with_role(role);
    }
    if let Some(session) = header("x-session-id") {
        actor = actor.with_session(session);
    }
    if let Some(ip) = header("x-forwarded-for") {
        actor = actor.with_ip(ip);
    }
    if let Some(user_agent) = header("user-agent") {
        actor = actor.with_user_agent(user_agent);
    }
    actor
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub hard: bool,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    pub within_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub entity_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrailQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AuditStatsQuery {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct TypesQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListByEntityQuery {
    pub document_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub documents: Vec<DocumentView>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

// ==================
// Router
// ==================

/// Create the document routes
pub fn document_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/document-types", get(list_types_handler))
        .route("/documents", post(upload_handler))
        .route("/documents", get(search_handler))
        .route("/documents/expiring", get(expiring_handler))
        .route("/documents/stats", get(stats_handler))
        .route("/documents/:id", get(get_handler))
        .route("/documents/:id", patch(update_handler))
        .route("/documents/:id", delete(delete_handler))
        .route("/documents/:id/restore", post(restore_handler))
        .route("/documents/:id/view", get(view_handler))
        .route("/documents/:id/download", get(download_handler))
        .route("/documents/:id/audit", get(audit_trail_handler))
        .route("/audit/stats", get(audit_stats_handler))
        .route("/audit/users/:user_id", get(user_trail_handler))
        .route(
            "/entities/:entity_type/:external_id/documents",
            get(list_by_entity_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

// ==================
// Handlers
// ==================

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn list_types_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TypesQuery>,
) -> Json<Vec<DocumentType>> {
    let types = state
        .catalog
        .list(query.category.as_deref())
        .into_iter()
        .cloned()
        .collect();
    Json(types)
}

async fn upload_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentView>), ErrorReply> {
    let actor = actor_from_headers(&headers);

    let mut entity_type = None;
    let mut external_entity_id = None;
    let mut entity_name = None;
    let mut document_type = None;
    let mut document_number = None;
    let mut expiry_date = None;
    let mut notes = None;
    let mut metadata = None;
    let mut file: Option<(String, String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("unnamed").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| bad_request(e.to_string()))?;
                file = Some((file_name, content_type, bytes));
            }
            "entity_type" => {
                entity_type = Some(field.text().await.map_err(|e| bad_request(e.to_string()))?);
            }
            "external_entity_id" => {
                let text = field.text().await.map_err(|e| bad_request(e.to_string()))?;
                let id = text
                    .parse::<i64>()
                    .map_err(|_| bad_request(format!("invalid external_entity_id: {}", text)))?;
                external_entity_id = Some(id);
            }
            "entity_name" => {
                entity_name = Some(field.text().await.map_err(|e| bad_request(e.to_string()))?);
            }
            "document_type" => {
                document_type = Some(field.text().await.map_err(|e| bad_request(e.to_string()))?);
            }
            "document_number" => {
                document_number =
                    Some(field.text().await.map_err(|e| bad_request(e.to_string()))?);
            }
            "expiry_date" => {
                let text = field.text().await.map_err(|e| bad_request(e.to_string()))?;
                let parsed = text
                    .parse::<DateTime<Utc>>()
                    .map_err(|_| bad_request(format!("invalid expiry_date: {}", text)))?;
                expiry_date = Some(parsed);
            }
            "notes" => {
                notes = Some(field.text().await.map_err(|e| bad_request(e.to_string()))?);
            }
            "metadata" => {
                let text = field.text().await.map_err(|e| bad_request(e.to_string()))?;
                let value = serde_json::from_str(&text)
                    .map_err(|e| bad_request(format!("invalid metadata JSON: {}", e)))?;
                metadata = Some(value);
            }
            _ => {}
        }
    }

    let (original_file_name, mime_type, bytes) =
        file.ok_or_else(|| bad_request("missing file part"))?;
    let entity_type = entity_type.ok_or_else(|| bad_request("missing entity_type"))?;
    let external_entity_id =
        external_entity_id.ok_or_else(|| bad_request("missing external_entity_id"))?;
    let document_type = document_type.ok_or_else(|| bad_request("missing document_type"))?;

    let request = UploadRequest {
        entity_type,
        external_entity_id,
        entity_name,
        type_name: document_type,
        document_number,
        original_file_name,
        bytes: bytes.to_vec(),
        mime_type,
        expiry_date,
        notes,
        metadata,
    };

    // Hashing and file I/O stay off the request-serving threads
    let store = state.store.clone();
    let view = tokio::task::spawn_blocking(move || store.upload(request, &actor))
        .await
        .map_err(|e| internal_error(e.to_string()))?
        .map_err(document_error)?;

    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentView>, ErrorReply> {
    state.store.get(id).map(Json).map_err(document_error)
}

async fn update_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(patch): Json<DocumentPatch>,
) -> Result<Json<DocumentView>, ErrorReply> {
    let actor = actor_from_headers(&headers);
    state
        .store
        .update(id, patch, &actor)
        .map(Json)
        .map_err(document_error)
}

async fn delete_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteQuery>,
) -> Result<StatusCode, ErrorReply> {
    let actor = actor_from_headers(&headers);
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || store.delete(id, &actor, query.hard))
        .await
        .map_err(|e| internal_error(e.to_string()))?
        .map_err(document_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn restore_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentView>, ErrorReply> {
    let actor = actor_from_headers(&headers);
    state
        .store
        .restore(id, &actor)
        .map(Json)
        .map_err(document_error)
}

async fn view_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, HeaderMap, Bytes), ErrorReply> {
    serve_content(state, headers, id, ReadPurpose::View).await
}

async fn download_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, HeaderMap, Bytes), ErrorReply> {
    serve_content(state, headers, id, ReadPurpose::Download).await
}

async fn serve_content(
    state: Arc<AppState>,
    headers: HeaderMap,
    id: Uuid,
    purpose: ReadPurpose,
) -> Result<(StatusCode, HeaderMap, Bytes), ErrorReply> {
    let actor = actor_from_headers(&headers);
    let store = state.store.clone();
    let content = tokio::task::spawn_blocking(move || store.fetch_for_read(id, &actor, purpose))
        .await
        .map_err(|e| internal_error(e.to_string()))?
        .map_err(document_error)?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        "content-type",
        content
            .document
            .document
            .mime_type
            .parse()
            .unwrap_or_else(|_| "application/octet-stream".parse().expect("valid header")),
    );

    let disposition = match purpose {
        // Inline views render in place and must not be cached
        ReadPurpose::View => {
            response_headers.insert("cache-control", "no-store".parse().expect("valid header"));
            "inline".to_string()
        }
        ReadPurpose::Download => {
            let file_name = content.document.document.original_file_name.replace('"', "");
            format!("attachment; filename=\"{}\"", file_name)
        }
    };
    response_headers.insert(
        "content-disposition",
        disposition
            .parse()
            .unwrap_or_else(|_| "attachment".parse().expect("valid header")),
    );

    Ok((StatusCode::OK, response_headers, Bytes::from(content.bytes)))
}

async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<DocumentFilter>,
) -> Result<Json<SearchResponse>, ErrorReply> {
    let documents = state.search.search(&filter).map_err(search_error)?;
    Ok(Json(SearchResponse {
        total: documents.len(),
        documents,
    }))
}

async fn expiring_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExpiringQuery>,
) -> Result<Json<SearchResponse>, ErrorReply> {
    let documents = state
        .search
        .expiring(query.within_days.unwrap_or(30))
        .map_err(search_error)?;
    Ok(Json(SearchResponse {
        total: documents.len(),
        documents,
    }))
}

async fn stats_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Json<Vec<TypeStats>> {
    Json(state.search.stats(query.entity_type.as_deref()))
}

async fn audit_trail_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<TrailQuery>,
) -> Json<Vec<AuditLogEntry>> {
    Json(state.store.audit_trail(id, query.limit))
}

async fn user_trail_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Json<Vec<UserAuditRecord>> {
    Json(state.store.user_audit_trail(&user_id))
}

async fn audit_stats_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditStatsQuery>,
) -> Json<Vec<OperationStats>> {
    Json(state.store.audit_stats(query.since, query.until))
}

async fn list_by_entity_handler(
    State(state): State<Arc<AppState>>,
    Path((entity_type, external_id)): Path<(String, i64)>,
    Query(query): Query<ListByEntityQuery>,
) -> Result<Json<SearchResponse>, ErrorReply> {
    let documents = state
        .store
        .list_by_entity(&entity_type, external_id, query.document_type.as_deref())
        .map_err(document_error)?;
    Ok(Json(SearchResponse {
        total: documents.len(),
        documents,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_from_headers_defaults_to_anonymous() {
        let actor = actor_from_headers(&HeaderMap::new());
        assert_eq!(actor.user_id, "anonymous");
        assert!(actor.user_role.is_none());
    }

    #[test]
    fn test_actor_from_headers_reads_identity() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", "ops-9".parse().unwrap());
        headers.insert("x-user-role", "admin".parse().unwrap());
        headers.insert("x-forwarded-for", "10.1.2.3".parse().unwrap());

        let actor = actor_from_headers(&headers);
        assert_eq!(actor.user_id, "ops-9");
        assert_eq!(actor.user_role.as_deref(), Some("admin"));
        assert_eq!(actor.ip_address.as_deref(), Some("10.1.2.3"));
    }
}
