use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::get;
use axum::{Extension, Json, Router};
use tracing::debug;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::gateway::SubmissionMeta;
use crate::middleware::client_ip::ClientIp;
use crate::schemas::contact::{
    ContactCandidate, ContactView, CreateContactResponse, CreatedContact, DeleteContactResponse,
    DeletedContact, ErrorEnvelope, GetContactResponse, ListContactsQuery, ListContactsResponse,
    Pagination,
};
use crate::state::AppState;

pub static X_API_KEY: &str = "x-api-key";

#[derive(OpenApi)]
#[openapi(
    paths(create_contact, list_contacts, get_contact, delete_contact),
    components(schemas(
        ContactCandidate,
        ContactView,
        CreatedContact,
        DeletedContact,
        Pagination,
        CreateContactResponse,
        ListContactsResponse,
        GetContactResponse,
        DeleteContactResponse,
        ErrorEnvelope,
    ))
)]
pub struct ContactsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/contacts", get(list_contacts).post(create_contact))
        .route("/contacts/{id}", get(get_contact).delete(delete_contact))
}

#[utoipa::path(
    post,
    path = "/api/contacts",
    tag = "contacts",
    request_body = ContactCandidate,
    responses(
        (status = 201, description = "Submission stored", body = CreateContactResponse),
        (status = 400, description = "Validation failed or malformed JSON", body = ErrorEnvelope),
        (status = 409, description = "Duplicate contact", body = ErrorEnvelope),
        (status = 429, description = "Rate limit exceeded", body = ErrorEnvelope),
        (status = 500, description = "Store error", body = ErrorEnvelope),
    )
)]
pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    Extension(client): Extension<ClientIp>,
    headers: HeaderMap,
    payload: Result<Json<ContactCandidate>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateContactResponse>), ServerError> {
    let Json(candidate) = payload.map_err(|rejection| {
        debug!(error = %rejection, "rejected contact payload");
        ServerError::BadRequest("Invalid JSON payload".to_owned())
    })?;

    let meta = SubmissionMeta {
        ip_address: client.to_storage(),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
    };
    let record = state.gateway().create(&candidate, meta).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateContactResponse {
            success: true,
            message: "Contact form submitted successfully".to_owned(),
            data: record.to_created(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/contacts",
    tag = "contacts",
    params(ListContactsQuery),
    responses(
        (status = 200, description = "Page of contacts", body = ListContactsResponse),
        (status = 400, description = "Invalid date filter", body = ErrorEnvelope),
        (status = 500, description = "Store error", body = ErrorEnvelope),
    )
)]
pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListContactsQuery>,
) -> Result<Json<ListContactsResponse>, ServerError> {
    let page = state.gateway().list(&query).await?;
    Ok(Json(ListContactsResponse {
        success: true,
        data: page.rows.iter().map(|r| r.to_view()).collect(),
        pagination: page.pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/api/contacts/{id}",
    tag = "contacts",
    params(
        ("id" = i64, Path, description = "Contact ID")
    ),
    responses(
        (status = 200, description = "Contact found", body = GetContactResponse),
        (status = 400, description = "Malformed ID", body = ErrorEnvelope),
        (status = 404, description = "Contact not found", body = ErrorEnvelope),
    )
)]
pub async fn get_contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<GetContactResponse>, ServerError> {
    let record = state.gateway().get(&id).await?;
    Ok(Json(GetContactResponse { success: true, data: record.to_view() }))
}

#[utoipa::path(
    delete,
    path = "/api/contacts/{id}",
    tag = "contacts",
    params(
        ("id" = i64, Path, description = "Contact ID"),
        ("X-API-Key" = Option<String>, Header, description = "Admin key, required in production")
    ),
    responses(
        (status = 200, description = "Contact deleted", body = DeleteContactResponse),
        (status = 401, description = "Missing or invalid admin key", body = ErrorEnvelope),
        (status = 404, description = "Contact not found", body = ErrorEnvelope),
    )
)]
pub async fn delete_contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<DeleteContactResponse>, ServerError> {
    let credential = headers.get(X_API_KEY).and_then(|v| v.to_str().ok());
    let record = state.gateway().delete(&id, credential).await?;
    Ok(Json(DeleteContactResponse {
        success: true,
        message: "Contact deleted successfully".to_owned(),
        data: DeletedContact { id: record.id, email: record.email },
    }))
}
