use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::dao::{ContactRecord, DailyContactMetric, format_timestamp};

/// Raw `POST /api/contacts` body. Every field is optional so a missing
/// field surfaces as a `required` validation error rather than a parse
/// failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ContactCandidate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Query string accepted by `GET /api/contacts`.
///
/// Values are kept as strings and interpreted leniently: a non-numeric
/// `page`/`limit` falls back to the default.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListContactsQuery {
    /// 1-based page number (default 1).
    pub page: Option<String>,
    /// Page size (default 10).
    pub limit: Option<String>,
    /// Exact email match.
    pub email: Option<String>,
    /// Inclusive lower bound on `created_at` (`YYYY-MM-DD` or RFC 3339).
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    /// Inclusive upper bound on `created_at` (`YYYY-MM-DD` or RFC 3339).
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreatedContact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContactView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeletedContact {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateContactResponse {
    pub success: bool,
    pub message: String,
    pub data: CreatedContact,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListContactsResponse {
    pub success: bool,
    pub data: Vec<ContactView>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GetContactResponse {
    pub success: bool,
    pub data: ContactView,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteContactResponse {
    pub success: bool,
    pub message: String,
    pub data: DeletedContact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DailyMetricView {
    pub date: String,
    pub total_contacts: i64,
    pub unique_emails: i64,
    pub daily_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MetricsResponse {
    pub success: bool,
    pub data: Vec<DailyMetricView>,
}

/// `{error, details?}` as documented in the OpenAPI output.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl ContactRecord {
    pub fn to_view(&self) -> ContactView {
        ContactView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            message: self.message.clone(),
            created_at: format_timestamp(self.created_at),
        }
    }

    pub fn to_created(&self) -> CreatedContact {
        CreatedContact {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: format_timestamp(self.created_at),
        }
    }
}

impl DailyContactMetric {
    pub fn to_view(&self) -> DailyMetricView {
        DailyMetricView {
            date: self.date.clone(),
            total_contacts: self.total_contacts,
            unique_emails: self.unique_emails,
            daily_count: self.daily_count,
        }
    }
}
