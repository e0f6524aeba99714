use crate::types::enums::RequestStatus;
use crate::types::ids::{RequestId, UserId};
use crate::types::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A posted help request awaiting or under fulfilment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HelpRequest {
    pub id: RequestId,
    pub requester_id: UserId,
    pub title: String,
    pub description: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing/detail view with the requester joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RequestWithRequester {
    pub request: HelpRequest,
    pub requester: User,
}
