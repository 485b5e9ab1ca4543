use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::matching::repo::{MatchRecord, MatchStatus};

/// Request body for a mentee's match request.
#[derive(Debug, Deserialize)]
pub struct MatchRequestBody {
    pub mentor_email: String,
    #[serde(default)]
    pub message: String,
}

/// Request body for a mentor's accept/reject decision.
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub mentee_email: String,
    pub accept: bool,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub id: Uuid,
    pub mentee_email: String,
    pub mentor_email: String,
    pub status: MatchStatus,
    pub message: String,
    pub created_at: OffsetDateTime,
}

impl From<MatchRecord> for MatchResponse {
    fn from(r: MatchRecord) -> Self {
        Self {
            id: r.id,
            mentee_email: r.mentee_email,
            mentor_email: r.mentor_email,
            status: r.status,
            message: r.message,
            created_at: r.created_at,
        }
    }
}
