use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Identity;

/// SessionUser
///
/// The signed-in user as the dashboard sees it (`GET /api/me`). Exported to TypeScript
/// so the client-side header and profile menu share the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
    // Supabase role claim, `authenticated` for ordinary accounts.
    pub role: String,
}

impl From<Identity> for SessionUser {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email,
            role: identity.role,
        }
    }
}
