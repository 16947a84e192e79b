//! Team invitation entity and state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::authz::Role;
use crate::domain::team::TeamId;
use crate::domain::user::UserId;

/// Invite identifier (uuid-shaped string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InviteId(String);

impl InviteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InviteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of an invitation.
///
/// `Pending -> Accepted` and `Pending -> Revoked` are the only transitions;
/// both targets are terminal and render the token permanently inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    #[default]
    Pending,
    Accepted,
    Revoked,
}

impl InviteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Revoked => "revoked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "revoked" => Some(Self::Revoked),
            _ => None,
        }
    }
}

/// An invitation to join a team by email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamInvite {
    /// Unique identifier
    id: InviteId,
    /// Team the invitee would join
    team_id: TeamId,
    /// Invitee email address
    email: String,
    /// Role assigned on acceptance
    role: Role,
    /// Single-use random token; meaningful only while pending
    token: String,
    /// Lifecycle state
    status: InviteStatus,
    /// User who created the invite
    invited_by: UserId,
    /// Creation timestamp
    created_at: DateTime<Utc>,
    /// Set when the invite transitions to accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    accepted_at: Option<DateTime<Utc>>,
}

impl TeamInvite {
    /// Create a new pending invite
    pub fn new(
        team_id: TeamId,
        email: impl Into<String>,
        role: Role,
        token: impl Into<String>,
        invited_by: UserId,
    ) -> Self {
        Self {
            id: InviteId::generate(),
            team_id,
            email: email.into(),
            role,
            token: token.into(),
            status: InviteStatus::Pending,
            invited_by,
            created_at: Utc::now(),
            accepted_at: None,
        }
    }

    /// Rebuild an invite from persisted state
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_storage(
        id: InviteId,
        team_id: TeamId,
        email: String,
        role: Role,
        token: String,
        status: InviteStatus,
        invited_by: UserId,
        created_at: DateTime<Utc>,
        accepted_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            team_id,
            email,
            role,
            token,
            status,
            invited_by,
            created_at,
            accepted_at,
        }
    }

    // Getters

    pub fn id(&self) -> &InviteId {
        &self.id
    }

    pub fn team_id(&self) -> &TeamId {
        &self.team_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn status(&self) -> InviteStatus {
        self.status
    }

    pub fn invited_by(&self) -> &UserId {
        &self.invited_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn accepted_at(&self) -> Option<DateTime<Utc>> {
        self.accepted_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == InviteStatus::Pending
    }

    // Transitions

    /// Swap in a freshly issued token. Only meaningful while pending.
    pub fn rotate_token(&mut self, token: impl Into<String>) {
        self.token = token.into();
    }

    /// Pending -> Accepted, stamping the acceptance time
    pub fn mark_accepted(&mut self) {
        self.status = InviteStatus::Accepted;
        self.accepted_at = Some(Utc::now());
    }

    /// Pending -> Revoked
    pub fn mark_revoked(&mut self) {
        self.status = InviteStatus::Revoked;
    }
}
