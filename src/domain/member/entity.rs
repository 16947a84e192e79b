//! Team membership entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::authz::Role;
use crate::domain::team::TeamId;
use crate::domain::user::UserId;

/// A (user, team) pairing with exactly one role.
///
/// At most one membership may exist per (team, user) pair; the repository
/// enforces this as a uniqueness constraint, not application logic, because
/// concurrent invite acceptance relies on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    /// Team this membership belongs to
    team_id: TeamId,
    /// Member user
    user_id: UserId,
    /// Role within the team
    role: Role,
    /// When the membership was created
    created_at: DateTime<Utc>,
}

impl TeamMember {
    /// Create a new membership
    pub fn new(team_id: TeamId, user_id: UserId, role: Role) -> Self {
        Self {
            team_id,
            user_id,
            role,
            created_at: Utc::now(),
        }
    }

    /// Rebuild a membership from persisted state
    pub(crate) fn from_storage(
        team_id: TeamId,
        user_id: UserId,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            team_id,
            user_id,
            role,
            created_at,
        }
    }

    pub fn team_id(&self) -> &TeamId {
        &self.team_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Change the member's role
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_creation() {
        let member = TeamMember::new(TeamId::generate(), UserId::generate(), Role::Viewer);
        assert_eq!(member.role(), Role::Viewer);
    }

    #[test]
    fn test_set_role() {
        let mut member = TeamMember::new(TeamId::generate(), UserId::generate(), Role::Member);
        member.set_role(Role::Admin);
        assert_eq!(member.role(), Role::Admin);
    }
}
