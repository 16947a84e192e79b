//! Invite lifecycle manager
//!
//! Owns the pending -> accepted | revoked state machine, token issuance
//! and rotation, and the race-safe acceptance protocol. Non-pending
//! invites are reported as missing so callers cannot probe the state of a
//! revoked or already-accepted invitation.

use std::sync::Arc;

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info};

use crate::domain::authz::Role;
use crate::domain::invite::{InviteId, InviteRepository, TeamInvite};
use crate::domain::member::{MemberRepository, TeamMember};
use crate::domain::notification::{Notifier, TeamInviteMail};
use crate::domain::team::TeamId;
use crate::domain::user::{validate_email, User};
use crate::domain::DomainError;
use crate::infrastructure::mutation::run_with_compensation;
use crate::infrastructure::team::Directory;

/// Number of random bytes behind an invite token (hex-encoded on issue)
const TOKEN_BYTES: usize = 32;

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Invite lifecycle manager
#[derive(Debug)]
pub struct InviteService {
    invites: Arc<dyn InviteRepository>,
    members: Arc<dyn MemberRepository>,
    directory: Directory,
    notifier: Arc<dyn Notifier>,
}

impl InviteService {
    /// Create a new invite service
    pub fn new(
        invites: Arc<dyn InviteRepository>,
        members: Arc<dyn MemberRepository>,
        directory: Directory,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            invites,
            members,
            directory,
            notifier,
        }
    }

    /// Create a pending invite and send the invitation mail.
    ///
    /// Admin action. An invite without an explicit role assignment falls
    /// back to the team's default role. The invite row is persisted before
    /// the mail goes out; if the mail fails the row is deleted again (by
    /// id, falling back to the (team, token) natural key) and the failure
    /// surfaces compensated.
    pub async fn create(
        &self,
        team_id: &str,
        actor: &User,
        email: &str,
        role: Option<Role>,
    ) -> Result<TeamInvite, DomainError> {
        let team_id = parse_team_id(team_id)?;
        let team = self.directory.require_admin(&team_id, actor.id()).await?;

        let email = email.trim().to_lowercase();
        validate_email(&email).map_err(|e| DomainError::validation(e.to_string()))?;

        let role = role.unwrap_or_else(|| team.default_role());

        let invite = TeamInvite::new(
            team_id.clone(),
            &email,
            role,
            generate_token(),
            actor.id().clone(),
        );

        info!(team_id = %team_id, invite_id = %invite.id(), "Creating invite");

        let invites = Arc::clone(&self.invites);
        let invites_undo = Arc::clone(&self.invites);
        let notifier = Arc::clone(&self.notifier);
        let team_name = team.name().to_string();

        run_with_compensation(
            move || async move { invites.create(invite).await },
            move |saved: TeamInvite| async move {
                notifier
                    .send_team_invite(&TeamInviteMail {
                        email: saved.email().to_string(),
                        team_name,
                        token: saved.token().to_string(),
                    })
                    .await
            },
            move |saved: TeamInvite| async move {
                match invites_undo.delete(saved.id()).await {
                    Ok(true) => Ok(()),
                    // Fall back to the natural key when the id path finds
                    // nothing or errors out.
                    Ok(false) | Err(_) => invites_undo
                        .delete_by_token(saved.team_id(), saved.token())
                        .await
                        .map(|_| ()),
                }
            },
        )
        .await
    }

    /// Rotate the token of a pending invite and send a fresh mail.
    ///
    /// The rotated token is persisted before the mail goes out; on mail
    /// failure the previously stored token is written back and the status
    /// stays pending.
    pub async fn resend(
        &self,
        team_id: &str,
        invite_id: &str,
        actor: &User,
    ) -> Result<TeamInvite, DomainError> {
        let team_id = parse_team_id(team_id)?;
        let team = self.directory.require_admin(&team_id, actor.id()).await?;

        let invite = self.get_pending(&team_id, invite_id).await?;

        debug!(team_id = %team_id, invite_id = %invite.id(), "Rotating invite token");

        let previous = invite.clone();
        let mut rotated = invite;
        rotated.rotate_token(generate_token());

        let invites = Arc::clone(&self.invites);
        let invites_revert = Arc::clone(&self.invites);
        let notifier = Arc::clone(&self.notifier);
        let team_name = team.name().to_string();

        run_with_compensation(
            move || async move { invites.update(&rotated).await },
            move |saved: TeamInvite| async move {
                notifier
                    .send_team_invite(&TeamInviteMail {
                        email: saved.email().to_string(),
                        team_name,
                        token: saved.token().to_string(),
                    })
                    .await
            },
            move |_| async move { invites_revert.update(&previous).await.map(|_| ()) },
        )
        .await
    }

    /// Revoke a pending invite. Terminal; no external effect.
    pub async fn revoke(
        &self,
        team_id: &str,
        invite_id: &str,
        actor: &User,
    ) -> Result<(), DomainError> {
        let team_id = parse_team_id(team_id)?;
        self.directory.require_admin(&team_id, actor.id()).await?;

        let mut invite = self.get_pending(&team_id, invite_id).await?;

        info!(team_id = %team_id, invite_id = %invite.id(), "Revoking invite");

        invite.mark_revoked();
        self.invites.update(&invite).await?;
        Ok(())
    }

    /// Accept a pending invite by token.
    ///
    /// The membership insert relies on the storage uniqueness constraint
    /// for correctness under races: a conflict on (team, user) means a
    /// concurrent accept already won, and the caller's intent is satisfied,
    /// so it is treated as success. Any other insert failure aborts before
    /// the invite is touched.
    pub async fn accept(
        &self,
        team_id: &str,
        token: &str,
        actor: &User,
    ) -> Result<TeamMember, DomainError> {
        let team_id = parse_team_id(team_id)?;
        self.directory.require_team(&team_id).await?;

        let invite = self
            .invites
            .get_by_token(&team_id, token)
            .await?
            .filter(|i| i.is_pending())
            .ok_or_else(|| DomainError::not_found("Invite not found"))?;

        if !invite.email().eq_ignore_ascii_case(actor.email()) {
            return Err(DomainError::forbidden(
                "Invite was issued for a different email address",
            ));
        }

        let membership = match self
            .members
            .create(TeamMember::new(
                team_id.clone(),
                actor.id().clone(),
                invite.role(),
            ))
            .await
        {
            Ok(member) => member,
            Err(DomainError::Conflict { .. }) => {
                debug!(team_id = %team_id, user_id = %actor.id(), "Membership already exists, treating accept as idempotent success");
                self.members
                    .get(&team_id, actor.id())
                    .await?
                    .ok_or_else(|| {
                        DomainError::internal("Membership vanished after conflicting insert")
                    })?
            }
            Err(other) => return Err(other),
        };

        let mut accepted = invite;
        accepted.mark_accepted();
        self.invites.update(&accepted).await?;

        info!(team_id = %team_id, user_id = %actor.id(), "Invite accepted");

        Ok(membership)
    }

    /// List a team's invites. Admin action.
    pub async fn list(&self, team_id: &str, actor: &User) -> Result<Vec<TeamInvite>, DomainError> {
        let team_id = parse_team_id(team_id)?;
        self.directory.require_admin(&team_id, actor.id()).await?;
        self.invites.list_for_team(&team_id).await
    }

    /// Fetch a pending invite; a missing or non-pending invite is reported
    /// as not-found so callers cannot distinguish the two.
    async fn get_pending(
        &self,
        team_id: &TeamId,
        invite_id: &str,
    ) -> Result<TeamInvite, DomainError> {
        self.invites
            .get(&InviteId::new(invite_id), team_id)
            .await?
            .filter(|i| i.is_pending())
            .ok_or_else(|| DomainError::not_found("Invite not found"))
    }
}

fn parse_team_id(id: &str) -> Result<TeamId, DomainError> {
    TeamId::new(id).map_err(|e| DomainError::invalid_id(e.to_string()))
}
