//! Friendship operations against the remote service.

use super::{FriendRequest, Friendship, FriendshipStatus};
use crate::api::{ApiClient, FriendRequestPayload};
use crate::confirm::Confirmation;
use crate::error::{CoreError, Result};
use crate::refresh::{Exclusive, Running};
use crate::session::{Session, SessionBackend};

pub struct FriendService<'a> {
    api: &'a ApiClient,
    running: Exclusive<(&'static str, String)>,
}

impl<'a> FriendService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self {
            api,
            running: Exclusive::new(),
        }
    }

    fn begin(
        &self,
        action: &'static str,
        id: &str,
    ) -> Result<Running<'_, (&'static str, String)>> {
        self.running
            .start((action, id.to_string()))
            .ok_or_else(|| CoreError::Busy {
                action,
                id: id.to_string(),
            })
    }

    /// Friendships visible to the session user, minus removed ones.
    pub async fn list<B: SessionBackend>(&self, session: &Session<B>) -> Result<Vec<Friendship>> {
        let user = session.require()?;
        let friends = self.api.list_friends(&user.id).await?;
        Ok(friends
            .into_iter()
            .filter(|f| {
                if !f.is_consistent() {
                    tracing::warn!(friendship_id = %f.id, "skipping self-friendship");
                    return false;
                }
                f.status != FriendshipStatus::Removed
            })
            .collect())
    }

    /// Send a friend request for `name` at `phone`.
    ///
    /// # Errors
    /// `Validation` if either field is blank; no request is sent then.
    pub async fn request<B: SessionBackend>(
        &self,
        session: &Session<B>,
        name: &str,
        phone: &str,
    ) -> Result<Friendship> {
        let request = FriendRequest::new(name, phone)?;
        let user = session.require()?;

        let payload = FriendRequestPayload {
            user_id: user.id.clone(),
            phone: request.phone().to_string(),
            nickname: request.name().to_string(),
        };
        let receipt = self.api.send_friend_request(&payload).await?;

        let friendship = Friendship {
            id: receipt.id.unwrap_or_default(),
            requester_id: user.id.clone(),
            friend_id: receipt.friend_id.unwrap_or_default(),
            status: receipt.status.unwrap_or(FriendshipStatus::Pending),
            friend_name: payload.nickname,
            friend_phone: payload.phone,
            username: None,
        };
        tracing::info!(friendship_id = %friendship.id, status = %friendship.status, "friend request sent");
        Ok(friendship)
    }

    /// Ask the service to send the invitation again. The status is unchanged.
    pub async fn resend(&self, friendship: &Friendship) -> Result<()> {
        if !friendship.status.can_resend() {
            return Err(CoreError::InvalidTransition {
                action: "resend",
                from: friendship.status,
            });
        }
        let _running = self.begin("resend", &friendship.id)?;
        self.api.resend_friend_request(&friendship.id).await?;
        tracing::info!(friendship_id = %friendship.id, "friend request resent");
        Ok(())
    }

    pub fn propose_removal(&self, friendship: &Friendship) -> Result<Confirmation<Friendship>> {
        if !friendship.status.can_transition_to(&FriendshipStatus::Removed) {
            return Err(CoreError::InvalidTransition {
                action: "remove",
                from: friendship.status,
            });
        }
        Ok(Confirmation::new(
            friendship.clone(),
            "Remove Friend",
            "Are you sure you want to remove this friend?",
        ))
    }

    /// Remove a confirmed friendship. Returns it in its terminal state.
    pub async fn remove(&self, confirmed: Confirmation<Friendship>) -> Result<Friendship> {
        let mut friendship = confirmed.into_target();
        let _running = self.begin("remove", &friendship.id)?;
        self.api.delete_friend(&friendship.id).await?;
        friendship.status = FriendshipStatus::Removed;
        tracing::info!(friendship_id = %friendship.id, "friend removed");
        Ok(friendship)
    }
}
