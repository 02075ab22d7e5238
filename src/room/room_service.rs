use crate::db::DbPool;
use crate::error::{is_unique_violation, AppError, Result};
use crate::room::room_models::{
    ensure_can_join, ensure_can_read, ensure_creator, random_suffix, room_slug, Room,
    RoomResponse,
};
use crate::room::room_repository::RoomRepository;
use uuid::Uuid;

const SLUG_ATTEMPTS: usize = 3;

/// Service layer for room membership and lifecycle.
#[derive(Clone)]
pub struct RoomService {
    db: DbPool,
    repo: RoomRepository,
}

impl RoomService {
    pub fn new(db: DbPool, repo: RoomRepository) -> Self {
        Self { db, repo }
    }

    pub async fn find_room(&self, slug: &str) -> Result<Room> {
        self.repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound("Room does not exist!".into()))
    }

    pub async fn is_member(&self, room: &Room, user_id: Uuid) -> Result<bool> {
        self.repo.is_member(room.id, user_id).await
    }

    /// Loads a room the user is allowed to read.
    pub async fn readable_room(&self, slug: &str, user_id: Uuid) -> Result<Room> {
        let room = self.find_room(slug).await?;
        let is_member = self.repo.is_member(room.id, user_id).await?;
        ensure_can_read(&room, is_member)?;
        Ok(room)
    }

    pub async fn readable_room_by_id(&self, room_id: Uuid, user_id: Uuid) -> Result<Room> {
        let room = self
            .repo
            .find_by_id(room_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Room does not exist!".into()))?;
        let is_member = self.repo.is_member(room.id, user_id).await?;
        ensure_can_read(&room, is_member)?;
        Ok(room)
    }

    pub async fn to_response(&self, room: Room) -> Result<RoomResponse> {
        let creator = self.repo.creator_username(&room).await?;
        let members = self.repo.list_members(room.id).await?;
        let likes = self.repo.count_likes(room.id).await?;
        Ok(RoomResponse::build(room, creator, members, likes))
    }

    pub async fn to_responses(&self, rooms: Vec<Room>) -> Result<Vec<RoomResponse>> {
        let mut responses = Vec::with_capacity(rooms.len());
        for room in rooms {
            responses.push(self.to_response(room).await?);
        }
        Ok(responses)
    }

    pub async fn create_room(
        &self,
        creator: Uuid,
        name: Option<&str>,
        description: Option<&str>,
        is_private: bool,
    ) -> Result<RoomResponse> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::Validation("Room name is required!".into()))?;

        if name.chars().count() > 128 {
            return Err(AppError::field("room_name", "Ensure this field has no more than 128 characters."));
        }

        let mut attempt = 0;
        let room = loop {
            attempt += 1;
            let slug = room_slug(name, &random_suffix());

            match self.insert_room(creator, name, &slug, description, is_private).await {
                Ok(room) => break room,
                Err(e) if attempt < SLUG_ATTEMPTS && is_unique_violation(&e, Some("rooms_slug_key")) => {
                    tracing::warn!("Slug {} already taken, drawing a new suffix", slug);
                }
                Err(e) => return Err(e),
            }
        };

        tracing::info!("Room {} created by {}", room.slug, creator);
        self.to_response(room).await
    }

    async fn insert_room(
        &self,
        creator: Uuid,
        name: &str,
        slug: &str,
        description: Option<&str>,
        is_private: bool,
    ) -> Result<Room> {
        let mut tx = self.db.begin().await?;

        let room = self
            .repo
            .create_with_tx(&mut tx, name, slug, description, is_private, creator)
            .await?;
        self.repo
            .add_member_with_tx(&mut tx, room.id, creator, true)
            .await?;

        tx.commit().await?;
        Ok(room)
    }

    pub async fn join_room(&self, slug: &str, user_id: Uuid) -> Result<()> {
        let room = self.find_room(slug).await?;
        let already_member = self.repo.is_member(room.id, user_id).await?;
        ensure_can_join(&room, already_member)?;

        if self.repo.add_member(room.id, user_id).await? {
            tracing::info!("User {} joined room {}", user_id, room.slug);
        }
        Ok(())
    }

    pub async fn remove_user(&self, slug: &str, username: &str, requester: Uuid) -> Result<String> {
        let room = self.find_room(slug).await?;
        ensure_creator(&room, requester, "Only the room creator can remove users.")?;

        let member = self
            .repo
            .find_member_by_username(room.id, username)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found in the room.".into()))?;

        if room.is_creator(member.user_id) {
            return Err(AppError::BadRequest(
                "The room creator cannot be removed from the room.".into(),
            ));
        }

        self.repo.remove_member(room.id, member.user_id).await?;
        tracing::info!("User {} removed from room {}", username, room.slug);
        Ok(format!("User {} removed from the room.", username))
    }

    pub async fn make_admin(&self, slug: &str, username: &str, requester: Uuid) -> Result<String> {
        let room = self.find_room(slug).await?;
        ensure_creator(&room, requester, "Only the room creator can make users admins.")?;

        let member = self
            .repo
            .find_member_by_username(room.id, username)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found in the room.".into()))?;

        self.repo.set_admin(room.id, member.user_id).await?;
        Ok(format!("User {} is now an admin of the room.", username))
    }

    pub async fn delete_room(&self, slug: &str, requester: Uuid) -> Result<()> {
        let room = self.find_room(slug).await?;
        ensure_creator(
            &room,
            requester,
            "You are not the creator of this room, so you cannot delete it.",
        )?;

        self.repo.soft_delete(room.id).await?;
        tracing::info!("Room {} deleted by {}", room.slug, requester);
        Ok(())
    }

    pub async fn room_detail(&self, slug: &str, user_id: Uuid) -> Result<RoomResponse> {
        let room = self.readable_room(slug, user_id).await?;
        self.to_response(room).await
    }

    pub async fn toggle_like(&self, slug: &str, user_id: Uuid) -> Result<bool> {
        let room = self.find_room(slug).await?;
        self.repo.toggle_like(room.id, user_id).await
    }

    pub async fn rooms_for_user(&self, user_id: Uuid) -> Result<(Vec<RoomResponse>, Vec<RoomResponse>)> {
        let joined = self.repo.find_joined_by_user(user_id).await?;
        let created = self.repo.find_created_by_user(user_id).await?;
        Ok((self.to_responses(joined).await?, self.to_responses(created).await?))
    }
}
