mod comments;
mod expert_requests;
mod notifications;
mod posts;
mod subscriptions;
mod users;

use super::models::{
    CommentRecord, ExpertRequestRecord, FeedFilter, ModerationUpdate, NotificationRecord,
    PostRecord, ProfileUpdate, SubscriptionRecord, UserRecord,
};
use anyhow::Result;
use rusqlite::Connection;

pub trait UserRepository {
    fn create(&self, record: &UserRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<UserRecord>>;
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;
    fn update_profile(&self, id: &str, update: &ProfileUpdate) -> Result<bool>;
    fn set_avatar(&self, id: &str, avatar_name: &str) -> Result<bool>;
    fn set_banned(&self, id: &str, banned: bool) -> Result<bool>;
}

pub trait PostRepository {
    fn create(&self, record: &PostRecord, category_ids: &[i64]) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<PostRecord>>;
    fn query_feed(&self, filter: &FeedFilter) -> Result<Vec<PostRecord>>;
    fn categories_of(&self, post_id: &str) -> Result<Vec<i64>>;
    fn apply_moderation(&self, post_id: &str, update: &ModerationUpdate) -> Result<()>;
    /// Returns the caller's new like state and the post's new like count.
    fn toggle_like(&self, post_id: &str, user_id: &str) -> Result<(bool, i64)>;
    fn is_liked(&self, post_id: &str, user_id: &str) -> Result<bool>;
    /// Returns the post's view count after the (possibly deduplicated) view.
    fn record_view(&self, post_id: &str, viewer_id: Option<&str>) -> Result<i64>;
    fn set_comments_disabled(&self, post_id: &str, disabled: bool) -> Result<bool>;
    fn delete(&self, post_id: &str) -> Result<bool>;
}

pub trait CommentRepository {
    fn create(&self, record: &CommentRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<CommentRecord>>;
    fn list_top_level(&self, post_id: &str) -> Result<Vec<CommentRecord>>;
    fn list_replies(&self, parent_comment_id: &str) -> Result<Vec<CommentRecord>>;
    fn count_for_post(&self, post_id: &str) -> Result<i64>;
    fn toggle_like(&self, comment_id: &str, user_id: &str) -> Result<(bool, i64)>;
    fn like_count(&self, comment_id: &str) -> Result<i64>;
    fn is_liked(&self, comment_id: &str, user_id: &str) -> Result<bool>;
}

pub trait SubscriptionRepository {
    fn upsert(&self, subscriber_id: &str, target_id: &str, created_at: i64) -> Result<()>;
    fn delete(&self, subscriber_id: &str, target_id: &str) -> Result<()>;
    fn list_for(&self, subscriber_id: &str) -> Result<Vec<SubscriptionRecord>>;
    fn count_outgoing(&self, user_id: &str) -> Result<i64>;
    fn count_incoming(&self, user_id: &str) -> Result<i64>;
}

/// Notification creation is driven by external triggers; this core only reads.
pub trait NotificationRepository {
    fn list_for_user(&self, user_id: &str) -> Result<Vec<NotificationRecord>>;
}

pub trait ExpertRequestRepository {
    fn get(&self, user_id: &str) -> Result<Option<ExpertRequestRecord>>;
    fn upsert(&self, record: &ExpertRequestRecord) -> Result<()>;
}

pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn users(&self) -> impl UserRepository + '_ {
        users::SqliteUserRepository { conn: self.conn }
    }

    pub fn posts(&self) -> impl PostRepository + '_ {
        posts::SqlitePostRepository { conn: self.conn }
    }

    pub fn comments(&self) -> impl CommentRepository + '_ {
        comments::SqliteCommentRepository { conn: self.conn }
    }

    pub fn subscriptions(&self) -> impl SubscriptionRepository + '_ {
        subscriptions::SqliteSubscriptionRepository { conn: self.conn }
    }

    pub fn notifications(&self) -> impl NotificationRepository + '_ {
        notifications::SqliteNotificationRepository { conn: self.conn }
    }

    pub fn expert_requests(&self) -> impl ExpertRequestRepository + '_ {
        expert_requests::SqliteExpertRequestRepository { conn: self.conn }
    }

    pub fn conn(&self) -> &'conn Connection {
        self.conn
    }
}
