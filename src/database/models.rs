use serde::{Deserialize, Serialize};

/// Capability flags stored as a bitmask on the user record. Extend by adding
/// constants, never by widening the meaning of existing bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions(pub i64);

impl Permissions {
    pub const NONE: Permissions = Permissions(0);
    pub const ADMIN: Permissions = Permissions(1 << 0);

    pub fn contains(self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub surname: String,
    pub patronymic: String,
    pub birthday: String,
    pub phone_number: Option<String>,
    pub is_banned: bool,
    pub permissions: i64,
    pub registration_date: i64,
    pub show_first_name: bool,
    pub show_surname: bool,
    pub show_email: bool,
    pub show_phone: bool,
    pub hide_profile: bool,
    pub notify_new_comment: bool,
    pub notify_new_like: bool,
    pub notify_new_subscriber: bool,
    pub notify_new_offers: bool,
    pub about_text: Option<String>,
    pub screen_name: Option<String>,
    pub avatar_name: Option<String>,
}

impl UserRecord {
    pub fn is_admin(&self) -> bool {
        Permissions(self.permissions).contains(Permissions::ADMIN)
    }
}

/// Partial profile update: `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    pub birthday: Option<String>,
    pub phone_number: Option<String>,
    pub show_first_name: Option<bool>,
    pub show_surname: Option<bool>,
    pub show_email: Option<bool>,
    pub show_phone: Option<bool>,
    pub hide_profile: Option<bool>,
    pub notify_new_comment: Option<bool>,
    pub notify_new_like: Option<bool>,
    pub notify_new_subscriber: Option<bool>,
    pub notify_new_offers: Option<bool>,
    pub about_text: Option<String>,
    pub screen_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub author_id: Option<String>,
    pub title: String,
    pub body: String,
    pub source: Option<String>,
    pub image_name: Option<String>,
    /// JSON array of tag strings, kept raw for the FTS index.
    pub tags: String,
    pub moderated: bool,
    pub comments_disabled: bool,
    /// Posts become publicly visible once moderated and this time has passed.
    pub publish_after: i64,
    pub publication_time: i64,
    pub likes: i64,
    pub views: i64,
}

/// Feed query parameters resolved by the post repository. `visible_before`
/// applies the scheduled-publish gate and is only set for the public feed.
#[derive(Debug, Clone, Default)]
pub struct FeedFilter {
    pub moderated: bool,
    pub visible_before: Option<i64>,
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub author_id: Option<String>,
    /// Order plain-text search matches by relevance. The moderation queue
    /// leaves this off and stays chronological even while searching.
    pub rank_by_relevance: bool,
    pub offset: u32,
    pub limit: u32,
}

/// Full field overwrite applied when a moderator reviews a post.
/// `image_name = None` keeps the stored image.
#[derive(Debug, Clone)]
pub struct ModerationUpdate {
    pub approved: bool,
    pub publish_after: i64,
    pub title: String,
    pub body: String,
    pub source: Option<String>,
    pub tags: String,
    pub category_ids: Vec<i64>,
    pub likes: i64,
    pub views: i64,
    pub publication_time: i64,
    pub image_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub post_id: String,
    pub parent_comment_id: Option<String>,
    pub author_id: String,
    pub body: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub subscriber_id: String,
    pub target_id: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    pub user_id: String,
    pub text: String,
    pub actor_name: String,
    pub actor_avatar: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpertRequestRecord {
    pub user_id: String,
    pub status: bool,
    /// JSON array of tag strings.
    pub tags: String,
}
