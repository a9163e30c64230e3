use crate::database::models::{
    CommentRecord, FeedFilter, ModerationUpdate, PostRecord, UserRecord,
};
use crate::database::repositories::{
    CommentRepository, PostRepository, SqliteRepositories, UserRepository,
};
use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::users::UserView;
use crate::utils::now_unix;
use serde::Serialize;
use uuid::Uuid;

/// Default page size for the public feed.
pub const DEFAULT_FEED_LIMIT: u32 = 20;
/// Default page size for the moderation queue.
pub const DEFAULT_QUEUE_LIMIT: u32 = 100;
const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: String,
    pub author: UserView,
    pub title: String,
    pub body: String,
    pub source: Option<String>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub category_ids: Vec<i64>,
    pub moderated: bool,
    pub comments_disabled: bool,
    pub publish_after: i64,
    pub publication_time: i64,
    pub likes: i64,
    pub views: i64,
    pub comment_count: i64,
    pub is_liked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: String,
    pub post_id: String,
    pub author: UserView,
    pub body: String,
    pub created_at: i64,
    pub likes: i64,
    pub is_liked: bool,
    pub replies: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub likes: i64,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub source: Option<String>,
    pub tags: Vec<String>,
    pub category_ids: Vec<i64>,
    pub image_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FeedQuery {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub author_id: Option<String>,
    pub offset: u32,
    pub limit: Option<u32>,
}

/// Moderator review payload. `None` fields keep the stored value, so a bare
/// approval does not erase the submission.
#[derive(Debug, Clone, Default)]
pub struct ModerationInput {
    pub approved: bool,
    pub publish_after: Option<i64>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub source: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category_ids: Option<Vec<i64>>,
    pub likes: Option<i64>,
    pub views: Option<i64>,
    pub publication_time: Option<i64>,
    pub image_name: Option<String>,
}

/// Posts, their moderation workflow, comments and reaction counters.
#[derive(Clone)]
pub struct ContentService {
    database: Database,
}

impl ContentService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn create_post(&self, author: &UserRecord, input: NewPost) -> AppResult<PostView> {
        if input.title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".into()));
        }
        if input.body.trim().is_empty() {
            return Err(AppError::Validation("body must not be empty".into()));
        }
        let record = PostRecord {
            id: Uuid::new_v4().to_string(),
            author_id: Some(author.id.clone()),
            title: input.title,
            body: input.body,
            source: input.source,
            image_name: input.image_name,
            tags: serde_json::to_string(&input.tags).map_err(anyhow::Error::from)?,
            moderated: false,
            comments_disabled: false,
            publish_after: 0,
            publication_time: now_unix(),
            likes: 0,
            views: 0,
        };
        let view = self.database.with_repositories(|repos| {
            repos.posts().create(&record, &input.category_ids)?;
            assemble_post_view(&repos, &record, Some(&author.id))
        })?;
        Ok(view)
    }

    /// Public feed: approved posts whose scheduled publish time has passed,
    /// newest first (or by relevance when a text search is given).
    pub fn feed(&self, viewer: Option<&UserRecord>, query: &FeedQuery) -> AppResult<Vec<PostView>> {
        let filter = FeedFilter {
            moderated: true,
            visible_before: Some(now_unix()),
            search: normalize_search(query.search.as_deref()),
            category_id: query.category_id,
            author_id: query.author_id.clone(),
            rank_by_relevance: true,
            offset: query.offset,
            limit: query.limit.unwrap_or(DEFAULT_FEED_LIMIT).min(MAX_PAGE_LIMIT),
        };
        self.run_feed(viewer, &filter)
    }

    /// Posts awaiting review. Administrators only.
    pub fn moderation_queue(
        &self,
        caller: &UserRecord,
        query: &FeedQuery,
    ) -> AppResult<Vec<PostView>> {
        require_admin(caller)?;
        // The queue stays in publication order even while searching.
        let filter = FeedFilter {
            moderated: false,
            visible_before: None,
            search: normalize_search(query.search.as_deref()),
            category_id: query.category_id,
            author_id: query.author_id.clone(),
            rank_by_relevance: false,
            offset: query.offset,
            limit: query
                .limit
                .unwrap_or(DEFAULT_QUEUE_LIMIT)
                .min(MAX_PAGE_LIMIT),
        };
        self.run_feed(Some(caller), &filter)
    }

    fn run_feed(
        &self,
        viewer: Option<&UserRecord>,
        filter: &FeedFilter,
    ) -> AppResult<Vec<PostView>> {
        let viewer_id = viewer.map(|record| record.id.as_str());
        let views = self.database.with_repositories(|repos| {
            let records = repos.posts().query_feed(filter)?;
            let mut views = Vec::with_capacity(records.len());
            for record in records {
                views.push(assemble_post_view(&repos, &record, viewer_id)?);
            }
            Ok(views)
        })?;
        Ok(views)
    }

    pub fn get_post(&self, viewer: Option<&UserRecord>, post_id: &str) -> AppResult<PostView> {
        let viewer_id = viewer.map(|record| record.id.as_str());
        let view = self.database.with_repositories(|repos| {
            let record = repos
                .posts()
                .get(post_id)?
                .ok_or_else(|| AppError::NotFound("post not found".into()))?;
            assemble_post_view(&repos, &record, viewer_id)
        })?;
        Ok(view)
    }

    /// Applies a moderator's review. Approval flips the post into the public
    /// feed; supplied fields overwrite the submission.
    pub fn moderate(
        &self,
        caller: &UserRecord,
        post_id: &str,
        input: ModerationInput,
    ) -> AppResult<PostView> {
        require_admin(caller)?;
        let caller_id = caller.id.clone();
        let view = self.database.with_repositories(|repos| {
            let current = repos
                .posts()
                .get(post_id)?
                .ok_or_else(|| AppError::NotFound("post not found".into()))?;
            let tags = match &input.tags {
                Some(tags) => serde_json::to_string(tags)?,
                None => current.tags.clone(),
            };
            let category_ids = match input.category_ids.clone() {
                Some(ids) => ids,
                None => repos.posts().categories_of(post_id)?,
            };
            let update = ModerationUpdate {
                approved: input.approved,
                publish_after: input.publish_after.unwrap_or(current.publish_after),
                title: input.title.clone().unwrap_or_else(|| current.title.clone()),
                body: input.body.clone().unwrap_or_else(|| current.body.clone()),
                source: input.source.clone().or_else(|| current.source.clone()),
                tags,
                category_ids,
                likes: input.likes.unwrap_or(current.likes),
                views: input.views.unwrap_or(current.views),
                publication_time: input.publication_time.unwrap_or(current.publication_time),
                image_name: input.image_name.clone(),
            };
            repos.posts().apply_moderation(post_id, &update)?;
            let record = repos
                .posts()
                .get(post_id)?
                .ok_or_else(|| AppError::NotFound("post not found".into()))?;
            assemble_post_view(&repos, &record, Some(&caller_id))
        })?;
        Ok(view)
    }

    /// Author may withdraw their own post; administrators may delete any.
    /// Returns the name of the image the deletion orphaned, if any, so the
    /// caller can remove the file.
    pub fn delete_post(&self, caller: &UserRecord, post_id: &str) -> AppResult<Option<String>> {
        let orphaned_image = self.database.with_repositories(|repos| {
            let record = repos
                .posts()
                .get(post_id)?
                .ok_or_else(|| AppError::NotFound("post not found".into()))?;
            let is_author = record.author_id.as_deref() == Some(caller.id.as_str());
            if !is_author && !caller.is_admin() {
                return Err(AppError::PermissionDenied(
                    "not the author of this post".into(),
                )
                .into());
            }
            repos.posts().delete(post_id)?;
            Ok(record.image_name)
        })?;
        Ok(orphaned_image)
    }

    pub fn toggle_like(&self, caller: &UserRecord, post_id: &str) -> AppResult<LikeResponse> {
        let (liked, likes) = self.database.with_repositories(|repos| {
            if repos.posts().get(post_id)?.is_none() {
                return Err(AppError::NotFound("post not found".into()).into());
            }
            repos.posts().toggle_like(post_id, &caller.id)
        })?;
        Ok(LikeResponse { liked, likes })
    }

    /// Counts at most one view per authenticated account; anonymous views
    /// always count. Returns the post's new view total.
    pub fn record_view(&self, viewer: Option<&UserRecord>, post_id: &str) -> AppResult<i64> {
        let viewer_id = viewer.map(|record| record.id.as_str());
        let views = self.database.with_repositories(|repos| {
            if repos.posts().get(post_id)?.is_none() {
                return Err(AppError::NotFound("post not found".into()).into());
            }
            repos.posts().record_view(post_id, viewer_id)
        })?;
        Ok(views)
    }

    pub fn set_comments_disabled(
        &self,
        caller: &UserRecord,
        post_id: &str,
        disabled: bool,
    ) -> AppResult<()> {
        require_admin(caller)?;
        let updated = self
            .database
            .with_repositories(|repos| repos.posts().set_comments_disabled(post_id, disabled))?;
        if !updated {
            return Err(AppError::NotFound("post not found".into()));
        }
        Ok(())
    }

    /// Comments are at most one level deep: a reply always targets a
    /// top-level comment on the same post.
    pub fn create_comment(
        &self,
        caller: &UserRecord,
        post_id: &str,
        body: &str,
        parent_comment_id: Option<&str>,
    ) -> AppResult<CommentView> {
        if body.trim().is_empty() {
            return Err(AppError::Validation("comment must not be empty".into()));
        }
        let record = CommentRecord {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.to_string(),
            parent_comment_id: parent_comment_id.map(str::to_string),
            author_id: caller.id.clone(),
            body: body.trim().to_string(),
            created_at: now_unix(),
        };
        let caller_id = caller.id.clone();
        let view = self.database.with_repositories(|repos| {
            let post = repos
                .posts()
                .get(post_id)?
                .ok_or_else(|| AppError::NotFound("post not found".into()))?;
            if post.comments_disabled {
                return Err(
                    AppError::Validation("comments are disabled for this post".into()).into(),
                );
            }
            if let Some(parent_id) = parent_comment_id {
                let parent = repos
                    .comments()
                    .get(parent_id)?
                    .ok_or_else(|| AppError::NotFound("parent comment not found".into()))?;
                if parent.post_id != post_id {
                    return Err(AppError::Validation(
                        "parent comment belongs to a different post".into(),
                    )
                    .into());
                }
                if parent.parent_comment_id.is_some() {
                    return Err(
                        AppError::Validation("replies cannot be nested further".into()).into(),
                    );
                }
            }
            repos.comments().create(&record)?;
            assemble_comment_view(&repos, &record, Some(&caller_id), Vec::new())
        })?;
        Ok(view)
    }

    /// Comment tree for a post: top-level comments in posting order, each
    /// with its replies.
    pub fn comments(
        &self,
        viewer: Option<&UserRecord>,
        post_id: &str,
    ) -> AppResult<Vec<CommentView>> {
        let viewer_id = viewer.map(|record| record.id.as_str());
        let views = self.database.with_repositories(|repos| {
            if repos.posts().get(post_id)?.is_none() {
                return Err(AppError::NotFound("post not found".into()).into());
            }
            let top_level = repos.comments().list_top_level(post_id)?;
            let mut views = Vec::with_capacity(top_level.len());
            for record in top_level {
                let reply_records = repos.comments().list_replies(&record.id)?;
                let mut replies = Vec::with_capacity(reply_records.len());
                for reply in reply_records {
                    replies.push(assemble_comment_view(&repos, &reply, viewer_id, Vec::new())?);
                }
                views.push(assemble_comment_view(&repos, &record, viewer_id, replies)?);
            }
            Ok(views)
        })?;
        Ok(views)
    }

    pub fn toggle_comment_like(
        &self,
        caller: &UserRecord,
        comment_id: &str,
    ) -> AppResult<LikeResponse> {
        let (liked, likes) = self.database.with_repositories(|repos| {
            if repos.comments().get(comment_id)?.is_none() {
                return Err(AppError::NotFound("comment not found".into()).into());
            }
            repos.comments().toggle_like(comment_id, &caller.id)
        })?;
        Ok(LikeResponse { liked, likes })
    }
}

fn require_admin(caller: &UserRecord) -> AppResult<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(
            "administrator permissions required".into(),
        ))
    }
}

/// `None` and `''` mean no text filter.
fn normalize_search(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn author_view(repos: &SqliteRepositories<'_>, author_id: Option<&str>) -> anyhow::Result<UserView> {
    let Some(author_id) = author_id else {
        return Ok(UserView::fallback());
    };
    Ok(match repos.users().get(author_id)? {
        Some(record) if !record.hide_profile => UserView::from_record(&record),
        _ => UserView::fallback(),
    })
}

fn assemble_post_view(
    repos: &SqliteRepositories<'_>,
    record: &PostRecord,
    viewer_id: Option<&str>,
) -> anyhow::Result<PostView> {
    let is_liked = match viewer_id {
        Some(viewer_id) => repos.posts().is_liked(&record.id, viewer_id)?,
        None => false,
    };
    Ok(PostView {
        id: record.id.clone(),
        author: author_view(repos, record.author_id.as_deref())?,
        title: record.title.clone(),
        body: record.body.clone(),
        source: record.source.clone(),
        image_url: record
            .image_name
            .as_deref()
            .map(|name| format!("/images/{name}")),
        tags: serde_json::from_str(&record.tags).unwrap_or_default(),
        category_ids: repos.posts().categories_of(&record.id)?,
        moderated: record.moderated,
        comments_disabled: record.comments_disabled,
        publish_after: record.publish_after,
        publication_time: record.publication_time,
        likes: record.likes,
        views: record.views,
        comment_count: repos.comments().count_for_post(&record.id)?,
        is_liked,
    })
}

fn assemble_comment_view(
    repos: &SqliteRepositories<'_>,
    record: &CommentRecord,
    viewer_id: Option<&str>,
    replies: Vec<CommentView>,
) -> anyhow::Result<CommentView> {
    let is_liked = match viewer_id {
        Some(viewer_id) => repos.comments().is_liked(&record.id, viewer_id)?,
        None => false,
    };
    Ok(CommentView {
        id: record.id.clone(),
        post_id: record.post_id.clone(),
        author: author_view(repos, Some(&record.author_id))?,
        body: record.body.clone(),
        created_at: record.created_at,
        likes: repos.comments().like_count(&record.id)?,
        is_liked,
        replies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthService;
    use crate::config::AuthConfig;
    use crate::users::{SignupRequest, UserService, FALLBACK_DISPLAY_NAME};
    use rusqlite::Connection;

    struct Fixture {
        users: UserService,
        content: ContentService,
        database: Database,
    }

    fn setup() -> Fixture {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(crate::database::MIGRATIONS).unwrap();
        let database = Database::from_connection(conn, true);
        let auth = AuthService::new(AuthConfig {
            jwt_secret: "test-secret".into(),
            token_ttl_secs: 3600,
            master_password: None,
        });
        Fixture {
            users: UserService::new(database.clone(), auth),
            content: ContentService::new(database.clone()),
            database,
        }
    }

    fn register(fixture: &Fixture, email: &str, admin: bool) -> UserRecord {
        let created = fixture
            .users
            .signup(SignupRequest {
                email: email.into(),
                password: "hunter2".into(),
                name: "Иван".into(),
                surname: "Петров".into(),
                patronymic: "".into(),
                birthday: "".into(),
                phone_number: None,
            })
            .unwrap();
        if admin {
            fixture
                .database
                .with_repositories(|repos| {
                    repos.conn().execute(
                        "UPDATE users SET permissions = 1 WHERE id = ?1",
                        rusqlite::params![created.user.id],
                    )?;
                    Ok(())
                })
                .unwrap();
        }
        fixture.users.get_record(&created.user.id).unwrap().unwrap()
    }

    fn sample_post(title: &str) -> NewPost {
        NewPost {
            title: title.into(),
            body: "body text".into(),
            source: None,
            tags: vec!["школа".into()],
            category_ids: vec![1],
            image_name: None,
        }
    }

    #[test]
    fn post_lifecycle_submission_to_public_feed() {
        let fixture = setup();
        let author = register(&fixture, "author@example.com", false);
        let admin = register(&fixture, "admin@example.com", true);

        let post = fixture
            .content
            .create_post(&author, sample_post("Новый учебный год"))
            .unwrap();
        assert!(!post.moderated);

        // Invisible to the public until approved.
        assert!(fixture
            .content
            .feed(None, &FeedQuery::default())
            .unwrap()
            .is_empty());

        let queue = fixture
            .content
            .moderation_queue(&admin, &FeedQuery::default())
            .unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, post.id);

        let approved = fixture
            .content
            .moderate(
                &admin,
                &post.id,
                ModerationInput {
                    approved: true,
                    title: Some("Отредактировано".into()),
                    ..ModerationInput::default()
                },
            )
            .unwrap();
        assert!(approved.moderated);
        assert_eq!(approved.title, "Отредактировано");
        // Untouched fields survive the review.
        assert_eq!(approved.body, "body text");
        assert_eq!(approved.category_ids, vec![1]);

        let feed = fixture.content.feed(None, &FeedQuery::default()).unwrap();
        assert_eq!(feed.len(), 1);
        assert!(fixture
            .content
            .moderation_queue(&admin, &FeedQuery::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn moderation_queue_requires_admin() {
        let fixture = setup();
        let author = register(&fixture, "author@example.com", false);
        assert!(matches!(
            fixture.content.moderation_queue(&author, &FeedQuery::default()),
            Err(AppError::PermissionDenied(_))
        ));
        assert!(matches!(
            fixture
                .content
                .moderate(&author, "post-x", ModerationInput::default()),
            Err(AppError::PermissionDenied(_))
        ));
    }

    #[test]
    fn scheduled_posts_stay_hidden_until_due() {
        let fixture = setup();
        let author = register(&fixture, "author@example.com", false);
        let admin = register(&fixture, "admin@example.com", true);
        let post = fixture
            .content
            .create_post(&author, sample_post("Запланировано"))
            .unwrap();
        fixture
            .content
            .moderate(
                &admin,
                &post.id,
                ModerationInput {
                    approved: true,
                    publish_after: Some(now_unix() + 3600),
                    ..ModerationInput::default()
                },
            )
            .unwrap();
        assert!(fixture
            .content
            .feed(None, &FeedQuery::default())
            .unwrap()
            .is_empty());
        // Direct lookup still works for the owner and moderators.
        assert!(fixture.content.get_post(None, &post.id).is_ok());
    }

    #[test]
    fn like_toggles_and_views_deduplicate() {
        let fixture = setup();
        let author = register(&fixture, "author@example.com", false);
        let reader = register(&fixture, "reader@example.com", false);
        let post = fixture
            .content
            .create_post(&author, sample_post("Счётчики"))
            .unwrap();

        let like = fixture.content.toggle_like(&reader, &post.id).unwrap();
        assert!(like.liked);
        assert_eq!(like.likes, 1);
        let like = fixture.content.toggle_like(&reader, &post.id).unwrap();
        assert!(!like.liked);
        assert_eq!(like.likes, 0);

        assert_eq!(fixture.content.record_view(Some(&reader), &post.id).unwrap(), 1);
        assert_eq!(fixture.content.record_view(Some(&reader), &post.id).unwrap(), 1);
        assert_eq!(fixture.content.record_view(None, &post.id).unwrap(), 2);

        assert!(matches!(
            fixture.content.toggle_like(&reader, "no-such-post"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn comment_tree_rules() {
        let fixture = setup();
        let author = register(&fixture, "author@example.com", false);
        let reader = register(&fixture, "reader@example.com", false);
        let post = fixture
            .content
            .create_post(&author, sample_post("Обсуждение"))
            .unwrap();

        let top = fixture
            .content
            .create_comment(&reader, &post.id, "первый", None)
            .unwrap();
        let reply = fixture
            .content
            .create_comment(&author, &post.id, "ответ", Some(&top.id))
            .unwrap();

        // Replies to replies are rejected.
        assert!(matches!(
            fixture
                .content
                .create_comment(&reader, &post.id, "глубже", Some(&reply.id)),
            Err(AppError::Validation(_))
        ));

        let other = fixture
            .content
            .create_post(&author, sample_post("Другой пост"))
            .unwrap();
        assert!(matches!(
            fixture
                .content
                .create_comment(&reader, &other.id, "не туда", Some(&top.id)),
            Err(AppError::Validation(_))
        ));

        let tree = fixture.content.comments(None, &post.id).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].replies.len(), 1);
        assert_eq!(tree[0].replies[0].body, "ответ");

        // The displayed comment count is top-level only.
        let view = fixture.content.get_post(None, &post.id).unwrap();
        assert_eq!(view.comment_count, 1);
    }

    #[test]
    fn disabled_comments_reject_new_ones() {
        let fixture = setup();
        let author = register(&fixture, "author@example.com", false);
        let admin = register(&fixture, "admin@example.com", true);
        let post = fixture
            .content
            .create_post(&author, sample_post("Закрыто"))
            .unwrap();

        assert!(matches!(
            fixture
                .content
                .set_comments_disabled(&author, &post.id, true),
            Err(AppError::PermissionDenied(_))
        ));
        fixture
            .content
            .set_comments_disabled(&admin, &post.id, true)
            .unwrap();
        assert!(matches!(
            fixture.content.create_comment(&author, &post.id, "тихо", None),
            Err(AppError::Validation(_))
        ));

        fixture
            .content
            .set_comments_disabled(&admin, &post.id, false)
            .unwrap();
        assert!(fixture
            .content
            .create_comment(&author, &post.id, "снова можно", None)
            .is_ok());
    }

    #[test]
    fn comment_like_is_a_real_toggle() {
        let fixture = setup();
        let author = register(&fixture, "author@example.com", false);
        let reader = register(&fixture, "reader@example.com", false);
        let post = fixture
            .content
            .create_post(&author, sample_post("Лайки"))
            .unwrap();
        let comment = fixture
            .content
            .create_comment(&author, &post.id, "текст", None)
            .unwrap();

        let like = fixture
            .content
            .toggle_comment_like(&reader, &comment.id)
            .unwrap();
        assert!(like.liked);
        assert_eq!(like.likes, 1);
        let like = fixture
            .content
            .toggle_comment_like(&reader, &comment.id)
            .unwrap();
        assert!(!like.liked);
        assert_eq!(like.likes, 0);
    }

    #[test]
    fn delete_is_author_or_admin_only() {
        let fixture = setup();
        let author = register(&fixture, "author@example.com", false);
        let stranger = register(&fixture, "stranger@example.com", false);
        let admin = register(&fixture, "admin@example.com", true);

        let post = fixture
            .content
            .create_post(&author, sample_post("Удаляемое"))
            .unwrap();
        assert!(matches!(
            fixture.content.delete_post(&stranger, &post.id),
            Err(AppError::PermissionDenied(_))
        ));
        fixture.content.delete_post(&author, &post.id).unwrap();
        assert!(matches!(
            fixture.content.get_post(None, &post.id),
            Err(AppError::NotFound(_))
        ));
        // Deleting twice reports not found, not success.
        assert!(matches!(
            fixture.content.delete_post(&admin, &post.id),
            Err(AppError::NotFound(_))
        ));

        let other = fixture
            .content
            .create_post(&author, sample_post("Админское"))
            .unwrap();
        fixture.content.delete_post(&admin, &other.id).unwrap();
    }

    #[test]
    fn delete_reports_the_orphaned_image() {
        let fixture = setup();
        let author = register(&fixture, "author@example.com", false);
        let mut input = sample_post("С обложкой");
        input.image_name = Some("cover-1.png".into());
        let post = fixture.content.create_post(&author, input).unwrap();

        let orphaned = fixture.content.delete_post(&author, &post.id).unwrap();
        assert_eq!(orphaned.as_deref(), Some("cover-1.png"));

        let plain = fixture
            .content
            .create_post(&author, sample_post("Без обложки"))
            .unwrap();
        assert!(fixture.content.delete_post(&author, &plain.id).unwrap().is_none());
    }

    #[test]
    fn queue_search_keeps_newest_first() {
        let fixture = setup();
        let author = register(&fixture, "author@example.com", false);
        let admin = register(&fixture, "admin@example.com", true);

        let mut relevant = sample_post("Новости новости новости");
        relevant.body = "новости про новости".into();
        let older = fixture.content.create_post(&author, relevant).unwrap();
        let mut weaker = sample_post("Еженедельный дайджест");
        weaker.body = "короткая заметка про новости среди прочего текста".into();
        let newer = fixture.content.create_post(&author, weaker).unwrap();
        fixture
            .database
            .with_repositories(|repos| {
                repos.conn().execute(
                    "UPDATE posts SET publication_time = 100 WHERE id = ?1",
                    rusqlite::params![older.id],
                )?;
                repos.conn().execute(
                    "UPDATE posts SET publication_time = 200 WHERE id = ?1",
                    rusqlite::params![newer.id],
                )?;
                Ok(())
            })
            .unwrap();

        let queue = fixture
            .content
            .moderation_queue(
                &admin,
                &FeedQuery {
                    search: Some("новости".into()),
                    ..FeedQuery::default()
                },
            )
            .unwrap();
        let ids: Vec<&str> = queue.iter().map(|p| p.id.as_str()).collect();
        // A search term must not reorder the queue by relevance.
        assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);
    }

    #[test]
    fn missing_author_renders_fallback() {
        let fixture = setup();
        let author = register(&fixture, "author@example.com", false);
        let post = fixture
            .content
            .create_post(&author, sample_post("Сирота"))
            .unwrap();
        fixture
            .database
            .with_repositories(|repos| {
                repos.conn().execute(
                    "DELETE FROM users WHERE id = ?1",
                    rusqlite::params![author.id],
                )?;
                Ok(())
            })
            .unwrap();
        let view = fixture.content.get_post(None, &post.id).unwrap();
        assert_eq!(view.author.display_name, FALLBACK_DISPLAY_NAME);
    }
}
