use crate::auth::AuthService;
use crate::database::models::{
    ExpertRequestRecord, NotificationRecord, ProfileUpdate, UserRecord,
};
use crate::database::repositories::{
    ExpertRequestRepository, NotificationRepository, SubscriptionRepository, UserRepository,
};
use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::utils::now_unix;
use serde::Serialize;
use uuid::Uuid;

/// Shown in place of an author that no longer exists or hides their profile.
pub const FALLBACK_DISPLAY_NAME: &str = "Некто";
pub const DEFAULT_AVATAR_URL: &str = "/images/default-avatar.png";

pub fn avatar_url(avatar_name: Option<&str>) -> String {
    match avatar_name {
        Some(name) => format!("/images/{name}"),
        None => DEFAULT_AVATAR_URL.to_string(),
    }
}

/// Public projection of a user, with fields gated by the owner's privacy
/// settings.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: String,
    pub display_name: String,
    pub avatar_url: String,
    pub about_text: Option<String>,
    pub registration_date: i64,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub subscriber_count: i64,
    pub subscription_count: i64,
}

impl UserView {
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            display_name: display_name(record),
            avatar_url: avatar_url(record.avatar_name.as_deref()),
            about_text: record.about_text.clone(),
            registration_date: record.registration_date,
            name: record.show_first_name.then(|| record.name.clone()),
            surname: record.show_surname.then(|| record.surname.clone()),
            email: record.show_email.then(|| record.email.clone()),
            phone_number: record
                .show_phone
                .then(|| record.phone_number.clone())
                .flatten(),
            subscriber_count: 0,
            subscription_count: 0,
        }
    }

    pub fn fallback() -> Self {
        Self {
            id: String::new(),
            display_name: FALLBACK_DISPLAY_NAME.to_string(),
            avatar_url: DEFAULT_AVATAR_URL.to_string(),
            about_text: None,
            registration_date: 0,
            name: None,
            surname: None,
            email: None,
            phone_number: None,
            subscriber_count: 0,
            subscription_count: 0,
        }
    }
}

/// Display name preference: screen name, then "name surname", then the
/// anonymous fallback.
fn display_name(record: &UserRecord) -> String {
    if let Some(screen_name) = record.screen_name.as_deref() {
        if !screen_name.trim().is_empty() {
            return screen_name.to_string();
        }
    }
    let full = format!("{} {}", record.name, record.surname);
    if full.trim().is_empty() {
        FALLBACK_DISPLAY_NAME.to_string()
    } else {
        full.trim().to_string()
    }
}

/// Full projection of the caller's own account, ungated by privacy flags.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub id: String,
    pub email: String,
    pub name: String,
    pub surname: String,
    pub patronymic: String,
    pub birthday: String,
    pub phone_number: Option<String>,
    pub registration_date: i64,
    pub is_admin: bool,
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
    pub avatar_url: String,
}

impl ProfileView {
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            email: record.email.clone(),
            name: record.name.clone(),
            surname: record.surname.clone(),
            patronymic: record.patronymic.clone(),
            birthday: record.birthday.clone(),
            phone_number: record.phone_number.clone(),
            registration_date: record.registration_date,
            is_admin: record.is_admin(),
            show_first_name: record.show_first_name,
            show_surname: record.show_surname,
            show_email: record.show_email,
            show_phone: record.show_phone,
            hide_profile: record.hide_profile,
            notify_new_comment: record.notify_new_comment,
            notify_new_like: record.notify_new_like,
            notify_new_subscriber: record.notify_new_subscriber,
            notify_new_offers: record.notify_new_offers,
            about_text: record.about_text.clone(),
            screen_name: record.screen_name.clone(),
            avatar_url: avatar_url(record.avatar_name.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: ProfileView,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    pub user: UserView,
    pub subscribed_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    pub id: String,
    pub text: String,
    pub actor_name: String,
    pub actor_avatar: String,
    pub created_at: i64,
}

impl NotificationView {
    fn from_record(record: NotificationRecord) -> Self {
        Self {
            id: record.id,
            text: record.text,
            actor_name: record.actor_name,
            actor_avatar: record
                .actor_avatar
                .unwrap_or_else(|| DEFAULT_AVATAR_URL.to_string()),
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpertRequestView {
    pub status: bool,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub surname: String,
    pub patronymic: String,
    pub birthday: String,
    pub phone_number: Option<String>,
}

/// Account lifecycle, sessions, profiles, subscriptions and the small
/// satellites around them (notifications, expert requests).
#[derive(Clone)]
pub struct UserService {
    database: Database,
    auth: AuthService,
}

impl UserService {
    pub fn new(database: Database, auth: AuthService) -> Self {
        Self { database, auth }
    }

    pub fn signup(&self, request: SignupRequest) -> AppResult<AuthResponse> {
        let email = request.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Validation("invalid email address".into()));
        }
        if request.password.is_empty() {
            return Err(AppError::Validation("password must not be empty".into()));
        }

        let password_hash = self.auth.hash_password(&request.password)?;
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            name: request.name,
            surname: request.surname,
            patronymic: request.patronymic,
            birthday: request.birthday,
            phone_number: request.phone_number,
            is_banned: false,
            permissions: 0,
            registration_date: now_unix(),
            show_first_name: false,
            show_surname: false,
            show_email: false,
            show_phone: false,
            hide_profile: false,
            notify_new_comment: false,
            notify_new_like: false,
            notify_new_subscriber: false,
            notify_new_offers: false,
            about_text: None,
            screen_name: None,
            avatar_name: None,
        };

        self.database.with_repositories(|repos| {
            if repos.users().find_by_email(&record.email)?.is_some() {
                return Err(AppError::Conflict("email is already registered".into()).into());
            }
            repos.users().create(&record)?;
            Ok(())
        })?;

        let token = self.auth.issue_token(&record.id)?;
        Ok(AuthResponse {
            token,
            user: ProfileView::from_record(&record),
        })
    }

    pub fn login(&self, email: &str, password: &str) -> AppResult<AuthResponse> {
        let email = email.trim().to_lowercase();
        let record = self
            .database
            .with_repositories(|repos| repos.users().find_by_email(&email))?
            .ok_or_else(|| AppError::InvalidCredentials("unknown email or password".into()))?;
        if !self.auth.verify_password(password, &record.password_hash) {
            return Err(AppError::InvalidCredentials(
                "unknown email or password".into(),
            ));
        }
        if record.is_banned {
            return Err(AppError::InvalidCredentials("account is banned".into()));
        }
        let token = self.auth.issue_token(&record.id)?;
        Ok(AuthResponse {
            token,
            user: ProfileView::from_record(&record),
        })
    }

    /// Resolves a bearer token to its account. Banned accounts fail even with
    /// a valid token.
    pub fn authenticate(&self, token: &str) -> AppResult<UserRecord> {
        let user_id = self.auth.verify_token(token)?;
        let record = self
            .database
            .with_repositories(|repos| repos.users().get(&user_id))?
            .ok_or_else(|| AppError::InvalidCredentials("account no longer exists".into()))?;
        if record.is_banned {
            return Err(AppError::InvalidCredentials("account is banned".into()));
        }
        Ok(record)
    }

    pub fn get_record(&self, user_id: &str) -> AppResult<Option<UserRecord>> {
        Ok(self
            .database
            .with_repositories(|repos| repos.users().get(user_id))?)
    }

    /// Public profile lookup. Hidden profiles resolve to the anonymous
    /// fallback rather than an error, matching what post views show.
    pub fn get_user(&self, user_id: &str) -> AppResult<UserView> {
        let record = self
            .get_record(user_id)?
            .ok_or_else(|| AppError::NotFound("user not found".into()))?;
        if record.hide_profile {
            return Ok(UserView::fallback());
        }
        let mut view = UserView::from_record(&record);
        let (incoming, outgoing) = self.database.with_repositories(|repos| {
            Ok((
                repos.subscriptions().count_incoming(user_id)?,
                repos.subscriptions().count_outgoing(user_id)?,
            ))
        })?;
        view.subscriber_count = incoming;
        view.subscription_count = outgoing;
        Ok(view)
    }

    pub fn edit_profile(&self, user_id: &str, update: &ProfileUpdate) -> AppResult<ProfileView> {
        let mut update = update.clone();
        if let Some(email) = update.email.as_mut() {
            *email = email.trim().to_lowercase();
            if email.is_empty() || !email.contains('@') {
                return Err(AppError::Validation("invalid email address".into()));
            }
        }
        let record = self.database.with_repositories(|repos| {
            if let Some(email) = &update.email {
                if let Some(existing) = repos.users().find_by_email(email)? {
                    if existing.id != user_id {
                        return Err(
                            AppError::Conflict("email is already registered".into()).into()
                        );
                    }
                }
            }
            if !repos.users().update_profile(user_id, &update)? {
                return Err(AppError::NotFound("user not found".into()).into());
            }
            repos.users().get(user_id)
        })?;
        let record = record.ok_or_else(|| AppError::NotFound("user not found".into()))?;
        Ok(ProfileView::from_record(&record))
    }

    pub fn set_avatar(&self, user_id: &str, avatar_name: &str) -> AppResult<String> {
        let updated = self
            .database
            .with_repositories(|repos| repos.users().set_avatar(user_id, avatar_name))?;
        if !updated {
            return Err(AppError::NotFound("user not found".into()));
        }
        Ok(avatar_url(Some(avatar_name)))
    }

    pub fn ban(&self, caller: &UserRecord, target_id: &str) -> AppResult<()> {
        if !caller.is_admin() {
            return Err(AppError::PermissionDenied(
                "only administrators may ban accounts".into(),
            ));
        }
        let updated = self
            .database
            .with_repositories(|repos| repos.users().set_banned(target_id, true))?;
        if !updated {
            return Err(AppError::NotFound("user not found".into()));
        }
        Ok(())
    }

    pub fn subscribe(&self, subscriber_id: &str, target_id: &str) -> AppResult<()> {
        if subscriber_id == target_id {
            return Err(AppError::Validation("cannot subscribe to yourself".into()));
        }
        self.database.with_repositories(|repos| {
            if repos.users().get(target_id)?.is_none() {
                return Err(AppError::NotFound("user not found".into()).into());
            }
            repos
                .subscriptions()
                .upsert(subscriber_id, target_id, now_unix())
        })?;
        Ok(())
    }

    pub fn unsubscribe(&self, subscriber_id: &str, target_id: &str) -> AppResult<()> {
        self.database
            .with_repositories(|repos| repos.subscriptions().delete(subscriber_id, target_id))?;
        Ok(())
    }

    /// Lists who the caller follows. Counts on each entry describe the
    /// followed account, not the caller.
    pub fn subscriptions(&self, subscriber_id: &str) -> AppResult<Vec<SubscriptionView>> {
        let views = self.database.with_repositories(|repos| {
            let edges = repos.subscriptions().list_for(subscriber_id)?;
            let mut views = Vec::with_capacity(edges.len());
            for edge in edges {
                let mut user = match repos.users().get(&edge.target_id)? {
                    Some(record) if !record.hide_profile => UserView::from_record(&record),
                    _ => UserView::fallback(),
                };
                if !user.id.is_empty() {
                    user.subscriber_count = repos.subscriptions().count_incoming(&edge.target_id)?;
                    user.subscription_count =
                        repos.subscriptions().count_outgoing(&edge.target_id)?;
                }
                views.push(SubscriptionView {
                    user,
                    subscribed_at: edge.created_at,
                });
            }
            Ok(views)
        })?;
        Ok(views)
    }

    pub fn notifications(&self, user_id: &str) -> AppResult<Vec<NotificationView>> {
        let records = self
            .database
            .with_repositories(|repos| repos.notifications().list_for_user(user_id))?;
        Ok(records.into_iter().map(NotificationView::from_record).collect())
    }

    /// Missing rows read as an empty, unsubmitted request.
    pub fn expert_request(&self, user_id: &str) -> AppResult<ExpertRequestView> {
        let record = self
            .database
            .with_repositories(|repos| repos.expert_requests().get(user_id))?;
        Ok(match record {
            Some(record) => ExpertRequestView {
                status: record.status,
                tags: serde_json::from_str(&record.tags).unwrap_or_default(),
            },
            None => ExpertRequestView {
                status: false,
                tags: Vec::new(),
            },
        })
    }

    pub fn set_expert_request(
        &self,
        user_id: &str,
        status: bool,
        tags: &[String],
    ) -> AppResult<ExpertRequestView> {
        let record = ExpertRequestRecord {
            user_id: user_id.to_string(),
            status,
            tags: serde_json::to_string(tags).map_err(anyhow::Error::from)?,
        };
        self.database
            .with_repositories(|repos| repos.expert_requests().upsert(&record))?;
        Ok(ExpertRequestView {
            status,
            tags: tags.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use rusqlite::Connection;

    fn setup() -> UserService {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(crate::database::MIGRATIONS).unwrap();
        let database = Database::from_connection(conn, true);
        let auth = AuthService::new(AuthConfig {
            jwt_secret: "test-secret".into(),
            token_ttl_secs: 3600,
            master_password: Some("skeleton-key".into()),
        });
        UserService::new(database, auth)
    }

    fn sample_signup(email: &str) -> SignupRequest {
        SignupRequest {
            email: email.into(),
            password: "hunter2".into(),
            name: "Ада".into(),
            surname: "Лавлейс".into(),
            patronymic: "".into(),
            birthday: "10.12.1815".into(),
            phone_number: None,
        }
    }

    #[test]
    fn signup_then_login_round_trip() {
        let users = setup();
        let created = users.signup(sample_signup("ada@example.com")).unwrap();
        assert!(!created.token.is_empty());

        let session = users.login("ada@example.com", "hunter2").unwrap();
        assert_eq!(session.user.email, "ada@example.com");

        let authed = users.authenticate(&session.token).unwrap();
        assert_eq!(authed.id, created.user.id);
    }

    #[test]
    fn signup_rejects_duplicate_email() {
        let users = setup();
        users.signup(sample_signup("ada@example.com")).unwrap();
        // Case and whitespace are normalized before the uniqueness check.
        let result = users.signup(sample_signup("  ADA@example.com "));
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn login_rejects_bad_password_and_banned_account() {
        let users = setup();
        let created = users.signup(sample_signup("ada@example.com")).unwrap();
        assert!(matches!(
            users.login("ada@example.com", "wrong"),
            Err(AppError::InvalidCredentials(_))
        ));

        let admin = users.signup(sample_signup("root@example.com")).unwrap();
        users
            .database
            .with_repositories(|repos| {
                repos.conn().execute(
                    "UPDATE users SET permissions = 1 WHERE id = ?1",
                    rusqlite::params![admin.user.id],
                )?;
                Ok(())
            })
            .unwrap();
        let admin_record = users.get_record(&admin.user.id).unwrap().unwrap();
        users.ban(&admin_record, &created.user.id).unwrap();

        assert!(matches!(
            users.login("ada@example.com", "hunter2"),
            Err(AppError::InvalidCredentials(_))
        ));
        assert!(matches!(
            users.authenticate(&created.token),
            Err(AppError::InvalidCredentials(_))
        ));
    }

    #[test]
    fn master_password_logs_into_any_account() {
        let users = setup();
        users.signup(sample_signup("ada@example.com")).unwrap();
        let session = users.login("ada@example.com", "skeleton-key").unwrap();
        assert_eq!(session.user.email, "ada@example.com");
    }

    #[test]
    fn ban_requires_admin() {
        let users = setup();
        let caller = users.signup(sample_signup("user@example.com")).unwrap();
        let target = users.signup(sample_signup("target@example.com")).unwrap();
        let caller_record = users.get_record(&caller.user.id).unwrap().unwrap();
        assert!(matches!(
            users.ban(&caller_record, &target.user.id),
            Err(AppError::PermissionDenied(_))
        ));
    }

    #[test]
    fn public_view_respects_privacy_flags() {
        let users = setup();
        let created = users.signup(sample_signup("ada@example.com")).unwrap();

        let view = users.get_user(&created.user.id).unwrap();
        assert!(view.email.is_none());
        assert!(view.name.is_none());
        assert_eq!(view.display_name, "Ада Лавлейс");

        users
            .edit_profile(
                &created.user.id,
                &ProfileUpdate {
                    show_email: Some(true),
                    screen_name: Some("countess".into()),
                    ..ProfileUpdate::default()
                },
            )
            .unwrap();
        let view = users.get_user(&created.user.id).unwrap();
        assert_eq!(view.email.as_deref(), Some("ada@example.com"));
        assert_eq!(view.display_name, "countess");

        users
            .edit_profile(
                &created.user.id,
                &ProfileUpdate {
                    hide_profile: Some(true),
                    ..ProfileUpdate::default()
                },
            )
            .unwrap();
        let view = users.get_user(&created.user.id).unwrap();
        assert_eq!(view.display_name, FALLBACK_DISPLAY_NAME);
        assert!(view.id.is_empty());
    }

    #[test]
    fn subscriptions_report_target_counts() {
        let users = setup();
        let alice = users.signup(sample_signup("alice@example.com")).unwrap();
        let bob = users.signup(sample_signup("bob@example.com")).unwrap();
        let carol = users.signup(sample_signup("carol@example.com")).unwrap();

        users.subscribe(&alice.user.id, &bob.user.id).unwrap();
        users.subscribe(&carol.user.id, &bob.user.id).unwrap();
        users.subscribe(&bob.user.id, &carol.user.id).unwrap();

        let list = users.subscriptions(&alice.user.id).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].user.id, bob.user.id);
        assert_eq!(list[0].user.subscriber_count, 2);
        assert_eq!(list[0].user.subscription_count, 1);

        assert!(matches!(
            users.subscribe(&alice.user.id, &alice.user.id),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            users.subscribe(&alice.user.id, "no-such-user"),
            Err(AppError::NotFound(_))
        ));

        users.unsubscribe(&alice.user.id, &bob.user.id).unwrap();
        assert!(users.subscriptions(&alice.user.id).unwrap().is_empty());
    }

    #[test]
    fn expert_request_defaults_then_round_trips() {
        let users = setup();
        let created = users.signup(sample_signup("ada@example.com")).unwrap();

        let view = users.expert_request(&created.user.id).unwrap();
        assert!(!view.status);
        assert!(view.tags.is_empty());

        let tags = vec!["математика".to_string(), "история".to_string()];
        users
            .set_expert_request(&created.user.id, true, &tags)
            .unwrap();
        let view = users.expert_request(&created.user.id).unwrap();
        assert!(view.status);
        assert_eq!(view.tags, tags);
    }
}
