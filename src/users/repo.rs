use axum::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Mentor,
    Mentee,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Mentor => "mentor",
            UserRole::Mentee => "mentee",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mentor" => Some(UserRole::Mentor),
            "mentee" => Some(UserRole::Mentee),
            _ => None,
        }
    }
}

/// User record. `email` is the primary key and immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: UserRole,
    pub bio: String,
    pub tech_stack: String,
    pub profile_image: Option<String>,
    pub created_at: OffsetDateTime,
}

impl User {
    /// Role gate for mentor-only and mentee-only operations.
    pub fn require_role(&self, expected: UserRole) -> Result<(), ApiError> {
        if self.role == expected {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "operation requires {} role",
                expected.as_str()
            )))
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: UserRole,
    pub bio: String,
    pub tech_stack: String,
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub name: String,
    pub bio: String,
    pub tech_stack: String,
    pub role: UserRole,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails `DuplicateIdentity` if the email is already registered.
    async fn create(&self, user: NewUser) -> Result<User, ApiError>;
    async fn find(&self, email: &str) -> Result<Option<User>, ApiError>;
    /// Mutates the mutable profile fields; fails `NotFound` if absent.
    async fn update_profile(&self, email: &str, update: ProfileUpdate) -> Result<User, ApiError>;
    async fn set_profile_image(&self, email: &str, key: &str) -> Result<(), ApiError>;
    /// All users with role mentor, in storage order.
    async fn list_mentors(&self) -> Result<Vec<User>, ApiError>;
}

// ---- Postgres ----

#[derive(Debug, FromRow)]
struct UserRow {
    email: String,
    password_hash: String,
    name: String,
    role: String,
    bio: String,
    tech_stack: String,
    profile_image: Option<String>,
    created_at: OffsetDateTime,
}

impl UserRow {
    fn into_user(self) -> Result<User, ApiError> {
        let role = UserRole::parse(&self.role)
            .ok_or_else(|| anyhow::anyhow!("unknown role in store: {}", self.role))?;
        Ok(User {
            email: self.email,
            password_hash: self.password_hash,
            name: self.name,
            role,
            bio: self.bio,
            tech_stack: self.tech_stack,
            profile_image: self.profile_image,
            created_at: self.created_at,
        })
    }
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, ApiError> {
        let res = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password_hash, name, role, bio, tech_stack)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING email, password_hash, name, role, bio, tech_stack, profile_image, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(&user.bio)
        .bind(&user.tech_stack)
        .fetch_one(&self.pool)
        .await;

        match res {
            Ok(row) => row.into_user(),
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some("23505") => {
                Err(ApiError::DuplicateIdentity)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find(&self, email: &str) -> Result<Option<User>, ApiError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT email, password_hash, name, role, bio, tech_stack, profile_image, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn update_profile(&self, email: &str, update: ProfileUpdate) -> Result<User, ApiError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET name = $2, bio = $3, tech_stack = $4, role = $5
            WHERE email = $1
            RETURNING email, password_hash, name, role, bio, tech_stack, profile_image, created_at
            "#,
        )
        .bind(email)
        .bind(&update.name)
        .bind(&update.bio)
        .bind(&update.tech_stack)
        .bind(update.role.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| ApiError::NotFound(format!("no user {email}")))?
            .into_user()
    }

    async fn set_profile_image(&self, email: &str, key: &str) -> Result<(), ApiError> {
        let res = sqlx::query(r#"UPDATE users SET profile_image = $2 WHERE email = $1"#)
            .bind(email)
            .bind(key)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("no user {email}")));
        }
        Ok(())
    }

    async fn list_mentors(&self) -> Result<Vec<User>, ApiError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT email, password_hash, name, role, bio, tech_stack, profile_image, created_at
            FROM users
            WHERE role = 'mentor'
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(UserRow::into_user).collect()
    }
}

// ---- In-memory (tests and local runs) ----

/// Vec-backed store; scans are fine at this scale and preserve insertion
/// order for the mentor listing.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, ApiError> {
        let mut users = self.users.write();
        if users.iter().any(|u| u.email == user.email) {
            return Err(ApiError::DuplicateIdentity);
        }
        let user = User {
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            role: user.role,
            bio: user.bio,
            tech_stack: user.tech_stack,
            profile_image: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self.users.read().iter().find(|u| u.email == email).cloned())
    }

    async fn update_profile(&self, email: &str, update: ProfileUpdate) -> Result<User, ApiError> {
        let mut users = self.users.write();
        let user = users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| ApiError::NotFound(format!("no user {email}")))?;
        user.name = update.name;
        user.bio = update.bio;
        user.tech_stack = update.tech_stack;
        user.role = update.role;
        Ok(user.clone())
    }

    async fn set_profile_image(&self, email: &str, key: &str) -> Result<(), ApiError> {
        let mut users = self.users.write();
        let user = users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| ApiError::NotFound(format!("no user {email}")))?;
        user.profile_image = Some(key.to_string());
        Ok(())
    }

    async fn list_mentors(&self) -> Result<Vec<User>, ApiError> {
        Ok(self
            .users
            .read()
            .iter()
            .filter(|u| u.role == UserRole::Mentor)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, role: UserRole) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "hash".into(),
            name: email.split('@').next().unwrap().into(),
            role,
            bio: String::new(),
            tech_stack: String::new(),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let store = MemoryUserStore::default();
        store.create(new_user("a@x.com", UserRole::Mentor)).await.unwrap();
        let err = store
            .create(new_user("a@x.com", UserRole::Mentee))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateIdentity));
    }

    #[tokio::test]
    async fn update_profile_mutates_only_mutable_fields() {
        let store = MemoryUserStore::default();
        store.create(new_user("a@x.com", UserRole::Mentee)).await.unwrap();
        let updated = store
            .update_profile(
                "a@x.com",
                ProfileUpdate {
                    name: "Alice".into(),
                    bio: "hi".into(),
                    tech_stack: "Rust".into(),
                    role: UserRole::Mentor,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "a@x.com");
        assert_eq!(updated.name, "Alice");
        assert_eq!(updated.role, UserRole::Mentor);
    }

    #[tokio::test]
    async fn update_profile_unknown_user_is_not_found() {
        let store = MemoryUserStore::default();
        let err = store
            .update_profile(
                "ghost@x.com",
                ProfileUpdate {
                    name: "g".into(),
                    bio: String::new(),
                    tech_stack: String::new(),
                    role: UserRole::Mentee,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_mentors_preserves_insertion_order() {
        let store = MemoryUserStore::default();
        store.create(new_user("m1@x.com", UserRole::Mentor)).await.unwrap();
        store.create(new_user("e1@x.com", UserRole::Mentee)).await.unwrap();
        store.create(new_user("m2@x.com", UserRole::Mentor)).await.unwrap();
        let mentors = store.list_mentors().await.unwrap();
        let emails: Vec<_> = mentors.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, ["m1@x.com", "m2@x.com"]);
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            email: "a@x.com".into(),
            password_hash: "secret-hash".into(),
            name: "A".into(),
            role: UserRole::Mentor,
            bio: String::new(),
            tech_stack: String::new(),
            profile_image: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
