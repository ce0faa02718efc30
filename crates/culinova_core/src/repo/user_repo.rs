//! User, credential and follow repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist locally cached accounts and look them up by identity.
//! - Record which identity providers authenticated an account.
//! - Own follow edge writes and follower/following queries.
//!
//! # Invariants
//! - Username lookups compare lowercase values.
//! - Duplicate username/external id/follow edge surfaces as `Conflict`.

use crate::db::{ensure_tables, now_epoch_ms};
use crate::model::user::{AuthCredential, AuthProvider, CredentialId, Follow, User, UserId};
use crate::repo::{map_write_error, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT
    uuid,
    username,
    external_id,
    display_name,
    avatar_url,
    created_at
FROM users";

/// Repository interface for account records.
pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_by_external_id(&self, external_id: &str) -> RepoResult<Option<User>>;
    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    /// Sets the provider subject on a record (legacy backfill).
    fn set_external_id(&self, id: UserId, external_id: &str) -> RepoResult<()>;
    fn update_profile(
        &self,
        id: UserId,
        display_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> RepoResult<()>;
    /// Lists records with no provider subject.
    fn list_legacy_users(&self) -> RepoResult<Vec<User>>;
    fn add_credential(&self, credential: &AuthCredential) -> RepoResult<CredentialId>;
    fn list_credentials(&self, user_id: UserId) -> RepoResult<Vec<AuthCredential>>;
    fn has_credential(
        &self,
        user_id: UserId,
        provider: AuthProvider,
        external_id: Option<&str>,
    ) -> RepoResult<bool>;
    fn follow(&self, follower_id: UserId, followee_id: UserId) -> RepoResult<Follow>;
    /// Returns `false` when no edge existed.
    fn unfollow(&self, follower_id: UserId, followee_id: UserId) -> RepoResult<bool>;
    fn list_following(&self, user_id: UserId) -> RepoResult<Vec<User>>;
    fn list_followers(&self, user_id: UserId) -> RepoResult<Vec<User>>;
}

/// SQLite-backed account repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["users", "auth_credentials", "follows"])?;
        Ok(Self { conn })
    }

    fn query_one(&self, filter: &str, value: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE {filter} = ?1;"))?;
        let mut rows = stmt.query([value])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn query_many(&self, sql: &str, id: UserId) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn ensure_user_exists(&self, id: UserId) -> RepoResult<()> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::NotFound {
                entity: "user",
                id,
            });
        }
        Ok(())
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()?;

        self.conn
            .execute(
                "INSERT INTO users (
                    uuid,
                    username,
                    external_id,
                    display_name,
                    avatar_url,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    user.id.to_string(),
                    user.username.as_str(),
                    user.external_id.as_deref(),
                    user.display_name.as_deref(),
                    user.avatar_url.as_deref(),
                    user.created_at,
                ],
            )
            .map_err(|err| map_write_error(err, "create user"))?;

        Ok(user.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.query_one("uuid", id.to_string().as_str())
    }

    fn find_by_external_id(&self, external_id: &str) -> RepoResult<Option<User>> {
        self.query_one("external_id", external_id)
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.query_one("username", username.trim().to_lowercase().as_str())
    }

    fn set_external_id(&self, id: UserId, external_id: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE users SET external_id = ?2 WHERE uuid = ?1;",
                params![id.to_string(), external_id],
            )
            .map_err(|err| map_write_error(err, "set external id"))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "user",
                id,
            });
        }
        Ok(())
    }

    fn update_profile(
        &self,
        id: UserId,
        display_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET display_name = ?2, avatar_url = ?3 WHERE uuid = ?1;",
            params![id.to_string(), display_name, avatar_url],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "user",
                id,
            });
        }
        Ok(())
    }

    fn list_legacy_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL} WHERE external_id IS NULL ORDER BY created_at ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn add_credential(&self, credential: &AuthCredential) -> RepoResult<CredentialId> {
        self.ensure_user_exists(credential.user_id)?;
        self.conn
            .execute(
                "INSERT INTO auth_credentials (
                    uuid,
                    user_uuid,
                    provider,
                    external_id,
                    credential_id,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    credential.id.to_string(),
                    credential.user_id.to_string(),
                    credential.provider.as_str(),
                    credential.external_id.as_deref(),
                    credential.credential_id.as_deref(),
                    credential.created_at,
                ],
            )
            .map_err(|err| map_write_error(err, "add credential"))?;
        Ok(credential.id)
    }

    fn list_credentials(&self, user_id: UserId) -> RepoResult<Vec<AuthCredential>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                uuid,
                user_uuid,
                provider,
                external_id,
                credential_id,
                created_at
             FROM auth_credentials
             WHERE user_uuid = ?1
             ORDER BY created_at ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut credentials = Vec::new();
        while let Some(row) = rows.next()? {
            credentials.push(parse_credential_row(row)?);
        }
        Ok(credentials)
    }

    fn has_credential(
        &self,
        user_id: UserId,
        provider: AuthProvider,
        external_id: Option<&str>,
    ) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM auth_credentials
                WHERE user_uuid = ?1
                  AND provider = ?2
                  AND external_id IS ?3
            );",
            params![user_id.to_string(), provider.as_str(), external_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn follow(&self, follower_id: UserId, followee_id: UserId) -> RepoResult<Follow> {
        if follower_id == followee_id {
            return Err(RepoError::Conflict("a user cannot follow itself".to_string()));
        }
        self.ensure_user_exists(follower_id)?;
        self.ensure_user_exists(followee_id)?;

        let edge = Follow {
            id: Uuid::new_v4(),
            follower_id,
            followee_id,
            created_at: now_epoch_ms(),
        };
        self.conn
            .execute(
                "INSERT INTO follows (uuid, follower_uuid, followee_uuid, created_at)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    edge.id.to_string(),
                    follower_id.to_string(),
                    followee_id.to_string(),
                    edge.created_at,
                ],
            )
            .map_err(|err| map_write_error(err, "follow"))?;
        Ok(edge)
    }

    fn unfollow(&self, follower_id: UserId, followee_id: UserId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM follows WHERE follower_uuid = ?1 AND followee_uuid = ?2;",
            params![follower_id.to_string(), followee_id.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn list_following(&self, user_id: UserId) -> RepoResult<Vec<User>> {
        self.query_many(
            "SELECT
                u.uuid AS uuid,
                u.username AS username,
                u.external_id AS external_id,
                u.display_name AS display_name,
                u.avatar_url AS avatar_url,
                u.created_at AS created_at
             FROM follows f
             INNER JOIN users u ON u.uuid = f.followee_uuid
             WHERE f.follower_uuid = ?1
             ORDER BY u.username ASC;",
            user_id,
        )
    }

    fn list_followers(&self, user_id: UserId) -> RepoResult<Vec<User>> {
        self.query_many(
            "SELECT
                u.uuid AS uuid,
                u.username AS username,
                u.external_id AS external_id,
                u.display_name AS display_name,
                u.avatar_url AS avatar_url,
                u.created_at AS created_at
             FROM follows f
             INNER JOIN users u ON u.uuid = f.follower_uuid
             WHERE f.followee_uuid = ?1
             ORDER BY u.username ASC;",
            user_id,
        )
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let uuid_text: String = row.get("uuid")?;
    let user = User {
        id: parse_uuid(&uuid_text, "users.uuid")?,
        username: row.get("username")?,
        external_id: row.get("external_id")?,
        display_name: row.get("display_name")?,
        avatar_url: row.get("avatar_url")?,
        created_at: row.get("created_at")?,
    };
    user.validate()?;
    Ok(user)
}

fn parse_credential_row(row: &Row<'_>) -> RepoResult<AuthCredential> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_uuid")?;
    let provider_text: String = row.get("provider")?;
    let provider = AuthProvider::parse(&provider_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid provider `{provider_text}` in auth_credentials.provider"
        ))
    })?;

    Ok(AuthCredential {
        id: parse_uuid(&uuid_text, "auth_credentials.uuid")?,
        user_id: parse_uuid(&user_text, "auth_credentials.user_uuid")?,
        provider,
        external_id: row.get("external_id")?,
        credential_id: row.get("credential_id")?,
        created_at: row.get("created_at")?,
    })
}
