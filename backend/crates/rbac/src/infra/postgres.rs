//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entity::{
    role::Role,
    user_record::{NewUser, UserRecord},
};
use crate::domain::repository::{RoleRepository, UserRepository};
use crate::domain::role_presets::RolePresets;
use crate::domain::value_object::{
    email::Email,
    role_level::RoleLevel,
    user_id::{RoleId, UserId},
};
use crate::error::{RbacError, RbacResult};

/// User columns plus aggregated role IDs. Append a WHERE clause (if any),
/// then `GROUP BY u.id`.
const SELECT_USER: &str = r#"
    SELECT
        u.id,
        u.email,
        u.password_hash,
        u.full_name,
        u.is_active,
        u.created_at,
        COALESCE(
            array_agg(ur.role_id ORDER BY ur.role_id) FILTER (WHERE ur.role_id IS NOT NULL),
            '{}'
        ) AS role_ids
    FROM users u
    LEFT JOIN user_roles ur ON ur.user_id = u.id
"#;

/// PostgreSQL-backed RBAC repository
#[derive(Clone)]
pub struct PgRbacRepository {
    pool: PgPool,
}

impl PgRbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_user(&self, user_id: UserId) -> RbacResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "{SELECT_USER} WHERE u.id = $1 GROUP BY u.id"
        ))
        .bind(user_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_record))
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgRbacRepository {
    async fn find_by_email(&self, email: &Email) -> RbacResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "{SELECT_USER} WHERE u.email = $1 GROUP BY u.id"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_record))
    }

    async fn find_by_id(&self, user_id: UserId) -> RbacResult<Option<UserRecord>> {
        self.fetch_user(user_id).await
    }

    async fn list(&self) -> RbacResult<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "{SELECT_USER} GROUP BY u.id ORDER BY u.id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(UserRow::into_record).collect())
    }

    async fn create(&self, user: NewUser) -> RbacResult<UserRecord> {
        let mut tx = self.pool.begin().await?;

        let user_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (email, password_hash, full_name, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.full_name.as_deref())
        .bind(user.is_active)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RbacError::DuplicateEmail
            } else {
                RbacError::Database(e)
            }
        })?;

        if !user.role_ids.is_empty() {
            let role_ids: Vec<i64> = user.role_ids.iter().map(|id| id.as_i64()).collect();
            sqlx::query(
                r#"
                INSERT INTO user_roles (user_id, role_id)
                SELECT $1, r.id FROM roles r WHERE r.id = ANY($2)
                ON CONFLICT (user_id, role_id) DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(&role_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.fetch_user(UserId::from_raw(user_id))
            .await?
            .ok_or_else(|| RbacError::Internal("Created user not readable".to_string()))
    }

    async fn add_role(&self, user_id: UserId, role_id: RoleId) -> RbacResult<UserRecord> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id.as_i64())
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(RbacError::UserNotFound);
        }

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, role_id) DO NOTHING
            "#,
        )
        .bind(user_id.as_i64())
        .bind(role_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                RbacError::RoleNotFound
            } else {
                RbacError::Database(e)
            }
        })?;

        self.fetch_user(user_id).await?.ok_or(RbacError::UserNotFound)
    }
}

// ============================================================================
// Role Repository Implementation
// ============================================================================

impl RoleRepository for PgRbacRepository {
    async fn find_by_level(&self, level: RoleLevel) -> RbacResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>("SELECT id, name, level FROM roles WHERE level = $1")
            .bind(level)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(RoleRow::into_role))
    }

    async fn find_by_name(&self, name: &str) -> RbacResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>("SELECT id, name, level FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(RoleRow::into_role))
    }

    async fn find_by_ids(&self, ids: &[RoleId]) -> RbacResult<Vec<Role>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();

        let rows = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, level FROM roles WHERE id = ANY($1) ORDER BY level",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RoleRow::into_role).collect())
    }

    async fn list(&self) -> RbacResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>("SELECT id, name, level FROM roles ORDER BY level")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(RoleRow::into_role).collect())
    }

    async fn ensure_roles(&self, presets: &RolePresets) -> RbacResult<()> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for preset in presets.iter() {
            inserted += sqlx::query(
                r#"
                INSERT INTO roles (name, level)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(&preset.name)
            .bind(preset.level)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;

        tracing::debug!(roles_inserted = inserted, "Role presets ensured");
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_foreign_key_violation())
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    full_name: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    role_ids: Vec<i64>,
}

impl UserRow {
    fn into_record(self) -> UserRecord {
        UserRecord {
            id: UserId::from_raw(self.id),
            email: Email::from_db(self.email),
            password_hash: self.password_hash,
            full_name: self.full_name,
            is_active: self.is_active,
            created_at: self.created_at,
            role_ids: self.role_ids.into_iter().map(RoleId::from_raw).collect(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: i64,
    name: String,
    level: i32,
}

impl RoleRow {
    fn into_role(self) -> Role {
        Role::from_db(RoleId::from_raw(self.id), self.name, self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_row_into_record() {
        let created_at = Utc::now();
        let record = UserRow {
            id: 3,
            email: "Mia@Example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            full_name: None,
            is_active: false,
            created_at,
            role_ids: vec![1, 4],
        }
        .into_record();

        assert_eq!(record.id, UserId::from_raw(3));
        assert_eq!(record.email.as_str(), "Mia@Example.com");
        assert!(!record.is_active);
        assert_eq!(record.created_at, created_at);
        assert_eq!(record.role_ids, vec![RoleId::from_raw(1), RoleId::from_raw(4)]);
    }

    #[test]
    fn test_role_row_into_role() {
        let role = RoleRow {
            id: 5,
            name: "Administrator".to_string(),
            level: 5,
        }
        .into_role();
        assert_eq!(role, Role::from_db(RoleId::from_raw(5), "Administrator", 5));
    }

    #[test]
    fn test_non_database_errors_are_not_violations() {
        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
        assert!(!is_foreign_key_violation(&err));
    }
}
