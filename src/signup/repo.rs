use crate::signup::{
    errors::RepoError,
    repo_types::{NewUser, User},
};
use sqlx::SqlitePool;

impl User {
    /// Insert a validated signup in its own transaction.
    pub async fn create(db: &SqlitePool, new: &NewUser) -> Result<User, RepoError> {
        let mut tx = db.begin().await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (fullname, email, idnumber, role)
            VALUES (?, ?, ?, ?)
            RETURNING id, fullname, email, idnumber, role
            "#,
        )
        .bind(&new.fullname)
        .bind(&new.email)
        .bind(&new.idnumber)
        .bind(new.role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(RepoError::classify)?;
        tx.commit().await?;
        Ok(user)
    }

    /// Every record in insertion order.
    pub async fn list_all(db: &SqlitePool) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, fullname, email, idnumber, role
            FROM users
            ORDER BY id ASC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    #[cfg(test)]
    pub async fn find_by_idnumber(db: &SqlitePool, idnumber: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, fullname, email, idnumber, role
            FROM users
            WHERE idnumber = ?
            "#,
        )
        .bind(idnumber)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}
