//! Agent roster persistence
//!
//! The ingest pipeline only ever calls [`load_roster`]; creation exists for
//! the agent management endpoints.

use listdist_common::api::{generate_salt, hash_password};
use listdist_common::db::Agent;
use listdist_common::{time, Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_guid, parse_timestamp};

/// Validated input for a new agent
#[derive(Debug, Clone)]
pub struct NewAgent {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
}

/// All agents in roster order (registration order)
///
/// Read fresh on every call; never cached.
pub async fn load_roster(pool: &SqlitePool) -> Result<Vec<Agent>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, name, email, mobile, created_at
        FROM agents
        ORDER BY created_at ASC, rowid ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<Agent> {
            Ok(Agent {
                id: parse_guid(row.get("guid"))?,
                name: row.get("name"),
                email: row.get("email"),
                mobile: row.get("mobile"),
                created_at: parse_timestamp(row.get("created_at"))?,
            })
        })
        .collect()
}

/// Insert a new agent with a salted password hash
///
/// Duplicate email maps to `Error::Conflict`.
pub async fn create_agent(pool: &SqlitePool, new_agent: &NewAgent) -> Result<Agent> {
    let agent = Agent {
        id: Uuid::new_v4(),
        name: new_agent.name.clone(),
        email: new_agent.email.clone(),
        mobile: new_agent.mobile.clone(),
        created_at: time::now(),
    };

    let salt = generate_salt();
    let password_hash = hash_password(&new_agent.password, &salt);

    let result = sqlx::query(
        r#"
        INSERT INTO agents (guid, name, email, mobile, password_hash, password_salt, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(agent.id.to_string())
    .bind(&agent.name)
    .bind(&agent.email)
    .bind(&agent.mobile)
    .bind(password_hash)
    .bind(salt)
    .bind(time::to_db_timestamp(agent.created_at))
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(agent),
        Err(e) => {
            let err = Error::from(e);
            if err.is_unique_violation() {
                Err(Error::Conflict("Email already exists".to_string()))
            } else {
                Err(err)
            }
        }
    }
}

/// Whether an agent with this email is already registered
pub async fn email_exists(pool: &SqlitePool, email: &str) -> Result<bool> {
    let found: Option<(String,)> = sqlx::query_as("SELECT guid FROM agents WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}
