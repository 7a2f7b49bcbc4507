//! Agent roster endpoints
//!
//! GET  /api/agents  - roster in registration order
//! POST /api/agents  - register an agent

use axum::{extract::State, http::StatusCode, Json};
use listdist_common::db::Agent;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::db::agents::{create_agent as insert_agent, email_exists, load_roster, NewAgent};
use crate::error::{ApiError, ApiResult, FieldError};
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 6;

/// POST body; missing fields arrive as empty strings and fail validation
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateAgentRequest {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
}

impl CreateAgentRequest {
    fn validate(self) -> Result<NewAgent, Vec<FieldError>> {
        let name = self.name.trim();
        let email = self.email.trim();
        let mobile = self.mobile.trim();
        let mut errors = Vec::new();

        if name.is_empty() {
            errors.push(FieldError {
                field: "name",
                message: "Name is required",
            });
        }
        if !is_valid_email(email) {
            errors.push(FieldError {
                field: "email",
                message: "Please include a valid email",
            });
        }
        if mobile.is_empty() {
            errors.push(FieldError {
                field: "mobile",
                message: "Mobile number is required",
            });
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError {
                field: "password",
                message: "Password must be at least 6 characters",
            });
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewAgent {
            name: name.to_string(),
            email: email.to_lowercase(),
            mobile: mobile.to_string(),
            password: self.password,
        })
    }
}

/// `local@domain.tld` with no whitespace and a dotted domain
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains("..")
        }
        None => false,
    }
}

/// Public view of a newly created agent
#[derive(Debug, Serialize)]
pub struct CreatedAgent {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: String,
}

#[derive(Debug, Serialize)]
pub struct CreateAgentResponse {
    pub message: String,
    pub agent: CreatedAgent,
}

/// GET /api/agents
pub async fn list_agents(State(state): State<AppState>) -> ApiResult<Json<Vec<Agent>>> {
    let roster = load_roster(&state.db).await?;
    Ok(Json(roster))
}

/// POST /api/agents
pub async fn create_agent(
    State(state): State<AppState>,
    Json(request): Json<CreateAgentRequest>,
) -> ApiResult<(StatusCode, Json<CreateAgentResponse>)> {
    let new_agent = request.validate().map_err(ApiError::Validation)?;

    // The UNIQUE index still catches a concurrent insert of the same email
    if email_exists(&state.db, &new_agent.email).await? {
        return Err(listdist_common::Error::Conflict("Email already exists".to_string()).into());
    }

    let agent = insert_agent(&state.db, &new_agent).await?;

    info!(agent_id = %agent.id, "Agent created");

    Ok((
        StatusCode::CREATED,
        Json(CreateAgentResponse {
            message: "Agent created successfully".to_string(),
            agent: CreatedAgent {
                id: agent.id,
                name: agent.name,
                email: agent.email,
                mobile: agent.mobile,
            },
        }),
    ))
}
