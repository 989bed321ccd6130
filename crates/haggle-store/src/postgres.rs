//! Durable postgres store backend.
//!
//! Uses runtime-checked queries against the tables in `schema.sql`. Enum
//! fields travel as lowercase text and are parsed back defensively; a value
//! this crate did not write surfaces as a backend error rather than a panic.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use haggle_core::{
    DealScope, MessageKind, Negotiation, NegotiationMessage, NegotiationResult, NegotiationStatus,
    ProposalStatus, Role,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use crate::contract::NegotiationStore;
use crate::error::StoreError;

/// How long to wait for the initial connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool size; the engine runs candidates sequentially, so this stays small.
const MAX_CONNECTIONS: u32 = 5;

/// Negotiation store backed by postgres.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the given database url.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when the database is unreachable
    /// within the connect timeout.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect(url)
            .await?;
        debug!("connected to postgres store");
        Ok(Self { pool })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NegotiationRow {
    id: String,
    buyer_agent_id: String,
    provider_agent_id: String,
    job_id: Option<String>,
    status: String,
    current_turn: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    summary: Option<String>,
}

impl TryFrom<NegotiationRow> for Negotiation {
    type Error = StoreError;

    fn try_from(row: NegotiationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            buyer_agent_id: row.buyer_agent_id,
            provider_agent_id: row.provider_agent_id,
            job_id: row.job_id,
            status: row.status.parse::<NegotiationStatus>()?,
            current_turn: row.current_turn.parse::<Role>()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            ended_at: row.ended_at,
            summary: row.summary,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: String,
    negotiation_id: String,
    sender: String,
    sender_role: String,
    content: String,
    kind: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for NegotiationMessage {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            negotiation_id: row.negotiation_id,
            sender: row.sender,
            sender_role: row.sender_role.parse::<Role>()?,
            content: row.content,
            kind: row.kind.parse::<MessageKind>()?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ResultRow {
    id: String,
    negotiation_id: String,
    proposed_by: String,
    status: String,
    final_price: Option<i64>,
    scope: Option<String>,
    created_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
    response_message: Option<String>,
}

impl TryFrom<ResultRow> for NegotiationResult {
    type Error = StoreError;

    fn try_from(row: ResultRow) -> Result<Self, Self::Error> {
        let scope = row
            .scope
            .as_deref()
            .map(serde_json::from_str::<DealScope>)
            .transpose()
            .map_err(|err| StoreError::Backend(format!("malformed scope json: {err}")))?;

        Ok(Self {
            id: row.id,
            negotiation_id: row.negotiation_id,
            proposed_by: row.proposed_by,
            status: row.status.parse::<ProposalStatus>()?,
            final_price: row.final_price,
            scope,
            created_at: row.created_at,
            responded_at: row.responded_at,
            response_message: row.response_message,
        })
    }
}

const NEGOTIATION_COLUMNS: &str = "id, buyer_agent_id, provider_agent_id, job_id, status, \
     current_turn, created_at, updated_at, ended_at, summary";

const RESULT_COLUMNS: &str = "id, negotiation_id, proposed_by, status, final_price, scope, \
     created_at, responded_at, response_message";

#[async_trait]
impl NegotiationStore for PgStore {
    async fn create_negotiation(
        &self,
        buyer_agent_id: &str,
        provider_agent_id: &str,
        job_id: Option<&str>,
    ) -> Result<Negotiation, StoreError> {
        let negotiation = Negotiation::new(
            buyer_agent_id,
            provider_agent_id,
            job_id.map(ToString::to_string),
        );

        sqlx::query(
            "INSERT INTO negotiations \
                 (id, buyer_agent_id, provider_agent_id, job_id, status, current_turn, \
                  created_at, updated_at, ended_at, summary) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&negotiation.id)
        .bind(&negotiation.buyer_agent_id)
        .bind(&negotiation.provider_agent_id)
        .bind(negotiation.job_id.as_deref())
        .bind(negotiation.status.as_str())
        .bind(negotiation.current_turn.as_str())
        .bind(negotiation.created_at)
        .bind(negotiation.updated_at)
        .bind(negotiation.ended_at)
        .bind(negotiation.summary.as_deref())
        .execute(&self.pool)
        .await?;

        debug!(negotiation_id = %negotiation.id, "created negotiation");
        Ok(negotiation)
    }

    async fn get_negotiation(&self, id: &str) -> Result<Option<Negotiation>, StoreError> {
        let row = sqlx::query_as::<_, NegotiationRow>(&format!(
            "SELECT {NEGOTIATION_COLUMNS} FROM negotiations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Negotiation::try_from).transpose()
    }

    async fn add_message(
        &self,
        negotiation_id: &str,
        sender: &str,
        sender_role: Role,
        content: &str,
        kind: MessageKind,
    ) -> Result<NegotiationMessage, StoreError> {
        let message = NegotiationMessage::new(negotiation_id, sender, sender_role, content, kind);

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE negotiations \
             SET current_turn = CASE current_turn WHEN 'buyer' THEN 'provider' ELSE 'buyer' END, \
                 updated_at = $2 \
             WHERE id = $1",
        )
        .bind(negotiation_id)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::negotiation_not_found(negotiation_id));
        }

        sqlx::query(
            "INSERT INTO negotiation_messages \
                 (id, negotiation_id, sender, sender_role, content, kind, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&message.id)
        .bind(&message.negotiation_id)
        .bind(&message.sender)
        .bind(message.sender_role.as_str())
        .bind(&message.content)
        .bind(message.kind.as_str())
        .bind(message.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            negotiation_id = %negotiation_id,
            sender_role = %sender_role,
            kind = %kind,
            "recorded message"
        );
        Ok(message)
    }

    async fn messages(&self, negotiation_id: &str) -> Result<Vec<NegotiationMessage>, StoreError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, negotiation_id, sender, sender_role, content, kind, created_at \
             FROM negotiation_messages \
             WHERE negotiation_id = $1 \
             ORDER BY seq",
        )
        .bind(negotiation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(NegotiationMessage::try_from)
            .collect()
    }

    async fn update_status(
        &self,
        id: &str,
        status: NegotiationStatus,
        summary: Option<&str>,
    ) -> Result<Negotiation, StoreError> {
        let now = Utc::now();
        let ended_at: Option<DateTime<Utc>> = status.is_terminal().then_some(now);

        let row = sqlx::query_as::<_, NegotiationRow>(&format!(
            "UPDATE negotiations \
             SET status = $2, summary = COALESCE($3, summary), ended_at = $4, updated_at = $5 \
             WHERE id = $1 \
             RETURNING {NEGOTIATION_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(summary)
        .bind(ended_at)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::negotiation_not_found(id))?;

        debug!(negotiation_id = %id, status = %status, "updated negotiation status");
        Negotiation::try_from(row)
    }

    async fn create_result(
        &self,
        negotiation_id: &str,
        proposed_by: &str,
        final_price: Option<i64>,
        scope: Option<DealScope>,
    ) -> Result<NegotiationResult, StoreError> {
        let exists = sqlx::query_scalar::<_, String>("SELECT id FROM negotiations WHERE id = $1")
            .bind(negotiation_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(StoreError::negotiation_not_found(negotiation_id));
        }

        let result = NegotiationResult::new(negotiation_id, proposed_by, final_price, scope);
        let scope_json = result
            .scope
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| StoreError::Backend(format!("scope serialization failed: {err}")))?;

        sqlx::query(
            "INSERT INTO negotiation_results \
                 (id, negotiation_id, proposed_by, status, final_price, scope, \
                  created_at, responded_at, response_message) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&result.id)
        .bind(&result.negotiation_id)
        .bind(&result.proposed_by)
        .bind(result.status.as_str())
        .bind(result.final_price)
        .bind(scope_json.as_deref())
        .bind(result.created_at)
        .bind(result.responded_at)
        .bind(result.response_message.as_deref())
        .execute(&self.pool)
        .await?;

        debug!(
            negotiation_id = %negotiation_id,
            result_id = %result.id,
            final_price = ?final_price,
            "created pending result"
        );
        Ok(result)
    }

    async fn respond_to_result(
        &self,
        result_id: &str,
        status: ProposalStatus,
        response_message: Option<&str>,
    ) -> Result<NegotiationResult, StoreError> {
        let row = sqlx::query_as::<_, ResultRow>(&format!(
            "UPDATE negotiation_results \
             SET status = $2, responded_at = $3, response_message = $4 \
             WHERE id = $1 \
             RETURNING {RESULT_COLUMNS}"
        ))
        .bind(result_id)
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(response_message)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::result_not_found(result_id))?;

        debug!(result_id = %result_id, status = %status, "settled result");
        NegotiationResult::try_from(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn negotiation_row() -> NegotiationRow {
        NegotiationRow {
            id: "neg-1".into(),
            buyer_agent_id: "buyer-1".into(),
            provider_agent_id: "provider-1".into(),
            job_id: None,
            status: "active".into(),
            current_turn: "buyer".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ended_at: None,
            summary: None,
        }
    }

    // ==========================================================================
    // Row mapping tests
    // ==========================================================================

    #[test]
    fn negotiation_row_parses_enum_columns() {
        let negotiation = Negotiation::try_from(negotiation_row()).unwrap();
        assert_eq!(negotiation.status, NegotiationStatus::Active);
        assert_eq!(negotiation.current_turn, Role::Buyer);
    }

    #[test]
    fn negotiation_row_rejects_unknown_status() {
        let mut row = negotiation_row();
        row.status = "haggling".into();
        let err = Negotiation::try_from(row).unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn message_row_parses_role_and_kind() {
        let row = MessageRow {
            id: "msg-1".into(),
            negotiation_id: "neg-1".into(),
            sender: "provider-1".into(),
            sender_role: "provider".into(),
            content: "counter offer".into(),
            kind: "proposal".into(),
            created_at: Utc::now(),
        };

        let message = NegotiationMessage::try_from(row).unwrap();
        assert_eq!(message.sender_role, Role::Provider);
        assert_eq!(message.kind, MessageKind::Proposal);
    }

    #[test]
    fn result_row_parses_scope_json() {
        let row = ResultRow {
            id: "res-1".into(),
            negotiation_id: "neg-1".into(),
            proposed_by: "buyer-1".into(),
            status: "accepted".into(),
            final_price: Some(240),
            scope: Some(r#"{"description":"move-out clean","rooms":3,"details":{}}"#.into()),
            created_at: Utc::now(),
            responded_at: Some(Utc::now()),
            response_message: Some("deal".into()),
        };

        let result = NegotiationResult::try_from(row).unwrap();
        assert_eq!(result.status, ProposalStatus::Accepted);
        let scope = result.scope.unwrap();
        assert_eq!(scope.description.as_deref(), Some("move-out clean"));
        assert_eq!(scope.rooms, Some(3));
    }

    #[test]
    fn result_row_rejects_malformed_scope() {
        let row = ResultRow {
            id: "res-1".into(),
            negotiation_id: "neg-1".into(),
            proposed_by: "buyer-1".into(),
            status: "pending".into(),
            final_price: None,
            scope: Some("{not json".into()),
            created_at: Utc::now(),
            responded_at: None,
            response_message: None,
        };

        let err = NegotiationResult::try_from(row).unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
