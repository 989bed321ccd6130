//! Volatile in-memory store backend.
//!
//! Used by tests and as the degraded-mode fallback when the configured
//! database is unreachable. All returned records are clones; nothing aliases
//! the maps behind the lock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use haggle_core::{
    DealScope, MessageKind, Negotiation, NegotiationMessage, NegotiationResult, NegotiationStatus,
    ProposalStatus, Role,
};
use parking_lot::RwLock;
use tracing::debug;

use crate::contract::NegotiationStore;
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Inner {
    negotiations: HashMap<String, Negotiation>,
    /// Messages per thread in insertion order, keeping same-instant appends
    /// stable without a sequence column.
    messages: HashMap<String, Vec<NegotiationMessage>>,
    results: HashMap<String, NegotiationResult>,
}

/// Thread-safe in-memory negotiation store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of threads held.
    #[must_use]
    pub fn negotiation_count(&self) -> usize {
        self.inner.read().negotiations.len()
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl NegotiationStore for MemoryStore {
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

        let mut inner = self.inner.write();
        inner
            .negotiations
            .insert(negotiation.id.clone(), negotiation.clone());
        inner.messages.insert(negotiation.id.clone(), Vec::new());

        debug!(negotiation_id = %negotiation.id, "created negotiation");
        Ok(negotiation)
    }

    async fn get_negotiation(&self, id: &str) -> Result<Option<Negotiation>, StoreError> {
        Ok(self.inner.read().negotiations.get(id).cloned())
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

        let mut inner = self.inner.write();
        let negotiation = inner
            .negotiations
            .get_mut(negotiation_id)
            .ok_or_else(|| StoreError::negotiation_not_found(negotiation_id))?;

        negotiation.current_turn = negotiation.current_turn.opposite();
        negotiation.updated_at = message.created_at;

        inner
            .messages
            .entry(negotiation_id.to_string())
            .or_default()
            .push(message.clone());

        debug!(
            negotiation_id = %negotiation_id,
            sender_role = %sender_role,
            kind = %kind,
            "recorded message"
        );
        Ok(message)
    }

    async fn messages(&self, negotiation_id: &str) -> Result<Vec<NegotiationMessage>, StoreError> {
        Ok(self
            .inner
            .read()
            .messages
            .get(negotiation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_status(
        &self,
        id: &str,
        status: NegotiationStatus,
        summary: Option<&str>,
    ) -> Result<Negotiation, StoreError> {
        let mut inner = self.inner.write();
        let negotiation = inner
            .negotiations
            .get_mut(id)
            .ok_or_else(|| StoreError::negotiation_not_found(id))?;

        let now = Utc::now();
        negotiation.status = status;
        negotiation.updated_at = now;
        negotiation.ended_at = status.is_terminal().then_some(now);
        if let Some(summary) = summary {
            negotiation.summary = Some(summary.to_string());
        }

        debug!(negotiation_id = %id, status = %status, "updated negotiation status");
        Ok(negotiation.clone())
    }

    async fn create_result(
        &self,
        negotiation_id: &str,
        proposed_by: &str,
        final_price: Option<i64>,
        scope: Option<DealScope>,
    ) -> Result<NegotiationResult, StoreError> {
        let mut inner = self.inner.write();
        if !inner.negotiations.contains_key(negotiation_id) {
            return Err(StoreError::negotiation_not_found(negotiation_id));
        }

        let result = NegotiationResult::new(negotiation_id, proposed_by, final_price, scope);
        inner.results.insert(result.id.clone(), result.clone());

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
        let mut inner = self.inner.write();
        let result = inner
            .results
            .get_mut(result_id)
            .ok_or_else(|| StoreError::result_not_found(result_id))?;

        result.status = status;
        result.responded_at = Some(Utc::now());
        result.response_message = response_message.map(ToString::to_string);

        debug!(result_id = %result_id, status = %status, "settled result");
        Ok(result.clone())
    }
}
