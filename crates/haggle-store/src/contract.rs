//! The store contract shared by all backends.

use async_trait::async_trait;
use haggle_core::{
    DealScope, MessageKind, Negotiation, NegotiationMessage, NegotiationResult, NegotiationStatus,
    ProposalStatus, Role,
};

use crate::error::StoreError;

/// Persistence operations for negotiation threads.
///
/// Both backends implement identical semantics; callers hold the store as
/// `Arc<dyn NegotiationStore>` and never branch on the backend.
#[async_trait]
pub trait NegotiationStore: Send + Sync {
    /// Opens a new active thread with the buyer holding the first turn.
    async fn create_negotiation(
        &self,
        buyer_agent_id: &str,
        provider_agent_id: &str,
        job_id: Option<&str>,
    ) -> Result<Negotiation, StoreError>;

    /// Fetches a thread by id. Returns `None` when it does not exist.
    async fn get_negotiation(&self, id: &str) -> Result<Option<Negotiation>, StoreError>;

    /// Appends a message and flips the thread's turn marker.
    ///
    /// The flip happens once per recorded message regardless of the sender's
    /// role; alternation discipline belongs to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the thread does not exist.
    async fn add_message(
        &self,
        negotiation_id: &str,
        sender: &str,
        sender_role: Role,
        content: &str,
        kind: MessageKind,
    ) -> Result<NegotiationMessage, StoreError>;

    /// Lists a thread's messages in recording order.
    ///
    /// An unknown thread id yields an empty list, matching a thread with no
    /// messages.
    async fn messages(&self, negotiation_id: &str) -> Result<Vec<NegotiationMessage>, StoreError>;

    /// Moves a thread to the given status.
    ///
    /// A terminal status stamps `ended_at`; moving back to active clears it.
    /// When a summary is given it replaces the stored one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the thread does not exist.
    async fn update_status(
        &self,
        id: &str,
        status: NegotiationStatus,
        summary: Option<&str>,
    ) -> Result<Negotiation, StoreError>;

    /// Records a pending deal proposal on a thread.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the thread does not exist.
    async fn create_result(
        &self,
        negotiation_id: &str,
        proposed_by: &str,
        final_price: Option<i64>,
        scope: Option<DealScope>,
    ) -> Result<NegotiationResult, StoreError>;

    /// Settles a proposal with the responder's verdict.
    ///
    /// Status and `responded_at` change together. Callers pass a settled
    /// status; the single-verdict rule is their discipline.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the result does not exist.
    async fn respond_to_result(
        &self,
        result_id: &str,
        status: ProposalStatus,
        response_message: Option<&str>,
    ) -> Result<NegotiationResult, StoreError>;
}
