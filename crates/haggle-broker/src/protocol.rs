//! Turn-based bilateral negotiation engine.
//!
//! One [`NegotiationProtocol`] drives one negotiation at a time: it opens the
//! thread, exchanges turns, puts proposals to the responder, and records
//! verdicts. Preconditions are checked before any model call or store write,
//! so a rejected operation leaves no partial state behind. Model failures
//! propagate uncaught; per-candidate isolation is the orchestrator's job.

use std::fmt;
use std::sync::Arc;

use haggle_core::{
    Candidate, DealScope, JobScope, MessageKind, Negotiation, NegotiationMessage,
    NegotiationResult, NegotiationStatus, Preferences, Role,
};
use haggle_llm::{ChatMessage, ChatModel};
use haggle_store::NegotiationStore;
use tracing::{debug, info};

use crate::error::{BrokerError, BrokerResult};
use crate::participant::{
    accepted_summary, opening_prompt, proposal_review_prompt, system_prompt, turn_prompt,
};
use crate::verdict::{classify_verdict, Verdict};

/// What [`NegotiationProtocol::start`] hands back.
#[derive(Debug, Clone)]
pub struct StartedNegotiation {
    /// The refreshed thread. The opening pair counts as one complete round,
    /// so the thread is back on the buyer's turn.
    pub negotiation: Negotiation,
    /// The buyer's generated opening message.
    pub buyer_opening: String,
    /// The provider's generated reply to that opening.
    pub provider_reply: String,
}

/// One full buyer, provider, buyer exchange from
/// [`NegotiationProtocol::send_buyer_message`].
#[derive(Debug, Clone)]
pub struct ExchangeRound {
    /// The thread's full message history after the round.
    pub messages: Vec<NegotiationMessage>,
    /// The provider's generated reply.
    pub provider_reply: String,
    /// The buyer's generated follow-up.
    pub buyer_reply: String,
}

/// Settled proposal state from [`NegotiationProtocol::propose_result`].
#[derive(Debug, Clone)]
pub struct ProposalOutcome {
    /// The thread after the verdict, completed when the deal was accepted.
    pub negotiation: Negotiation,
    /// The settled proposal record.
    pub result: NegotiationResult,
    /// How the responder's reply classified.
    pub verdict: Verdict,
    /// The responder's literal reply.
    pub responder_reply: String,
}

/// Runs the turn-taking protocol against one store and one model.
///
/// Both handles are threaded in by the caller; the engine never constructs
/// them and never reads configuration on its own.
pub struct NegotiationProtocol {
    store: Arc<dyn NegotiationStore>,
    model: Arc<dyn ChatModel>,
}

impl fmt::Debug for NegotiationProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NegotiationProtocol")
            .field("model", &self.model.name())
            .finish_non_exhaustive()
    }
}

impl NegotiationProtocol {
    /// Creates an engine over the given store and model.
    #[must_use]
    pub fn new(store: Arc<dyn NegotiationStore>, model: Arc<dyn ChatModel>) -> Self {
        Self { store, model }
    }

    /// Opens a negotiation with a candidate and runs the opening exchange.
    ///
    /// The buyer's opening message and the provider's reply to it are
    /// generated and persisted as one complete round; the returned thread
    /// reports the buyer's turn again.
    ///
    /// # Errors
    ///
    /// Propagates store and model failures.
    pub async fn start(
        &self,
        buyer_id: &str,
        candidate: &Candidate,
        scope: &JobScope,
        preferences: Option<&Preferences>,
        job_id: Option<&str>,
    ) -> BrokerResult<StartedNegotiation> {
        let negotiation = self
            .store
            .create_negotiation(buyer_id, &candidate.id, job_id)
            .await?;
        debug!(
            negotiation_id = %negotiation.id,
            candidate = %candidate.name,
            "negotiation opened"
        );

        let buyer_opening = self
            .model
            .complete(&[
                ChatMessage::system(system_prompt(Role::Buyer)),
                ChatMessage::user(opening_prompt(Role::Buyer, candidate, scope, preferences)),
            ])
            .await?;
        let opening_message = self
            .store
            .add_message(
                &negotiation.id,
                buyer_id,
                Role::Buyer,
                &buyer_opening,
                MessageKind::Message,
            )
            .await?;

        let provider_reply = self
            .model
            .complete(&[
                ChatMessage::system(system_prompt(Role::Provider)),
                ChatMessage::user(turn_prompt(
                    Role::Provider,
                    &negotiation,
                    std::slice::from_ref(&opening_message),
                    candidate,
                    preferences,
                )),
            ])
            .await?;
        self.store
            .add_message(
                &negotiation.id,
                &candidate.id,
                Role::Provider,
                &provider_reply,
                MessageKind::Message,
            )
            .await?;

        let negotiation = self.fetch(&negotiation.id).await?;
        Ok(StartedNegotiation {
            negotiation,
            buyer_opening,
            provider_reply,
        })
    }

    /// Records a buyer message, then runs one provider-then-buyer auto round
    /// with the full history as context.
    ///
    /// # Errors
    ///
    /// Fails with [`BrokerError::InvalidState`] before any side effect when
    /// the thread is not active.
    pub async fn send_buyer_message(
        &self,
        negotiation_id: &str,
        content: &str,
        candidate: &Candidate,
        preferences: Option<&Preferences>,
    ) -> BrokerResult<ExchangeRound> {
        let negotiation = self.fetch_active(negotiation_id).await?;

        self.store
            .add_message(
                negotiation_id,
                &negotiation.buyer_agent_id,
                Role::Buyer,
                content,
                MessageKind::Message,
            )
            .await?;

        let provider_reply = self
            .generate_reply(Role::Provider, &negotiation, candidate, preferences)
            .await?;
        self.store
            .add_message(
                negotiation_id,
                &negotiation.provider_agent_id,
                Role::Provider,
                &provider_reply,
                MessageKind::Message,
            )
            .await?;

        let buyer_reply = self
            .generate_reply(Role::Buyer, &negotiation, candidate, preferences)
            .await?;
        self.store
            .add_message(
                negotiation_id,
                &negotiation.buyer_agent_id,
                Role::Buyer,
                &buyer_reply,
                MessageKind::Message,
            )
            .await?;

        let messages = self.store.messages(negotiation_id).await?;
        debug!(
            negotiation_id = %negotiation_id,
            total_messages = messages.len(),
            "buyer round recorded"
        );
        Ok(ExchangeRound {
            messages,
            provider_reply,
            buyer_reply,
        })
    }

    /// Records one message and generates exactly one reply from the opposite
    /// role, attributed to that role's agent.
    ///
    /// # Errors
    ///
    /// Fails with [`BrokerError::InvalidState`] before any side effect when
    /// the thread is not active.
    pub async fn send_single_message(
        &self,
        negotiation_id: &str,
        sender: &str,
        sender_role: Role,
        content: &str,
        candidate: &Candidate,
        preferences: Option<&Preferences>,
    ) -> BrokerResult<NegotiationMessage> {
        let negotiation = self.fetch_active(negotiation_id).await?;

        self.store
            .add_message(
                negotiation_id,
                sender,
                sender_role,
                content,
                MessageKind::Message,
            )
            .await?;

        let reply_role = sender_role.opposite();
        let reply = self
            .generate_reply(reply_role, &negotiation, candidate, preferences)
            .await?;
        let message = self
            .store
            .add_message(
                negotiation_id,
                negotiation.agent_for(reply_role),
                reply_role,
                &reply,
                MessageKind::Message,
            )
            .await?;
        Ok(message)
    }

    /// Puts a priced proposal to the responder and records the verdict.
    ///
    /// The responder is whichever role the proposer does not hold; the
    /// proposer is the buyer iff their id matches the thread's buyer agent.
    /// An accepted verdict completes the thread with a summary carrying
    /// price and scope. A rejected verdict leaves the thread active.
    ///
    /// # Errors
    ///
    /// Fails with [`BrokerError::InvalidState`] before any side effect when
    /// the thread is not active.
    pub async fn propose_result(
        &self,
        negotiation_id: &str,
        proposer_id: &str,
        final_price: Option<i64>,
        scope: Option<DealScope>,
    ) -> BrokerResult<ProposalOutcome> {
        let negotiation = self.fetch_active(negotiation_id).await?;

        let proposer_role = if proposer_id == negotiation.buyer_agent_id {
            Role::Buyer
        } else {
            Role::Provider
        };
        let responder_role = proposer_role.opposite();

        let result = self
            .store
            .create_result(negotiation_id, proposer_id, final_price, scope.clone())
            .await?;

        let responder_reply = self
            .model
            .complete(&[
                ChatMessage::system(system_prompt(responder_role)),
                ChatMessage::user(proposal_review_prompt(
                    responder_role,
                    final_price,
                    scope.as_ref(),
                )),
            ])
            .await?;
        let verdict = classify_verdict(&responder_reply);
        let result = self
            .store
            .respond_to_result(&result.id, verdict.proposal_status(), Some(&responder_reply))
            .await?;

        let negotiation = if verdict.is_accepted() {
            let summary = accepted_summary(final_price, scope.as_ref());
            info!(
                negotiation_id = %negotiation_id,
                price = ?final_price,
                "proposal accepted, completing negotiation"
            );
            self.store
                .update_status(negotiation_id, NegotiationStatus::Completed, Some(&summary))
                .await?
        } else {
            debug!(negotiation_id = %negotiation_id, "proposal rejected");
            self.fetch(negotiation_id).await?
        };

        Ok(ProposalOutcome {
            negotiation,
            result,
            verdict,
            responder_reply,
        })
    }

    /// Cancels an active thread, recording the reason as its closing message
    /// and summary.
    ///
    /// # Errors
    ///
    /// Fails with [`BrokerError::InvalidState`] before any side effect when
    /// the thread is not active.
    pub async fn cancel(
        &self,
        negotiation_id: &str,
        cancelled_by: &str,
        canceller_role: Role,
        reason: &str,
    ) -> BrokerResult<Negotiation> {
        self.fetch_active(negotiation_id).await?;

        self.store
            .add_message(
                negotiation_id,
                cancelled_by,
                canceller_role,
                reason,
                MessageKind::Cancellation,
            )
            .await?;
        let negotiation = self
            .store
            .update_status(negotiation_id, NegotiationStatus::Cancelled, Some(reason))
            .await?;
        info!(negotiation_id = %negotiation_id, "negotiation cancelled");
        Ok(negotiation)
    }

    async fn fetch(&self, negotiation_id: &str) -> BrokerResult<Negotiation> {
        self.store
            .get_negotiation(negotiation_id)
            .await?
            .ok_or_else(|| BrokerError::negotiation_not_found(negotiation_id))
    }

    async fn fetch_active(&self, negotiation_id: &str) -> BrokerResult<Negotiation> {
        let negotiation = self.fetch(negotiation_id).await?;
        if !negotiation.is_active() {
            return Err(BrokerError::invalid_state(&negotiation));
        }
        Ok(negotiation)
    }

    /// Generates one reply for a role using the thread's history as context.
    async fn generate_reply(
        &self,
        role: Role,
        negotiation: &Negotiation,
        candidate: &Candidate,
        preferences: Option<&Preferences>,
    ) -> BrokerResult<String> {
        let history = self.store.messages(&negotiation.id).await?;
        let reply = self
            .model
            .complete(&[
                ChatMessage::system(system_prompt(role)),
                ChatMessage::user(turn_prompt(
                    role,
                    negotiation,
                    &history,
                    candidate,
                    preferences,
                )),
            ])
            .await?;
        Ok(reply)
    }
}
