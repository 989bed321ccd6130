//! Multi-candidate negotiation batches.
//!
//! Runs one negotiation per shortlisted candidate, sequentially, and always
//! returns exactly one outcome row per candidate in shortlist order. A
//! breakdown in one candidate's run is recorded in that candidate's row and
//! never stops the batch.

use haggle_core::{
    Candidate, DealScope, JobScope, NegotiationOutcome, OutcomeStatus, Preferences,
    ShortlistedCandidate,
};
use tracing::{info, warn};

use crate::error::BrokerResult;
use crate::participant::round_message;
use crate::protocol::{NegotiationProtocol, ProposalOutcome};
use crate::verdict::Verdict;

/// One batch of negotiations against a shortlist.
#[derive(Debug, Clone)]
pub struct NegotiationRequest {
    /// Agent id negotiating on the buyer's behalf.
    pub buyer_id: String,
    /// Candidates to negotiate with, in the order outcomes are reported.
    pub shortlist: Vec<ShortlistedCandidate>,
    /// Buyer constraints driving stance and proposal pricing.
    pub preferences: Preferences,
    /// The job being negotiated.
    pub scope: JobScope,
    /// Upstream job reference, when one exists.
    pub job_id: Option<String>,
    /// Conversation rounds per candidate before the proposal goes out.
    pub rounds: u32,
}

impl NegotiationRequest {
    /// Creates a request that proposes right after the opening round.
    #[must_use]
    pub fn new(
        buyer_id: impl Into<String>,
        shortlist: Vec<ShortlistedCandidate>,
        preferences: Preferences,
        scope: JobScope,
    ) -> Self {
        Self {
            buyer_id: buyer_id.into(),
            shortlist,
            preferences,
            scope,
            job_id: None,
            rounds: 1,
        }
    }

    /// Attaches an upstream job reference.
    #[must_use]
    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    /// Sets how many conversation rounds to run before proposing.
    #[must_use]
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }
}

/// Picks the price to propose: the budget ceiling first, then the candidate's
/// advertised base price, then their hourly rate. Zero and negative figures
/// are skipped.
#[must_use]
pub fn derive_proposal_price(preferences: &Preferences, candidate: &Candidate) -> Option<i64> {
    [
        preferences.budget,
        candidate.base_price,
        candidate.hourly_rate,
    ]
    .into_iter()
    .flatten()
    .find(|price| *price > 0)
}

/// Negotiates with every shortlisted candidate in turn.
///
/// The returned rows match the shortlist 1:1 in order. A candidate whose run
/// errors gets a failed row carrying the error text, and the batch moves on
/// to the next candidate.
pub async fn run_negotiations(
    protocol: &NegotiationProtocol,
    request: &NegotiationRequest,
) -> Vec<NegotiationOutcome> {
    let mut outcomes = Vec::with_capacity(request.shortlist.len());
    for shortlisted in &request.shortlist {
        let candidate = &shortlisted.candidate;
        info!(candidate = %candidate.name, "starting negotiation");
        match negotiate_candidate(protocol, request, candidate).await {
            Ok(outcome) => outcomes.push(outcome),
            Err(err) => {
                warn!(candidate = %candidate.name, error = %err, "negotiation run failed");
                outcomes.push(NegotiationOutcome::failed(
                    "",
                    &candidate.id,
                    &candidate.name,
                    err.to_string(),
                ));
            }
        }
    }
    let accepted = outcomes.iter().filter(|o| o.is_accepted_deal()).count();
    info!(
        total = outcomes.len(),
        accepted, "negotiation batch finished"
    );
    outcomes
}

async fn negotiate_candidate(
    protocol: &NegotiationProtocol,
    request: &NegotiationRequest,
    candidate: &Candidate,
) -> BrokerResult<NegotiationOutcome> {
    let started = protocol
        .start(
            &request.buyer_id,
            candidate,
            &request.scope,
            Some(&request.preferences),
            request.job_id.as_deref(),
        )
        .await?;

    for round in 2..=request.rounds {
        let content = round_message(round, &request.scope, &request.preferences);
        protocol
            .send_buyer_message(
                &started.negotiation.id,
                &content,
                candidate,
                Some(&request.preferences),
            )
            .await?;
    }

    let Some(price) = derive_proposal_price(&request.preferences, candidate) else {
        warn!(candidate = %candidate.name, "no usable proposal price, skipping proposal");
        return Ok(NegotiationOutcome::failed(
            started.negotiation.id,
            &candidate.id,
            &candidate.name,
            "no usable proposal price for this candidate",
        ));
    };

    let ProposalOutcome {
        negotiation,
        result,
        verdict,
        ..
    } = protocol
        .propose_result(
            &started.negotiation.id,
            &request.buyer_id,
            Some(price),
            Some(DealScope::from(&request.scope)),
        )
        .await?;

    let (status, summary) = match verdict {
        Verdict::Accepted => (OutcomeStatus::Completed, negotiation.summary.clone()),
        Verdict::Rejected => (OutcomeStatus::Rejected, result.response_message.clone()),
    };
    Ok(NegotiationOutcome {
        negotiation_id: negotiation.id,
        candidate_id: candidate.id.clone(),
        candidate_name: candidate.name.clone(),
        status,
        result: Some(result),
        summary,
    })
}
