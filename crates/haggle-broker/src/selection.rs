//! Candidate shortlisting and winner selection.
//!
//! Both decisions run in one of two modes. In live mode the model returns a
//! structured JSON verdict which is validated against the inputs before
//! anything downstream sees it. In deterministic mode a score- and
//! price-based ranking produces the same shapes without a model round trip,
//! which is also the degraded path when no live backend is configured.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use haggle_core::{
    Candidate, JobScope, NegotiationOutcome, OutcomeStatus, Preferences, Priority,
    ShortlistedCandidate,
};
use haggle_llm::{parse_structured, ChatBackend, ChatError, ChatMessage, ChatModel};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{BrokerError, BrokerResult};

/// How many candidates a shortlist carries.
pub const SHORTLIST_SIZE: usize = 3;

/// Confidence reported by the deterministic winner ranking.
pub const FALLBACK_CONFIDENCE: f64 = 0.6;

/// Alignment reported when price has no bearing on the comparison.
const NEUTRAL_ALIGNMENT: u32 = 50;

/// Shortlisted candidates never score below this in the deterministic path.
const MATCH_SCORE_FLOOR: f64 = 60.0;

const SHORTLIST_SYSTEM: &str =
    "You are a procurement analyst choosing which service providers to negotiate with.";
const WINNER_SYSTEM: &str =
    "You are a procurement analyst picking the best concluded deal for the buyer.";

/// Which decision path the engine takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Ask the model for a structured verdict and validate it.
    Live,
    /// Rank by score and price without a model round trip.
    Deterministic,
}

impl SelectionMode {
    /// Live backends get live selection; the stub gets the deterministic path.
    #[must_use]
    pub const fn for_backend(backend: ChatBackend) -> Self {
        if backend.is_live() {
            Self::Live
        } else {
            Self::Deterministic
        }
    }
}

/// The settled winner verdict, live or deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinnerSelection {
    /// Thread id of the winning negotiation.
    pub winner_negotiation_id: String,
    /// Why this deal won.
    pub reasoning: String,
    /// Verdict confidence in 0.0..=1.0.
    pub confidence: f64,
    /// One comparison row per concluded negotiation, in input order.
    pub comparisons: Vec<CandidateComparison>,
}

/// How one concluded negotiation stacked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateComparison {
    /// Thread id the row refers to.
    pub negotiation_id: String,
    /// What spoke for this deal.
    pub strengths: String,
    /// What spoke against it.
    pub weaknesses: String,
    /// Fit against the buyer's priority in 0..=100.
    pub priority_alignment: u32,
}

#[derive(Deserialize)]
struct ShortlistReply {
    selections: Vec<ShortlistPick>,
}

#[derive(Deserialize)]
struct ShortlistPick {
    candidate_id: String,
    reasoning: String,
    match_score: u32,
}

#[derive(Serialize)]
struct OutcomeDigest<'a> {
    negotiation_id: &'a str,
    candidate: &'a str,
    status: &'a str,
    final_price: Option<i64>,
    summary: Option<&'a str>,
}

impl<'a> From<&'a NegotiationOutcome> for OutcomeDigest<'a> {
    fn from(outcome: &'a NegotiationOutcome) -> Self {
        Self {
            negotiation_id: &outcome.negotiation_id,
            candidate: &outcome.candidate_name,
            status: outcome.status.as_str(),
            final_price: outcome.settled_price(),
            summary: outcome.summary.as_deref(),
        }
    }
}

/// Shortlists candidates and picks winners.
pub struct SelectionEngine {
    model: Arc<dyn ChatModel>,
    mode: SelectionMode,
}

impl fmt::Debug for SelectionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionEngine")
            .field("model", &self.model.name())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl SelectionEngine {
    /// Creates an engine over the given model and decision mode.
    #[must_use]
    pub fn new(model: Arc<dyn ChatModel>, mode: SelectionMode) -> Self {
        Self { model, mode }
    }

    /// Picks the three candidates worth negotiating with.
    ///
    /// # Errors
    ///
    /// Fails with [`BrokerError::InvalidInput`] when fewer than three
    /// candidates are offered, and with [`BrokerError::InvalidResponse`]
    /// when a live verdict does not validate against the roster.
    pub async fn shortlist_top3(
        &self,
        candidates: &[Candidate],
        scope: &JobScope,
        preferences: &Preferences,
    ) -> BrokerResult<Vec<ShortlistedCandidate>> {
        if candidates.len() < SHORTLIST_SIZE {
            return Err(BrokerError::InvalidInput(format!(
                "shortlisting needs at least {SHORTLIST_SIZE} candidates, got {}",
                candidates.len()
            )));
        }
        match self.mode {
            SelectionMode::Live => self.live_shortlist(candidates, scope, preferences).await,
            SelectionMode::Deterministic => {
                debug!(total = candidates.len(), "shortlisting deterministically");
                Ok(fallback_shortlist(candidates, preferences))
            }
        }
    }

    /// Picks the winning negotiation out of a concluded batch.
    ///
    /// # Errors
    ///
    /// Fails with [`BrokerError::InvalidInput`] on an empty batch, and with
    /// [`BrokerError::InvalidResponse`] when a live verdict references
    /// negotiations that are not in the batch.
    pub async fn select_winner(
        &self,
        outcomes: &[NegotiationOutcome],
        preferences: &Preferences,
    ) -> BrokerResult<WinnerSelection> {
        if outcomes.is_empty() {
            return Err(BrokerError::InvalidInput(
                "winner selection needs at least one negotiation outcome".into(),
            ));
        }
        match self.mode {
            SelectionMode::Live => self.live_winner(outcomes, preferences).await,
            SelectionMode::Deterministic => fallback_winner(outcomes, preferences)
                .ok_or_else(|| BrokerError::InvalidInput("no outcomes to rank".into())),
        }
    }

    async fn live_shortlist(
        &self,
        candidates: &[Candidate],
        scope: &JobScope,
        preferences: &Preferences,
    ) -> BrokerResult<Vec<ShortlistedCandidate>> {
        let raw = self
            .model
            .complete(&[
                ChatMessage::system(SHORTLIST_SYSTEM),
                ChatMessage::user(shortlist_prompt(candidates, scope, preferences)),
            ])
            .await?;
        let reply: ShortlistReply = decode(&raw)?;

        if reply.selections.len() != SHORTLIST_SIZE {
            return Err(BrokerError::invalid_response(
                format!(
                    "expected {SHORTLIST_SIZE} selections, got {}",
                    reply.selections.len()
                ),
                raw,
            ));
        }
        let mut shortlist = Vec::with_capacity(SHORTLIST_SIZE);
        for pick in reply.selections {
            let Some(candidate) = candidates.iter().find(|c| c.id == pick.candidate_id) else {
                return Err(BrokerError::invalid_response(
                    format!("unknown candidate id {}", pick.candidate_id),
                    raw,
                ));
            };
            shortlist.push(ShortlistedCandidate {
                candidate: candidate.clone(),
                reasoning: pick.reasoning,
                match_score: pick.match_score.min(100),
            });
        }
        info!(model = self.model.name(), "live shortlist validated");
        Ok(shortlist)
    }

    async fn live_winner(
        &self,
        outcomes: &[NegotiationOutcome],
        preferences: &Preferences,
    ) -> BrokerResult<WinnerSelection> {
        let raw = self
            .model
            .complete(&[
                ChatMessage::system(WINNER_SYSTEM),
                ChatMessage::user(winner_prompt(outcomes, preferences)),
            ])
            .await?;
        let mut selection: WinnerSelection = decode(&raw)?;

        let known = |id: &str| outcomes.iter().any(|o| o.negotiation_id == id);
        if !known(&selection.winner_negotiation_id) {
            return Err(BrokerError::invalid_response(
                format!(
                    "unknown winner negotiation id {}",
                    selection.winner_negotiation_id
                ),
                raw,
            ));
        }
        for comparison in &selection.comparisons {
            if !known(&comparison.negotiation_id) {
                return Err(BrokerError::invalid_response(
                    format!(
                        "comparison references unknown negotiation id {}",
                        comparison.negotiation_id
                    ),
                    raw,
                ));
            }
        }
        selection.confidence = selection.confidence.clamp(0.0, 1.0);
        for comparison in &mut selection.comparisons {
            comparison.priority_alignment = comparison.priority_alignment.min(100);
        }
        info!(
            model = self.model.name(),
            winner = %selection.winner_negotiation_id,
            "live winner validated"
        );
        Ok(selection)
    }
}

/// Parses a structured model reply, surfacing parse trouble as an invalid
/// response rather than a backend failure.
fn decode<T: DeserializeOwned>(raw: &str) -> BrokerResult<T> {
    parse_structured(raw).map_err(|err| match err {
        ChatError::MalformedResponse { detail, raw } => BrokerError::InvalidResponse { detail, raw },
        other => BrokerError::Provider(other),
    })
}

/// Ranks candidates by score and takes the top three.
///
/// Scores translate to match scores on a 0..=100 scale, each rank below the
/// top docked three points, floored at 60 so a shortlisted candidate never
/// reads as a poor fit.
#[must_use]
pub fn fallback_shortlist(
    candidates: &[Candidate],
    preferences: &Preferences,
) -> Vec<ShortlistedCandidate> {
    let mut ranked: Vec<&Candidate> = candidates.iter().collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked
        .into_iter()
        .take(SHORTLIST_SIZE)
        .enumerate()
        .map(|(rank, candidate)| ShortlistedCandidate {
            candidate: candidate.clone(),
            reasoning: format!(
                "{} scored {:.2} against the job requirements; picked to {}.",
                candidate.name,
                candidate.score,
                preferences.priority.stance()
            ),
            match_score: fallback_match_score(candidate.score, rank),
        })
        .collect()
}

fn fallback_match_score(score: f64, rank: usize) -> u32 {
    let scaled = (score * 100.0).round() - (rank as f64) * 3.0;
    scaled.clamp(MATCH_SCORE_FLOOR, 100.0) as u32
}

/// Ranks concluded negotiations and picks a winner without a model.
///
/// Accepted deals beat everything else; among them price decides, cheapest
/// first under a cost priority and priciest first otherwise. Returns `None`
/// only for an empty batch.
#[must_use]
pub fn fallback_winner(
    outcomes: &[NegotiationOutcome],
    preferences: &Preferences,
) -> Option<WinnerSelection> {
    let mut ranked: Vec<&NegotiationOutcome> = outcomes.iter().collect();
    ranked.sort_by(|a, b| {
        b.is_accepted_deal()
            .cmp(&a.is_accepted_deal())
            .then_with(|| compare_prices(a.settled_price(), b.settled_price(), preferences.priority))
    });
    let winner = ranked.first()?;

    let deal = match (winner.is_accepted_deal(), winner.settled_price()) {
        (true, Some(price)) => format!("an accepted deal at ${price}"),
        (true, None) => "an accepted deal".to_string(),
        (false, _) => "the strongest remaining position".to_string(),
    };
    let comparisons = outcomes
        .iter()
        .map(|outcome| CandidateComparison {
            negotiation_id: outcome.negotiation_id.clone(),
            strengths: strengths_text(outcome),
            weaknesses: weaknesses_text(outcome),
            priority_alignment: priority_alignment(outcome, outcomes, preferences.priority),
        })
        .collect();

    Some(WinnerSelection {
        winner_negotiation_id: winner.negotiation_id.clone(),
        reasoning: format!(
            "{} offers {}, ranked first to {}.",
            winner.candidate_name,
            deal,
            preferences.priority.stance()
        ),
        confidence: FALLBACK_CONFIDENCE,
        comparisons,
    })
}

fn compare_prices(a: Option<i64>, b: Option<i64>, priority: Priority) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            if priority == Priority::Cost {
                a.cmp(&b)
            } else {
                b.cmp(&a)
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn strengths_text(outcome: &NegotiationOutcome) -> String {
    if outcome.is_accepted_deal() {
        match outcome.settled_price() {
            Some(price) => format!("accepted deal at ${price}"),
            None => "accepted deal with terms settled in conversation".to_string(),
        }
    } else {
        "responded to the outreach".to_string()
    }
}

fn weaknesses_text(outcome: &NegotiationOutcome) -> String {
    match outcome.status {
        OutcomeStatus::Completed => "none noted".to_string(),
        OutcomeStatus::Rejected => "turned the proposal down".to_string(),
        OutcomeStatus::Failed => outcome
            .summary
            .clone()
            .unwrap_or_else(|| "run broke down before a verdict".to_string()),
    }
}

/// Price-derived alignment under a cost priority, 100 for the cheapest
/// settled deal shrinking with price. Neutral everywhere else.
fn priority_alignment(
    outcome: &NegotiationOutcome,
    all: &[NegotiationOutcome],
    priority: Priority,
) -> u32 {
    if priority != Priority::Cost {
        return NEUTRAL_ALIGNMENT;
    }
    let Some(price) = outcome.settled_price().filter(|p| *p > 0) else {
        return NEUTRAL_ALIGNMENT;
    };
    let Some(cheapest) = all
        .iter()
        .filter_map(NegotiationOutcome::settled_price)
        .filter(|p| *p > 0)
        .min()
    else {
        return NEUTRAL_ALIGNMENT;
    };
    let ratio = (cheapest as f64) / (price as f64) * 100.0;
    ratio.round().clamp(0.0, 100.0) as u32
}

fn shortlist_prompt(
    candidates: &[Candidate],
    scope: &JobScope,
    preferences: &Preferences,
) -> String {
    let job = match scope.rooms {
        Some(rooms) => format!("{} ({rooms} rooms)", scope.description),
        None => scope.description.clone(),
    };
    let roster = serde_json::to_string_pretty(candidates).unwrap_or_default();
    let breakers = if preferences.deal_breakers.is_empty() {
        String::new()
    } else {
        format!(" Deal breakers: {}.", preferences.deal_breakers.join(", "))
    };
    format!(
        "Job: {job}.\nBuyer priority: {priority}. Budget: {budget}.{breakers}\n\
         Candidates:\n{roster}\n\n\
         Pick exactly {n} candidates to negotiate with. Respond with JSON only, in this shape:\n\
         {{\"selections\":[{{\"candidate_id\":\"...\",\"reasoning\":\"...\",\"match_score\":0}}]}}\n\
         match_score is 0-100.",
        priority = preferences.priority,
        budget = budget_text(preferences),
        n = SHORTLIST_SIZE,
    )
}

fn winner_prompt(outcomes: &[NegotiationOutcome], preferences: &Preferences) -> String {
    let digests: Vec<OutcomeDigest<'_>> = outcomes.iter().map(OutcomeDigest::from).collect();
    let table = serde_json::to_string_pretty(&digests).unwrap_or_default();
    format!(
        "Buyer priority: {priority}. Budget: {budget}.\n\
         Concluded negotiations:\n{table}\n\n\
         Pick the winning negotiation for the buyer. Respond with JSON only, in this shape:\n\
         {{\"winner_negotiation_id\":\"...\",\"reasoning\":\"...\",\"confidence\":0.0,\
         \"comparisons\":[{{\"negotiation_id\":\"...\",\"strengths\":\"...\",\
         \"weaknesses\":\"...\",\"priority_alignment\":0}}]}}\n\
         confidence is 0.0-1.0 and priority_alignment is 0-100.",
        priority = preferences.priority,
        budget = budget_text(preferences),
    )
}

fn budget_text(preferences: &Preferences) -> String {
    preferences
        .budget
        .map_or_else(|| "none stated".to_string(), |b| format!("${b}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use haggle_core::{NegotiationResult, ProposalStatus};
    use haggle_llm::StubChat;

    #[derive(Debug)]
    struct ScriptedModel(String);

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, ChatError> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn live_engine(reply: &str) -> SelectionEngine {
        SelectionEngine::new(
            Arc::new(ScriptedModel(reply.to_string())),
            SelectionMode::Live,
        )
    }

    fn deterministic_engine() -> SelectionEngine {
        SelectionEngine::new(Arc::new(StubChat::new()), SelectionMode::Deterministic)
    }

    fn cost_preferences() -> Preferences {
        Preferences::with_priority(Priority::Cost)
    }

    fn accepted(neg: &str, name: &str, price: i64) -> NegotiationOutcome {
        let mut result = NegotiationResult::new(neg, "buyer-1", Some(price), None);
        result.status = ProposalStatus::Accepted;
        NegotiationOutcome {
            negotiation_id: neg.into(),
            candidate_id: format!("cand-{neg}"),
            candidate_name: name.into(),
            status: OutcomeStatus::Completed,
            result: Some(result),
            summary: Some(format!("Deal agreed at ${price}.")),
        }
    }

    fn rejected(neg: &str, name: &str, price: i64) -> NegotiationOutcome {
        let mut result = NegotiationResult::new(neg, "buyer-1", Some(price), None);
        result.status = ProposalStatus::Rejected;
        NegotiationOutcome {
            negotiation_id: neg.into(),
            candidate_id: format!("cand-{neg}"),
            candidate_name: name.into(),
            status: OutcomeStatus::Rejected,
            result: Some(result),
            summary: None,
        }
    }

    fn failed(neg: &str, name: &str) -> NegotiationOutcome {
        NegotiationOutcome::failed(neg, format!("cand-{neg}"), name, "provider unreachable")
    }

    mod shortlist_tests {
        use super::*;

        fn roster() -> Vec<Candidate> {
            vec![
                Candidate::new("cand-a", "Alpha", 0.64),
                Candidate::new("cand-b", "Beta", 0.95),
                Candidate::new("cand-c", "Gamma", 0.85),
            ]
        }

        #[tokio::test]
        async fn fewer_than_three_candidates_fails() {
            let engine = deterministic_engine();
            let two = vec![
                Candidate::new("cand-a", "Alpha", 0.9),
                Candidate::new("cand-b", "Beta", 0.8),
            ];

            let err = engine
                .shortlist_top3(&two, &JobScope::new("paint the fence"), &cost_preferences())
                .await
                .unwrap_err();
            assert!(matches!(err, BrokerError::InvalidInput(_)));
            assert!(err.to_string().contains("got 2"));
        }

        #[tokio::test]
        async fn deterministic_shortlist_ranks_by_score() {
            let engine = deterministic_engine();

            let shortlist = engine
                .shortlist_top3(
                    &roster(),
                    &JobScope::new("paint the fence"),
                    &cost_preferences(),
                )
                .await
                .unwrap();

            assert_eq!(shortlist.len(), 3);
            assert_eq!(shortlist[0].candidate.id, "cand-b");
            assert_eq!(shortlist[1].candidate.id, "cand-c");
            assert_eq!(shortlist[2].candidate.id, "cand-a");
            assert_eq!(shortlist[0].match_score, 95);
            assert_eq!(shortlist[1].match_score, 82);
            // 64 docked six points lands below the floor.
            assert_eq!(shortlist[2].match_score, 60);
            assert!(shortlist[0].reasoning.contains("Beta"));
            assert!(shortlist[0].reasoning.contains("keep the price efficient"));
        }

        #[tokio::test]
        async fn deterministic_shortlist_takes_three_of_five() {
            let engine = deterministic_engine();
            let five = vec![
                Candidate::new("cand-a", "Alpha", 0.50),
                Candidate::new("cand-b", "Beta", 0.95),
                Candidate::new("cand-c", "Gamma", 0.40),
                Candidate::new("cand-d", "Delta", 0.90),
                Candidate::new("cand-e", "Epsilon", 0.70),
            ];

            let shortlist = engine
                .shortlist_top3(&five, &JobScope::new("move a piano"), &cost_preferences())
                .await
                .unwrap();

            let ids: Vec<&str> = shortlist.iter().map(|s| s.candidate.id.as_str()).collect();
            assert_eq!(ids, ["cand-b", "cand-d", "cand-e"]);
        }

        #[test]
        fn match_scores_never_drop_below_the_floor() {
            let close = vec![
                Candidate::new("cand-a", "Alpha", 0.62),
                Candidate::new("cand-b", "Beta", 0.61),
                Candidate::new("cand-c", "Gamma", 0.55),
            ];

            let shortlist = fallback_shortlist(&close, &cost_preferences());
            let scores: Vec<u32> = shortlist.iter().map(|s| s.match_score).collect();
            assert_eq!(scores, [62, 60, 60]);
        }

        #[tokio::test]
        async fn live_shortlist_parses_and_clamps() {
            let reply = r#"Here is my pick:
```json
{"selections":[
  {"candidate_id":"cand-c","reasoning":"balanced offer","match_score":140},
  {"candidate_id":"cand-a","reasoning":"cheap and available","match_score":72},
  {"candidate_id":"cand-b","reasoning":"highest rated","match_score":91}
]}
```"#;
            let engine = live_engine(reply);

            let shortlist = engine
                .shortlist_top3(
                    &roster(),
                    &JobScope::new("paint the fence"),
                    &cost_preferences(),
                )
                .await
                .unwrap();

            // Reply order wins over roster order.
            assert_eq!(shortlist[0].candidate.id, "cand-c");
            assert_eq!(shortlist[0].match_score, 100);
            assert_eq!(shortlist[1].candidate.id, "cand-a");
            assert_eq!(shortlist[1].reasoning, "cheap and available");
            assert_eq!(shortlist[2].candidate.id, "cand-b");
        }

        #[tokio::test]
        async fn live_unknown_candidate_id_fails() {
            let reply = r#"{"selections":[
  {"candidate_id":"cand-a","reasoning":"ok","match_score":70},
  {"candidate_id":"cand-zzz","reasoning":"ok","match_score":70},
  {"candidate_id":"cand-b","reasoning":"ok","match_score":70}
]}"#;
            let engine = live_engine(reply);

            let err = engine
                .shortlist_top3(
                    &roster(),
                    &JobScope::new("paint the fence"),
                    &cost_preferences(),
                )
                .await
                .unwrap_err();

            match err {
                BrokerError::InvalidResponse { detail, raw } => {
                    assert!(detail.contains("cand-zzz"));
                    assert!(raw.contains("cand-zzz"));
                }
                other => panic!("expected InvalidResponse, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn live_wrong_selection_count_fails() {
            let reply = r#"{"selections":[
  {"candidate_id":"cand-a","reasoning":"ok","match_score":70},
  {"candidate_id":"cand-b","reasoning":"ok","match_score":70}
]}"#;
            let engine = live_engine(reply);

            let err = engine
                .shortlist_top3(
                    &roster(),
                    &JobScope::new("paint the fence"),
                    &cost_preferences(),
                )
                .await
                .unwrap_err();
            assert!(err.to_string().contains("expected 3 selections, got 2"));
        }

        #[tokio::test]
        async fn live_malformed_reply_retains_raw() {
            let engine = live_engine("I would rather chat about the weather.");

            let err = engine
                .shortlist_top3(
                    &roster(),
                    &JobScope::new("paint the fence"),
                    &cost_preferences(),
                )
                .await
                .unwrap_err();

            match err {
                BrokerError::InvalidResponse { raw, .. } => {
                    assert_eq!(raw, "I would rather chat about the weather.");
                }
                other => panic!("expected InvalidResponse, got {other:?}"),
            }
        }
    }

    mod winner_tests {
        use super::*;

        #[tokio::test]
        async fn empty_batch_fails() {
            let engine = deterministic_engine();

            let err = engine
                .select_winner(&[], &cost_preferences())
                .await
                .unwrap_err();
            assert!(matches!(err, BrokerError::InvalidInput(_)));
        }

        #[tokio::test]
        async fn cost_priority_picks_the_cheapest_accepted_deal() {
            let engine = deterministic_engine();
            let outcomes = vec![
                accepted("neg-1", "Alpha", 300),
                accepted("neg-2", "Beta", 200),
                rejected("neg-3", "Gamma", 100),
            ];

            let selection = engine
                .select_winner(&outcomes, &cost_preferences())
                .await
                .unwrap();

            assert_eq!(selection.winner_negotiation_id, "neg-2");
            assert!((selection.confidence - FALLBACK_CONFIDENCE).abs() < f64::EPSILON);
            assert!(selection.reasoning.contains("Beta"));
            assert!(selection.reasoning.contains("$200"));
        }

        #[tokio::test]
        async fn quality_priority_prefers_the_pricier_accepted_deal() {
            let engine = deterministic_engine();
            let outcomes = vec![
                accepted("neg-1", "Alpha", 200),
                accepted("neg-2", "Beta", 300),
            ];

            let selection = engine
                .select_winner(&outcomes, &Preferences::with_priority(Priority::Quality))
                .await
                .unwrap();
            assert_eq!(selection.winner_negotiation_id, "neg-2");
        }

        #[tokio::test]
        async fn accepted_deal_beats_a_cheaper_rejection() {
            let engine = deterministic_engine();
            let outcomes = vec![
                rejected("neg-1", "Alpha", 100),
                accepted("neg-2", "Beta", 300),
            ];

            let selection = engine
                .select_winner(&outcomes, &cost_preferences())
                .await
                .unwrap();
            assert_eq!(selection.winner_negotiation_id, "neg-2");
        }

        #[tokio::test]
        async fn comparisons_cover_every_outcome_in_input_order() {
            let engine = deterministic_engine();
            let outcomes = vec![
                accepted("neg-1", "Alpha", 200),
                accepted("neg-2", "Beta", 300),
                failed("neg-3", "Gamma"),
            ];

            let selection = engine
                .select_winner(&outcomes, &cost_preferences())
                .await
                .unwrap();

            let ids: Vec<&str> = selection
                .comparisons
                .iter()
                .map(|c| c.negotiation_id.as_str())
                .collect();
            assert_eq!(ids, ["neg-1", "neg-2", "neg-3"]);

            let alignment: Vec<u32> = selection
                .comparisons
                .iter()
                .map(|c| c.priority_alignment)
                .collect();
            // Cheapest settled deal scores 100, $300 lands at 200/300, the
            // failed run stays neutral.
            assert_eq!(alignment, [100, 67, 50]);

            assert!(selection.comparisons[2].weaknesses.contains("unreachable"));
        }

        #[test]
        fn non_cost_priorities_report_neutral_alignment() {
            let outcomes = vec![
                accepted("neg-1", "Alpha", 200),
                accepted("neg-2", "Beta", 300),
            ];

            let selection =
                fallback_winner(&outcomes, &Preferences::with_priority(Priority::Speed)).unwrap();
            for comparison in &selection.comparisons {
                assert_eq!(comparison.priority_alignment, 50);
            }
        }

        #[test]
        fn fallback_winner_is_none_only_when_empty() {
            assert!(fallback_winner(&[], &cost_preferences()).is_none());
            let only_failures = vec![failed("neg-1", "Alpha")];
            let selection = fallback_winner(&only_failures, &cost_preferences()).unwrap();
            assert_eq!(selection.winner_negotiation_id, "neg-1");
            assert!(selection.reasoning.contains("strongest remaining position"));
        }

        #[tokio::test]
        async fn live_winner_parses_and_clamps_confidence() {
            let reply = r#"{"winner_negotiation_id":"neg-2","reasoning":"best value","confidence":1.4,
"comparisons":[
  {"negotiation_id":"neg-1","strengths":"fast","weaknesses":"pricey","priority_alignment":180},
  {"negotiation_id":"neg-2","strengths":"cheap","weaknesses":"slower","priority_alignment":95}
]}"#;
            let engine = live_engine(reply);
            let outcomes = vec![
                accepted("neg-1", "Alpha", 300),
                accepted("neg-2", "Beta", 200),
            ];

            let selection = engine
                .select_winner(&outcomes, &cost_preferences())
                .await
                .unwrap();

            assert_eq!(selection.winner_negotiation_id, "neg-2");
            assert!((selection.confidence - 1.0).abs() < f64::EPSILON);
            assert_eq!(selection.comparisons[0].priority_alignment, 100);
            assert_eq!(selection.comparisons[1].priority_alignment, 95);
        }

        #[tokio::test]
        async fn live_unknown_winner_id_fails() {
            let reply = r#"{"winner_negotiation_id":"neg-9","reasoning":"x","confidence":0.9,"comparisons":[]}"#;
            let engine = live_engine(reply);
            let outcomes = vec![accepted("neg-1", "Alpha", 300)];

            let err = engine
                .select_winner(&outcomes, &cost_preferences())
                .await
                .unwrap_err();
            assert!(err.to_string().contains("neg-9"));
        }

        #[tokio::test]
        async fn live_unknown_comparison_id_fails() {
            let reply = r#"{"winner_negotiation_id":"neg-1","reasoning":"x","confidence":0.9,
"comparisons":[{"negotiation_id":"neg-7","strengths":"x","weaknesses":"y","priority_alignment":50}]}"#;
            let engine = live_engine(reply);
            let outcomes = vec![accepted("neg-1", "Alpha", 300)];

            let err = engine
                .select_winner(&outcomes, &cost_preferences())
                .await
                .unwrap_err();
            assert!(err.to_string().contains("neg-7"));
        }
    }

    mod mode_tests {
        use super::*;

        #[test]
        fn live_backends_select_live() {
            assert_eq!(
                SelectionMode::for_backend(ChatBackend::OpenAi),
                SelectionMode::Live
            );
            assert_eq!(
                SelectionMode::for_backend(ChatBackend::Anthropic),
                SelectionMode::Live
            );
            assert_eq!(
                SelectionMode::for_backend(ChatBackend::Stub),
                SelectionMode::Deterministic
            );
        }
    }
}
