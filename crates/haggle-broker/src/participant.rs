//! Role-specific prompt building for negotiation participants.
//!
//! The two participant variants are selected by [`Role`]; each builder is a
//! pure function of its inputs. The protocol engine decides when to speak,
//! these functions decide what to ask the model for.

use haggle_core::{Candidate, DealScope, JobScope, Negotiation, NegotiationMessage, Preferences, Role};

/// Returns the standing instructions for one side of the table.
#[must_use]
pub const fn system_prompt(role: Role) -> &'static str {
    match role {
        Role::Buyer => {
            "You are a negotiation agent representing a buyer. You drive toward a \
             concrete deal on price and scope, stay professional, and keep your \
             messages short."
        }
        Role::Provider => {
            "You are a negotiation agent representing a service provider. You answer \
             the buyer's requests, defend fair pricing for the work, and move toward \
             a concrete deal in short messages."
        }
    }
}

/// Builds the prompt that opens a negotiation for the given role.
#[must_use]
pub fn opening_prompt(
    role: Role,
    candidate: &Candidate,
    scope: &JobScope,
    preferences: Option<&Preferences>,
) -> String {
    let job = job_text(scope);
    match role {
        Role::Buyer => {
            let pitch = candidate
                .headline
                .as_deref()
                .map_or_else(String::new, |headline| {
                    format!(" Their pitch: \"{headline}\".")
                });
            let constraints = constraint_lines(preferences);
            format!(
                "You are hiring for: {job}. The provider on the line is {}.{pitch}\n\
                 {constraints}\n\
                 Please open the conversation: introduce the job in two or three \
                 sentences and ask for their best offer.",
                candidate.name
            )
        }
        Role::Provider => format!(
            "You are {}, offering services for: {job}.\n\
             Please open the conversation: greet the buyer and summarize what you \
             can do for them.",
            candidate.name
        ),
    }
}

/// Builds the prompt for one mid-negotiation turn, with the conversation so
/// far as context.
#[must_use]
pub fn turn_prompt(
    role: Role,
    negotiation: &Negotiation,
    recent: &[NegotiationMessage],
    candidate: &Candidate,
    preferences: Option<&Preferences>,
) -> String {
    let transcript = if recent.is_empty() {
        "(no messages yet)".to_string()
    } else {
        recent
            .iter()
            .map(|message| format!("{}: {}", message.sender_role, message.content))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let job_line = negotiation
        .job_id
        .as_deref()
        .map_or_else(String::new, |job_id| format!("Job reference: {job_id}.\n"));
    let instruction = match role {
        Role::Buyer => {
            let aim = preferences.map_or_else(String::new, |preferences| {
                format!(" Steer toward terms that {}.", preferences.priority.stance())
            });
            format!(
                "Write the buyer's next message to {}.{aim} Keep it short and concrete.",
                candidate.name
            )
        }
        Role::Provider => format!(
            "Write the next reply from {}, the provider. Address the buyer's latest \
             point and move the deal forward. Keep it short and concrete.",
            candidate.name
        ),
    };
    format!("{job_line}Conversation so far:\n{transcript}\n\n{instruction}")
}

/// Builds the accept-or-reject ask put to a proposal's responder.
#[must_use]
pub fn proposal_review_prompt(
    responder: Role,
    final_price: Option<i64>,
    scope: Option<&DealScope>,
) -> String {
    let price_text = final_price.map_or_else(
        || "the terms already discussed".to_string(),
        |price| format!("a final price of ${price}"),
    );
    format!(
        "You are responding as the {responder}. A formal proposal is on the table: \
         {} at {price_text}. State clearly whether you accept or reject this \
         proposal, and why, in one short paragraph.",
        describe_scope(scope)
    )
}

/// Builds the buyer's synthesized message for an extra negotiation round.
#[must_use]
pub fn round_message(round: u32, scope: &JobScope, preferences: &Preferences) -> String {
    format!(
        "Round {round}: let's tighten the terms for {}. My aim is to {}. Where can \
         you move?",
        job_text(scope),
        preferences.priority.stance()
    )
}

/// Builds the closing summary stored on a completed negotiation.
#[must_use]
pub fn accepted_summary(final_price: Option<i64>, scope: Option<&DealScope>) -> String {
    let scope_text = describe_scope(scope);
    match final_price {
        Some(price) => format!("Deal agreed at ${price} for {scope_text}."),
        None => format!("Deal agreed for {scope_text}."),
    }
}

fn job_text(scope: &JobScope) -> String {
    match scope.rooms {
        Some(rooms) => format!("{} ({rooms} rooms)", scope.description),
        None => scope.description.clone(),
    }
}

fn describe_scope(scope: Option<&DealScope>) -> String {
    scope.map_or_else(|| DealScope::default().describe(), DealScope::describe)
}

fn constraint_lines(preferences: Option<&Preferences>) -> String {
    let Some(preferences) = preferences else {
        return String::new();
    };
    let mut lines = vec![format!(
        "Your negotiating aim: {}.",
        preferences.priority.stance()
    )];
    if let Some(budget) = preferences.budget {
        lines.push(format!("Budget ceiling: ${budget}."));
    }
    if !preferences.deal_breakers.is_empty() {
        lines.push(format!(
            "Deal breakers: {}.",
            preferences.deal_breakers.join(", ")
        ));
    }
    lines.join("\n")
}
