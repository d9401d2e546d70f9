//! Prompt construction.
//!
//! The system prompt is fixed. The user prompt is the context summary plus
//! the list of actions the provider may pick from.
use kingdom_core::{DecisionConfig, DecisionContext};

use crate::api::ProviderRequest;

pub const SYSTEM_PROMPT: &str = "You advise a single unit in a small fantasy kingdom. \
Read the situation and choose one action. \
Reply with exactly one JSON object and nothing else, shaped as \
{\"action\": \"<action>\", \"target\": \"<what to act on>\", \"reason\": \"<one short sentence>\"}. \
Refer to units and buildings by their #id when you name a target.";

/// Render the user prompt for `ctx`.
pub fn user_prompt(ctx: &DecisionContext, config: &DecisionConfig) -> String {
    let actions: Vec<&str> = config
        .advisory_actions
        .iter()
        .map(|action| action.as_str())
        .collect();
    format!(
        "{}\nAllowed actions: {}\nWhat should this unit do next?",
        ctx.summary(),
        actions.join(", ")
    )
}

pub fn request_for(ctx: &DecisionContext, config: &DecisionConfig) -> ProviderRequest {
    ProviderRequest {
        system_prompt: SYSTEM_PROMPT.to_owned(),
        user_prompt: user_prompt(ctx, config),
    }
}
