//! Ability verification
//!
//! Each (candidate, implied ability) pair is a yes/no question to the completion
//! model. The trait takes every ability for one candidate at once, so a batched
//! implementation can answer them in a single call.

use crate::model::ModelGateway;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Token whose presence (case-insensitive substring) makes an answer affirmative
pub const AFFIRMATIVE_TOKEN: &str = "yes";

#[async_trait]
pub trait AbilityVerifier: Send + Sync {
    /// One verdict per ability, in order. Failures count as `false`.
    async fn verify(&self, profile_context: &str, abilities: &[String]) -> Vec<bool>;
}

pub fn is_affirmative(reply: &str) -> bool {
    reply.to_lowercase().contains(AFFIRMATIVE_TOKEN)
}

fn verification_prompt(profile_context: &str, ability: &str) -> String {
    format!(
        "Given the candidate profile context below, answer only 'yes' or 'no': \
         does this candidate have the following ability: '{}'?\nContext: {}",
        ability, profile_context
    )
}

/// One completion call per ability, with a shared cap on calls in flight
pub struct CompletionAbilityVerifier {
    gateway: ModelGateway,
    permits: Arc<Semaphore>,
}

impl CompletionAbilityVerifier {
    pub fn new(gateway: ModelGateway, max_concurrency: usize) -> Self {
        Self {
            gateway,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }
}

#[async_trait]
impl AbilityVerifier for CompletionAbilityVerifier {
    async fn verify(&self, profile_context: &str, abilities: &[String]) -> Vec<bool> {
        let mut tasks = JoinSet::new();
        for (index, ability) in abilities.iter().enumerate() {
            let gateway = self.gateway.clone();
            let permits = Arc::clone(&self.permits);
            let prompt = verification_prompt(profile_context, ability);
            let ability = ability.clone();

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let verdict = match gateway.complete(&prompt).await {
                    Ok(reply) => is_affirmative(&reply),
                    Err(e) => {
                        tracing::warn!("Verification of '{}' failed, counting as no: {}", ability, e);
                        false
                    }
                };
                (index, verdict)
            });
        }

        let mut verdicts = vec![false; abilities.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, verdict)) => verdicts[index] = verdict,
                Err(e) => tracing::warn!("Verification task failed: {}", e),
            }
        }
        verdicts
    }
}
