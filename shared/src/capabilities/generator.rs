use crux_core::capability::{Capability, CapabilityContext, Operation};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Drip, ExplanationMode};

/// Requests the shell forwards to the generative content service. The shell
/// owns prompting, media synthesis and id assignment (timestamp+random); the
/// core only sees finished drips or failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeneratorOperation {
    Drip { topics: Vec<String>, region: String },
    Explain { fact: String, mode: ExplanationMode },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeneratorOutput {
    Drip(Drip),
    Explanation(String),
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("content service unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("generation rejected: {reason}")]
    Rejected { reason: String },

    #[error("no content produced")]
    Exhausted,
}

pub type GeneratorResult = Result<GeneratorOutput, GeneratorError>;

/// What a whole batch settles to: the fulfilled drips (at least one), or the
/// error that stands for the all-failed case.
pub type BatchOutcome = Result<Vec<Drip>, GeneratorError>;

impl Operation for GeneratorOperation {
    type Output = GeneratorResult;
}

pub struct Generator<Ev> {
    context: CapabilityContext<GeneratorOperation, Ev>,
}

impl<Ev> Capability<Ev> for Generator<Ev> {
    type Operation = GeneratorOperation;
    type MappedSelf<MappedEv> = Generator<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Generator::new(self.context.map_event(f))
    }
}

impl<Ev> Generator<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<GeneratorOperation, Ev>) -> Self {
        Self { context }
    }

    /// Issue `count` independent single-drip generations concurrently and
    /// wait for all of them to settle; rejections are dropped, and only the
    /// all-rejected case surfaces as an error. Exactly one event is sent
    /// back, whatever the mix of outcomes.
    pub fn batch<F>(&self, topics: Vec<String>, region: String, count: usize, make_event: F)
    where
        F: FnOnce(BatchOutcome) -> Ev + Send + Sync + 'static,
        Ev: Send,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let requests = (0..count).map(|_| {
                context.request_from_shell(GeneratorOperation::Drip {
                    topics: topics.clone(),
                    region: region.clone(),
                })
            });

            let mut drips = Vec::new();
            let mut last_error = None;
            for settled in join_all(requests).await {
                match settled {
                    Ok(GeneratorOutput::Drip(drip)) => drips.push(drip),
                    Ok(other) => {
                        tracing::warn!(?other, "unexpected output for a drip request");
                    }
                    Err(e) => last_error = Some(e),
                }
            }

            let outcome = if drips.is_empty() {
                Err(last_error.unwrap_or(GeneratorError::Exhausted))
            } else {
                Ok(drips)
            };
            context.update_app(make_event(outcome));
        });
    }

    /// Single-shot explanation of a fact.
    pub fn explain<F>(&self, fact: String, mode: ExplanationMode, make_event: F)
    where
        F: FnOnce(Result<String, GeneratorError>) -> Ev + Send + Sync + 'static,
        Ev: Send,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = match context
                .request_from_shell(GeneratorOperation::Explain { fact, mode })
                .await
            {
                Ok(GeneratorOutput::Explanation(text)) => Ok(text),
                Ok(other) => {
                    tracing::warn!(?other, "unexpected output for an explain request");
                    Err(GeneratorError::Rejected {
                        reason: "unexpected output".to_string(),
                    })
                }
                Err(e) => Err(e),
            };
            context.update_app(make_event(result));
        });
    }
}
