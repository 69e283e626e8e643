// ============================================================================
// VERIFICATION GATEWAY - External scoring of submitted results
// ============================================================================
//
// A gateway looks at a claim (rank or kill count) and its evidence and
// returns its own estimate plus a confidence in [0, 1]. It never decides
// anything: admins still verify or reject through `tournament::results`.
//
//   request_review(result) ──► tokio::spawn ──► gateway.evaluate(claim).await
//                                                   │
//                                                   ▼
//                                     attach_evaluation(result, evaluation)
//
// The ledger lock is never held across the await. A result with no
// evaluation simply stays pending.
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::accounts::UserId;
use crate::engine::SettlementEngine;
use crate::error::{Entity, LedgerError, LedgerResult};
use crate::tournament::results::ResultId;
use crate::tournament::TournamentId;

/// Evaluations under this confidence are highlighted to reviewers.
pub const LOW_CONFIDENCE: f64 = 0.7;

/// What the player (or admin) claims happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimedOutcome {
    Rank(u32),
    Kills(u32),
}

impl ClaimedOutcome {
    pub fn value(self) -> u32 {
        match self {
            ClaimedOutcome::Rank(v) | ClaimedOutcome::Kills(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub outcome: ClaimedOutcome,
    /// Screenshot location, if one was uploaded
    pub evidence: Option<String>,
}

/// Gateway output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub estimate: u32,
    pub confidence: f64,
    pub evaluated_at: DateTime<Utc>,
}

impl Evaluation {
    /// Confidence is clamped into `[0, 1]`; NaN becomes 0.
    pub fn new(estimate: u32, confidence: f64, evaluated_at: DateTime<Utc>) -> Self {
        let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) };
        Self { estimate, confidence, evaluated_at }
    }

    pub fn is_low_confidence(&self) -> bool {
        self.confidence < LOW_CONFIDENCE
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("No evidence attached to the claim")]
    MissingEvidence,

    #[error("Verification gateway unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[async_trait]
pub trait VerificationGateway: Send + Sync {
    async fn evaluate(&self, claim: &Claim) -> Result<Evaluation, GatewayError>;
}

// ============================================================================
// SIMULATED SCORER
// ============================================================================

/// Stand-in for an OCR backend. Usually lands within a couple of units of
/// the claim; one time in five it is wildly off.
pub struct SimulatedScreenshotScorer {
    rng: Mutex<StdRng>,
    latency: Duration,
    mismatch_rate: f64,
}

impl SimulatedScreenshotScorer {
    pub fn new(latency: Duration) -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            latency,
            mismatch_rate: 0.2,
        }
    }

    /// Reproducible scorer for tests.
    pub fn seeded(seed: u64, latency: Duration) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            latency,
            mismatch_rate: 0.2,
        }
    }

    pub fn with_mismatch_rate(mut self, rate: f64) -> Self {
        self.mismatch_rate = rate.clamp(0.0, 1.0);
        self
    }

    fn score(&self, outcome: ClaimedOutcome) -> Evaluation {
        let mut rng = self.rng.lock();
        let mismatch = rng.gen_bool(self.mismatch_rate);
        let claimed = i64::from(outcome.value());

        let (estimate, scale) = match outcome {
            ClaimedOutcome::Kills(_) => {
                let drift = if mismatch { rng.gen_range(-5..=5) } else { rng.gen_range(-2..=1) };
                ((claimed + drift).max(0), 10.0)
            }
            ClaimedOutcome::Rank(_) => {
                let drift = if mismatch { rng.gen_range(-5..=5) } else { rng.gen_range(-1..=0) };
                ((claimed + drift).max(1), 5.0)
            }
        };
        let difference = (estimate - claimed).abs() as f64;
        let estimate = u32::try_from(estimate).unwrap_or(u32::MAX);
        Evaluation::new(estimate, 1.0 - difference / scale, Utc::now())
    }
}

#[async_trait]
impl VerificationGateway for SimulatedScreenshotScorer {
    async fn evaluate(&self, claim: &Claim) -> Result<Evaluation, GatewayError> {
        if claim.evidence.is_none() {
            return Err(GatewayError::MissingEvidence);
        }
        tokio::time::sleep(self.latency).await;
        Ok(self.score(claim.outcome))
    }
}

// ============================================================================
// ENGINE INTEGRATION
// ============================================================================

/// Which result an evaluation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultRef {
    Normal { result_id: ResultId },
    Kill { tournament_id: TournamentId, user_id: UserId },
}

impl SettlementEngine {
    /// Build the claim a gateway should score for `target`.
    pub fn claim_for(&self, target: ResultRef) -> LedgerResult<Claim> {
        self.store().read(|s| match target {
            ResultRef::Normal { result_id } => {
                let r = s
                    .results
                    .get(&result_id)
                    .ok_or(LedgerError::NotFound(Entity::Result, result_id))?;
                Ok(Claim {
                    outcome: ClaimedOutcome::Rank(r.rank),
                    evidence: r.screenshot_path.clone(),
                })
            }
            ResultRef::Kill { tournament_id, user_id } => {
                let r = s
                    .tournament(tournament_id)?
                    .kill_results
                    .iter()
                    .find(|r| r.user_id == user_id)
                    .ok_or(LedgerError::NotFound(Entity::Result, user_id))?;
                Ok(Claim {
                    outcome: ClaimedOutcome::Kills(r.kills),
                    evidence: r.screenshot_path.clone(),
                })
            }
        })
    }

    /// Store a gateway evaluation on a result still awaiting review. Never
    /// changes the result's status.
    pub fn attach_evaluation(&self, target: ResultRef, evaluation: Evaluation) -> LedgerResult<()> {
        self.transact(|tx| {
            let (status, slot) = match target {
                ResultRef::Normal { result_id } => {
                    let r = tx
                        .state
                        .results
                        .get_mut(&result_id)
                        .ok_or(LedgerError::NotFound(Entity::Result, result_id))?;
                    (r.status, &mut r.evaluation)
                }
                ResultRef::Kill { tournament_id, user_id } => {
                    let r = tx
                        .state
                        .tournaments
                        .get_mut(&tournament_id)
                        .ok_or(LedgerError::NotFound(Entity::Tournament, tournament_id))?
                        .kill_results
                        .iter_mut()
                        .find(|r| r.user_id == user_id)
                        .ok_or(LedgerError::NotFound(Entity::Result, user_id))?;
                    (r.status, &mut r.evaluation)
                }
            };
            if status.is_terminal() {
                return Err(LedgerError::AlreadyResolved(format!(
                    "Result was already {status:?} before the evaluation arrived"
                )));
            }
            *slot = Some(evaluation.clone());
            Ok(())
        })?;

        if evaluation.is_low_confidence() {
            warn!(?target, estimate = evaluation.estimate, confidence = evaluation.confidence, "Low-confidence evaluation");
        } else {
            debug!(?target, estimate = evaluation.estimate, confidence = evaluation.confidence, "Evaluation attached");
        }
        Ok(())
    }

    /// Ask `gateway` to score a result in the background. Must be called from
    /// within a tokio runtime.
    pub fn request_review(
        &self,
        gateway: Arc<dyn VerificationGateway>,
        target: ResultRef,
    ) -> LedgerResult<JoinHandle<Result<Evaluation, GatewayError>>> {
        let claim = self.claim_for(target)?;
        let engine = self.clone();
        info!(?target, claim = ?claim.outcome, "🔍 Review requested");

        Ok(tokio::spawn(async move {
            let evaluation = match gateway.evaluate(&claim).await {
                Ok(evaluation) => evaluation,
                Err(e) => {
                    warn!(?target, error = %e, "Verification gateway failed; result stays pending");
                    return Err(e);
                }
            };
            engine.attach_evaluation(target, evaluation.clone())?;
            Ok(evaluation)
        }))
    }
}
