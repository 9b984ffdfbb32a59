//! Ordered write plans with per-step outcome reporting.
//!
//! Desk operations perform one primary write (an update to the complaint)
//! followed by side effects: activity entries and notifications. An
//! [`EffectPlan`] captures that sequence explicitly so callers can see which
//! steps landed.
//!
//! A failed primary write aborts the plan before anything else runs. What
//! happens when a side effect fails depends on the [`EffectMode`]:
//!
//! - [`EffectMode::BestEffort`]: the failure is logged and recorded, and the
//!   remaining steps still run.
//! - [`EffectMode::Strict`]: the plan stops, remaining steps are reported as
//!   skipped, and [`Error::SideEffectFailed`] is returned. Steps already
//!   applied are not rolled back.

use crate::domain::{Complaint, ComplaintId, ComplaintPatch, NewActivity, NewNotification};
use crate::error::{Error, Result};
use crate::storage::DeskStorage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How side-effect failures are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectMode {
    /// Log and continue
    #[default]
    BestEffort,

    /// Stop at the first failure and report it as an error
    Strict,
}

impl EffectMode {
    /// Config spelling of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            EffectMode::BestEffort => "best_effort",
            EffectMode::Strict => "strict",
        }
    }
}

/// One write against the store
#[derive(Debug, Clone)]
pub enum Effect {
    /// Patch a complaint
    UpdateComplaint {
        /// Target complaint
        id: ComplaintId,
        /// Fields to change
        patch: ComplaintPatch,
    },

    /// Append an activity log entry
    AppendActivity(NewActivity),

    /// Deliver a notification
    Notify(NewNotification),
}

impl Effect {
    /// Short human-readable description used in reports and logs.
    pub fn describe(&self) -> String {
        match self {
            Effect::UpdateComplaint { id, .. } => format!("update complaint {id}"),
            Effect::AppendActivity(entry) => format!("log activity '{}'", entry.action),
            Effect::Notify(notification) => {
                format!("notify {} '{}'", notification.user_id, notification.title)
            }
        }
    }

    async fn apply(self, store: &mut dyn DeskStorage) -> Result<Option<Complaint>> {
        match self {
            Effect::UpdateComplaint { id, patch } => {
                store.update_complaint(&id, patch).await.map(Some)
            }
            Effect::AppendActivity(entry) => store.append_activity(entry).await.map(|_| None),
            Effect::Notify(notification) => {
                store.insert_notification(notification).await.map(|_| None)
            }
        }
    }
}

/// Result of a single plan step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The write succeeded
    Applied,

    /// The write failed with this message
    Failed(String),

    /// The step was not attempted
    Skipped,
}

/// Outcome of one step, labelled with its description
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// What the step was
    pub step: String,

    /// What happened
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Per-step results of running a plan
#[derive(Debug, Clone, Default, Serialize)]
pub struct EffectReport {
    /// The complaint as returned by the primary write, if it was an update
    pub complaint: Option<Complaint>,

    /// One entry per step, in plan order
    pub steps: Vec<StepReport>,
}

impl EffectReport {
    /// Steps that failed.
    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Failed(_)))
    }

    /// Whether every step was applied.
    pub fn is_clean(&self) -> bool {
        self.steps.iter().all(|s| s.outcome == StepOutcome::Applied)
    }
}

/// An ordered list of writes.
///
/// Plans built with [`EffectPlan::new`] treat their first effect as the
/// primary write; plans built with [`EffectPlan::side_effects`] contain only
/// side effects (used after a write that happened outside the plan, such as
/// creating the complaint itself).
#[derive(Debug, Clone)]
pub struct EffectPlan {
    effects: Vec<Effect>,
    has_primary: bool,
}

impl EffectPlan {
    /// Start a plan with its primary write.
    pub fn new(primary: Effect) -> Self {
        Self {
            effects: vec![primary],
            has_primary: true,
        }
    }

    /// Start a plan with no primary write.
    pub fn side_effects() -> Self {
        Self {
            effects: Vec::new(),
            has_primary: false,
        }
    }

    /// Append a side effect.
    #[must_use]
    pub fn then(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Append a side effect if present.
    #[must_use]
    pub fn then_some(self, effect: Option<Effect>) -> Self {
        match effect {
            Some(effect) => self.then(effect),
            None => self,
        }
    }

    /// Execute the plan in order.
    ///
    /// # Errors
    ///
    /// Returns the primary write's error unchanged if it fails. In
    /// [`EffectMode::Strict`], returns [`Error::SideEffectFailed`] for the
    /// first failing side effect.
    pub async fn run(self, store: &mut dyn DeskStorage, mode: EffectMode) -> Result<EffectReport> {
        let mut report = EffectReport::default();
        let mut effects = self.effects.into_iter();

        if self.has_primary {
            if let Some(primary) = effects.next() {
                let step = primary.describe();
                report.complaint = primary.apply(store).await?;
                debug!(step = %step, "Applied primary write");
                report.steps.push(StepReport {
                    step,
                    outcome: StepOutcome::Applied,
                });
            }
        }

        while let Some(effect) = effects.next() {
            let step = effect.describe();
            match effect.apply(store).await {
                Ok(_) => report.steps.push(StepReport {
                    step,
                    outcome: StepOutcome::Applied,
                }),
                Err(e) => {
                    let reason = e.to_string();
                    match mode {
                        EffectMode::BestEffort => {
                            warn!(step = %step, error = %reason, "Side effect failed; continuing");
                            report.steps.push(StepReport {
                                step,
                                outcome: StepOutcome::Failed(reason),
                            });
                        }
                        EffectMode::Strict => {
                            warn!(step = %step, error = %reason, "Side effect failed; stopping");
                            report.steps.push(StepReport {
                                step: step.clone(),
                                outcome: StepOutcome::Failed(reason.clone()),
                            });
                            for rest in effects.by_ref() {
                                report.steps.push(StepReport {
                                    step: rest.describe(),
                                    outcome: StepOutcome::Skipped,
                                });
                            }
                            debug!(?report, "Strict plan aborted");
                            return Err(Error::SideEffectFailed { step, reason });
                        }
                    }
                }
            }
        }

        Ok(report)
    }
}
