//! Tomorrow-plan orchestration.
//!
//! [`PlanOrchestrator`] decides whether a plan needs generating, gathers
//! context from the tip cache, calls the [`PlanGenerator`], and persists
//! the result. It owns an explicit state machine:
//!
//! ```text
//!            generate()             ok, non-empty
//!   Idle ───────────────▶ Generating ─────────────▶ Ready
//!    ▲                        │
//!    └────────────────────────┘
//!         failure (logged, nothing persisted)
//! ```
//!
//! A second `generate()` while one is in flight is refused, and a plan
//! already stored for today is adopted without any network call, so at
//! most one generation happens per day regardless of who calls.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::generation::{GenerationError, PlanGenerator};
use crate::models::{FarmProfile, PlanRequest};
use crate::plan::PlanStore;
use crate::speech::{SpeechController, SpeechToggle};
use crate::tips::TipCache;

/// Number of recent tips sent along as context by default.
pub const RECENT_TIP_CONTEXT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanState {
    Idle,
    Generating,
    Ready(String),
}

/// What a call to [`PlanOrchestrator::generate`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// Today's plan was already stored; no request was made.
    Cached(String),
    /// A new plan was generated and stored.
    Generated(String),
    /// Another generation is in flight; this call did nothing.
    InProgress,
    /// The request failed. State is back to idle and nothing was stored.
    Failed(GenerationError),
    /// The orchestrator was shut down; any result was dropped.
    Discarded,
}

/// Snapshot used to render the plan card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanCardView {
    pub visible: bool,
    pub night: bool,
    pub plan: Option<String>,
    pub generating: bool,
    pub speaking: bool,
}

pub struct PlanOrchestrator {
    tips: Arc<TipCache>,
    plans: Arc<PlanStore>,
    generator: Arc<dyn PlanGenerator>,
    speech: SpeechController,
    state: Mutex<PlanState>,
    closed: AtomicBool,
    /// Bumped by every shutdown; results from an older epoch are dropped.
    epoch: AtomicU64,
    recent_tip_context: usize,
}

/// Puts the state back to `Idle` if a generation is abandoned mid-flight.
struct GeneratingGuard<'a> {
    state: &'a Mutex<PlanState>,
    armed: bool,
}

impl GeneratingGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for GeneratingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(mut state) = self.state.lock() {
            if *state == PlanState::Generating {
                *state = PlanState::Idle;
            }
        }
    }
}

impl PlanOrchestrator {
    pub fn new(
        tips: Arc<TipCache>,
        plans: Arc<PlanStore>,
        generator: Arc<dyn PlanGenerator>,
        speech: SpeechController,
    ) -> Self {
        Self {
            tips,
            plans,
            generator,
            speech,
            state: Mutex::new(PlanState::Idle),
            closed: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            recent_tip_context: RECENT_TIP_CONTEXT,
        }
    }

    pub fn with_recent_tip_context(mut self, n: usize) -> Self {
        self.recent_tip_context = n;
        self
    }

    pub fn state(&self) -> PlanState {
        self.state
            .lock()
            .map(|s| s.clone())
            .unwrap_or(PlanState::Idle)
    }

    /// The plan currently held, if any.
    pub fn plan(&self) -> Option<String> {
        match self.state() {
            PlanState::Ready(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_generating(&self) -> bool {
        self.state() == PlanState::Generating
    }

    pub fn is_night_time(&self) -> bool {
        self.plans.is_night_time()
    }

    pub fn is_speaking(&self) -> bool {
        self.speech.is_speaking()
    }

    fn set_state(&self, next: PlanState) {
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
    }

    /// Produce today's plan for `profile`, generating it only if needed.
    ///
    /// Never returns an error: failures are logged and reported through
    /// [`GenerateOutcome::Failed`] with the state reset to idle.
    pub async fn generate(&self, profile: &FarmProfile) -> GenerateOutcome {
        if self.closed.load(Ordering::SeqCst) {
            return GenerateOutcome::Discarded;
        }
        let epoch = self.epoch.load(Ordering::SeqCst);
        {
            let Ok(mut state) = self.state.lock() else {
                return GenerateOutcome::InProgress;
            };
            if *state == PlanState::Generating {
                return GenerateOutcome::InProgress;
            }
            *state = PlanState::Generating;
        }
        let guard = GeneratingGuard {
            state: &self.state,
            armed: true,
        };

        if let Some(cached) = self.plans.get_today().await {
            guard.disarm();
            self.set_state(PlanState::Ready(cached.clone()));
            return GenerateOutcome::Cached(cached);
        }

        let recent = self.tips.recent_texts(self.recent_tip_context).await;
        let request = PlanRequest::new(profile, recent);
        info!(
            crop = %request.crop,
            stage = %request.stage,
            context_tips = request.recent_tips.len(),
            "generating tomorrow plan"
        );

        let result = self
            .generator
            .generate_plan(&request)
            .await
            .and_then(|text| {
                if text.trim().is_empty() {
                    Err(GenerationError::Malformed("empty planText".to_string()))
                } else {
                    Ok(text)
                }
            });

        if self.closed.load(Ordering::SeqCst) || self.epoch.load(Ordering::SeqCst) != epoch {
            // Guard resets state on drop.
            return GenerateOutcome::Discarded;
        }

        match result {
            Ok(text) => {
                if let Err(e) = self.plans.save_today(&text).await {
                    warn!(error = %e, "generated plan could not be persisted");
                }
                guard.disarm();
                self.set_state(PlanState::Ready(text.clone()));
                GenerateOutcome::Generated(text)
            }
            Err(e) => {
                warn!(error = %e, "plan generation failed");
                GenerateOutcome::Failed(e)
            }
        }
    }

    /// Start or stop reading the current plan aloud.
    pub fn speak_plan(&self) -> SpeechToggle {
        self.speech.toggle(self.plan().as_deref())
    }

    /// Re-evaluate night-time and today's stored plan.
    ///
    /// Adopts a stored plan, and drops a held plan once the day rolls
    /// over. Leaves an in-flight generation alone.
    pub async fn refresh(&self) -> PlanCardView {
        let night = self.plans.is_night_time();
        let stored = self.plans.get_today().await;
        if let Ok(mut state) = self.state.lock() {
            if *state != PlanState::Generating {
                *state = match &stored {
                    Some(text) => PlanState::Ready(text.clone()),
                    None => PlanState::Idle,
                };
            }
        }
        let plan = self.plan();
        PlanCardView {
            visible: night || plan.is_some(),
            night,
            generating: self.is_generating(),
            speaking: self.speech.is_speaking(),
            plan,
        }
    }

    /// Tear down: stop speech and ignore any generation still in flight.
    ///
    /// Later `generate()` calls return [`GenerateOutcome::Discarded`] until
    /// [`resume`](Self::resume) is called.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if self.speech.stop() {
            info!("speech cancelled on shutdown");
        }
    }

    /// Accept generations again after a [`shutdown`](Self::shutdown).
    ///
    /// A request started before the shutdown stays discarded.
    pub fn resume(&self) {
        self.closed.store(false, Ordering::SeqCst);
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
