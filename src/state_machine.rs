//! Which screen the landing page shows, and why it changes.
//!
//! The machine is pure: `ViewState × Event → (ViewState, Vec<Effect>)`.
//! Remote calls and storage writes are returned as [`Effect`]s for the
//! controller to run; their outcomes come back in as new events.
//!
//! ```text
//! start ──uid──▶ Verifying ──found──▶ GatedKit ◀──kit── Success
//!   │               │ not found ─▶ IdleWithError    ▲        │
//!   │               │ failed ────▶ Idle             └dismiss─┘
//!   └──no uid──▶ Idle ──submit──▶ Submitting ──ok──▶ Success
//!                                     └──failed──▶ IdleWithError
//! ```

use crate::models::NewLead;
use crate::record_store::VerifyOutcome;
use serde::Serialize;

/// Shown when a remembered or linked identifier no longer resolves.
pub const LINK_EXPIRED_MESSAGE: &str =
    "El enlace de acceso ha caducado o no es válido. Por favor, regístrate de nuevo.";
/// Shown when the lead could not be created.
pub const REGISTRATION_FAILED_MESSAGE: &str =
    "No se pudo completar el registro. Inténtalo de nuevo.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewState {
    /// Registration form, no banner.
    Idle,
    /// Registration form with a banner.
    IdleWithError { message: String },
    /// Form disabled while the lead is created.
    Submitting,
    /// Full-screen loader while a remembered identifier is checked.
    Verifying { identifier: String },
    /// Embedded kit with a dismiss control.
    GatedKit { lead_id: String },
    /// Confirmation with a button to open the kit.
    Success { lead_id: String },
}

impl ViewState {
    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Idle => "idle",
            ViewState::IdleWithError { .. } => "idle_with_error",
            ViewState::Submitting => "submitting",
            ViewState::Verifying { .. } => "verifying",
            ViewState::GatedKit { .. } => "gated_kit",
            ViewState::Success { .. } => "success",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Page opened. Carries the URL override or the remembered identifier.
    Started { identifier: Option<String> },
    VerifyFinished(VerifyOutcome),
    /// The lookup itself failed (network, server).
    VerifyFailed,
    SubmitRequested(NewLead),
    CreateSucceeded { lead_id: String },
    CreateFailed,
    KitRequested,
    KitDismissed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Verify { identifier: String },
    Create(NewLead),
    PersistIdentifier(String),
    ClearIdentifier,
    Celebrate,
    /// Fire and continue; its outcome never feeds back into the machine.
    MarkDownloaded { lead_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: ViewState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: ViewState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with(state: ViewState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }
}

/// Computes the next view and the side effects to run.
///
/// Events that make no sense in the current state leave it unchanged and
/// produce no effects (e.g. a second submit while `Submitting`).
pub fn transition(state: &ViewState, event: Event) -> Transition {
    match (state, event) {
        (_, Event::Started { identifier }) => match identifier.filter(|id| !id.is_empty()) {
            Some(identifier) => Transition::with(
                ViewState::Verifying {
                    identifier: identifier.clone(),
                },
                vec![Effect::Verify { identifier }],
            ),
            None => Transition::to(ViewState::Idle),
        },

        (ViewState::Verifying { .. }, Event::VerifyFinished(VerifyOutcome::Found(lead_id))) => {
            Transition::with(
                ViewState::GatedKit {
                    lead_id: lead_id.clone(),
                },
                vec![Effect::PersistIdentifier(lead_id)],
            )
        }
        (ViewState::Verifying { identifier }, Event::VerifyFinished(VerifyOutcome::NotFound)) => {
            tracing::info!("Forgetting identifier {}: no matching lead", identifier);
            Transition::with(
                ViewState::IdleWithError {
                    message: LINK_EXPIRED_MESSAGE.to_string(),
                },
                vec![Effect::ClearIdentifier],
            )
        }
        // A failed lookup may be transient; fall back to the plain form.
        (ViewState::Verifying { identifier }, Event::VerifyFailed) => {
            tracing::warn!("Could not verify {}, showing the plain form", identifier);
            Transition::to(ViewState::Idle)
        }

        (ViewState::Idle | ViewState::IdleWithError { .. }, Event::SubmitRequested(lead)) => {
            Transition::with(ViewState::Submitting, vec![Effect::Create(lead)])
        }
        (ViewState::Submitting, Event::CreateSucceeded { lead_id }) => Transition::with(
            ViewState::Success {
                lead_id: lead_id.clone(),
            },
            vec![Effect::PersistIdentifier(lead_id), Effect::Celebrate],
        ),
        (ViewState::Submitting, Event::CreateFailed) => Transition::to(ViewState::IdleWithError {
            message: REGISTRATION_FAILED_MESSAGE.to_string(),
        }),

        (ViewState::GatedKit { lead_id }, Event::KitDismissed) => {
            Transition::to(ViewState::Success {
                lead_id: lead_id.clone(),
            })
        }
        (ViewState::Success { lead_id }, Event::KitRequested) => Transition::with(
            ViewState::GatedKit {
                lead_id: lead_id.clone(),
            },
            vec![Effect::MarkDownloaded {
                lead_id: lead_id.clone(),
            }],
        ),

        (state, event) => {
            tracing::debug!("Ignoring {:?} in state {}", event, state.name());
            Transition::to(state.clone())
        }
    }
}
