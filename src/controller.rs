//! Drives the view state machine for one visitor: owns the form, runs the
//! effects the machine asks for, and feeds their outcomes back in.

use crate::attribution::EntryContext;
use crate::errors::AppError;
use crate::form::{FieldValue, FormField, FormState};
use crate::identifier_store::IdentifierStore;
use crate::record_store::RecordStore;
use crate::state_machine::{transition, Effect, Event, Transition, ViewState};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// One visitor's page session.
///
/// Operations take `&mut self`, so at most one runs at a time; callers that
/// share a controller wrap it in a mutex and reject re-entrant triggers.
pub struct LandingController {
    state: ViewState,
    form: FormState,
    store: Arc<dyn RecordStore>,
    identifiers: Arc<dyn IdentifierStore>,
    celebrate: bool,
    started: bool,
    background: Vec<JoinHandle<()>>,
}

impl LandingController {
    pub fn new(store: Arc<dyn RecordStore>, identifiers: Arc<dyn IdentifierStore>) -> Self {
        Self {
            state: ViewState::Idle,
            form: FormState::default(),
            store,
            identifiers,
            celebrate: false,
            started: false,
            background: Vec::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn progress(&self) -> f64 {
        self.form.progress()
    }

    /// Identifier currently held in the durable slot.
    pub fn remembered_identifier(&self) -> Option<String> {
        self.identifiers.get()
    }

    /// Returns whether the celebration should play, then resets it.
    pub fn take_celebration(&mut self) -> bool {
        std::mem::take(&mut self.celebrate)
    }

    /// Startup resolution. Runs once; later calls return the current view.
    ///
    /// The `uid` in the entry URL wins over the remembered identifier.
    pub async fn start(&mut self, entry: &EntryContext) -> &ViewState {
        if self.started {
            return &self.state;
        }
        self.started = true;
        self.form = FormState::from_entry(entry);

        let identifier = entry.uid.clone().or_else(|| self.identifiers.get());
        self.dispatch(Event::Started { identifier }).await
    }

    pub fn update_field(&mut self, field: FormField, value: FieldValue) -> Result<(), AppError> {
        if !matches!(self.state, ViewState::Idle | ViewState::IdleWithError { .. }) {
            return Err(AppError::BadRequest(format!(
                "Form is not editable while {}",
                self.state.name()
            )));
        }
        self.form.update_field(field, value)
    }

    /// Submits the form. Field data is kept if creation fails.
    pub async fn submit(&mut self) -> Result<&ViewState, AppError> {
        if !self.form.consent {
            return Err(AppError::BadRequest("Consent is required".to_string()));
        }
        let lead = self.form.normalize_for_submission();
        Ok(self.dispatch(Event::SubmitRequested(lead)).await)
    }

    /// Opens the kit immediately; the download flag is recorded in the background.
    pub async fn open_kit(&mut self) -> &ViewState {
        self.dispatch(Event::KitRequested).await
    }

    pub async fn dismiss_kit(&mut self) -> &ViewState {
        self.dispatch(Event::KitDismissed).await
    }

    /// Waits for background bookkeeping (download flags) to finish.
    pub async fn settle(&mut self) {
        for handle in self.background.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!("Background task ended abnormally: {}", e);
            }
        }
    }

    async fn dispatch(&mut self, event: Event) -> &ViewState {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            let from = self.state.name();
            let Transition { state, effects } = transition(&self.state, event);
            if state.name() != from {
                tracing::info!("View {} -> {}", from, state.name());
            }
            self.state = state;

            for effect in effects {
                if let Some(next) = self.run(effect).await {
                    queue.push_back(next);
                }
            }
        }

        &self.state
    }

    async fn run(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::Verify { identifier } => match self.store.verify(&identifier).await {
                Ok(outcome) => Some(Event::VerifyFinished(outcome)),
                Err(e) => {
                    tracing::error!("Verify access error for {}: {}", identifier, e);
                    Some(Event::VerifyFailed)
                }
            },
            Effect::Create(lead) => match self.store.create(&lead).await {
                Ok(lead_id) => Some(Event::CreateSucceeded { lead_id }),
                Err(e) => {
                    tracing::error!("Submission error: {}", e);
                    Some(Event::CreateFailed)
                }
            },
            Effect::PersistIdentifier(identifier) => {
                if let Err(e) = self.identifiers.set(&identifier) {
                    tracing::warn!("Could not remember identifier {}: {}", identifier, e);
                }
                None
            }
            Effect::ClearIdentifier => {
                if let Err(e) = self.identifiers.clear() {
                    tracing::warn!("Could not forget stale identifier: {}", e);
                }
                None
            }
            Effect::Celebrate => {
                self.celebrate = true;
                None
            }
            Effect::MarkDownloaded { lead_id } => {
                let store = Arc::clone(&self.store);
                self.background.retain(|handle| !handle.is_finished());
                self.background.push(tokio::spawn(async move {
                    if let Err(e) = store.mark_downloaded(&lead_id).await {
                        tracing::warn!("Error tracking download for {}: {}", lead_id, e);
                    }
                }));
                None
            }
        }
    }
}
