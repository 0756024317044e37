use std::sync::Arc;

use tracing::{error, info, warn};

use rumbo_core::{
    BackendError, BookingData, BookingSession, BookingStep, RequestContext, SessionStore,
    STEP_ORDER,
};

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("failed to load session {session_id}: {source}")]
    SessionLoad {
        session_id: String,
        source: BackendError,
    },
    #[error("session {0} has no booking data")]
    SessionIncomplete(String),
    #[error("unknown step name: {0}")]
    UnknownStep(String),
    #[error("failed to persist step transition: {0}")]
    Persist(BackendError),
    #[error("a step transition is already in flight")]
    TransitionInFlight,
    #[error("no session loaded")]
    NotLoaded,
    #[error("cannot move from {from} to {to}: steps only advance forward")]
    StepOrder {
        from: BookingStep,
        to: BookingStep,
    },
}

/// Ordinal position among the fixed steps, for the progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StepIndicator {
    pub position: usize,
    pub total: usize,
}

impl StepIndicator {
    fn for_step(step: BookingStep) -> Self {
        Self {
            position: step.ordinal(),
            total: STEP_ORDER.len(),
        }
    }
}

/// What the wizard currently shows.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case", tag = "view")]
pub enum WizardView {
    Step {
        step: BookingStep,
        indicator: StepIndicator,
    },
    /// Terminal error view. Only session-integrity failures land here;
    /// step-local errors never replace the active step.
    Failed { message: String },
}

/// Message sent by a step when it completes. The single input to the
/// wizard's transition handler, so the transition table lives in one
/// place instead of being scattered across step components.
#[derive(Debug, Clone)]
pub enum WizardEvent {
    StepCompleted {
        update: BookingData,
        next: BookingStep,
    },
}

/// Orchestrator of the four-step checkout flow.
///
/// Owns the step pointer and the loaded session, and is the only writer
/// of the session record. Persistence is last-write-wins: every advance
/// sends the full `{booking_data, current_step}` replacement, and no
/// concurrency token is carried.
pub struct BookingWizard {
    sessions: Arc<dyn SessionStore>,
    session: Option<BookingSession>,
    step: Option<BookingStep>,
    view: Option<WizardView>,
    in_flight: bool,
}

impl BookingWizard {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            sessions,
            session: None,
            step: None,
            view: None,
            in_flight: false,
        }
    }

    /// Fetch the session and render the step named by its step pointer.
    pub async fn load(
        &mut self,
        ctx: &RequestContext,
        session_id: &str,
    ) -> Result<WizardView, WizardError> {
        let session = match self.sessions.fetch(ctx, session_id).await {
            Ok(session) => session,
            Err(source) => {
                let err = WizardError::SessionLoad {
                    session_id: session_id.to_string(),
                    source,
                };
                self.fail(err.to_string());
                return Err(err);
            }
        };

        if session.booking_data.is_none() {
            // Keep the session around so the failure can be diagnosed
            warn!(session_id, "session loaded without booking data");
            self.session = Some(session);
            self.step = None;
            let err = WizardError::SessionIncomplete(session_id.to_string());
            self.fail(err.to_string());
            return Err(err);
        }

        match BookingStep::parse(&session.current_step) {
            Some(step) => {
                info!(session_id, step = %step, "session loaded");
                self.session = Some(session);
                self.step = Some(step);
                let view = WizardView::Step {
                    step,
                    indicator: StepIndicator::for_step(step),
                };
                self.view = Some(view.clone());
                Ok(view)
            }
            None => {
                let name = session.current_step.clone();
                error!(session_id, step = %name, "unrecognized step name");
                self.session = Some(session);
                self.step = None;
                let err = WizardError::UnknownStep(name);
                self.fail(err.to_string());
                Err(err)
            }
        }
    }

    /// Transition handler; all step hand-offs funnel through here.
    pub async fn handle_event(
        &mut self,
        ctx: &RequestContext,
        event: WizardEvent,
    ) -> Result<WizardView, WizardError> {
        match event {
            WizardEvent::StepCompleted { update, next } => self.advance(ctx, update, next).await,
        }
    }

    /// Merge a step's partial update into the session, persist the merge
    /// and the new step pointer, and re-render.
    ///
    /// On persistence failure the local view is not advanced: the caller
    /// stays on the current step and nothing is silently skipped.
    pub async fn advance(
        &mut self,
        ctx: &RequestContext,
        update: BookingData,
        next: BookingStep,
    ) -> Result<WizardView, WizardError> {
        if self.in_flight {
            return Err(WizardError::TransitionInFlight);
        }
        let session = self.session.as_ref().ok_or(WizardError::NotLoaded)?;
        let current = self.step.ok_or(WizardError::NotLoaded)?;

        if next.index() != current.index() + 1 {
            return Err(WizardError::StepOrder {
                from: current,
                to: next,
            });
        }

        let mut merged = session
            .booking_data
            .clone()
            .ok_or_else(|| WizardError::SessionIncomplete(session.session_id.clone()))?;
        merged.merge(update);

        let session_id = session.session_id.clone();
        self.in_flight = true;
        let result = self
            .sessions
            .update(ctx, &session_id, &merged, next.as_str())
            .await;
        self.in_flight = false;

        match result {
            Ok(mut saved) => {
                info!(session_id, from = %current, to = %next, "step transition persisted");
                if saved.booking_data.is_none() {
                    saved.booking_data = Some(merged);
                }
                self.session = Some(saved);
                self.step = Some(next);
                let view = WizardView::Step {
                    step: next,
                    indicator: StepIndicator::for_step(next),
                };
                self.view = Some(view.clone());
                Ok(view)
            }
            Err(source) => {
                warn!(session_id, from = %current, to = %next, error = %source,
                    "step transition failed to persist, staying on current step");
                Err(WizardError::Persist(source))
            }
        }
    }

    pub fn view(&self) -> Option<&WizardView> {
        self.view.as_ref()
    }

    pub fn current_step(&self) -> Option<BookingStep> {
        self.step
    }

    pub fn step_indicator(&self) -> Option<StepIndicator> {
        self.step.map(StepIndicator::for_step)
    }

    pub fn session(&self) -> Option<&BookingSession> {
        self.session.as_ref()
    }

    pub fn booking_data(&self) -> Option<&BookingData> {
        self.session.as_ref().and_then(|s| s.booking_data.as_ref())
    }

    fn fail(&mut self, message: String) {
        self.view = Some(WizardView::Failed { message });
    }

    #[cfg(test)]
    fn set_in_flight(&mut self, value: bool) {
        self.in_flight = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use rumbo_core::{BackendResult, SelectedVehicle, TripType};

    /// Scripted session store: serves one session, records updates,
    /// optionally fails them.
    struct ScriptedStore {
        session: Mutex<Option<BookingSession>>,
        fail_fetch: bool,
        fail_update: bool,
        updates: Mutex<Vec<(BookingData, String)>>,
    }

    impl ScriptedStore {
        fn with_session(session: BookingSession) -> Self {
            Self {
                session: Mutex::new(Some(session)),
                fail_fetch: false,
                fail_update: false,
                updates: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SessionStore for ScriptedStore {
        async fn fetch(
            &self,
            _ctx: &RequestContext,
            session_id: &str,
        ) -> BackendResult<BookingSession> {
            if self.fail_fetch {
                return Err(BackendError::Transport("connection refused".to_string()));
            }
            self.session
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| BackendError::Status {
                    code: 404,
                    message: format!("no session {}", session_id),
                })
        }

        async fn update(
            &self,
            _ctx: &RequestContext,
            session_id: &str,
            booking_data: &BookingData,
            current_step: &str,
        ) -> BackendResult<BookingSession> {
            if self.fail_update {
                return Err(BackendError::Status {
                    code: 500,
                    message: "persistence unavailable".to_string(),
                });
            }
            self.updates
                .lock()
                .unwrap()
                .push((booking_data.clone(), current_step.to_string()));
            let saved = BookingSession {
                session_id: session_id.to_string(),
                current_step: current_step.to_string(),
                booking_data: Some(booking_data.clone()),
            };
            *self.session.lock().unwrap() = Some(saved.clone());
            Ok(saved)
        }
    }

    fn session_at(step: &str) -> BookingSession {
        BookingSession {
            session_id: "s-1".to_string(),
            current_step: step.to_string(),
            booking_data: Some(BookingData {
                trip_type: Some(TripType::OneWay),
                date: Some("2025-05-10".to_string()),
                time: Some("10:32".to_string()),
                ..BookingData::default()
            }),
        }
    }

    fn vehicle_update() -> BookingData {
        BookingData {
            vehicle: Some(SelectedVehicle {
                id: "v1".to_string(),
                name: "Sedan".to_string(),
                price: 65.0,
            }),
            ..BookingData::default()
        }
    }

    #[tokio::test]
    async fn test_load_renders_current_step() {
        let store = Arc::new(ScriptedStore::with_session(session_at("payment")));
        let mut wizard = BookingWizard::new(store);

        let view = wizard
            .load(&RequestContext::anonymous(), "s-1")
            .await
            .unwrap();

        assert_eq!(
            view,
            WizardView::Step {
                step: BookingStep::Payment,
                indicator: StepIndicator {
                    position: 3,
                    total: 4
                },
            }
        );
    }

    #[tokio::test]
    async fn test_load_transport_failure() {
        let mut store = ScriptedStore::with_session(session_at("payment"));
        store.fail_fetch = true;
        let mut wizard = BookingWizard::new(Arc::new(store));

        let err = wizard
            .load(&RequestContext::anonymous(), "s-1")
            .await
            .unwrap_err();
        assert!(matches!(err, WizardError::SessionLoad { .. }));
        assert!(matches!(wizard.view(), Some(WizardView::Failed { .. })));
    }

    #[tokio::test]
    async fn test_load_without_booking_data_is_fatal() {
        let mut session = session_at("payment");
        session.booking_data = None;
        let store = Arc::new(ScriptedStore::with_session(session));
        let mut wizard = BookingWizard::new(store);

        let err = wizard
            .load(&RequestContext::anonymous(), "s-1")
            .await
            .unwrap_err();
        assert!(matches!(err, WizardError::SessionIncomplete(_)));
        // The session is retained so the failure is diagnosable
        assert!(wizard.session().is_some());
        assert!(matches!(wizard.view(), Some(WizardView::Failed { .. })));
    }

    #[tokio::test]
    async fn test_load_unknown_step_is_terminal() {
        let store = Arc::new(ScriptedStore::with_session(session_at("checkout_v2")));
        let mut wizard = BookingWizard::new(store);

        let err = wizard
            .load(&RequestContext::anonymous(), "s-1")
            .await
            .unwrap_err();
        assert!(matches!(err, WizardError::UnknownStep(name) if name == "checkout_v2"));
        assert!(matches!(wizard.view(), Some(WizardView::Failed { .. })));
    }

    #[tokio::test]
    async fn test_advance_merges_and_persists() {
        let store = Arc::new(ScriptedStore::with_session(session_at("vehicle_selection")));
        let mut wizard = BookingWizard::new(store.clone());
        wizard.load(&RequestContext::anonymous(), "s-1").await.unwrap();

        let view = wizard
            .handle_event(
                &RequestContext::anonymous(),
                WizardEvent::StepCompleted {
                    update: vehicle_update(),
                    next: BookingStep::PassengerDetails,
                },
            )
            .await
            .unwrap();

        assert_eq!(wizard.current_step(), Some(BookingStep::PassengerDetails));
        assert!(matches!(view, WizardView::Step { step, .. } if step == BookingStep::PassengerDetails));

        let updates = store.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        let (persisted, step) = &updates[0];
        assert_eq!(step, "passenger_details");
        // Earlier fields survive the merge alongside the new vehicle
        assert_eq!(persisted.trip_type, Some(TripType::OneWay));
        assert_eq!(persisted.vehicle.as_ref().unwrap().id, "v1");
    }

    #[tokio::test]
    async fn test_advance_persist_failure_stays_on_step() {
        let mut store = ScriptedStore::with_session(session_at("vehicle_selection"));
        store.fail_update = true;
        let mut wizard = BookingWizard::new(Arc::new(store));
        wizard.load(&RequestContext::anonymous(), "s-1").await.unwrap();

        let err = wizard
            .advance(
                &RequestContext::anonymous(),
                vehicle_update(),
                BookingStep::PassengerDetails,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, WizardError::Persist(_)));
        assert_eq!(wizard.current_step(), Some(BookingStep::VehicleSelection));
        // Local data is untouched: the failed merge was not adopted
        assert!(wizard.booking_data().unwrap().vehicle.is_none());
    }

    #[tokio::test]
    async fn test_advance_rejects_backward_and_skipping() {
        let store = Arc::new(ScriptedStore::with_session(session_at("payment")));
        let mut wizard = BookingWizard::new(store);
        wizard.load(&RequestContext::anonymous(), "s-1").await.unwrap();

        let back = wizard
            .advance(
                &RequestContext::anonymous(),
                BookingData::default(),
                BookingStep::VehicleSelection,
            )
            .await
            .unwrap_err();
        assert!(matches!(back, WizardError::StepOrder { .. }));

        let store = Arc::new(ScriptedStore::with_session(session_at("vehicle_selection")));
        let mut wizard = BookingWizard::new(store);
        wizard.load(&RequestContext::anonymous(), "s-1").await.unwrap();

        let skip = wizard
            .advance(
                &RequestContext::anonymous(),
                BookingData::default(),
                BookingStep::Payment,
            )
            .await
            .unwrap_err();
        assert!(matches!(skip, WizardError::StepOrder { .. }));
    }

    #[tokio::test]
    async fn test_advance_guarded_while_in_flight() {
        let store = Arc::new(ScriptedStore::with_session(session_at("vehicle_selection")));
        let mut wizard = BookingWizard::new(store);
        wizard.load(&RequestContext::anonymous(), "s-1").await.unwrap();

        wizard.set_in_flight(true);
        let err = wizard
            .advance(
                &RequestContext::anonymous(),
                vehicle_update(),
                BookingStep::PassengerDetails,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WizardError::TransitionInFlight));

        wizard.set_in_flight(false);
        wizard
            .advance(
                &RequestContext::anonymous(),
                vehicle_update(),
                BookingStep::PassengerDetails,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_indicator_recomputed_per_transition() {
        let store = Arc::new(ScriptedStore::with_session(session_at("vehicle_selection")));
        let mut wizard = BookingWizard::new(store);
        wizard.load(&RequestContext::anonymous(), "s-1").await.unwrap();
        assert_eq!(wizard.step_indicator().unwrap().position, 1);

        wizard
            .advance(
                &RequestContext::anonymous(),
                vehicle_update(),
                BookingStep::PassengerDetails,
            )
            .await
            .unwrap();
        assert_eq!(wizard.step_indicator().unwrap().position, 2);
        assert_eq!(wizard.step_indicator().unwrap().total, 4);
    }
}
