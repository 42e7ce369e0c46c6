//! Patient lookup flow.
//!
//! The search screen is a small state machine with four mutually exclusive views:
//!
//! ```text
//!            submit (valid)                     choose_birthday
//! Searching ───────────────► Found ◄──────────────────────┐
//!     ▲      │                                             │
//!     │      ├──────────────► NotFound                     │
//!     │      └──────────────► SelectBirthday ──────────────┘
//!     └──── dismiss (from any state)                       └──► NotFound
//! ```
//!
//! [`SearchResolver`] turns one validated query into exactly one [`ViewState`]: it asks the
//! backend first and falls back to the shared [`ReferenceDirectory`] when the backend fails or
//! has no match. [`LookupSession`] owns the current state and stamps every submission with a
//! [`RequestTicket`], so an outcome that arrives after a newer submission is discarded.

use crate::backend::HospitalBackend;
use crate::directory::{same_text, ReferenceDirectory};
use crate::error::{ImusError, ImusResult};
use crate::query::{NormalisedQuery, PatientQuery};
use api_shared::PatientRecord;
use std::sync::Arc;

/// What the search screen is showing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ViewState {
    /// The empty search form.
    #[default]
    Searching,
    /// No record matched; the user may try again.
    NotFound,
    /// One record matched; shown as an ID card.
    Found(PatientRecord),
    /// Several directory records share the name; the user must pick a birthday.
    SelectBirthday(BirthdayChoice),
}

impl ViewState {
    fn name(&self) -> &'static str {
        match self {
            ViewState::Searching => "searching",
            ViewState::NotFound => "showing not found",
            ViewState::Found(_) => "showing a patient",
            ViewState::SelectBirthday(_) => "selecting a birthday",
        }
    }
}

/// Candidates offered for birthday disambiguation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BirthdayChoice {
    query: NormalisedQuery,
    candidates: Vec<PatientRecord>,
}

impl BirthdayChoice {
    /// Distinct candidate birthdays, in directory order.
    pub fn birthdays(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for candidate in &self.candidates {
            let birthday = candidate.birthday.trim();
            if !seen.contains(&birthday) {
                seen.push(birthday);
            }
        }
        seen
    }

    pub fn candidates(&self) -> &[PatientRecord] {
        &self.candidates
    }

    pub fn query(&self) -> &NormalisedQuery {
        &self.query
    }
}

/// Resolves validated queries against the backend and the reference directory.
#[derive(Clone)]
pub struct SearchResolver {
    backend: Arc<dyn HospitalBackend>,
    directory: Arc<ReferenceDirectory>,
}

impl SearchResolver {
    pub fn new(backend: Arc<dyn HospitalBackend>, directory: Arc<ReferenceDirectory>) -> Self {
        Self { backend, directory }
    }

    pub fn directory(&self) -> &ReferenceDirectory {
        &self.directory
    }

    /// Produces exactly one view state for the query.
    ///
    /// The first server candidate wins. Transport and decode failures, unsuccessful
    /// responses and empty results all fall through to the directory without surfacing an
    /// error.
    pub async fn resolve(&self, query: &NormalisedQuery) -> ViewState {
        match self.backend.search(&query.to_search_form()).await {
            Ok(res) => {
                if let Some(patient) = res.patients().first() {
                    tracing::debug!("backend matched patient {}", patient.id);
                    return ViewState::Found(patient.clone());
                }
                tracing::debug!(
                    "backend had no match ({}), using reference directory",
                    res.message.as_deref().unwrap_or("no message")
                );
            }
            Err(e) => {
                tracing::warn!("search request failed, using reference directory: {}", e);
            }
        }

        self.resolve_in_directory(query)
    }

    /// Directory-only resolution.
    pub fn resolve_in_directory(&self, query: &NormalisedQuery) -> ViewState {
        if let Some(patient) = self.directory.exact_matches(query).first() {
            return ViewState::Found((*patient).clone());
        }

        let candidates: Vec<PatientRecord> = self
            .directory
            .name_matches(query)
            .into_iter()
            .cloned()
            .collect();
        let choice = BirthdayChoice {
            query: query.clone(),
            candidates,
        };

        if choice.birthdays().len() > 1 {
            ViewState::SelectBirthday(choice)
        } else {
            ViewState::NotFound
        }
    }

    /// Second, stricter pass after the user picked a birthday.
    ///
    /// Matches the candidates on the chosen birthday and, when the query carries one, on the
    /// suffix.
    ///
    /// # Errors
    ///
    /// [`ImusError::BirthdayNotOffered`] if `birthday` was not one of the offered choices.
    pub fn choose_birthday(&self, choice: &BirthdayChoice, birthday: &str) -> ImusResult<ViewState> {
        let birthday = birthday.trim();
        if !choice.birthdays().contains(&birthday) {
            return Err(ImusError::BirthdayNotOffered(birthday.to_owned()));
        }

        let matched = choice.candidates.iter().find(|candidate| {
            candidate.birthday.trim() == birthday
                && match &choice.query.suffix {
                    Some(wanted) => same_text(candidate.suffix.as_deref().unwrap_or(""), wanted),
                    None => true,
                }
        });

        Ok(match matched {
            Some(patient) => ViewState::Found(patient.clone()),
            None => ViewState::NotFound,
        })
    }
}

/// Identifies one submission; only the latest ticket may update the view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

/// A validated submission waiting for its backend round-trip.
#[derive(Clone, Debug)]
pub struct PendingSearch {
    ticket: RequestTicket,
    query: NormalisedQuery,
}

impl PendingSearch {
    pub fn ticket(&self) -> RequestTicket {
        self.ticket
    }

    pub fn query(&self) -> &NormalisedQuery {
        &self.query
    }

    /// Runs the search; the outcome can be applied to the session later.
    pub async fn run(self, resolver: &SearchResolver) -> SearchOutcome {
        let state = resolver.resolve(&self.query).await;
        SearchOutcome {
            ticket: self.ticket,
            state,
        }
    }
}

/// A resolved search, tagged with the ticket it was issued under.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub ticket: RequestTicket,
    pub state: ViewState,
}

/// The search screen: current view state plus the race guard.
pub struct LookupSession {
    resolver: SearchResolver,
    state: ViewState,
    latest: u64,
}

impl LookupSession {
    pub fn new(resolver: SearchResolver) -> Self {
        Self {
            resolver,
            state: ViewState::Searching,
            latest: 0,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn resolver(&self) -> &SearchResolver {
        &self.resolver
    }

    fn next_ticket(&mut self) -> RequestTicket {
        self.latest += 1;
        RequestTicket(self.latest)
    }

    /// Validates the form and issues a ticket. The view state is left untouched.
    ///
    /// # Errors
    ///
    /// [`ImusError::Validation`] for an incomplete or invalid birthday; no ticket is issued.
    pub fn begin(&mut self, query: &PatientQuery) -> ImusResult<PendingSearch> {
        let query = query.normalise()?;
        Ok(PendingSearch {
            ticket: self.next_ticket(),
            query,
        })
    }

    /// Applies an outcome if it belongs to the latest submission.
    ///
    /// Returns `false` (and keeps the current state) for a stale outcome.
    pub fn apply(&mut self, outcome: SearchOutcome) -> bool {
        if outcome.ticket != RequestTicket(self.latest) {
            tracing::warn!(
                "discarding stale search outcome {:?} (latest is {})",
                outcome.ticket,
                self.latest
            );
            return false;
        }
        self.state = outcome.state;
        true
    }

    /// Validate, resolve and apply in one step.
    pub async fn submit(&mut self, query: &PatientQuery) -> ImusResult<&ViewState> {
        let pending = self.begin(query)?;
        let outcome = pending.run(&self.resolver).await;
        self.apply(outcome);
        Ok(&self.state)
    }

    /// Resolves a [`ViewState::SelectBirthday`] with the user's pick.
    pub fn choose_birthday(&mut self, birthday: &str) -> ImusResult<&ViewState> {
        let next = match &self.state {
            ViewState::SelectBirthday(choice) => self.resolver.choose_birthday(choice, birthday)?,
            other => {
                return Err(ImusError::InvalidTransition {
                    action: "choose a birthday",
                    state: other.name(),
                })
            }
        };
        // Any search still in flight belongs to the superseded form.
        self.next_ticket();
        self.state = next;
        Ok(&self.state)
    }

    /// Back to the empty search form.
    pub fn dismiss(&mut self) {
        self.next_ticket();
        self.state = ViewState::Searching;
    }

    /// Hands the resolved patient to the appointment view.
    pub fn request_appointments(&self) -> ImusResult<PatientRecord> {
        match &self.state {
            ViewState::Found(patient) => Ok(patient.clone()),
            other => Err(ImusError::InvalidTransition {
                action: "open appointments",
                state: other.name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{MockBackend, SearchReply};
    use crate::error::ValidationError;
    use api_shared::PatientId;

    fn session_with(backend: MockBackend) -> (LookupSession, Arc<MockBackend>) {
        let backend = Arc::new(backend);
        let resolver = SearchResolver::new(
            backend.clone(),
            Arc::new(ReferenceDirectory::builtin()),
        );
        (LookupSession::new(resolver), backend)
    }

    fn form(lastname: &str, firstname: &str, middlename: &str, day: &str, month: &str, year: &str) -> PatientQuery {
        PatientQuery {
            lastname: lastname.into(),
            firstname: firstname.into(),
            middlename: middlename.into(),
            suffix: None,
            day: day.into(),
            month: month.into(),
            year: year.into(),
        }
    }

    fn found_id(state: &ViewState) -> Option<u64> {
        match state {
            ViewState::Found(patient) => Some(patient.id.get()),
            _ => None,
        }
    }

    #[tokio::test]
    async fn directory_fallback_finds_maria_santos() {
        let (mut session, backend) = session_with(MockBackend::default());

        let state = session
            .submit(&form("Santos", "Maria", "Cruz", "15", "March", "1985"))
            .await
            .unwrap();

        assert_eq!(found_id(state), Some(1));
        assert_eq!(backend.search_count(), 1);
    }

    #[tokio::test]
    async fn fallback_is_case_insensitive() {
        let (mut session, _) = session_with(MockBackend::default());
        let state = session
            .submit(&form("sAnToS", "MARIA", "cruz", "15", "march", "1985"))
            .await
            .unwrap();
        assert_eq!(found_id(state), Some(1));
    }

    #[tokio::test]
    async fn unmatched_query_is_not_found() {
        let (mut session, _) = session_with(MockBackend {
            search_reply: SearchReply::Patients(vec![]),
            ..Default::default()
        });
        let state = session
            .submit(&form("Dizon", "Lito", "Reyes", "1", "January", "1970"))
            .await
            .unwrap();
        assert_eq!(state, &ViewState::NotFound);
    }

    #[tokio::test]
    async fn wrong_birthday_for_single_name_is_not_found() {
        let (mut session, _) = session_with(MockBackend::default());
        let state = session
            .submit(&form("Santos", "Maria", "Cruz", "1", "January", "1990"))
            .await
            .unwrap();
        assert_eq!(state, &ViewState::NotFound);
    }

    #[tokio::test]
    async fn unsuccessful_server_response_falls_back() {
        let (mut session, _) = session_with(MockBackend {
            search_reply: SearchReply::Unsuccessful,
            ..Default::default()
        });
        let state = session
            .submit(&form("Garcia", "Juan", "Dela Cruz", "22", "July", "1990"))
            .await
            .unwrap();
        assert_eq!(found_id(state), Some(3));
    }

    #[tokio::test]
    async fn server_match_takes_first_candidate() {
        let server_patients = vec![
            PatientRecord::identity(50, "Santos", "Maria", Some("Cruz"), None, "1985-03-15"),
            PatientRecord::identity(51, "Santos", "Maria", Some("Cruz"), None, "1985-03-15"),
        ];
        let (mut session, _) = session_with(MockBackend {
            search_reply: SearchReply::Patients(server_patients),
            ..Default::default()
        });
        let state = session
            .submit(&form("Santos", "Maria", "Cruz", "15", "March", "1985"))
            .await
            .unwrap();
        assert_eq!(found_id(state), Some(50));
    }

    #[tokio::test]
    async fn lastname_only_goes_through_birthday_selection() {
        let (mut session, _) = session_with(MockBackend::default());

        let state = session
            .submit(&form("Santos", "", "", "15", "May", "1985"))
            .await
            .unwrap();
        match state {
            ViewState::SelectBirthday(choice) => {
                assert_eq!(choice.birthdays(), vec!["1985-03-15", "1985-05-15"]);
            }
            other => panic!("expected birthday selection, got {other:?}"),
        }

        let state = session.choose_birthday("1985-05-15").unwrap();
        assert_eq!(found_id(state), Some(2));
    }

    #[tokio::test]
    async fn birthday_selection_compares_suffix() {
        let (mut session, _) = session_with(MockBackend::default());
        let mut query = form("Santos", "", "", "15", "May", "1985");
        query.suffix = Some("Jr.".into());

        session.submit(&query).await.unwrap();
        let state = session.choose_birthday("1985-05-15").unwrap();
        assert_eq!(state, &ViewState::NotFound);
    }

    #[tokio::test]
    async fn choosing_an_unoffered_birthday_keeps_state() {
        let (mut session, _) = session_with(MockBackend::default());
        session
            .submit(&form("Santos", "", "", "15", "May", "1985"))
            .await
            .unwrap();

        let err = session.choose_birthday("2000-01-01").unwrap_err();
        assert!(matches!(err, ImusError::BirthdayNotOffered(_)));
        assert!(matches!(session.state(), ViewState::SelectBirthday(_)));
    }

    #[tokio::test]
    async fn invalid_month_is_rejected_without_searching() {
        let (mut session, backend) = session_with(MockBackend::default());

        let err = session
            .submit(&form("Santos", "Maria", "Cruz", "15", "Marzo", "1985"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ImusError::Validation(ValidationError::UnknownMonth(_))
        ));
        assert_eq!(session.state(), &ViewState::Searching);
        assert_eq!(backend.search_count(), 0);
    }

    #[tokio::test]
    async fn missing_date_component_keeps_previous_state() {
        let (mut session, _) = session_with(MockBackend::default());
        session
            .submit(&form("Santos", "Maria", "Cruz", "15", "March", "1985"))
            .await
            .unwrap();

        let err = session
            .submit(&form("Reyes", "Ana", "Bautista", "", "November", "1978"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ImusError::Validation(ValidationError::MissingDateComponent("day"))
        ));
        assert_eq!(found_id(session.state()), Some(1));
    }

    #[tokio::test]
    async fn stale_outcome_does_not_overwrite_newer_one() {
        let (mut session, _) = session_with(MockBackend::default());
        let resolver = session.resolver().clone();

        let first = session
            .begin(&form("Santos", "Maria", "Cruz", "15", "March", "1985"))
            .unwrap();
        let second = session
            .begin(&form("Reyes", "Ana", "Bautista", "8", "November", "1978"))
            .unwrap();
        assert!(first.ticket() < second.ticket());

        let second_outcome = second.run(&resolver).await;
        let first_outcome = first.run(&resolver).await;

        assert!(session.apply(second_outcome));
        assert!(!session.apply(first_outcome));
        assert_eq!(found_id(session.state()), Some(4));
    }

    #[tokio::test]
    async fn dismiss_invalidates_in_flight_search() {
        let (mut session, _) = session_with(MockBackend::default());
        let resolver = session.resolver().clone();

        let pending = session
            .begin(&form("Santos", "Maria", "Cruz", "15", "March", "1985"))
            .unwrap();
        session.dismiss();

        let outcome = pending.run(&resolver).await;
        assert!(!session.apply(outcome));
        assert_eq!(session.state(), &ViewState::Searching);
    }

    #[tokio::test]
    async fn appointments_handoff_requires_found_patient() {
        let (mut session, _) = session_with(MockBackend::default());
        assert!(matches!(
            session.request_appointments(),
            Err(ImusError::InvalidTransition { .. })
        ));

        session
            .submit(&form("Santos", "Maria", "Cruz", "15", "March", "1985"))
            .await
            .unwrap();
        let patient = session.request_appointments().unwrap();
        assert_eq!(patient.id, PatientId::new(1));

        session.dismiss();
        assert_eq!(session.state(), &ViewState::Searching);
    }

    #[test]
    fn choose_birthday_outside_selection_is_invalid() {
        let (mut session, _) = session_with(MockBackend::default());
        assert!(matches!(
            session.choose_birthday("1985-05-15"),
            Err(ImusError::InvalidTransition { .. })
        ));
    }
}
