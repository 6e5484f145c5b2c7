//! Agent seats.
//!
//! Every agent lives on its own worker thread and is driven over channels.
//! The controller waits for each answer with a deadline, so an agent that
//! loops or blocks costs the match at most one wait before it is forfeited.
//! A worker whose call expired is abandoned; it exits once its agent returns
//! and finds nobody listening.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::agent::Agent;
use crate::error::{AgentError, MatchError};
use crate::game::{Action, AgentId, GameState, Observation};

const WORKER_GONE: &str = "agent worker stopped";

enum Request {
    Register(GameState),
    Choose(Observation),
}

type Reply = Result<Option<Action>, String>;

/// Result of one bounded agent call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Outcome<T> {
    /// The agent answered in time.
    Done(T),
    /// The agent returned an error or panicked, or its worker is gone.
    Failed(String),
    /// No answer before the deadline.
    Expired,
}

impl<T> Outcome<T> {
    fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Done(value) => Outcome::Done(f(value)),
            Self::Failed(message) => Outcome::Failed(message),
            Self::Expired => Outcome::Expired,
        }
    }
}

/// Handle to one agent's worker thread.
pub(super) struct Seat {
    name: String,
    requests: Sender<Request>,
    replies: Receiver<Reply>,
}

impl Seat {
    /// Move `agent` onto a new worker thread.
    pub(super) fn spawn(id: AgentId, mut agent: Box<dyn Agent>) -> Result<Self, MatchError> {
        let name = agent.name().to_string();
        let (requests, inbox) = mpsc::channel::<Request>();
        let (outbox, replies) = mpsc::channel::<Reply>();

        thread::Builder::new()
            .name(format!("agent-{id}"))
            .spawn(move || {
                for request in inbox {
                    let reply = match request {
                        Request::Register(state) => {
                            guarded(|| agent.register_initial_state(&state).map(|()| None))
                        }
                        Request::Choose(observation) => {
                            guarded(|| agent.choose_action(&observation).map(Some))
                        }
                    };
                    if outbox.send(reply).is_err() {
                        break;
                    }
                }
            })
            .map_err(MatchError::Spawn)?;

        Ok(Self {
            name,
            requests,
            replies,
        })
    }

    /// The agent's display name.
    pub(super) fn name(&self) -> &str {
        &self.name
    }

    /// Register the initial state, waiting at most `limit`.
    pub(super) fn register(&self, state: GameState, limit: Duration) -> (Outcome<()>, Duration) {
        let (outcome, elapsed) = self.call(Request::Register(state), limit);
        (outcome.map(|_| ()), elapsed)
    }

    /// Ask for a decision, waiting at most `limit`.
    pub(super) fn choose(
        &self,
        observation: Observation,
        limit: Duration,
    ) -> (Outcome<Action>, Duration) {
        let (outcome, elapsed) = self.call(Request::Choose(observation), limit);
        (outcome.map(|action| action.unwrap_or(Action::Stop)), elapsed)
    }

    fn call(&self, request: Request, limit: Duration) -> (Outcome<Option<Action>>, Duration) {
        let started = Instant::now();
        if self.requests.send(request).is_err() {
            return (Outcome::Failed(WORKER_GONE.to_string()), started.elapsed());
        }
        let outcome = match self.replies.recv_timeout(limit) {
            Ok(Ok(reply)) => Outcome::Done(reply),
            Ok(Err(message)) => Outcome::Failed(message),
            Err(RecvTimeoutError::Timeout) => Outcome::Expired,
            Err(RecvTimeoutError::Disconnected) => Outcome::Failed(WORKER_GONE.to_string()),
        };
        (outcome, started.elapsed())
    }
}

/// Run an agent call, turning errors and panics into messages.
fn guarded<T>(call: impl FnOnce() -> Result<T, AgentError>) -> Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ScriptedAgent;
    use crate::config::RulesConfig;
    use crate::game::{observe, Layout};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct Stuck;

    impl Agent for Stuck {
        fn name(&self) -> &str {
            "stuck"
        }

        fn choose_action(&mut self, _observation: &Observation) -> Result<Action, AgentError> {
            thread::sleep(Duration::from_secs(2));
            Ok(Action::Stop)
        }
    }

    fn state() -> GameState {
        let layout = Layout::from_rows(&["%%%%%%", "%1  2%", "%%%%%%"]).unwrap();
        GameState::new(&layout, RulesConfig::default(), 10, 2).unwrap()
    }

    #[test]
    fn test_seat_answers() {
        let state = state();
        let seat = Seat::spawn(0, Box::new(ScriptedAgent::new([Action::East]))).unwrap();
        assert_eq!(seat.name(), "scripted");

        let (outcome, _) = seat.register(state.clone(), Duration::from_secs(5));
        assert_eq!(outcome, Outcome::Done(()));

        let observation = observe(&state, 0, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();
        let (outcome, _) = seat.choose(observation, Duration::from_secs(5));
        assert_eq!(outcome, Outcome::Done(Action::East));
    }

    #[test]
    fn test_blocked_agent_expires_on_deadline() {
        let state = state();
        let seat = Seat::spawn(1, Box::new(Stuck)).unwrap();
        let observation = observe(&state, 1, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();

        let (outcome, elapsed) = seat.choose(observation, Duration::from_millis(20));
        assert_eq!(outcome, Outcome::Expired);
        assert!(elapsed < Duration::from_secs(1));
    }

    #[test]
    fn test_panic_becomes_failure() {
        let failed = guarded::<()>(|| panic!("bad move"));
        assert_eq!(failed, Err("panicked: bad move".to_string()));
        let failed = guarded::<()>(|| Err(AgentError::new("nope")));
        assert_eq!(failed, Err("nope".to_string()));
    }
}
