/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Bounded polling until a recording reaches the state an action asked for.
//!
//! The broker applies recording actions asynchronously, so a successful
//! action call does not mean the recording has changed yet. After the call,
//! the recording's state is polled until the field named by the request's
//! `source` equals its goal, the field turns out to be missing, or the
//! attempt budget runs out.
//!
//! ```text
//! Issued ──(no source)──────────────────────────────▶ Done
//! Issued ──▶ Verifying ──(match)──────────────────────▶ Done
//!                 │ ──(field missing / exhausted)─────▶ Failed
//!                 └──(mismatch)──▶ Retrying ──(sleep)──▶ Verifying
//! Issued ──(transport error)──────────────────────────▶ Failed
//! ```
//!
//! Each check is a pure [`evaluate`] call returning a [`PollStep`]; the
//! loop in [`ConvergencePoller::converge`] only sleeps and re-probes.
//! Checks for one request are strictly sequential.

use std::time::Duration;

use async_trait::async_trait;
use bbb_broker_types::{ActionRequest, RecordingAction, StateSnapshot};
use log::{debug, warn};

use crate::config::DEFAULT_BACKOFF_UNIT;
use crate::error::{ApiError, ConvergenceError};

/// Source of a recording's current state.
#[async_trait]
pub trait StateProbe {
    /// Fetch the state of the recording `request` refers to.
    async fn probe(&self, request: &ActionRequest) -> Result<StateSnapshot, ApiError>;
}

/// Result of checking one snapshot against a request's goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    Done,
    Failed(ConvergenceError),
    /// Not there yet: check again as attempt `attempt` after `delay`.
    Retrying { attempt: u32, delay: Duration },
}

/// A confirmed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Converged {
    /// Number of state queries issued after the action itself.
    pub verifications: u32,
    /// The action the recording now offers (publish after unpublish, ...).
    pub next_action: RecordingAction,
}

/// Delay before attempt number `attempt`: `(attempt - 1) * unit`.
pub fn backoff_delay(attempt: u32, unit: Duration) -> Duration {
    unit.saturating_mul(attempt.saturating_sub(1))
}

/// Check `snapshot` against the goal of `request`.
///
/// On a mismatch with attempts left, `request.attempt` is advanced and the
/// delay before the next check is returned.
pub fn evaluate(request: &mut ActionRequest, snapshot: &StateSnapshot, unit: Duration) -> PollStep {
    let Some((source, goal)) = request
        .verification()
        .map(|(source, goal)| (source.to_string(), goal.clone()))
    else {
        return PollStep::Done;
    };

    match snapshot.field(&source) {
        None => PollStep::Failed(ConvergenceError::StateNotFound { field: source }),
        Some(value) if goal.matches(value) => PollStep::Done,
        Some(_) if request.has_attempts_left() => {
            request.attempt += 1;
            PollStep::Retrying {
                attempt: request.attempt,
                delay: backoff_delay(request.attempt, unit),
            }
        }
        Some(_) => PollStep::Failed(ConvergenceError::NotCompleted {
            attempts: request.attempts.max(1),
        }),
    }
}

/// Drives [`evaluate`] against a [`StateProbe`] until a terminal step.
pub struct ConvergencePoller<'a, P: ?Sized> {
    probe: &'a P,
    backoff_unit: Duration,
}

impl<'a, P> ConvergencePoller<'a, P>
where
    P: StateProbe + Sync + ?Sized,
{
    pub fn new(probe: &'a P) -> Self {
        Self {
            probe,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
        }
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Confirm that the action described by `request` took effect.
    ///
    /// `response` is the body the action call itself returned. It is the
    /// only thing checked when the request allows a single attempt, in
    /// which case no further call is made.
    pub async fn converge(
        &self,
        request: &mut ActionRequest,
        response: &StateSnapshot,
    ) -> Result<Converged, ConvergenceError> {
        request.attempt = 1;
        let done = Converged {
            verifications: 0,
            next_action: request.action.reversed(),
        };

        if request.verification().is_none() {
            debug!("{} {}: nothing to verify", request.action, request.recording_id);
            return Ok(done);
        }

        if request.attempts <= 1 {
            return match evaluate(request, response, self.backoff_unit) {
                PollStep::Done => Ok(done),
                PollStep::Failed(err) => Err(err),
                PollStep::Retrying { .. } => Err(ConvergenceError::NotCompleted { attempts: 1 }),
            };
        }

        let mut verifications = 0;
        loop {
            debug!(
                "{} {}: verifying, attempt {}/{}",
                request.action, request.recording_id, request.attempt, request.attempts
            );
            let snapshot = self.probe.probe(request).await.map_err(|err| {
                warn!(
                    "{} {}: state query failed: {err}",
                    request.action, request.recording_id
                );
                ConvergenceError::from(err)
            })?;
            verifications += 1;

            match evaluate(request, &snapshot, self.backoff_unit) {
                PollStep::Done => {
                    debug!("{} {}: done", request.action, request.recording_id);
                    return Ok(Converged {
                        verifications,
                        ..done
                    });
                }
                PollStep::Failed(err) => {
                    warn!("{} {}: {err}", request.action, request.recording_id);
                    return Err(err);
                }
                PollStep::Retrying { attempt, delay } => {
                    debug!(
                        "{} {}: not converged, retry {attempt} in {delay:?}",
                        request.action, request.recording_id
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned probe results and counts calls.
    struct ScriptedProbe {
        replies: Mutex<VecDeque<Result<Value, u16>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedProbe {
        fn new(replies: Vec<Result<Value, u16>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl StateProbe for ScriptedProbe {
        async fn probe(&self, _request: &ActionRequest) -> Result<StateSnapshot, ApiError> {
            *self.calls.lock().unwrap() += 1;
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(body)) => Ok(StateSnapshot::new(body)),
                Some(Err(status)) => Err(ApiError::ServerError {
                    status,
                    body: "boom".to_string(),
                }),
                None => panic!("probe called more often than scripted"),
            }
        }
    }

    fn poller(probe: &ScriptedProbe) -> ConvergencePoller<'_, ScriptedProbe> {
        ConvergencePoller::new(probe).with_backoff_unit(Duration::from_millis(1))
    }

    fn published(value: &str) -> Result<Value, u16> {
        Ok(json!({ "published": value }))
    }

    #[test]
    fn backoff_is_linear() {
        let unit = Duration::from_secs(1);
        assert_eq!(backoff_delay(1, unit), Duration::ZERO);
        assert_eq!(backoff_delay(2, unit), Duration::from_secs(1));
        assert_eq!(backoff_delay(3, unit), Duration::from_secs(2));
        assert_eq!(backoff_delay(4, unit), Duration::from_secs(3));
    }

    #[test]
    fn evaluate_walks_the_state_machine() {
        let unit = Duration::from_secs(1);
        let mut request = ActionRequest::publish("r", "m").with_attempts(3);
        let stale = StateSnapshot::new(json!({"published": "false"}));

        assert_eq!(
            evaluate(&mut request, &stale, unit),
            PollStep::Retrying {
                attempt: 2,
                delay: Duration::from_secs(1)
            }
        );
        assert_eq!(
            evaluate(&mut request, &stale, unit),
            PollStep::Retrying {
                attempt: 3,
                delay: Duration::from_secs(2)
            }
        );
        assert_eq!(
            evaluate(&mut request, &stale, unit),
            PollStep::Failed(ConvergenceError::NotCompleted { attempts: 3 })
        );

        let fresh = StateSnapshot::new(json!({"data": {"published": true}}));
        assert_eq!(evaluate(&mut request, &fresh, unit), PollStep::Done);

        let missing = StateSnapshot::new(json!({"data": {}}));
        assert_eq!(
            evaluate(&mut request, &missing, unit),
            PollStep::Failed(ConvergenceError::StateNotFound {
                field: "published".to_string()
            })
        );
    }

    #[test]
    fn unverified_requests_are_done() {
        let mut request = ActionRequest::import("r", "m");
        let empty = StateSnapshot::default();
        assert_eq!(evaluate(&mut request, &empty, DEFAULT_BACKOFF_UNIT), PollStep::Done);
    }

    #[tokio::test]
    async fn no_source_finishes_without_probing() {
        let probe = ScriptedProbe::new(vec![]);
        let mut request = ActionRequest::import("r", "m");
        let done = poller(&probe)
            .converge(&mut request, &StateSnapshot::default())
            .await
            .unwrap();
        assert_eq!(done.verifications, 0);
        assert_eq!(probe.calls(), 0);
    }

    #[tokio::test]
    async fn single_attempt_checks_the_action_response_only() {
        let probe = ScriptedProbe::new(vec![]);
        let mut request = ActionRequest::delete("r", "m", true);
        let response = StateSnapshot::new(json!({"status": true}));
        let done = poller(&probe).converge(&mut request, &response).await.unwrap();
        assert_eq!(done.verifications, 0);
        assert_eq!(probe.calls(), 0);

        let mut play = ActionRequest::play("r", "m");
        let unpublished = StateSnapshot::new(json!({"published": "false"}));
        let err = poller(&probe)
            .converge(&mut play, &unpublished)
            .await
            .unwrap_err();
        assert_eq!(err, ConvergenceError::NotCompleted { attempts: 1 });
        assert_eq!(probe.calls(), 0);
    }

    #[tokio::test]
    async fn converges_on_third_poll() {
        let probe = ScriptedProbe::new(vec![
            published("false"),
            published("false"),
            published("true"),
        ]);
        let mut request = ActionRequest::publish("r", "m").with_attempts(3);
        let done = poller(&probe)
            .converge(&mut request, &StateSnapshot::default())
            .await
            .unwrap();
        assert_eq!(done.verifications, 3);
        assert_eq!(done.next_action, RecordingAction::Unpublish);
        assert_eq!(probe.calls(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_the_budget() {
        let probe = ScriptedProbe::new(vec![published("false"), published("false")]);
        let mut request = ActionRequest::publish("r", "m").with_attempts(2);
        let err = poller(&probe)
            .converge(&mut request, &StateSnapshot::default())
            .await
            .unwrap_err();
        assert_eq!(err, ConvergenceError::NotCompleted { attempts: 2 });
        assert_eq!(probe.calls(), 2);
    }

    #[tokio::test]
    async fn missing_field_stops_immediately() {
        let probe = ScriptedProbe::new(vec![Ok(json!({"data": {"other": 1}}))]);
        let mut request = ActionRequest::protect("r", "m");
        let err = poller(&probe)
            .converge(&mut request, &StateSnapshot::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ConvergenceError::StateNotFound { .. }));
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test]
    async fn transport_error_short_circuits() {
        let probe = ScriptedProbe::new(vec![published("false"), Err(503)]);
        let mut request = ActionRequest::publish("r", "m");
        let err = poller(&probe)
            .converge(&mut request, &StateSnapshot::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ConvergenceError::Transport("Request failed: 503 responseText: boom".to_string())
        );
        assert_eq!(probe.calls(), 2);
    }

    #[tokio::test]
    async fn waits_between_polls() {
        let probe = ScriptedProbe::new(vec![
            published("false"),
            published("false"),
            published("true"),
        ]);
        let mut request = ActionRequest::publish("r", "m").with_attempts(3);
        let started = tokio::time::Instant::now();
        ConvergencePoller::new(&probe)
            .with_backoff_unit(Duration::from_millis(20))
            .converge(&mut request, &StateSnapshot::default())
            .await
            .unwrap();
        // 1 unit before attempt 2, 2 units before attempt 3.
        assert!(started.elapsed() >= Duration::from_millis(60));
    }
}
