// src/groups/resolver.rs

use tracing::{debug, info, warn};

use crate::contract::{SessionOutcome, SyncResult, TaskFlags};
use crate::errors::{Result, SyncError};
use crate::groups::graph::GroupGraph;
use crate::groups::state::{GroupRunState, ResolverStep, RunState};
use crate::groups::TaskFailure;

/// Per-session dependency resolver.
///
/// It is responsible for:
/// - deciding which groups the session needs (requested flags closed over
///   `depends`)
/// - handing out groups whose dependencies were provided by groups that
///   already succeeded in this session
/// - failing dependents when a group fails
/// - turning group states into one result per requested flag
///
/// The resolver never runs groups itself; see
/// [`PluginExecutor`](crate::plugin::PluginExecutor).
#[derive(Debug)]
pub struct Resolver<'a> {
    graph: &'a GroupGraph,
    requested: TaskFlags,
    needed: TaskFlags,
    states: Vec<Option<RunState>>,
    /// Flags provided by successful groups so far.
    satisfied: TaskFlags,
    first_error: Option<String>,
}

impl<'a> Resolver<'a> {
    /// Prepare a session for `requested`.
    ///
    /// Fails with [`SyncError::UnsatisfiableDependencies`] when some needed
    /// group could never run even if every group succeeded (a cycle, or a
    /// dependency nobody provides). Nothing has run at that point.
    pub fn start(graph: &'a GroupGraph, requested: TaskFlags) -> Result<Self> {
        let needed = graph.close_over_depends(requested);
        let states = (0..graph.len())
            .map(|idx| {
                if graph.provides(idx).intersects(needed) {
                    Some(RunState::Pending)
                } else {
                    None
                }
            })
            .collect();

        let resolver = Self {
            graph,
            requested,
            needed,
            states,
            satisfied: TaskFlags::empty(),
            first_error: None,
        };

        resolver.check_satisfiable()?;

        debug!(
            requested = %requested,
            needed = %needed,
            groups = resolver.groups_in_session().len(),
            "resolver: session prepared"
        );

        Ok(resolver)
    }

    pub fn requested(&self) -> TaskFlags {
        self.requested
    }

    /// Requested flags plus the prerequisites they pull in.
    pub fn needed(&self) -> TaskFlags {
        self.needed
    }

    pub fn satisfied(&self) -> TaskFlags {
        self.satisfied
    }

    pub fn run_state_of(&self, idx: usize) -> GroupRunState {
        self.states.get(idx).copied().flatten().into()
    }

    pub fn groups_in_session(&self) -> Vec<usize> {
        self.states
            .iter()
            .enumerate()
            .filter_map(|(idx, state)| state.map(|_| idx))
            .collect()
    }

    /// The part of a group's `provides` this session needs.
    pub fn tasks_for(&self, idx: usize) -> TaskFlags {
        self.graph.provides(idx) & self.needed
    }

    pub fn is_finished(&self) -> bool {
        self.states.iter().flatten().all(|state| state.is_terminal())
    }

    /// Collect pending groups whose dependencies are satisfied, mark them
    /// `Running` and return them.
    pub fn next_ready(&mut self) -> Vec<usize> {
        let candidates: Vec<usize> = self
            .states
            .iter()
            .enumerate()
            .filter_map(|(idx, state)| {
                if matches!(state, Some(RunState::Pending))
                    && self.satisfied.contains(self.graph.depends(idx))
                {
                    Some(idx)
                } else {
                    None
                }
            })
            .collect();

        for idx in &candidates {
            debug!(
                group = self.graph.name(*idx),
                tasks = %self.tasks_for(*idx),
                "dependencies satisfied; marking Running"
            );
            self.states[*idx] = Some(RunState::Running);
        }

        candidates
    }

    /// Report the outcome of a group handed out by [`Self::next_ready`].
    pub fn complete(
        &mut self,
        idx: usize,
        outcome: std::result::Result<(), TaskFailure>,
    ) -> ResolverStep {
        let mut newly_blocked = Vec::new();

        match self.states.get(idx).copied().flatten() {
            Some(RunState::Running) => match outcome {
                Ok(()) => {
                    self.states[idx] = Some(RunState::DoneSuccess);
                    self.satisfied |= self.graph.provides(idx);
                    debug!(
                        group = self.graph.name(idx),
                        satisfied = %self.satisfied,
                        "task group succeeded"
                    );
                }
                Err(failure) => {
                    let result = failure.sync_result();
                    warn!(
                        group = self.graph.name(idx),
                        result = %result,
                        error = %failure,
                        "task group failed; failing dependents in this session"
                    );
                    self.states[idx] = Some(RunState::DoneFailed(result));
                    if self.first_error.is_none() {
                        self.first_error = Some(failure.to_string());
                    }
                    newly_blocked = self.mark_dependents_failed(idx, result);
                }
            },
            other => {
                warn!(
                    group = self.graph.name(idx),
                    state = ?other,
                    "completion for a group that is not running; ignoring"
                );
            }
        }

        ResolverStep {
            newly_blocked,
            session_finished: self.is_finished(),
        }
    }

    /// Fail every needed group at once, without running anything else.
    ///
    /// Used when the session could not even be opened.
    pub fn fail_all(&mut self, failure: &TaskFailure) {
        let result = failure.sync_result();
        for state in self.states.iter_mut().flatten() {
            if !state.is_terminal() {
                *state = RunState::DoneFailed(result);
            }
        }
        if self.first_error.is_none() {
            self.first_error = Some(failure.to_string());
        }
    }

    /// Error for a session that stopped making progress.
    ///
    /// [`Self::start`] rules this out; callers still check for it instead
    /// of spinning.
    pub fn stalled_error(&self) -> SyncError {
        let waiting: Vec<usize> = self
            .states
            .iter()
            .enumerate()
            .filter_map(|(idx, state)| match state {
                Some(RunState::Pending) => Some(idx),
                _ => None,
            })
            .collect();
        self.unsatisfiable(&waiting, self.satisfied)
    }

    /// One result per requested flag, plus the first failure message.
    pub fn into_outcome(self) -> SessionOutcome {
        let mut outcome = SessionOutcome::new();

        for bit in self.requested.iter() {
            let result = (0..self.graph.len())
                .find(|idx| self.graph.provides(*idx).contains(bit))
                .and_then(|idx| self.states[idx])
                .map(|state| match state {
                    RunState::DoneSuccess => SyncResult::Ok,
                    RunState::DoneFailed(result) => result,
                    RunState::Pending | RunState::Running => SyncResult::NotSupported,
                })
                .unwrap_or(SyncResult::NotSupported);
            outcome.record(bit, result);
        }

        if let Some(message) = self.first_error {
            outcome.note_error(message);
        }

        outcome
    }

    /// Mark all pending dependents (transitively) of a failed group as
    /// failed with the same result.
    fn mark_dependents_failed(&mut self, failed: usize, result: SyncResult) -> Vec<usize> {
        let mut stack: Vec<usize> = self.graph.dependents_of(failed).to_vec();
        let mut newly_blocked = Vec::new();

        while let Some(idx) = stack.pop() {
            if let Some(Some(RunState::Pending)) = self.states.get(idx) {
                self.states[idx] = Some(RunState::DoneFailed(result));
                info!(
                    group = self.graph.name(idx),
                    upstream = self.graph.name(failed),
                    "task group blocked by upstream failure"
                );
                newly_blocked.push(idx);
                stack.extend(self.graph.dependents_of(idx).iter().copied());
            }
        }

        newly_blocked
    }

    /// Fixed-point pass assuming every group succeeds.
    fn check_satisfiable(&self) -> Result<()> {
        let mut provided = TaskFlags::empty();
        let mut waiting = self.groups_in_session();

        loop {
            let (runnable, rest): (Vec<usize>, Vec<usize>) = waiting
                .into_iter()
                .partition(|idx| provided.contains(self.graph.depends(*idx)));

            if runnable.is_empty() {
                waiting = rest;
                break;
            }
            for idx in runnable {
                provided |= self.graph.provides(idx);
            }
            waiting = rest;
        }

        if waiting.is_empty() {
            Ok(())
        } else {
            Err(self.unsatisfiable(&waiting, provided))
        }
    }

    fn unsatisfiable(&self, waiting: &[usize], provided: TaskFlags) -> SyncError {
        let missing: TaskFlags = waiting
            .iter()
            .map(|idx| self.graph.depends(*idx).difference(provided))
            .collect();
        SyncError::UnsatisfiableDependencies {
            groups: waiting
                .iter()
                .map(|idx| self.graph.name(*idx).to_string())
                .collect(),
            missing: missing.to_string(),
        }
    }
}
