//! Process-isolated coarse units
//!
//! Each unit is a `fork`ed child of the coordinator. The shared result store
//! is mapped before the first fork, so every child writes into the same pages
//! under the same process-shared mutex. A child runs its unit and leaves with
//! `_exit`:
//!
//! | exit code | meaning                                  |
//! |-----------|------------------------------------------|
//! | 0         | every worker finished                    |
//! | 1         | the unit failed (spawn, push, or panic)  |
//! | 101       | the unit itself panicked                 |
//!
//! The parent waits on every child pid, retrying when the wait is
//! interrupted. Forking requires the coordinator to be the only thread in
//! the process at that point.

use super::{Coordinator, CoordinatorState, SearchError};
use crate::partition::IntervalAssignment;
use crate::report::UnitOutcome;
use crate::store::shm::SharedMemoryStore;
use crate::worker::{self, UnitOptions};
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};

const EXIT_UNIT_FAILED: i32 = 1;
const EXIT_UNIT_PANICKED: i32 = 101;

impl Coordinator {
    /// Fork one child per unit and wait for all of them
    pub(super) fn run_process_units(
        &mut self,
        assignments: &[IntervalAssignment],
        store: &SharedMemoryStore,
    ) -> Result<Vec<UnitOutcome>, SearchError> {
        let threads = self.config.search.threads_per_unit;
        let options = self.unit_options();

        let mut children: Vec<(libc::pid_t, IntervalAssignment)> =
            Vec::with_capacity(assignments.len());
        let mut spawn_error = None;

        for &assignment in assignments {
            // Buffered output would otherwise be duplicated into the child
            let _ = io::stdout().flush();
            let _ = io::stderr().flush();

            let pid = unsafe { libc::fork() };
            match pid {
                -1 => {
                    spawn_error = Some(SearchError::SpawnUnit {
                        unit: assignment.index,
                        source: io::Error::last_os_error(),
                    });
                    break;
                }
                0 => run_child(assignment, threads, store, &options),
                pid => {
                    tracing::debug!(unit = assignment.index, pid, "unit forked");
                    children.push((pid, assignment));
                }
            }
        }
        self.transition(CoordinatorState::Spawned);

        let mut pending = children.len();
        self.transition(CoordinatorState::Waiting { pending });

        let mut outcomes = Vec::with_capacity(children.len());
        let mut wait_error = None;
        for (pid, assignment) in children {
            match wait_for_child(pid) {
                Ok(status) => {
                    let outcome = outcome_from_status(assignment, status);
                    super::log_outcome(&outcome);
                    outcomes.push(outcome);
                }
                Err(source) => {
                    tracing::error!(unit = assignment.index, pid, error = %source, "wait failed");
                    if wait_error.is_none() {
                        wait_error = Some(SearchError::Wait {
                            unit: assignment.index,
                            pid,
                            source,
                        });
                    }
                }
            }
            pending -= 1;
            self.transition(CoordinatorState::Waiting { pending });
        }

        if let Some(err) = wait_error.or(spawn_error) {
            return Err(err);
        }
        Ok(outcomes)
    }
}

/// Body of a forked unit; never returns
fn run_child(
    assignment: IntervalAssignment,
    threads: usize,
    store: &SharedMemoryStore,
    options: &UnitOptions,
) -> ! {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        worker::run_unit(assignment, threads, store, options)
    }));

    let code = match result {
        Ok(Ok(_)) => 0,
        Ok(Err(err)) => {
            eprintln!("Unit {}: {}", assignment.index, super::error_chain(&err));
            EXIT_UNIT_FAILED
        }
        Err(_) => EXIT_UNIT_PANICKED,
    };

    let _ = io::stdout().flush();
    let _ = io::stderr().flush();

    // Destructors of state inherited from the parent must not run here
    unsafe { libc::_exit(code) }
}

/// Block until `pid` terminates and return its raw wait status
///
/// Interrupted waits are retried; any other failure is returned.
fn wait_for_child(pid: libc::pid_t) -> io::Result<libc::c_int> {
    let mut status: libc::c_int = 0;
    loop {
        let rc = unsafe { libc::waitpid(pid, &mut status, 0) };
        if rc == pid {
            return Ok(status);
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        return Err(err);
    }
}

/// Translate a raw wait status into a unit outcome
fn outcome_from_status(assignment: IntervalAssignment, status: libc::c_int) -> UnitOutcome {
    if libc::WIFEXITED(status) {
        match libc::WEXITSTATUS(status) {
            0 => UnitOutcome::completed(assignment, None),
            EXIT_UNIT_PANICKED => UnitOutcome::failed(assignment, "unit panicked"),
            code => UnitOutcome::failed(assignment, format!("exited with status {}", code)),
        }
    } else if libc::WIFSIGNALED(status) {
        UnitOutcome::failed(
            assignment,
            format!("terminated by signal {}", libc::WTERMSIG(status)),
        )
    } else {
        UnitOutcome::failed(assignment, format!("unexpected wait status {:#x}", status))
    }
}
