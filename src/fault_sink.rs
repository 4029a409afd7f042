//! Process-wide capture of unhandled faults
//!
//! Any failure nobody else handles ends up here, is recorded as a diagnostic
//! and clears the busy indicator.
//!
//! # Fault surfaces
//! - **Thread**: a panic on any thread, seen through the process panic hook.
//!   Recorded, then the previously installed hook runs and the thread unwinds
//!   as usual.
//! - **Interactive**: a panic inside [`FaultSink::run_interactive`]. Recorded
//!   and swallowed; the caller carries on.
//! - **Unobserved work**: an error returned by work started with
//!   [`FaultSink::spawn_detached`] whose [`WorkHandle`] was dropped without
//!   being joined. Recorded; nothing else happens to it.
//!
//! All three go through [`FaultSink::record`]. It can be called from several
//! threads at once and never retries anything. The [`Disposition`] it returns
//! decides whether the surface's default handling still runs.
//!
//! The hook fires before unwinding starts, so it cannot tell whether some
//! caller's own `catch_unwind` will stop the panic. Outside
//! [`FaultSink::run_interactive`] every panic is recorded on the thread
//! surface, including ones caught further up the stack.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::mem;
use std::panic::{self, AssertUnwindSafe, PanicHookInfo};
use std::sync::{Arc, Mutex, MutexGuard, Once, OnceLock, PoisonError};
use std::thread::{self, JoinHandle};

use strum::Display;

use crate::status::BusyIndicator;

/// Global sink, created on first use
static FAULT_SINK: OnceLock<Arc<FaultSink>> = OnceLock::new();

/// Guards panic hook registration
static HOOK_INSTALLED: Once = Once::new();

thread_local! {
    /// Nesting depth of `run_interactive` on this thread
    static INTERACTIVE_DEPTH: Cell<usize> = const { Cell::new(0) };
    /// Panic description handed from the hook to `run_interactive`
    static PENDING_INTERACTIVE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Where a fault came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FaultSurface {
    Thread,
    Interactive,
    UnobservedWork,
}

/// What happens to a fault after it is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Suppressed; execution continues
    Handled,
    /// Default behaviour for the surface still applies
    Propagate,
}

impl FaultSurface {
    pub fn disposition(self) -> Disposition {
        match self {
            Self::Interactive => Disposition::Handled,
            Self::Thread | Self::UnobservedWork => Disposition::Propagate,
        }
    }
}

/// One recorded fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub surface: FaultSurface,
    pub message: String,
    /// Name of the thread that reported it, if it had one
    pub thread: Option<String>,
}

/// Diagnostic store plus the busy indicator it resets
#[derive(Debug)]
pub struct FaultSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    busy: BusyIndicator,
}

impl FaultSink {
    /// Create a standalone sink. Only [`FaultSink::install`] hooks a sink
    /// into the panic machinery.
    pub fn new(busy: BusyIndicator) -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            busy,
        }
    }

    /// Get or create the global sink, tied to the global busy indicator
    pub fn global() -> Arc<FaultSink> {
        FAULT_SINK
            .get_or_init(|| Arc::new(FaultSink::new(BusyIndicator::global())))
            .clone()
    }

    /// Register the global sink with the panic hook.
    /// Call this once at program start; repeated calls are no-ops.
    pub fn install() -> Arc<FaultSink> {
        let sink = Self::global();

        HOOK_INSTALLED.call_once(|| {
            let previous = panic::take_hook();
            let hook_sink = Arc::clone(&sink);
            panic::set_hook(Box::new(move |info| {
                let message = describe_panic(info);
                if in_interactive_scope() {
                    // run_interactive records it once the unwind reaches it
                    let _ = PENDING_INTERACTIVE.try_with(|slot| slot.replace(Some(message)));
                    return;
                }
                if hook_sink.record(FaultSurface::Thread, message) == Disposition::Propagate {
                    previous(info);
                }
            }));
            tracing::debug!("Fault sink installed");
        });

        sink
    }

    /// Record a fault and clear the busy indicator.
    ///
    /// This is the single handler every surface funnels into. The diagnostics
    /// lock is never held across anything that can panic.
    pub fn record(&self, surface: FaultSurface, message: impl Into<String>) -> Disposition {
        let message = message.into();
        let thread = thread::current().name().map(str::to_owned);

        tracing::error!(
            surface = %surface,
            thread = thread.as_deref().unwrap_or("<unnamed>"),
            "Unhandled fault: {}",
            message
        );

        self.lock().push(Diagnostic {
            surface,
            message,
            thread,
        });
        self.busy.clear();

        surface.disposition()
    }

    /// Snapshot of everything recorded so far
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    /// Number of recorded faults
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Run interactive work; a panic inside it is recorded and swallowed.
    ///
    /// Returns `None` when `work` panicked.
    pub fn run_interactive<T>(&self, work: impl FnOnce() -> T) -> Option<T> {
        let _scope = InteractiveScope::enter();

        match panic::catch_unwind(AssertUnwindSafe(work)) {
            Ok(value) => Some(value),
            Err(payload) => {
                let message = take_pending_interactive()
                    .unwrap_or_else(|| payload_message(&*payload));
                match self.record(FaultSurface::Interactive, message) {
                    Disposition::Handled => None,
                    Disposition::Propagate => panic::resume_unwind(payload),
                }
            }
        }
    }

    /// Start fire-and-forget work on a named thread.
    ///
    /// If the returned handle is dropped without [`WorkHandle::join`] and the
    /// work fails, the error is recorded as [`FaultSurface::UnobservedWork`].
    pub fn spawn_detached<T, F>(
        self: &Arc<Self>,
        name: impl Into<String>,
        work: F,
    ) -> std::io::Result<WorkHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        let shared = Arc::new(WorkShared {
            name: name.into(),
            state: Mutex::new(WorkState::Running),
            sink: Arc::clone(self),
        });

        let worker = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name(shared.name.clone())
            .spawn(move || {
                let result = work();
                let mut state = worker.lock();
                if matches!(*state, WorkState::Abandoned) {
                    drop(state);
                    if let Err(err) = result {
                        worker.report(err);
                    }
                } else {
                    *state = WorkState::Finished(result);
                }
            })?;

        Ok(WorkHandle {
            shared,
            thread: Some(thread),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks the current thread as inside `run_interactive` until dropped
struct InteractiveScope;

impl InteractiveScope {
    fn enter() -> Self {
        INTERACTIVE_DEPTH.with(|depth| depth.set(depth.get() + 1));
        InteractiveScope
    }
}

impl Drop for InteractiveScope {
    fn drop(&mut self) {
        INTERACTIVE_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

fn in_interactive_scope() -> bool {
    INTERACTIVE_DEPTH
        .try_with(|depth| depth.get() > 0)
        .unwrap_or(false)
}

fn take_pending_interactive() -> Option<String> {
    PENDING_INTERACTIVE
        .try_with(|slot| slot.borrow_mut().take())
        .ok()
        .flatten()
}

fn describe_panic(info: &PanicHookInfo<'_>) -> String {
    let message = payload_message(info.payload());
    match info.location() {
        Some(location) => format!(
            "panicked at {}:{}: {}",
            location.file(),
            location.line(),
            message
        ),
        None => format!("panicked: {}", message),
    }
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

enum WorkState<T> {
    Running,
    Finished(anyhow::Result<T>),
    /// Handle dropped; the worker reports its own failure
    Abandoned,
    /// Result taken by `join`
    Collected,
}

struct WorkShared<T> {
    name: String,
    state: Mutex<WorkState<T>>,
    sink: Arc<FaultSink>,
}

impl<T> WorkShared<T> {
    fn lock(&self) -> MutexGuard<'_, WorkState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report(&self, err: anyhow::Error) {
        self.sink.record(
            FaultSurface::UnobservedWork,
            format!("background work '{}' failed: {:#}", self.name, err),
        );
    }
}

/// Handle to work started by [`FaultSink::spawn_detached`]
pub struct WorkHandle<T> {
    shared: Arc<WorkShared<T>>,
    thread: Option<JoinHandle<()>>,
}

impl<T> WorkHandle<T> {
    /// Whether the work has returned
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the work and take its result. A joined failure counts as
    /// observed and is not recorded.
    pub fn join(mut self) -> anyhow::Result<T> {
        if let Some(thread) = self.thread.take() {
            // A panic was already recorded by the hook; it surfaces below as
            // a missing result.
            let _ = thread.join();
        }

        let state = mem::replace(&mut *self.shared.lock(), WorkState::Collected);
        match state {
            WorkState::Finished(result) => result,
            _ => Err(anyhow::anyhow!(
                "background work '{}' panicked",
                self.shared.name
            )),
        }
    }
}

impl<T> Drop for WorkHandle<T> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        let previous = mem::replace(&mut *state, WorkState::Abandoned);
        match previous {
            WorkState::Finished(Err(err)) => {
                drop(state);
                self.shared.report(err);
            }
            WorkState::Collected => *state = WorkState::Collected,
            WorkState::Running | WorkState::Finished(Ok(_)) | WorkState::Abandoned => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    fn sink() -> Arc<FaultSink> {
        Arc::new(FaultSink::new(BusyIndicator::new()))
    }

    /// Poll until `sink` holds `count` diagnostics or the timeout passes
    fn wait_for_diagnostics(sink: &FaultSink, count: usize, timeout: Duration) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if sink.count() >= count {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_record_stores_diagnostic_and_clears_busy() {
        let busy = BusyIndicator::new();
        let sink = FaultSink::new(busy.clone());
        busy.set_busy();

        let disposition = sink.record(FaultSurface::Thread, "worker exploded");

        assert_eq!(disposition, Disposition::Propagate);
        assert!(!busy.is_busy());
        let diagnostics = sink.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].surface, FaultSurface::Thread);
        assert_eq!(diagnostics[0].message, "worker exploded");
    }

    #[test]
    fn test_dispositions_per_surface() {
        assert_eq!(FaultSurface::Interactive.disposition(), Disposition::Handled);
        assert_eq!(FaultSurface::Thread.disposition(), Disposition::Propagate);
        assert_eq!(
            FaultSurface::UnobservedWork.disposition(),
            Disposition::Propagate
        );
        assert_eq!(FaultSurface::UnobservedWork.to_string(), "unobserved_work");
    }

    #[test]
    fn test_run_interactive_passes_value_through() {
        let sink = sink();
        assert_eq!(sink.run_interactive(|| 42), Some(42));
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_run_interactive_swallows_panic() {
        let busy = BusyIndicator::new();
        let sink = FaultSink::new(busy.clone());
        busy.set_busy();

        let result: Option<()> = sink.run_interactive(|| panic!("button handler boom"));

        assert!(result.is_none());
        assert!(!busy.is_busy());
        let diagnostics = sink.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].surface, FaultSurface::Interactive);
        assert!(diagnostics[0].message.contains("button handler boom"));

        // Scope is unwound; the thread is no longer interactive
        assert!(!in_interactive_scope());
    }

    #[test]
    fn test_joined_work_is_not_recorded() {
        let sink = sink();

        let ok = sink.spawn_detached("ok-work", || Ok(7)).unwrap();
        assert_eq!(ok.join().unwrap(), 7);

        let failed = sink
            .spawn_detached("failing-work", || -> anyhow::Result<()> {
                anyhow::bail!("disk full")
            })
            .unwrap();
        let err = failed.join().unwrap_err();
        assert!(err.to_string().contains("disk full"));

        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_dropped_finished_failure_is_recorded() {
        let sink = sink();
        let handle = sink
            .spawn_detached("cleanup", || -> anyhow::Result<()> {
                anyhow::bail!("could not remove temp dir")
            })
            .unwrap();

        let start = Instant::now();
        while !handle.is_finished() && start.elapsed() < Duration::from_secs(5) {
            std::thread::sleep(Duration::from_millis(5));
        }
        drop(handle);

        let diagnostics = sink.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].surface, FaultSurface::UnobservedWork);
        assert!(diagnostics[0].message.contains("cleanup"));
        assert!(diagnostics[0].message.contains("could not remove temp dir"));
    }

    #[test]
    fn test_failure_after_handle_dropped_is_recorded() {
        let sink = sink();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let handle = sink
            .spawn_detached("late-failure", move || -> anyhow::Result<()> {
                let _ = release_rx.recv();
                anyhow::bail!("late failure")
            })
            .unwrap();

        drop(handle);
        assert_eq!(sink.count(), 0);
        release_tx.send(()).unwrap();

        assert!(wait_for_diagnostics(&sink, 1, Duration::from_secs(5)));
        let diagnostics = sink.diagnostics();
        assert_eq!(diagnostics[0].surface, FaultSurface::UnobservedWork);
        assert_eq!(diagnostics[0].thread.as_deref(), Some("late-failure"));
    }

    #[test]
    fn test_dropped_success_is_silent() {
        let sink = sink();
        let handle = sink.spawn_detached("quiet", || Ok(())).unwrap();
        let start = Instant::now();
        while !handle.is_finished() && start.elapsed() < Duration::from_secs(5) {
            std::thread::sleep(Duration::from_millis(5));
        }
        drop(handle);
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_concurrent_records_are_all_kept() {
        let sink = sink();
        let threads: Vec<_> = (0..8)
            .map(|i| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        let surface = if j % 2 == 0 {
                            FaultSurface::Thread
                        } else {
                            FaultSurface::UnobservedWork
                        };
                        sink.record(surface, format!("fault {}-{}", i, j));
                    }
                })
            })
            .collect();

        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(sink.count(), 400);
    }
}
