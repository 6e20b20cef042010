//! Scan orchestration: bounded worker pool, single-writer session
//! aggregation, progress and cancellation.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use tokio::sync::{Mutex, RwLock, broadcast, mpsc};
use tracing::{debug, info, warn};

use lanscope_common::ScanError;
use lanscope_common::config::ScanParameters;
use lanscope_common::network::host::HostInfo;
use lanscope_common::session::{ScanProgress, ScanSession, ScanStatus, SessionId};
use lanscope_topology::{TopologyAnalyzer, TopologyGraph};

use crate::events::ScanEvent;
use crate::probe::ProbeStrategy;
use crate::probe::capability::{ProbeCapability, SystemProbes};
use crate::task::{ScanTask, build_strategies};
use crate::vendors::{MacOuiRepo, VendorLookup};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Bookkeeping for one session owned by this scheduler.
struct SessionState {
    session: Arc<RwLock<ScanSession>>,
    cancel: Arc<AtomicBool>,
    total: usize,
    scanned: Arc<AtomicUsize>,
}

/// Owns the worker pool and the sessions it populates.
///
/// One instance per use; there is no global scanner state. Workers never
/// touch a session directly — results flow through a channel to a single
/// collector, which is the only writer.
pub struct ScanScheduler {
    capability: Arc<dyn ProbeCapability>,
    vendors: Arc<dyn VendorLookup>,
    analyzer: Arc<TopologyAnalyzer>,
    sessions: Mutex<HashMap<SessionId, SessionState>>,
    events: broadcast::Sender<ScanEvent>,
    next_id: AtomicU64,
}

impl ScanScheduler {
    pub fn new(capability: Arc<dyn ProbeCapability>, vendors: Arc<dyn VendorLookup>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            capability,
            vendors,
            analyzer: Arc::new(TopologyAnalyzer::default()),
            sessions: Mutex::new(HashMap::new()),
            events,
            next_id: AtomicU64::new(1),
        }
    }

    /// Scheduler wired to the real OS probes and the bundled OUI registry.
    pub fn with_system_probes() -> Self {
        Self::new(Arc::new(SystemProbes::new()), Arc::new(MacOuiRepo))
    }

    /// Subscribes to the scheduler's event stream. Events published before
    /// the call are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.events.subscribe()
    }

    /// Validates the parameters and starts a scan, returning its session
    /// handle immediately. Targets are enumerated lazily; a `/8` does not
    /// allocate 16M addresses up front.
    ///
    /// Fails with `InvalidParameters` before a session exists; an unusable
    /// probing primitive records a `Failed` session and surfaces
    /// `ProbeCapabilityUnavailable`.
    pub async fn start_scan(&self, params: ScanParameters) -> Result<SessionId, ScanError> {
        let resolved = params.validate()?;
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));

        if let Err(e) = self.capability.ensure_available(&params.probes) {
            warn!("scan {id} refused: {e}");
            let mut session = ScanSession::new(id, params);
            session.finish(ScanStatus::Failed);
            self.insert_state(id, session, 0).await;
            let _ = self.events.send(ScanEvent::SessionFailed {
                session: id,
                reason: e.to_string(),
            });
            return Err(e);
        }

        let total = resolved.len();
        let mut session = ScanSession::new(id, params.clone());
        session.status = ScanStatus::Running;
        let state = self.insert_state(id, session, total).await;

        info!("scan {id} started: {total} targets, {} workers", params.effective_concurrency());

        let strategies = Arc::new(build_strategies(
            &params,
            self.capability.clone(),
            self.vendors.clone(),
        ));

        tokio::spawn(run_scan(
            id,
            params,
            resolved.iter(),
            total,
            strategies,
            state.session.clone(),
            state.cancel.clone(),
            state.scanned.clone(),
            self.analyzer.clone(),
            self.events.clone(),
        ));

        Ok(id)
    }

    /// Requests cooperative cancellation. Workers stop before their next
    /// target; in-flight probes expire on their own timeouts. Results
    /// collected so far are retained.
    pub async fn cancel(&self, id: SessionId) -> Result<(), ScanError> {
        let sessions = self.sessions.lock().await;
        let state = sessions.get(&id).ok_or(ScanError::SessionNotFound(id))?;
        debug!("cancellation requested for scan {id}");
        state.cancel.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Current progress; safe to call while the scan is running.
    pub async fn progress(&self, id: SessionId) -> Result<ScanProgress, ScanError> {
        let (session, total, scanned) = {
            let sessions = self.sessions.lock().await;
            let state = sessions.get(&id).ok_or(ScanError::SessionNotFound(id))?;
            (
                state.session.clone(),
                state.total,
                state.scanned.load(Ordering::Relaxed),
            )
        };

        let session = session.read().await;
        Ok(ScanProgress {
            scanned,
            total,
            discovered: session.alive_count(),
            status: session.status,
        })
    }

    /// A point-in-time copy of the session record.
    pub async fn snapshot(&self, id: SessionId) -> Result<ScanSession, ScanError> {
        let session = {
            let sessions = self.sessions.lock().await;
            sessions
                .get(&id)
                .ok_or(ScanError::SessionNotFound(id))?
                .session
                .clone()
        };
        let session = session.read().await;
        Ok(session.clone())
    }

    /// Infers the topology of a finished session.
    pub async fn topology(&self, id: SessionId) -> Result<TopologyGraph, ScanError> {
        let session = self.snapshot(id).await?;
        if !session.status.is_terminal() {
            return Err(ScanError::SessionNotFinished(id));
        }
        Ok(self.analyzer.analyze(&session))
    }

    async fn insert_state(
        &self,
        id: SessionId,
        session: ScanSession,
        total: usize,
    ) -> SessionStateHandles {
        let session = Arc::new(RwLock::new(session));
        let cancel = Arc::new(AtomicBool::new(false));
        let scanned = Arc::new(AtomicUsize::new(0));

        self.sessions.lock().await.insert(
            id,
            SessionState {
                session: session.clone(),
                cancel: cancel.clone(),
                total,
                scanned: scanned.clone(),
            },
        );

        SessionStateHandles {
            session,
            cancel,
            scanned,
        }
    }
}

struct SessionStateHandles {
    session: Arc<RwLock<ScanSession>>,
    cancel: Arc<AtomicBool>,
    scanned: Arc<AtomicUsize>,
}

/// Supervises one scan: feeds targets, runs the pool, collects results,
/// finishes the session and publishes the terminal event.
#[allow(clippy::too_many_arguments)]
async fn run_scan(
    id: SessionId,
    params: ScanParameters,
    targets: Box<dyn Iterator<Item = IpAddr> + Send>,
    total: usize,
    strategies: Arc<Vec<Box<dyn ProbeStrategy>>>,
    session: Arc<RwLock<ScanSession>>,
    cancel: Arc<AtomicBool>,
    scanned: Arc<AtomicUsize>,
    analyzer: Arc<TopologyAnalyzer>,
    events: broadcast::Sender<ScanEvent>,
) {
    let workers = params.effective_concurrency();
    let channel_capacity = workers * 2;

    // Lazy enumeration: the bounded channel applies backpressure, so wide
    // ranges are produced only as fast as workers consume them.
    let (target_tx, target_rx) = mpsc::channel::<IpAddr>(channel_capacity);
    let enumerator_cancel = cancel.clone();
    tokio::spawn(async move {
        for addr in targets {
            if enumerator_cancel.load(Ordering::Relaxed) {
                break;
            }
            if target_tx.send(addr).await.is_err() {
                break;
            }
        }
    });

    let target_rx = Arc::new(Mutex::new(target_rx));
    let (result_tx, mut result_rx) = mpsc::channel::<HostInfo>(channel_capacity);

    for _ in 0..workers {
        let target_rx = target_rx.clone();
        let result_tx = result_tx.clone();
        let strategies = strategies.clone();
        let cancel = cancel.clone();
        let probe_timeout = params.probe_timeout;

        tokio::spawn(async move {
            loop {
                if cancel.load(Ordering::Relaxed) {
                    break;
                }
                // Hold the receiver lock only across the dequeue, never
                // across a running task.
                let target = { target_rx.lock().await.recv().await };
                let Some(target) = target else { break };
                if cancel.load(Ordering::Relaxed) {
                    break;
                }

                let task =
                    ScanTask::new(target, strategies.clone(), probe_timeout, cancel.clone());
                let host = task.run().await;

                if result_tx.send(host).await.is_err() {
                    break;
                }
            }
        });
    }
    drop(result_tx);

    if let Some(deadline) = params.scan_timeout {
        let watchdog_cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            if !watchdog_cancel.swap(true, Ordering::Relaxed) {
                debug!("scan {id} hit its deadline, cancelling");
            }
        });
    }

    // Single-writer discipline: this loop is the only place the session is
    // mutated while the scan runs.
    while let Some(host) = result_rx.recv().await {
        let done = scanned.fetch_add(1, Ordering::Relaxed) + 1;
        let visible = host.is_visible();

        {
            let mut session = session.write().await;
            session.record(host.clone());
        }

        if visible {
            let _ = events.send(ScanEvent::HostDiscovered { session: id, host });
        }
        let _ = events.send(ScanEvent::Progress {
            session: id,
            scanned: done,
            total,
        });
    }

    let status = if cancel.load(Ordering::Relaxed) {
        ScanStatus::Cancelled
    } else {
        ScanStatus::Completed
    };

    let final_session = {
        let mut session = session.write().await;
        session.finish(status);
        Arc::new(session.clone())
    };

    info!(
        "scan {id} {status}: {}/{} targets, {} alive",
        final_session.results.len(),
        total,
        final_session.alive_count()
    );

    let topology = Arc::new(analyzer.analyze(&final_session));
    let _ = events.send(ScanEvent::SessionFinished {
        session: final_session,
        topology,
    });
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
