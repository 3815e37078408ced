use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

use crate::metaheuristic::aco::pheromone::PheromoneTable;
use crate::metaheuristic::aco::strategy::{ScheduleError, Scheduler, StrategyError};
use crate::metaheuristic::aco::{Ant, Colony};
use crate::sync::{Mutex, MutexGuard, Rendezvous};

/// How the ants of a round are split among the workers of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    /// Every worker walks `batch_size` consecutive ants, the last one possibly fewer.
    Batched { batch_size: usize },
    /// At most `cores` workers share the ants as evenly as possible.
    Threaded { cores: usize },
}

impl Partition {
    /// Returns the range of ants every worker is responsible for, in ant order.
    pub fn slices(&self, ants: usize) -> Vec<Range<usize>> {
        match *self {
            Partition::Batched { batch_size } => {
                let batch_size = batch_size.max(1);
                (0..ants)
                    .step_by(batch_size)
                    .map(|start| start..usize::min(start + batch_size, ants))
                    .collect()
            }
            Partition::Threaded { cores } => {
                let workers = usize::min(ants, cores.max(1));
                if workers == 0 {
                    return Vec::new();
                }

                let (base, remainder) = (ants / workers, ants % workers);
                let mut start = 0;
                (0..workers)
                    .map(|worker| {
                        let len = if worker < remainder { base + 1 } else { base };
                        let slice = start..start + len;
                        start += len;
                        slice
                    })
                    .collect()
            }
        }
    }
}

/// Parses the core count of the threaded pool.
/// `auto`, `cores`, `native` and an empty string select the available parallelism.
pub(crate) fn parse_cores(args: &str) -> Option<usize> {
    match args.trim() {
        "" | "auto" | "cores" | "native" => Some(available_cores()),
        count => count.parse().ok(),
    }
}

fn available_cores() -> usize {
    thread::available_parallelism()
        .map(|cores| cores.get())
        .unwrap_or(1)
}

/// Ants and round snapshot handed to a single worker.
#[derive(Default)]
struct Batch {
    ants: Vec<Ant>,
    colony: Option<Arc<Colony>>,
    pheromones: Option<Arc<PheromoneTable>>,
}

struct Slot {
    cancelled: AtomicBool,
    panicked: AtomicBool,
    batch: Mutex<Batch>,
}

impl Slot {
    fn new() -> Self {
        Slot {
            cancelled: AtomicBool::new(false),
            panicked: AtomicBool::new(false),
            batch: Mutex::new(Batch::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Batch> {
        self.batch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Shared {
    start: Rendezvous,
    finish: Rendezvous,
    slots: Vec<Slot>,
}

/// The running threads of a pool, sized for a fixed ant count.
struct Workers {
    shared: Arc<Shared>,
    slices: Vec<Range<usize>>,
    handles: Vec<JoinHandle<()>>,
    ant_count: usize,
}

impl Workers {
    fn spawn(name: &str, partition: Partition, ant_count: usize) -> Result<Self, ScheduleError> {
        let slices = partition.slices(ant_count);
        let shared = Arc::new(Shared {
            start: Rendezvous::new(),
            finish: Rendezvous::new(),
            slots: slices.iter().map(|_| Slot::new()).collect(),
        });

        let mut workers = Workers {
            shared,
            slices,
            handles: Vec::new(),
            ant_count,
        };
        for id in 0..workers.slices.len() {
            let shared = Arc::clone(&workers.shared);
            let spawned = thread::Builder::new()
                .name(format!("{}-{}", name, id))
                .spawn(move || run_worker(shared, id));
            match spawned {
                Ok(handle) => workers.handles.push(handle),
                Err(err) => {
                    // the threads that did start are waiting on the start rendezvous
                    if let Err(stop_err) = workers.stop() {
                        warn!(error = %stop_err, "failed to stop a partially spawned pool");
                    }
                    return Err(ScheduleError::Spawn(err));
                }
            }
        }
        debug!(
            strategy = name,
            workers = workers.handles.len(),
            ants = ant_count,
            "started worker pool"
        );

        Ok(workers)
    }

    /// Hands one round to the workers and collects the walked ants in order.
    fn run_round(
        &self,
        colony: &Arc<Colony>,
        pheromones: &Arc<PheromoneTable>,
        ants: Vec<Ant>,
    ) -> Result<Vec<Ant>, ScheduleError> {
        let mut ants = ants.into_iter();
        for (slot, slice) in self.shared.slots.iter().zip(self.slices.iter()) {
            let mut batch = slot.lock();
            batch.ants.clear();
            batch.ants.extend(ants.by_ref().take(slice.len()));
            batch.colony = Some(Arc::clone(colony));
            batch.pheromones = Some(Arc::clone(pheromones));
        }

        let count = self.handles.len();
        self.shared.start.await_count_then_reset(count);
        self.shared.finish.await_count_then_reset(count);

        let mut walked = Vec::with_capacity(self.ant_count);
        let mut panicked = false;
        for slot in self.shared.slots.iter() {
            panicked |= slot.panicked.swap(false, Ordering::AcqRel);
            walked.append(&mut slot.lock().ants);
        }

        if panicked {
            Err(ScheduleError::WorkerPanicked)
        } else {
            Ok(walked)
        }
    }

    /// Cancels every worker while they wait for the next round and joins them.
    fn stop(&mut self) -> Result<(), ScheduleError> {
        {
            let mut start = self.shared.start.await_count_locked(self.handles.len());
            for slot in self.shared.slots.iter() {
                slot.cancelled.store(true, Ordering::Release);
            }
            start.set(0);
        }

        let mut result = Ok(());
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                result = Err(ScheduleError::WorkerPanicked);
            }
        }

        result
    }
}

fn run_worker(shared: Arc<Shared>, id: usize) {
    let slot = &shared.slots[id];
    loop {
        shared.start.arrive_and_wait_for_release(0);
        if slot.cancelled.load(Ordering::Acquire) {
            break;
        }

        {
            let mut batch = slot.lock();
            let Batch {
                ants,
                colony,
                pheromones,
            } = &mut *batch;
            if let (Some(colony), Some(pheromones)) = (colony.take(), pheromones.take()) {
                let walked =
                    panic::catch_unwind(AssertUnwindSafe(|| colony.walk_all(&pheromones, ants)));
                if walked.is_err() {
                    slot.panicked.store(true, Ordering::Release);
                }
            }
        }

        shared.finish.arrive_and_wait_for_release(0);
    }
}

/// A persistent pool of worker threads reused across rounds.
///
/// The workers are started on the first round and whenever the ant count changes, and
/// stopped by [`Scheduler::shutdown`] or when the pool is dropped.
pub struct Pool {
    partition: Partition,
    workers: Option<Workers>,
}

impl Pool {
    pub fn batched(batch_size: usize) -> Result<Self, StrategyError> {
        if batch_size == 0 {
            return Err(StrategyError::ZeroBatchSize);
        }

        Ok(Pool::new(Partition::Batched { batch_size }))
    }

    /// Uses the available parallelism if `cores` is `None`.
    pub fn threaded(cores: Option<usize>) -> Result<Self, StrategyError> {
        let cores = cores.unwrap_or_else(available_cores);
        if cores == 0 {
            return Err(StrategyError::ZeroCores);
        }

        Ok(Pool::new(Partition::Threaded { cores }))
    }

    fn new(partition: Partition) -> Self {
        Pool {
            partition,
            workers: None,
        }
    }

    /// Returns true while worker threads are alive.
    pub fn is_running(&self) -> bool {
        self.workers.is_some()
    }

    /// Returns the number of live worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers
            .as_ref()
            .map(|workers| workers.handles.len())
            .unwrap_or(0)
    }
}

impl Scheduler for Pool {
    fn name(&self) -> String {
        match self.partition {
            Partition::Batched { batch_size } => format!("batched_{}", batch_size),
            Partition::Threaded { .. } => "threaded".to_string(),
        }
    }

    fn args(&self) -> String {
        match self.partition {
            Partition::Batched { batch_size } => batch_size.to_string(),
            Partition::Threaded { cores } => cores.to_string(),
        }
    }

    fn walk(
        &mut self,
        colony: &Arc<Colony>,
        pheromones: &Arc<PheromoneTable>,
        ants: Vec<Ant>,
    ) -> Result<Vec<Ant>, ScheduleError> {
        if ants.is_empty() {
            return Ok(ants);
        }

        let ant_count = ants.len();
        if self.workers.as_ref().map(|workers| workers.ant_count) != Some(ant_count) {
            self.shutdown()?;
            self.workers = Some(Workers::spawn(&self.name(), self.partition, ant_count)?);
        }

        match &self.workers {
            Some(workers) => workers.run_round(colony, pheromones, ants),
            None => Ok(ants),
        }
    }

    fn shutdown(&mut self) -> Result<(), ScheduleError> {
        match self.workers.take() {
            Some(mut workers) => {
                let result = workers.stop();
                debug!(strategy = %self.name(), "stopped worker pool");
                result
            }
            None => Ok(()),
        }
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!(error = %err, "failed to stop worker pool");
        }
    }
}
