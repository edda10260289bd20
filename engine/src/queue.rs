use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::Duration;

use network::{Task, TaskResponse};
use parking_lot::Mutex;
use tokio::sync::{oneshot, Notify};
use tracing::{debug, warn};

use crate::engine::Engine;
use crate::errors::EngineError;

/// Priority a deferred task is re-queued at.
pub const DEFER_PRIORITY: u32 = 100;

/// Closed set of engine operations with fixed argument counts; parsed
/// from the wire method name before any engine code runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskMethod {
    Sync,
    ImportWalletAddresses,
    SaveTransaction,
    CreateWallet,
}

impl TaskMethod {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "sync" => Some(TaskMethod::Sync),
            "importWalletAddresses" => Some(TaskMethod::ImportWalletAddresses),
            "saveTransaction" => Some(TaskMethod::SaveTransaction),
            "createWallet" => Some(TaskMethod::CreateWallet),
            _ => None,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            TaskMethod::Sync => 1,
            TaskMethod::ImportWalletAddresses => 2,
            TaskMethod::SaveTransaction => 2,
            TaskMethod::CreateWallet => 1,
        }
    }
}

struct QueueEntry {
    priority: u32,
    seq: u64,
    task: Task,
    /// Set once the entry has used its single deferral.
    deferred: bool,
    respond: oneshot::Sender<TaskResponse>,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    // Max-heap: lower priority value first, ties by arrival order.
    fn cmp(&self, other: &Self) -> Ordering {
        other.priority.cmp(&self.priority).then(other.seq.cmp(&self.seq))
    }
}

struct Inner {
    heap: BinaryHeap<QueueEntry>,
    next_seq: u64,
}

/// Bounded, priority-ordered task queue with a single worker: this is
/// what serializes every write against the index.
pub struct TaskQueue {
    inner: Mutex<Inner>,
    notify: Notify,
    bound: usize,
}

impl TaskQueue {
    pub fn new(bound: usize) -> Self {
        Self {
            inner: Mutex::new(Inner { heap: BinaryHeap::new(), next_seq: 0 }),
            notify: Notify::new(),
            bound,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().heap.is_empty()
    }

    /// Submissions past the bound are rejected immediately rather than
    /// blocking the submitter.
    pub fn submit(&self, task: Task, priority: u32) -> Result<oneshot::Receiver<TaskResponse>, EngineError> {
        let (respond, receiver) = oneshot::channel();
        {
            let mut inner = self.inner.lock();
            if inner.heap.len() >= self.bound {
                return Err(EngineError::QueueFull);
            }
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.heap.push(QueueEntry { priority, seq, task, deferred: false, respond });
        }
        self.notify.notify_one();
        Ok(receiver)
    }

    /// A deferral keeps the caller's response channel and re-enters the
    /// queue at the deferred priority; the bound does not apply since no
    /// new submitter is involved.
    fn requeue_deferred(&self, mut entry: QueueEntry) {
        let mut inner = self.inner.lock();
        entry.priority = DEFER_PRIORITY;
        entry.deferred = true;
        entry.seq = inner.next_seq;
        inner.next_seq += 1;
        inner.heap.push(entry);
        drop(inner);
        self.notify.notify_one();
    }

    /// Runs tasks one at a time until the engine is stopped. At most one
    /// task is ever in flight.
    pub async fn run_worker(&self, engine: Arc<Engine>) {
        loop {
            if engine.is_stopping() {
                return;
            }
            let entry = self.inner.lock().heap.pop();
            let Some(entry) = entry else {
                // Re-check the stop flag periodically while idle.
                let _ = tokio::time::timeout(Duration::from_millis(250), self.notify.notified()).await;
                continue;
            };

            let id = entry.task.id.clone();
            let outcome = match TaskMethod::parse(&entry.task.method) {
                None => Err(EngineError::UnknownMethod(entry.task.method.clone())),
                Some(method) if entry.task.params.len() != method.arity() => Err(EngineError::InvalidParams(format!(
                    "{} expects {} argument(s), got {}",
                    entry.task.method,
                    method.arity(),
                    entry.task.params.len()
                ))),
                Some(method) => engine.execute(method, &entry.task.params).await,
            };

            match outcome {
                Ok(result) => {
                    let _ = entry.respond.send(TaskResponse::ok(id, result));
                }
                Err(EngineError::Deferred(reason)) if !entry.deferred => {
                    debug!(id = %id, %reason, "deferring task");
                    self.requeue_deferred(entry);
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "task failed");
                    let _ = entry.respond.send(TaskResponse::err(id, e.to_string()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(id: &str) -> Task {
        Task { id: id.to_string(), method: "createWallet".to_string(), params: vec![json!("00")] }
    }

    #[test]
    fn pops_by_priority_then_arrival() {
        let queue = TaskQueue::new(10);
        let _r1 = queue.submit(task("slow"), 5).unwrap();
        let _r2 = queue.submit(task("urgent"), 1).unwrap();
        let _r3 = queue.submit(task("slow-later"), 5).unwrap();

        let mut inner = queue.inner.lock();
        let order: Vec<String> = std::iter::from_fn(|| inner.heap.pop()).map(|e| e.task.id).collect();
        assert_eq!(order, vec!["urgent", "slow", "slow-later"]);
    }

    #[test]
    fn rejects_when_full() {
        let queue = TaskQueue::new(2);
        let _r1 = queue.submit(task("a"), 1).unwrap();
        let _r2 = queue.submit(task("b"), 1).unwrap();
        assert!(matches!(queue.submit(task("c"), 1), Err(EngineError::QueueFull)));
    }

    #[test]
    fn method_table_arities() {
        assert_eq!(TaskMethod::parse("sync"), Some(TaskMethod::Sync));
        assert_eq!(TaskMethod::parse("importWalletAddresses").map(|m| m.arity()), Some(2));
        assert_eq!(TaskMethod::parse("saveTransaction").map(|m| m.arity()), Some(2));
        assert_eq!(TaskMethod::parse("createWallet").map(|m| m.arity()), Some(1));
        assert_eq!(TaskMethod::parse("dropTables"), None);
    }
}
