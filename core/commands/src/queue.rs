use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;

use gasoline_protocol::CommandResult;
use gasoline_protocol::CommandStatus;
use gasoline_protocol::CorrelationId;
use gasoline_protocol::DispatchedCommand;

/// Queue tuning.
#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    /// Hard cap on pending depth; enqueue fails beyond it.
    pub max_depth: usize,
    /// How long completed-but-unclaimed results are shelved for late polls.
    pub late_result_ttl: Duration,
    /// Default await deadline when the caller supplies none.
    pub default_timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_depth: 100,
            late_result_ttl: Duration::from_secs(30),
            default_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The queue is shutting down; fatal to the tool call.
    #[error("command queue is closed")]
    Closed,
    /// Backpressure: the queue refuses new commands instead of dropping.
    #[error("command queue is full (depth {depth})")]
    Full { depth: usize },
}

/// What the producer observes when awaiting a result.
#[derive(Debug, PartialEq)]
pub enum AwaitOutcome {
    Result(CommandResult),
    TimedOut,
    Cancelled,
}

/// Handed to the producer by [`CommandQueue::enqueue`]; redeemed via
/// [`CommandQueue::await_result`].
#[derive(Debug)]
pub struct PendingTicket {
    pub correlation_id: CorrelationId,
    receiver: oneshot::Receiver<CommandResult>,
    timeout: Duration,
}

struct PendingEntry {
    command: DispatchedCommand,
    target: Option<String>,
    selector: Option<String>,
    deadline: Instant,
    dispatched: bool,
}

struct Inner {
    pending: Vec<PendingEntry>,
    waiters: HashMap<CorrelationId, oneshot::Sender<CommandResult>>,
    late: HashMap<CorrelationId, (CommandResult, Instant)>,
    /// Last terminal status per selector; inputs to the fast-completion
    /// diagnostic.
    selector_failures: HashMap<String, CommandStatus>,
    last_poll_at: Option<Instant>,
    closed: bool,
}

/// The command queue. FIFO per client; broadcast commands queue globally.
pub struct CommandQueue {
    cfg: QueueConfig,
    inner: Mutex<Inner>,
}

impl CommandQueue {
    pub fn new(cfg: QueueConfig) -> Self {
        Self {
            cfg,
            inner: Mutex::new(Inner {
                pending: Vec::new(),
                waiters: HashMap::new(),
                late: HashMap::new(),
                selector_failures: HashMap::new(),
                last_poll_at: None,
                closed: false,
            }),
        }
    }

    /// Mint a correlation id, record the pending command, and hand back the
    /// completion ticket.
    pub fn enqueue(
        &self,
        tool: &str,
        args: Value,
        target: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<PendingTicket, QueueError> {
        let timeout = timeout.unwrap_or(self.cfg.default_timeout);
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.closed {
            return Err(QueueError::Closed);
        }
        if inner.pending.len() >= self.cfg.max_depth {
            return Err(QueueError::Full {
                depth: inner.pending.len(),
            });
        }

        let correlation_id = CorrelationId::mint(tool);
        let selector = args
            .get("selector")
            .and_then(Value::as_str)
            .map(str::to_string);
        let command = DispatchedCommand {
            correlation_id: correlation_id.clone(),
            tool: tool.to_string(),
            args,
            enqueued_at_ms: chrono::Utc::now().timestamp_millis(),
        };
        let (sender, receiver) = oneshot::channel();
        inner.pending.push(PendingEntry {
            command,
            target,
            selector,
            deadline: Instant::now() + timeout,
            dispatched: false,
        });
        inner.waiters.insert(correlation_id.clone(), sender);

        Ok(PendingTicket {
            correlation_id,
            receiver,
            timeout,
        })
    }

    /// Block until the result arrives, the deadline passes, or the queue is
    /// closed/cancelled underneath us.
    pub async fn await_result(&self, ticket: PendingTicket) -> AwaitOutcome {
        let PendingTicket {
            correlation_id,
            receiver,
            timeout,
        } = ticket;
        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(result)) => AwaitOutcome::Result(result),
            Ok(Err(_)) => AwaitOutcome::Cancelled,
            Err(_) => {
                self.abandon(&correlation_id);
                AwaitOutcome::TimedOut
            }
        }
    }

    /// Producer-side cancellation: the waiter (if any) observes `Cancelled`;
    /// a subsequent complete is shelved, then discarded.
    pub fn cancel(&self, correlation_id: &CorrelationId) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.waiters.remove(correlation_id);
        inner
            .pending
            .retain(|entry| entry.command.correlation_id != *correlation_id);
    }

    /// Timed-out producer: forget the waiter and record the selector
    /// failure so the diagnostics can see it.
    fn abandon(&self, correlation_id: &CorrelationId) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.waiters.remove(correlation_id);
        if let Some(pos) = inner
            .pending
            .iter()
            .position(|entry| entry.command.correlation_id == *correlation_id)
        {
            let entry = inner.pending.remove(pos);
            if let Some(selector) = entry.selector {
                inner
                    .selector_failures
                    .insert(selector, CommandStatus::Timeout);
            }
        }
    }

    /// Extension long-poll: hand out the oldest undispatched command
    /// targeted at `client_id` (or broadcast). Expired entries are pruned
    /// on the way.
    pub fn take_next(&self, client_id: &str) -> Option<DispatchedCommand> {
        let now = Instant::now();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.last_poll_at = Some(now);

        // Prune entries past their deadline; their waiters time out on
        // their own.
        let mut expired = Vec::new();
        inner.pending.retain(|entry| {
            if entry.deadline <= now {
                if let Some(selector) = &entry.selector {
                    expired.push(selector.clone());
                }
                false
            } else {
                true
            }
        });
        for selector in expired {
            inner
                .selector_failures
                .insert(selector, CommandStatus::Expired);
        }

        let entry = inner.pending.iter_mut().find(|entry| {
            !entry.dispatched
                && entry
                    .target
                    .as_deref()
                    .is_none_or(|target| target == client_id)
        })?;
        entry.dispatched = true;
        Some(entry.command.clone())
    }

    /// Complete a command. First completion wins; anything after the waiter
    /// is gone lands on the late shelf and ages out.
    pub fn complete(&self, result: CommandResult) {
        let now = Instant::now();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = result.correlation_id.clone();

        let pos = inner
            .pending
            .iter()
            .position(|entry| entry.command.correlation_id == id);
        let selector = pos
            .map(|pos| inner.pending.remove(pos))
            .and_then(|entry| entry.selector);
        if let Some(selector) = selector {
            if result.status.is_hard_failure() || result.status == CommandStatus::Error {
                inner.selector_failures.insert(selector, result.status);
            } else {
                inner.selector_failures.remove(&selector);
            }
        }

        match inner.waiters.remove(&id) {
            Some(sender) => {
                // The receiver may already be gone (awaiter raced past the
                // deadline); shelve the result so a late poll can still
                // claim it.
                if let Err(result) = sender.send(result) {
                    tracing::debug!(correlation_id = %id, "receiver gone; completion shelved");
                    inner.late.insert(id, (result, now));
                }
            }
            None => {
                tracing::debug!(correlation_id = %id, "late completion shelved");
                inner.late.insert(id, (result, now));
            }
        }
        let ttl = self.cfg.late_result_ttl;
        inner.late.retain(|_, (_, at)| now.duration_since(*at) < ttl);
    }

    /// Claim a shelved late result (consumed on read). Lets a producer
    /// that just timed out recover a completion that raced the deadline.
    pub fn late_result(&self, correlation_id: &CorrelationId) -> Option<CommandResult> {
        let now = Instant::now();
        let ttl = self.cfg.late_result_ttl;
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.late.retain(|_, (_, at)| now.duration_since(*at) < ttl);
        inner.late.remove(correlation_id).map(|(result, _)| result)
    }

    /// Pending depth (undispatched + dispatched-but-unfinished).
    pub fn depth(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.pending.len()
    }

    pub fn last_poll_age(&self) -> Option<Duration> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.last_poll_at.map(|at| at.elapsed())
    }

    pub fn selector_failure(&self, selector: &str) -> Option<CommandStatus> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.selector_failures.get(selector).copied()
    }

    /// Idempotent shutdown: pending waiters observe `Cancelled`, new
    /// enqueues fail with [`QueueError::Closed`].
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.closed = true;
        inner.pending.clear();
        inner.waiters.clear();
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}

#[cfg(test)]
#[path = "queue.test.rs"]
mod tests;
