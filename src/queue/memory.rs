//! In-process FIFO broker.
//!
//! Models the delivery rules the lock protocol relies on: strict order within
//! a message group, at most one in-flight message per group, visibility
//! timeouts, per-receive receipt handles and a deduplication window.

use super::{Envelope, QueueAddress, QueueBroker, ReceiptHandle};
use crate::error::{BlobmutxError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEDUP_WINDOW: Duration = Duration::from_secs(5 * 60);

const ADDRESS_SCHEME: &str = "memory://";

#[derive(Debug)]
struct StoredMessage {
    body: String,
    group_id: Option<String>,
    receipt: Option<String>,
    hidden_until: Option<Instant>,
}

impl StoredMessage {
    fn in_flight(&self, now: Instant) -> bool {
        self.hidden_until.is_some_and(|until| until > now)
    }
}

#[derive(Debug, Default)]
struct QueueState {
    fifo: bool,
    messages: VecDeque<StoredMessage>,
    dedup: HashMap<String, Instant>,
}

#[derive(Debug, Default)]
struct BrokerState {
    queues: HashMap<String, QueueState>,
    next_receipt: u64,
}

impl BrokerState {
    fn queue_mut(&mut self, queue: &QueueAddress) -> Result<&mut QueueState> {
        lookup(&mut self.queues, queue)
    }
}

fn lookup<'a>(
    queues: &'a mut HashMap<String, QueueState>,
    queue: &QueueAddress,
) -> Result<&'a mut QueueState> {
    let name = queue.0.strip_prefix(ADDRESS_SCHEME).unwrap_or(&queue.0);
    queues
        .get_mut(name)
        .ok_or_else(|| BlobmutxError::broker("lookup", format!("queue {} does not exist", queue)))
}

#[derive(Debug)]
pub struct MemoryBroker {
    state: Mutex<BrokerState>,
    visibility_timeout: Duration,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::with_visibility_timeout(DEFAULT_VISIBILITY_TIMEOUT)
    }

    pub fn with_visibility_timeout(visibility_timeout: Duration) -> Self {
        MemoryBroker {
            state: Mutex::new(BrokerState::default()),
            visibility_timeout,
        }
    }

    /// Number of undeleted messages in the queue, in flight or not.
    pub async fn len(&self, queue: &QueueAddress) -> Result<usize> {
        let mut state = self.state.lock().await;
        Ok(state.queue_mut(queue)?.messages.len())
    }

    pub async fn is_empty(&self, queue: &QueueAddress) -> Result<bool> {
        Ok(self.len(queue).await? == 0)
    }

    /// Bodies of all undeleted messages in delivery order.
    pub async fn bodies(&self, queue: &QueueAddress) -> Result<Vec<String>> {
        let mut state = self.state.lock().await;
        Ok(state
            .queue_mut(queue)?
            .messages
            .iter()
            .map(|m| m.body.clone())
            .collect())
    }
}

#[async_trait]
impl QueueBroker for MemoryBroker {
    async fn create_queue(&self, name: &str, fifo: bool) -> Result<QueueAddress> {
        if fifo && !name.ends_with(".fifo") {
            return Err(BlobmutxError::broker(
                "create_queue",
                format!("FIFO queue name '{}' must end with .fifo", name),
            ));
        }

        let mut state = self.state.lock().await;
        let queue = state.queues.entry(name.to_string()).or_insert_with(|| {
            debug!("Created in-memory queue {} (fifo: {})", name, fifo);
            QueueState {
                fifo,
                ..Default::default()
            }
        });
        if queue.fifo != fifo {
            return Err(BlobmutxError::broker(
                "create_queue",
                format!("queue '{}' already exists with different attributes", name),
            ));
        }

        Ok(QueueAddress(format!("{}{}", ADDRESS_SCHEME, name)))
    }

    async fn enqueue(
        &self,
        queue: &QueueAddress,
        body: &str,
        group_id: &str,
        dedup_token: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let queue = state.queue_mut(queue)?;
        let now = Instant::now();

        if queue.fifo {
            if group_id.is_empty() {
                return Err(BlobmutxError::broker(
                    "enqueue",
                    "FIFO queues require a message group id",
                ));
            }
            queue
                .dedup
                .retain(|_, seen| now.duration_since(*seen) < DEDUP_WINDOW);
            if queue.dedup.contains_key(dedup_token) {
                debug!("Dropping duplicate message (dedup token {})", dedup_token);
                return Ok(());
            }
            queue.dedup.insert(dedup_token.to_string(), now);
        }

        queue.messages.push_back(StoredMessage {
            body: body.to_string(),
            group_id: queue.fifo.then(|| group_id.to_string()),
            receipt: None,
            hidden_until: None,
        });
        Ok(())
    }

    async fn receive(&self, queue: &QueueAddress) -> Result<Option<Envelope>> {
        let mut guard = self.state.lock().await;
        let BrokerState {
            queues,
            next_receipt,
        } = &mut *guard;
        let queue = lookup(queues, queue)?;
        let now = Instant::now();

        let mut blocked_groups: HashSet<&str> = HashSet::new();
        let mut chosen = None;
        for (idx, message) in queue.messages.iter().enumerate() {
            let group = message.group_id.as_deref();
            if let Some(group) = group {
                if blocked_groups.contains(group) {
                    continue;
                }
            }
            if message.in_flight(now) {
                if let Some(group) = group {
                    blocked_groups.insert(group);
                }
                continue;
            }
            chosen = Some(idx);
            break;
        }

        let Some(idx) = chosen else {
            return Ok(None);
        };

        *next_receipt += 1;
        let receipt = format!("receipt-{}", next_receipt);
        let message = &mut queue.messages[idx];
        message.receipt = Some(receipt.clone());
        message.hidden_until = Some(now + self.visibility_timeout);

        Ok(Some(Envelope {
            body: message.body.clone(),
            receipt_handle: ReceiptHandle(receipt),
        }))
    }

    async fn change_visibility(
        &self,
        queue: &QueueAddress,
        receipt: &ReceiptHandle,
        timeout_secs: i32,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let queue = state.queue_mut(queue)?;
        let message = queue
            .messages
            .iter_mut()
            .find(|m| m.receipt.as_deref() == Some(receipt.0.as_str()))
            .ok_or_else(|| {
                BlobmutxError::broker("change_visibility", "receipt handle is invalid")
            })?;

        message.hidden_until = match u64::try_from(timeout_secs) {
            Ok(0) => None,
            Ok(secs) => Some(Instant::now() + Duration::from_secs(secs)),
            Err(_) => {
                return Err(BlobmutxError::broker(
                    "change_visibility",
                    format!("invalid visibility timeout {}", timeout_secs),
                ))
            }
        };
        Ok(())
    }

    async fn delete(&self, queue: &QueueAddress, receipt: &ReceiptHandle) -> Result<()> {
        let mut state = self.state.lock().await;
        let queue = state.queue_mut(queue)?;
        let idx = queue
            .messages
            .iter()
            .position(|m| m.receipt.as_deref() == Some(receipt.0.as_str()))
            .ok_or_else(|| BlobmutxError::broker("delete", "message not found"))?;
        queue.messages.remove(idx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fifo() -> (MemoryBroker, QueueAddress) {
        let broker = MemoryBroker::new();
        let queue = broker.create_queue("test.fifo", true).await.unwrap();
        (broker, queue)
    }

    #[tokio::test]
    async fn test_fifo_name_must_end_with_suffix() {
        let broker = MemoryBroker::new();
        assert!(broker.create_queue("plain", true).await.is_err());
        assert!(broker.create_queue("plain", false).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_queue_is_idempotent() {
        let (broker, queue) = fifo().await;
        assert_eq!(broker.create_queue("test.fifo", true).await.unwrap(), queue);
    }

    #[tokio::test]
    async fn test_group_head_blocks_while_in_flight() {
        let (broker, queue) = fifo().await;
        broker.enqueue(&queue, "first", "g", "1").await.unwrap();
        broker.enqueue(&queue, "second", "g", "2").await.unwrap();

        let head = broker.receive(&queue).await.unwrap().unwrap();
        assert_eq!(head.body, "first");
        assert!(broker.receive(&queue).await.unwrap().is_none());

        broker.delete(&queue, &head.receipt_handle).await.unwrap();
        let next = broker.receive(&queue).await.unwrap().unwrap();
        assert_eq!(next.body, "second");
    }

    #[tokio::test]
    async fn test_zero_visibility_makes_head_visible_again() {
        let (broker, queue) = fifo().await;
        broker.enqueue(&queue, "only", "g", "1").await.unwrap();

        let first = broker.receive(&queue).await.unwrap().unwrap();
        broker
            .change_visibility(&queue, &first.receipt_handle, 0)
            .await
            .unwrap();
        let again = broker.receive(&queue).await.unwrap().unwrap();
        assert_eq!(again.body, "only");
        assert_ne!(again.receipt_handle, first.receipt_handle);
    }

    #[tokio::test]
    async fn test_stale_receipt_rejected() {
        let (broker, queue) = fifo().await;
        broker.enqueue(&queue, "only", "g", "1").await.unwrap();

        let first = broker.receive(&queue).await.unwrap().unwrap();
        broker
            .change_visibility(&queue, &first.receipt_handle, 0)
            .await
            .unwrap();
        let _second = broker.receive(&queue).await.unwrap().unwrap();

        let err = broker.delete(&queue, &first.receipt_handle).await.unwrap_err();
        assert!(matches!(err, BlobmutxError::Broker { op: "delete", .. }));
        assert_eq!(broker.len(&queue).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_token_collapsed() {
        let (broker, queue) = fifo().await;
        broker.enqueue(&queue, "a", "g", "same").await.unwrap();
        broker.enqueue(&queue, "b", "g", "same").await.unwrap();
        assert_eq!(broker.bodies(&queue).await.unwrap(), vec!["a".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_visibility_timeout_expires() {
        let broker = MemoryBroker::with_visibility_timeout(Duration::from_secs(5));
        let queue = broker.create_queue("test.fifo", true).await.unwrap();
        broker.enqueue(&queue, "only", "g", "1").await.unwrap();

        broker.receive(&queue).await.unwrap().unwrap();
        assert!(broker.receive(&queue).await.unwrap().is_none());

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(broker.receive(&queue).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_queue_rejected() {
        let broker = MemoryBroker::new();
        let missing = QueueAddress("memory://missing.fifo".into());
        assert!(broker.receive(&missing).await.is_err());
    }
}
