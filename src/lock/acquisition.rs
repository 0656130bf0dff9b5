use super::options::AcquireOptions;
use super::request::LockRequest;
use crate::config::DEFAULT_QUEUE_NAME;
use crate::error::{BlobmutxError, Result};
use crate::identity::InstanceId;
use crate::queue::{QueueAddress, QueueBroker, ReceiptHandle};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFAULT_GROUP_ID: &str = "default";

#[derive(Debug, Clone)]
pub struct LockSettings {
    pub queue_name: String,
    pub group_id: String,
}

impl Default for LockSettings {
    fn default() -> Self {
        LockSettings {
            queue_name: DEFAULT_QUEUE_NAME.to_string(),
            group_id: DEFAULT_GROUP_ID.to_string(),
        }
    }
}

impl LockSettings {
    pub fn with_queue_name(mut self, queue_name: impl Into<String>) -> Self {
        self.queue_name = queue_name.into();
        self
    }
}

/// Proof of ownership of the global lock. Consumed by
/// [`DistributedLock::release`].
#[derive(Debug)]
#[must_use = "the lock stays held until the handle is released"]
pub struct LockHandle {
    receipt: ReceiptHandle,
    lock_id: String,
    released: bool,
}

impl LockHandle {
    pub fn lock_id(&self) -> &str {
        &self.lock_id
    }

    pub fn receipt_handle(&self) -> &ReceiptHandle {
        &self.receipt
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if !self.released {
            // The request stays at the head of the group until it becomes
            // visible again and this instance's next acquire removes it.
            warn!("Lock handle {} dropped without release", self.lock_id);
        }
    }
}

/// Global lock arbitrated through a FIFO message group.
///
/// Every acquire publishes a request to the group and polls the queue head.
/// The head is only ever visible to one receiver at a time, so whichever
/// instance finds its own current request there owns the lock until it
/// deletes that message.
pub struct DistributedLock {
    broker: Arc<dyn QueueBroker>,
    queue: QueueAddress,
    instance_id: InstanceId,
    group_id: String,
}

impl DistributedLock {
    /// Provision (or bind to) the arbitration queue.
    pub async fn init(
        broker: Arc<dyn QueueBroker>,
        instance_id: InstanceId,
        settings: LockSettings,
    ) -> Result<Self> {
        let queue = broker.create_queue(&settings.queue_name, true).await?;
        info!("Lock queue ready: {}", queue);

        Ok(DistributedLock {
            broker,
            queue,
            instance_id,
            group_id: settings.group_id,
        })
    }

    pub fn queue(&self) -> &QueueAddress {
        &self.queue
    }

    pub fn instance_id(&self) -> &InstanceId {
        &self.instance_id
    }

    /// Wait until this instance owns the lock. Never times out.
    pub async fn acquire(&self) -> Result<LockHandle> {
        self.acquire_with(AcquireOptions::default()).await
    }

    pub async fn acquire_with(&self, options: AcquireOptions) -> Result<LockHandle> {
        let lock_id = Uuid::new_v4().to_string();
        let body = LockRequest::new(self.instance_id.as_str(), lock_id.as_str()).to_body()?;
        let dedup_token = Uuid::new_v4().to_string();

        self.broker
            .enqueue(&self.queue, &body, &self.group_id, &dedup_token)
            .await?;
        debug!("Published lock request {} (options: {:?})", lock_id, options);

        let start = Instant::now();
        loop {
            if let Some(token) = &options.cancel {
                if token.is_cancelled() {
                    warn!("Abandoned lock request {}: cancelled", lock_id);
                    return Err(BlobmutxError::Cancelled);
                }
            }
            if let Some(duration) = options.max_wait {
                if start.elapsed() >= duration {
                    warn!("Abandoned lock request {}: timeout after {:?}", lock_id, duration);
                    return Err(BlobmutxError::LockTimeout { duration });
                }
            }

            if let Some(envelope) = self.broker.receive(&self.queue).await? {
                let head = LockRequest::from_body(&envelope.body)?;

                if head.instance_id != self.instance_id.as_str() {
                    // Not ours: hand the head straight back to the other receivers.
                    self.broker
                        .change_visibility(&self.queue, &envelope.receipt_handle, 0)
                        .await?;
                } else if head.lock_id != lock_id {
                    info!("Removing orphaned lock request {}", head.lock_id);
                    self.broker
                        .delete(&self.queue, &envelope.receipt_handle)
                        .await?;
                    continue;
                } else {
                    debug!("Lock acquired: {} after {:?}", lock_id, start.elapsed());
                    return Ok(LockHandle {
                        receipt: envelope.receipt_handle,
                        lock_id,
                        released: false,
                    });
                }
            }

            match options.poll.next_delay() {
                Some(delay) => pause(delay, options.cancel.as_ref()).await,
                None => tokio::task::yield_now().await,
            }
        }
    }

    /// Delete the owned request, letting the next request in the group
    /// reach the head.
    pub async fn release(&self, mut handle: LockHandle) -> Result<()> {
        self.broker.delete(&self.queue, &handle.receipt).await?;
        handle.released = true;
        debug!("Lock released: {}", handle.lock_id);
        Ok(())
    }

    /// Run `critical` while holding the lock.
    pub async fn with_lock<F, Fut, T>(&self, options: AcquireOptions, critical: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let handle = self.acquire_with(options).await?;
        let output = critical().await;
        self.release(handle).await?;
        Ok(output)
    }
}

async fn pause(delay: Duration, cancel: Option<&CancellationToken>) {
    match cancel {
        Some(token) => {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = token.cancelled() => {}
            }
        }
        None => tokio::time::sleep(delay).await,
    }
}
