//! FIFO message broker abstraction used for lock arbitration.
//!
//! - `sqs`: Amazon SQS FIFO queues
//! - `memory`: in-process simulation with the same group/visibility rules

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

pub mod memory;
pub mod sqs;

pub use memory::MemoryBroker;
pub use sqs::SqsBroker;

/// Broker-assigned address of a provisioned queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueAddress(pub String);

impl fmt::Display for QueueAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability to delete or re-hide one specific received message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptHandle(pub String);

/// A received message.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub body: String,
    pub receipt_handle: ReceiptHandle,
}

#[async_trait]
pub trait QueueBroker: Send + Sync {
    /// Create (or bind to an existing) queue and return its address.
    async fn create_queue(&self, name: &str, fifo: bool) -> Result<QueueAddress>;

    async fn enqueue(
        &self,
        queue: &QueueAddress,
        body: &str,
        group_id: &str,
        dedup_token: &str,
    ) -> Result<()>;

    /// Receive at most one visible message. In a FIFO group only the head
    /// message can be visible, and only while no other message of the group
    /// is in flight.
    async fn receive(&self, queue: &QueueAddress) -> Result<Option<Envelope>>;

    async fn change_visibility(
        &self,
        queue: &QueueAddress,
        receipt: &ReceiptHandle,
        timeout_secs: i32,
    ) -> Result<()>;

    async fn delete(&self, queue: &QueueAddress, receipt: &ReceiptHandle) -> Result<()>;
}
