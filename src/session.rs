use crate::config::Config;
use crate::error::Result;
use crate::identity::InstanceId;
use crate::lock::{DistributedLock, LockSettings};
use crate::queue::{QueueBroker, SqsBroker};
use crate::store::{ObjectStore, S3Store};
use crate::vfs::VirtualFs;
use std::sync::Arc;
use tracing::info;

/// Filesystem and lock bound to one backend pair. Produced by `init`; all
/// state the lock needs (queue address, identity) lives here.
pub struct Session {
    pub fs: VirtualFs,
    pub lock: DistributedLock,
}

impl Session {
    /// Connect to S3 and SQS with the configured credentials and provision
    /// the arbitration queue.
    pub async fn init(config: &Config) -> Result<Self> {
        let store = S3Store::connect(config).await;
        let broker = SqsBroker::connect(config).await;
        info!(
            "Connecting to bucket {} and queue {} in {}",
            config.bucket, config.queue_name, config.region
        );

        Self::with_backends(
            Arc::new(store),
            Arc::new(broker),
            InstanceId::current()?,
            LockSettings::default().with_queue_name(config.queue_name.clone()),
        )
        .await
    }

    pub async fn with_backends(
        store: Arc<dyn ObjectStore>,
        broker: Arc<dyn QueueBroker>,
        instance_id: InstanceId,
        settings: LockSettings,
    ) -> Result<Self> {
        let lock = DistributedLock::init(broker, instance_id, settings).await?;
        Ok(Session {
            fs: VirtualFs::new(store),
            lock,
        })
    }
}
