//! Amazon SQS broker.

use super::{Envelope, QueueAddress, QueueBroker, ReceiptHandle};
use crate::config::Config;
use crate::error::{BlobmutxError, Result};
use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::QueueAttributeName;
use aws_sdk_sqs::Client;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SqsBroker {
    client: Client,
}

impl SqsBroker {
    pub fn new(client: Client) -> Self {
        SqsBroker { client }
    }

    pub async fn connect(config: &Config) -> Self {
        let sdk_config = config.sdk_config().await;
        Self::new(Client::new(&sdk_config))
    }
}

#[async_trait]
impl QueueBroker for SqsBroker {
    async fn create_queue(&self, name: &str, fifo: bool) -> Result<QueueAddress> {
        let mut request = self.client.create_queue().queue_name(name);
        if fifo {
            request = request.attributes(QueueAttributeName::FifoQueue, "true");
        }
        let output = request
            .send()
            .await
            .map_err(|e| BlobmutxError::broker("create_queue", DisplayErrorContext(e)))?;

        let url = output.queue_url().ok_or_else(|| {
            BlobmutxError::broker("create_queue", "response carried no queue url")
        })?;
        debug!("Bound queue {} at {}", name, url);
        Ok(QueueAddress(url.to_string()))
    }

    async fn enqueue(
        &self,
        queue: &QueueAddress,
        body: &str,
        group_id: &str,
        dedup_token: &str,
    ) -> Result<()> {
        self.client
            .send_message()
            .queue_url(&queue.0)
            .message_body(body)
            .message_group_id(group_id)
            .message_deduplication_id(dedup_token)
            .send()
            .await
            .map_err(|e| BlobmutxError::broker("enqueue", DisplayErrorContext(e)))?;
        Ok(())
    }

    async fn receive(&self, queue: &QueueAddress) -> Result<Option<Envelope>> {
        let output = self
            .client
            .receive_message()
            .queue_url(&queue.0)
            .max_number_of_messages(1)
            .send()
            .await
            .map_err(|e| BlobmutxError::broker("receive", DisplayErrorContext(e)))?;

        let Some(message) = output.messages().first() else {
            return Ok(None);
        };
        let receipt = message.receipt_handle().ok_or_else(|| {
            BlobmutxError::broker("receive", "message carried no receipt handle")
        })?;

        Ok(Some(Envelope {
            body: message.body().unwrap_or_default().to_string(),
            receipt_handle: ReceiptHandle(receipt.to_string()),
        }))
    }

    async fn change_visibility(
        &self,
        queue: &QueueAddress,
        receipt: &ReceiptHandle,
        timeout_secs: i32,
    ) -> Result<()> {
        self.client
            .change_message_visibility()
            .queue_url(&queue.0)
            .receipt_handle(&receipt.0)
            .visibility_timeout(timeout_secs)
            .send()
            .await
            .map_err(|e| BlobmutxError::broker("change_visibility", DisplayErrorContext(e)))?;
        Ok(())
    }

    async fn delete(&self, queue: &QueueAddress, receipt: &ReceiptHandle) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&queue.0)
            .receipt_handle(&receipt.0)
            .send()
            .await
            .map_err(|e| BlobmutxError::broker("delete", DisplayErrorContext(e)))?;
        Ok(())
    }
}
