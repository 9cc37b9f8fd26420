use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::format::render;
use crate::model::{Audience, DealNotification};

/// Delivery channel for rendered messages.
///
/// `send` never raises; `false` means the message was not delivered.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, endpoint: &str, message: &str, image_url: Option<&str>) -> bool;
}

/// Renders a [`DealNotification`] and hands it to the sink.
#[derive(Clone)]
pub struct DealNotifier {
    sink: Arc<dyn NotificationSink>,
}

impl DealNotifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    pub async fn notify(&self, endpoint: &str, deal: &DealNotification, audience: Audience) -> bool {
        let message = render(deal, audience);
        let delivered = self
            .sink
            .send(endpoint, &message, deal.image_url.as_deref())
            .await;

        if delivered {
            info!(endpoint, item = %deal.item_name, ?audience, "notification sent");
        } else {
            warn!(endpoint, item = %deal.item_name, ?audience, "notification failed");
        }
        delivered
    }

    /// Plain message without rendering, used for connectivity checks.
    pub async fn send_raw(&self, endpoint: &str, message: &str) -> bool {
        self.sink.send(endpoint, message, None).await
    }
}

/// Stand-in used when no delivery channel is configured.
pub struct DisabledSink;

#[async_trait]
impl NotificationSink for DisabledSink {
    async fn send(&self, endpoint: &str, _message: &str, _image_url: Option<&str>) -> bool {
        tracing::debug!(endpoint, "notifications disabled, message dropped");
        false
    }
}
