use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use notifier::{Audience, DealNotification, DealNotifier, DisabledSink, NotificationSink};
use tracing_test::traced_test;

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<(String, String, Option<String>)>>,
    fail: bool,
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, endpoint: &str, message: &str, image_url: Option<&str>) -> bool {
        self.sent.lock().unwrap().push((
            endpoint.to_string(),
            message.to_string(),
            image_url.map(str::to_string),
        ));
        !self.fail
    }
}

fn deal() -> DealNotification {
    DealNotification {
        item_name: "Hades".into(),
        old_price: 20.0,
        new_price: 5.0,
        discount_rate: 75,
        rationale: "Lowest price on record".into(),
        image_url: Some("https://cdn.example/header.jpg".into()),
        link: None,
    }
}

#[tokio::test]
async fn notify_passes_rendered_message_and_image() {
    let sink = Arc::new(RecordingSink::default());
    let notifier = DealNotifier::new(sink.clone());

    assert!(notifier.notify("1001", &deal(), Audience::Subscriber).await);

    let sent = sink.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "1001");
    assert!(sent[0].1.contains("*Game:* Hades"));
    assert_eq!(sent[0].2.as_deref(), Some("https://cdn.example/header.jpg"));
}

#[tokio::test]
#[traced_test]
async fn failed_delivery_is_logged_not_raised() {
    let sink = Arc::new(RecordingSink {
        fail: true,
        ..Default::default()
    });
    let notifier = DealNotifier::new(sink);

    assert!(!notifier.notify("1001", &deal(), Audience::Broadcast).await);
    assert!(logs_contain("notification failed"));
}

#[tokio::test]
async fn disabled_sink_never_delivers() {
    let notifier = DealNotifier::new(Arc::new(DisabledSink));
    assert!(!notifier.send_raw("1001", "ping").await);
}
