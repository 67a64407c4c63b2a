use crate::domain_model::UserId;
use crate::domain_port::NoticePort;
use rdkafka::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub enum Notice {
    NewApply { target: UserId },
    FirstFriend { applicant: UserId, responder: UserId },
}

#[async_trait::async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &[u8], payload: &[u8]) -> anyhow::Result<()>;
}

pub struct KafkaPublisher {
    inner: FutureProducer,
}

impl KafkaPublisher {
    pub fn new(bootstrap_server: &str, client_id: &str) -> anyhow::Result<Self> {
        let inner = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_server)
            .set("client.id", client_id)
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .set("max.in.flight.requests.per.connection", "1")
            .set("compression.type", "lz4")
            .create()?;
        Ok(Self { inner })
    }
}

#[async_trait::async_trait]
impl EventPublisher for KafkaPublisher {
    async fn publish(&self, topic: &str, key: &[u8], payload: &[u8]) -> anyhow::Result<()> {
        let rec = FutureRecord::to(topic).key(key).payload(payload);
        self.inner
            .send(rec, Duration::from_secs(10))
            .await
            .map(|_delivery_report| ())
            .map_err(|(e, _msg)| anyhow::anyhow!(e))
    }
}

/// The `NoticePort` half: a bounded hand-off so service calls never wait on
/// the broker. A full queue drops the notice; delivery is best-effort.
pub struct NoticeRelay {
    tx: mpsc::Sender<Notice>,
}

impl NoticeRelay {
    fn enqueue(&self, notice: Notice) -> anyhow::Result<()> {
        self.tx
            .try_send(notice)
            .map_err(|e| anyhow::anyhow!("notice queue: {e}"))
    }
}

#[async_trait::async_trait]
impl NoticePort for NoticeRelay {
    async fn notify_new_apply(&self, target: &UserId) -> anyhow::Result<()> {
        self.enqueue(Notice::NewApply {
            target: target.clone(),
        })
    }

    async fn notify_first_friend(
        &self,
        applicant: &UserId,
        responder: &UserId,
    ) -> anyhow::Result<()> {
        self.enqueue(Notice::FirstFriend {
            applicant: applicant.clone(),
            responder: responder.clone(),
        })
    }
}

/// Drains the relay queue onto the event bus, keyed by receiver so one
/// user's notices stay ordered.
pub struct NoticeWorker {
    rx: mpsc::Receiver<Notice>,
    publisher: Arc<dyn EventPublisher>,
    topic: String,
    cancel: CancellationToken,
}

impl NoticeWorker {
    pub fn channel(
        publisher: Arc<dyn EventPublisher>,
        topic: &str,
        cancel: CancellationToken,
    ) -> (NoticeRelay, NoticeWorker) {
        let (tx, rx) = mpsc::channel(256);
        (
            NoticeRelay { tx },
            NoticeWorker {
                rx,
                publisher,
                topic: topic.to_owned(),
                cancel,
            },
        )
    }

    fn envelope(notice: &Notice) -> (UserId, Vec<u8>) {
        match notice {
            Notice::NewApply { target } => (
                target.clone(),
                serde_json::to_vec(&json!({
                    "kind": "friend.apply.new",
                    "to": target,
                }))
                .unwrap_or_default(),
            ),
            Notice::FirstFriend {
                applicant,
                responder,
            } => (
                applicant.clone(),
                serde_json::to_vec(&json!({
                    "kind": "friend.first",
                    "to": applicant,
                    "from": responder,
                }))
                .unwrap_or_default(),
            ),
        }
    }

    async fn deliver(&self, notice: &Notice) -> anyhow::Result<()> {
        let (receiver, payload) = Self::envelope(notice);
        self.publisher
            .publish(&self.topic, receiver.as_str().as_bytes(), &payload)
            .await
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::info!("notice worker shutting down...");
                    break;
                }
                maybe = self.rx.recv() => {
                    match maybe {
                        Some(notice) => {
                            if let Err(e) = self.deliver(&notice).await {
                                tracing::warn!("notice dropped: {e:#}");
                            }
                        }
                        None => break,
                    }
                }
            }
        }
        Ok(())
    }
}
