//! RabbitMQ Sink - Publishes packets to an AMQP broker
//!
//! Connections to every configured broker are opened at bind, so the
//! startup barrier only passes once at least one broker accepted a channel.
//! Brokers that fail to connect at bind are dialed again later.
//!
//! # Publishing
//!
//! Each message goes to the next live broker in round-robin order. A failed
//! publish drops that broker's connection and moves on, up to `retries`
//! extra attempts. A dropped broker is redialed on the write path once
//! `reconnect_delay` has passed. Messages that exhaust their attempts are
//! logged and dropped.
//!
//! ```text
//! [batch] --messages()--> publish ──→ broker[next] ──ok──→ done
//!                            │            └─err─→ drop connection, next broker
//!                            └── all attempts failed ──→ error log
//! ```

mod config;

use std::fmt;
use std::time::Instant;

use ferry_pipeline::{Output, Packet, PipelineContext, PluginError, PluginResult, async_trait};
use lapin::options::{
    BasicPublishOptions, ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tokio::sync::Mutex;

pub use config::{ExchangeType, PublishMode, RabbitmqConfig, redact};

#[cfg(test)]
#[path = "rabbitmq_test.rs"]
mod tests;

/// Registered name
pub const NAME: &str = "rabbitmq";

/// AMQP reply code for a normal close
const REPLY_SUCCESS: u16 = 200;

/// Message bodies for one batch
pub fn messages(config: &RabbitmqConfig, batch: &[Packet]) -> Vec<Vec<u8>> {
    match config.publish {
        PublishMode::Packet => batch.iter().map(|p| p.as_bytes().to_vec()).collect(),
        PublishMode::Batch => {
            if batch.is_empty() {
                return Vec::new();
            }
            match serde_json::to_vec(batch) {
                Ok(body) => vec![body],
                Err(e) => {
                    tracing::error!(error = %e, "rabbitmq batch encoding failed");
                    Vec::new()
                }
            }
        }
    }
}

/// An open connection and its publishing channel
struct Client {
    connection: Connection,
    channel: Channel,
}

impl Client {
    fn is_connected(&self) -> bool {
        self.connection.status().connected() && self.channel.status().connected()
    }
}

/// One configured broker
struct Broker {
    url: String,
    client: Option<Client>,
    retry_at: Instant,
}

/// Everything set up at bind
struct Session {
    config: RabbitmqConfig,
    brokers: Vec<Broker>,
    next: usize,
}

impl Session {
    /// Publish one message, rotating across brokers on failure
    async fn publish(&mut self, body: &[u8]) -> Result<(), String> {
        let mut last_error = String::from("no broker available");

        for _ in 0..=self.config.retries {
            let Some(index) = self.pick().await else {
                break;
            };
            let broker = &mut self.brokers[index];
            let Some(client) = broker.client.as_ref() else {
                continue;
            };

            match publish_on(&client.channel, &self.config, body).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(broker = %redact(&broker.url), error = %e, "rabbitmq publish failed");
                    last_error = e.to_string();
                    broker.client = None;
                    broker.retry_at = Instant::now() + self.config.reconnect_delay;
                }
            }
        }

        Err(last_error)
    }

    /// Next broker with a live client, redialing those whose delay passed
    async fn pick(&mut self) -> Option<usize> {
        let count = self.brokers.len();
        for _ in 0..count {
            let index = self.next % count;
            self.next = self.next.wrapping_add(1);

            let broker = &mut self.brokers[index];
            if broker.client.as_ref().is_some_and(Client::is_connected) {
                return Some(index);
            }
            broker.client = None;
            if Instant::now() < broker.retry_at {
                continue;
            }

            match connect(&broker.url, &self.config).await {
                Ok(client) => {
                    tracing::info!(broker = %redact(&broker.url), "rabbitmq broker reconnected");
                    broker.client = Some(client);
                    return Some(index);
                }
                Err(e) => {
                    tracing::info!(
                        broker = %redact(&broker.url),
                        error = %e,
                        retry_in = ?self.config.reconnect_delay,
                        "rabbitmq reconnect failed"
                    );
                    broker.retry_at = Instant::now() + self.config.reconnect_delay;
                }
            }
        }
        None
    }

    async fn close(&mut self) {
        for broker in &mut self.brokers {
            if let Some(client) = broker.client.take() {
                let _ = client.connection.close(REPLY_SUCCESS, "ferry shutdown").await;
            }
        }
    }
}

/// Open a connection and channel, then declare the topology
async fn connect(url: &str, config: &RabbitmqConfig) -> Result<Client, String> {
    let opened = tokio::time::timeout(config.connect_timeout, async {
        let connection = Connection::connect(url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;
        declare(&channel, config).await?;
        Ok::<_, lapin::Error>(Client {
            connection,
            channel,
        })
    })
    .await;

    match opened {
        Ok(Ok(client)) => Ok(client),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {:?}", config.connect_timeout)),
    }
}

async fn declare(channel: &Channel, config: &RabbitmqConfig) -> lapin::Result<()> {
    if !config.exchange.is_empty() {
        channel
            .exchange_declare(
                &config.exchange,
                config.exchange_type.into(),
                ExchangeDeclareOptions {
                    durable: config.exchange_durable,
                    auto_delete: config.exchange_auto_delete,
                    ..ExchangeDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;
    }

    if config.declare_queue {
        channel
            .queue_declare(
                &config.routing_key,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;
        if !config.exchange.is_empty() {
            channel
                .queue_bind(
                    &config.routing_key,
                    &config.exchange,
                    &config.routing_key,
                    QueueBindOptions::default(),
                    FieldTable::default(),
                )
                .await?;
        }
    }
    Ok(())
}

async fn publish_on(channel: &Channel, config: &RabbitmqConfig, body: &[u8]) -> lapin::Result<()> {
    channel
        .basic_publish(
            &config.exchange,
            &config.routing_key,
            BasicPublishOptions::default(),
            body,
            BasicProperties::default(),
        )
        .await?
        .await?;
    Ok(())
}

/// Publishes batches to RabbitMQ
#[derive(Default)]
pub struct RabbitmqOutput {
    session: Mutex<Option<Session>>,
}

impl fmt::Debug for RabbitmqOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RabbitmqOutput").finish_non_exhaustive()
    }
}

impl RabbitmqOutput {
    /// Create the output; brokers are dialed at bind
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Output for RabbitmqOutput {
    async fn bind(&self, ctx: &PipelineContext) -> PluginResult<()> {
        let config: RabbitmqConfig = ctx.decode_config()?;
        config.validate(ctx.name())?;

        let mut brokers = Vec::with_capacity(config.urls.len());
        let mut connected = 0;
        for url in &config.urls {
            let client = match connect(url, &config).await {
                Ok(client) => {
                    connected += 1;
                    Some(client)
                }
                Err(e) => {
                    tracing::warn!(parent: ctx.span(), broker = %redact(url), error = %e, "rabbitmq connect failed");
                    None
                }
            };
            brokers.push(Broker {
                url: url.clone(),
                client,
                retry_at: Instant::now() + config.reconnect_delay,
            });
        }

        if connected == 0 {
            return Err(PluginError::init(format!(
                "could not connect to any of {} rabbitmq broker(s)",
                config.urls.len()
            )));
        }

        tracing::info!(
            parent: ctx.span(),
            brokers = connected,
            configured = config.urls.len(),
            exchange = %config.exchange,
            routing_key = %config.routing_key,
            "rabbitmq output bound"
        );

        let previous = self.session.lock().await.replace(Session {
            config,
            brokers,
            next: 0,
        });
        if let Some(mut previous) = previous {
            previous.close().await;
        }
        Ok(())
    }

    async fn write(&self, batch: &[Packet]) {
        let mut guard = self.session.lock().await;
        let Some(session) = guard.as_mut() else {
            tracing::warn!("rabbitmq output written before bind, batch dropped");
            return;
        };

        let bodies = messages(&session.config, batch);
        let mut dropped = 0usize;
        let mut last_error = None;
        for body in &bodies {
            if let Err(e) = session.publish(body).await {
                dropped += 1;
                last_error = Some(e);
            }
        }

        if let Some(error) = last_error {
            tracing::error!(
                dropped,
                messages = bodies.len(),
                error = %error,
                "rabbitmq publish exhausted retries"
            );
        }
    }
}
