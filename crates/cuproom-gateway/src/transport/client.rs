//! Connection actor: one upgraded socket, two pumps.
//!
//! - Read pump: read deadline refreshed by pongs, decode, dispatch. Decode and
//!   handler errors are logged and the loop keeps going.
//! - Write pump: drains the mailbox and pings at `ping_interval`. A closed
//!   mailbox (hub dropped its sender) sends a Close frame and stops.
//!
//! Both pumps share a cancellation token and each unregisters on exit, so
//! either one ending takes the other down. Unregister is idempotent.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::GatewaySection;
use crate::context::Identity;
use crate::dispatch::Dispatcher;
use crate::realtime::{ClientCtx, ConnId, Hub, PreparedMsg};
use crate::transport::codec::{decode, Inbound};

pub struct Client {
    conn: ConnId,
    identity: Arc<Identity>,
    hub: Hub,
    dispatcher: Arc<Dispatcher>,
    pong_wait: Duration,
    ping_interval: Duration,
    mailbox_capacity: usize,
}

impl Client {
    pub fn new(identity: Identity, hub: Hub, dispatcher: Arc<Dispatcher>, gw: &GatewaySection) -> Self {
        Self {
            conn: ConnId::new(),
            identity: Arc::new(identity),
            hub,
            dispatcher,
            pong_wait: gw.pong_wait(),
            ping_interval: gw.ping_interval(),
            mailbox_capacity: gw.mailbox_capacity,
        }
    }

    pub fn conn_id(&self) -> ConnId {
        self.conn
    }

    pub async fn serve(self, socket: WebSocket) {
        let (sink, stream) = socket.split();
        self.run(sink, stream).await
    }

    /// Register with the hub, run both pumps to completion, then make sure
    /// the hub has forgotten this connection.
    pub async fn run<K, S, E>(self, sink: K, stream: S)
    where
        K: Sink<Message> + Unpin + Send + 'static,
        K::Error: Display + Send,
        S: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
        E: Display + Send + 'static,
    {
        let span = tracing::info_span!(
            "ws_session",
            conn_id = %self.conn,
            user_id = %self.identity.user_id
        );

        let (mailbox_tx, mailbox_rx) = mpsc::channel(self.mailbox_capacity);
        if let Err(e) = self
            .hub
            .register(self.conn, Arc::clone(&self.identity), mailbox_tx)
            .await
        {
            tracing::warn!(parent: &span, error = %e, "register failed, dropping connection");
            return;
        }
        tracing::info!(parent: &span, "session opened");

        let cancel = CancellationToken::new();
        let ctx = ClientCtx::new(self.conn, Arc::clone(&self.identity), self.hub.clone());

        let read = tokio::spawn(
            read_pump(stream, ctx, self.dispatcher, self.pong_wait, cancel.clone())
                .instrument(span.clone()),
        );
        let write = tokio::spawn(
            write_pump(
                sink,
                mailbox_rx,
                self.ping_interval,
                self.hub.clone(),
                self.conn,
                cancel,
            )
            .instrument(span.clone()),
        );

        let (read, write) = tokio::join!(read, write);
        if read.is_err() || write.is_err() {
            tracing::error!(parent: &span, "pump task aborted");
            let _ = self.hub.unregister(self.conn).await;
        }
        tracing::info!(parent: &span, "session closed");
    }
}

async fn read_pump<S, E>(
    mut stream: S,
    ctx: ClientCtx,
    dispatcher: Arc<Dispatcher>,
    pong_wait: Duration,
    cancel: CancellationToken,
) where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let deadline = sleep(pong_wait);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = &mut deadline => {
                tracing::info!("read deadline expired");
                break;
            }
            incoming = stream.next() => {
                let msg = match incoming {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "read failed");
                        break;
                    }
                    None => break,
                };

                match decode(msg) {
                    Ok(Inbound::Event(env)) => {
                        let event_type = env.event_type.clone();
                        if let Err(e) = dispatcher.dispatch(ctx.clone(), env).await {
                            if e.is_fatal_to_connection() {
                                tracing::info!(error = %e, "dispatch aborted session");
                                break;
                            }
                            tracing::warn!(
                                %event_type,
                                code = e.client_code().as_str(),
                                error = %e,
                                "event not handled"
                            );
                        }
                    }
                    Ok(Inbound::Pong) => deadline.as_mut().reset(Instant::now() + pong_wait),
                    Ok(Inbound::Ping) => {}
                    Ok(Inbound::Binary(len)) => tracing::debug!(len, "binary frame ignored"),
                    Ok(Inbound::Close) => break,
                    Err(e) => tracing::warn!(code = e.client_code().as_str(), error = %e, "frame decode failed"),
                }
            }
        }
    }

    cancel.cancel();
    unregister(ctx.hub(), ctx.conn_id(), "read").await;
}

async fn write_pump<K>(
    mut sink: K,
    mut mailbox: mpsc::Receiver<PreparedMsg>,
    ping_interval: Duration,
    hub: Hub,
    conn: ConnId,
    cancel: CancellationToken,
) where
    K: Sink<Message> + Unpin,
    K::Error: Display,
{
    let mut ticker = interval_at(Instant::now() + ping_interval, ping_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
            maybe_out = mailbox.recv() => match maybe_out {
                Some(msg) => {
                    if let Err(e) = sink.send(msg.to_ws_message()).await {
                        tracing::debug!(error = %e, "write failed");
                        break;
                    }
                }
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            _ = ticker.tick() => {
                if let Err(e) = sink.send(Message::Ping(Vec::new())).await {
                    tracing::debug!(error = %e, "ping failed");
                    break;
                }
            }
        }
    }

    cancel.cancel();
    unregister(&hub, conn, "write").await;
}

async fn unregister(hub: &Hub, conn: ConnId, pump: &'static str) {
    match hub.unregister(conn).await {
        Ok(true) => tracing::debug!(pump, "unregistered"),
        Ok(false) => {}
        Err(e) => tracing::debug!(pump, error = %e, "unregister skipped"),
    }
}
