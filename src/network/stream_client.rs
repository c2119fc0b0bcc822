use crate::{
    error::StreamError,
    network::{
        connection::ConnectionMachine,
        message::StatePatch,
    },
};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::{net::TcpStream, sync::mpsc, time::Instant};
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum SessionEnd {
    Closed,
    Shutdown,
}

/// Keeps one logical session with the backend alive and forwards every
/// decoded message as a [`StatePatch`].
///
/// Reconnects after a fixed delay on any failure. Cancelling the token closes
/// the socket, drops the pending reconnect and ends [`StreamClient::run`].
pub struct StreamClient {
    endpoint: String,
    machine: ConnectionMachine,
    patch_tx: mpsc::Sender<StatePatch>,
    cancel_token: CancellationToken,
}

impl StreamClient {
    pub fn new(
        endpoint: impl Into<String>,
        reconnect_delay: Duration,
        patch_tx: mpsc::Sender<StatePatch>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            machine: ConnectionMachine::new(reconnect_delay),
            patch_tx,
            cancel_token,
        }
    }

    pub async fn run(mut self) -> Result<(), StreamError> {
        info!("Stream client starting for {}", self.endpoint);
        let mut outcome = Ok(());
        while self.machine.begin_connect() {
            debug!("Connecting to {}", self.endpoint);
            let connect = tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => break,
                result = connect_async(self.endpoint.as_str()) => result,
            };

            match connect {
                Ok((socket, _response)) => {
                    self.machine.on_open();
                    match self.pump(socket).await {
                        Ok(SessionEnd::Shutdown) => break,
                        Ok(SessionEnd::Closed) => {}
                        Err(StreamError::ConsumerGone) => {
                            warn!("No consumer for backend patches, stopping stream client");
                            outcome = Err(StreamError::ConsumerGone);
                            break;
                        }
                        Err(e) => warn!("{}", e),
                    }
                }
                Err(source) => {
                    let err = StreamError::Connect {
                        endpoint: self.endpoint.clone(),
                        source,
                    };
                    warn!("{}", err);
                }
            }

            let Some(deadline) = self.machine.on_close(Instant::now()) else {
                break;
            };
            tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => break,
                _ = tokio::time::sleep_until(deadline) => {}
            }
        }
        self.machine.shutdown();
        info!("Stream client for {} stopped", self.endpoint);
        outcome
    }

    async fn pump(&mut self, socket: Socket) -> Result<SessionEnd, StreamError> {
        let (mut write, mut read) = socket.split();
        loop {
            tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    debug!("Closing backend stream");
                    if let Err(e) = write.send(Message::Close(None)).await {
                        debug!("Close frame not delivered: {}", e);
                    }
                    return Ok(SessionEnd::Shutdown);
                }
                message = read.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        self.forward(StatePatch::try_from(text.as_str())).await?;
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        self.forward(StatePatch::try_from(&bytes[..])).await?;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!("Backend closed stream: {:?}", frame);
                        return Ok(SessionEnd::Closed);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(StreamError::Transport(e)),
                    None => return Ok(SessionEnd::Closed),
                }
            }
        }
    }

    async fn forward(
        &self,
        decoded: Result<StatePatch, serde_json::Error>,
    ) -> Result<(), StreamError> {
        match decoded {
            Ok(patch) => self
                .patch_tx
                .send(patch)
                .await
                .map_err(|_| StreamError::ConsumerGone),
            Err(e) => {
                debug!("Dropping malformed message: {}", e);
                Ok(())
            }
        }
    }
}
