//! `tokio-tungstenite` implementation of the room transport port.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::ports::{Frame, FrameChannel, RoomTransport, TransportError};

/// Connects room sockets with `tokio-tungstenite` (native TLS for `wss`).
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteTransport;

impl TungsteniteTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RoomTransport for TungsteniteTransport {
    async fn connect(&self, url: &str) -> Result<Box<dyn FrameChannel>, TransportError> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Box::new(TungsteniteChannel { stream }))
    }
}

struct TungsteniteChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FrameChannel for TungsteniteChannel {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::text(text))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(TransportError::Io(e.to_string()))),
            };

            match message {
                Message::Text(text) => return Some(Ok(Frame::Text(text.as_str().to_owned()))),
                Message::Binary(bytes) => {
                    if let Ok(text) = String::from_utf8(bytes.to_vec()) {
                        return Some(Ok(Frame::Text(text)));
                    }
                }
                Message::Close(frame) => {
                    return Some(Ok(Frame::Close {
                        code: frame.map(|f| u16::from(f.code)),
                    }));
                }
                // Pings are answered by tungstenite itself.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stream
            .close(None)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }
}
