use futures_util::StreamExt;
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::types::InvocationUpdate;
use crate::error::DashboardError;

pub const STREAM_PATH: &str = "/api/invocations/stream";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Live updates for one command. Yields updates until the connection ends;
/// once ended it stays ended.
pub struct InvocationSubscription {
    socket: Option<Socket>,
    lost: Option<DashboardError>,
}

impl InvocationSubscription {
    pub fn stream_url(endpoint: &str, command_id: &str) -> Result<Url, DashboardError> {
        let raw = format!("{}{}", endpoint.trim_end_matches('/'), STREAM_PATH);
        let mut url = Url::parse(&raw).map_err(|err| DashboardError::InvalidEndpoint(format!("{raw}: {err}")))?;
        url.query_pairs_mut().append_pair("commandId", command_id);
        Ok(url)
    }

    pub async fn connect(endpoint: &str, command_id: &str) -> Result<Self, DashboardError> {
        let url = Self::stream_url(endpoint, command_id)?;
        info!(url = %url, "connecting to live updates");
        let (socket, _) = connect_async(url.as_str()).await.map_err(DashboardError::stream)?;
        info!(command_id, "live updates connected");
        Ok(Self {
            socket: Some(socket),
            lost: None,
        })
    }

    /// Waits for the next update. Errors with `StreamLost` once the
    /// connection is gone, and on every call after that.
    pub async fn next_update(&mut self) -> Result<InvocationUpdate, DashboardError> {
        let socket = match self.socket.as_mut() {
            Some(socket) => socket,
            None => return Err(self.ended()),
        };

        loop {
            let message = match socket.next().await {
                Some(Ok(message)) => message,
                Some(Err(err)) => return Err(self.lose(err.to_string())),
                None => return Err(self.lose("connection closed".to_string())),
            };

            match message {
                WsMessage::Text(text) => {
                    return match serde_json::from_str::<InvocationUpdate>(&text) {
                        Ok(update) => {
                            debug!(instance_id = %update.instance_id, "live update received");
                            Ok(update)
                        }
                        Err(err) => Err(self.lose(format!("undecodable update: {err}"))),
                    };
                }
                WsMessage::Close(frame) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .filter(|reason| !reason.is_empty())
                        .unwrap_or_else(|| "closed by server".to_string());
                    return Err(self.lose(reason));
                }
                _ => continue,
            }
        }
    }

    pub fn is_lost(&self) -> bool {
        self.socket.is_none()
    }

    fn lose(&mut self, reason: String) -> DashboardError {
        warn!(%reason, "live updates lost");
        self.socket = None;
        let err = DashboardError::StreamLost(reason);
        self.lost = Some(err.clone());
        err
    }

    fn ended(&self) -> DashboardError {
        self.lost
            .clone()
            .unwrap_or_else(|| DashboardError::StreamLost("not connected".to_string()))
    }
}
