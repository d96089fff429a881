//! socket.io push channel over a websocket.
//!
//! Each subscription owns one background connection that reconnects with
//! jittered exponential backoff until the subscription is dropped.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;

use housekeeping_core::sync::{ChannelEvent, PushChannel, Subscription, SUBSCRIPTION_BUFFER};

use super::frame::{
    self, EnginePacket, SocketPacket, DEFAULT_PING_INTERVAL_MS, DEFAULT_PING_TIMEOUT_MS,
};
use super::routes::EventRoutes;

const SOCKET_IO_PATH: &str = "/socket.io/?EIO=4&transport=websocket";
const RECONNECT_BASE_BACKOFF_MS: u64 = 500;
const RECONNECT_MAX_BACKOFF_MS: u64 = 30_000;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Reconnect delays: `base * 2^(attempt-1)` capped at `max`, plus up to 20% jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(RECONNECT_BASE_BACKOFF_MS),
            max: Duration::from_millis(RECONNECT_MAX_BACKOFF_MS),
        }
    }
}

impl ReconnectPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        let exp = attempt.saturating_sub(1).min(16);
        let backoff = base_ms.saturating_mul(1_u64 << exp).min(max_ms);
        let jitter = rand::thread_rng().gen_range(0..=(backoff / 5).max(1));
        Duration::from_millis(backoff.saturating_add(jitter))
    }
}

/// Push channel backed by the backend's socket.io endpoint.
#[derive(Debug, Clone)]
pub struct SocketChannel {
    url: String,
    token: Option<String>,
    routes: Arc<EventRoutes>,
    reconnect: ReconnectPolicy,
}

impl SocketChannel {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            token: None,
            routes: Arc::new(EventRoutes::default()),
            reconnect: ReconnectPolicy::default(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.trim().is_empty()).then_some(token);
        self
    }

    pub fn with_routes(mut self, routes: EventRoutes) -> Self {
        self.routes = Arc::new(routes);
        self
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Websocket endpoint: `http(s)` becomes `ws(s)` and the socket.io path is appended.
    pub fn endpoint(&self) -> String {
        let url = if let Some(rest) = self.url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.url.clone()
        };
        if url.contains("/socket.io") {
            url
        } else {
            format!("{}{}", url, SOCKET_IO_PATH)
        }
    }
}

impl PushChannel for SocketChannel {
    fn subscribe(&self) -> housekeeping_core::Result<Subscription> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let worker = tokio::spawn(run_connection(self.clone(), tx));
        Ok(Subscription::with_worker(rx, worker))
    }
}

enum SessionEnd {
    SubscriberGone,
    Dropped { reason: String, connected: bool },
}

async fn run_connection(channel: SocketChannel, events: mpsc::Sender<ChannelEvent>) {
    let endpoint = channel.endpoint();
    let mut attempt: u32 = 0;
    let mut down_reported = false;

    loop {
        if events.is_closed() {
            break;
        }

        let reason = match tokio_tungstenite::connect_async(endpoint.as_str()).await {
            Ok((socket, _)) => {
                debug!("[Realtime] Websocket open: {}", endpoint);
                match drive_session(&channel, socket, &events).await {
                    SessionEnd::SubscriberGone => break,
                    SessionEnd::Dropped { reason, connected } => {
                        if connected {
                            attempt = 0;
                            down_reported = false;
                        }
                        reason
                    }
                }
            }
            Err(e) => e.to_string(),
        };

        if !down_reported {
            warn!("[Realtime] Disconnected: {}", reason);
            if events
                .send(ChannelEvent::Disconnected { reason })
                .await
                .is_err()
            {
                break;
            }
            down_reported = true;
        } else {
            debug!("[Realtime] Reconnect attempt failed: {}", reason);
        }

        attempt = attempt.saturating_add(1);
        let delay = channel.reconnect.delay(attempt);
        debug!("[Realtime] Reconnecting in {:?} (attempt {})", delay, attempt);
        tokio::select! {
            _ = events.closed() => break,
            _ = sleep(delay) => {}
        }
    }
    debug!("[Realtime] Subscription closed; connection worker exiting");
}

async fn drive_session(
    channel: &SocketChannel,
    socket: WsStream,
    events: &mpsc::Sender<ChannelEvent>,
) -> SessionEnd {
    let (mut sink, mut stream) = socket.split();
    let mut heartbeat = Duration::from_millis(DEFAULT_PING_INTERVAL_MS + DEFAULT_PING_TIMEOUT_MS);
    let mut connected = false;

    let dropped = |reason: String, connected: bool| SessionEnd::Dropped { reason, connected };

    loop {
        let next = tokio::select! {
            _ = events.closed() => {
                let _ = sink.send(Message::Text(frame::encode(&EnginePacket::Close).into())).await;
                return SessionEnd::SubscriberGone;
            }
            next = timeout(heartbeat, stream.next()) => next,
        };

        let text = match next {
            Err(_) => return dropped("ping timeout".to_string(), connected),
            Ok(None) => return dropped("connection closed".to_string(), connected),
            Ok(Some(Err(e))) => return dropped(e.to_string(), connected),
            Ok(Some(Ok(Message::Text(text)))) => text,
            Ok(Some(Ok(Message::Close(_)))) => {
                return dropped("server closed the websocket".to_string(), connected)
            }
            Ok(Some(Ok(_))) => continue,
        };

        let packet = match frame::decode(text.as_str()) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("[Realtime] Dropping undecodable frame: {}", e);
                continue;
            }
        };

        let reply = match packet {
            EnginePacket::Open(handshake) => {
                heartbeat = Duration::from_millis(handshake.heartbeat_window_ms());
                debug!("[Realtime] Engine.IO session {}", handshake.sid);
                Some(frame::connect_frame(channel.token.as_deref()))
            }
            EnginePacket::Ping => Some(frame::encode(&EnginePacket::Pong)),
            EnginePacket::Close => {
                return dropped("server closed the session".to_string(), connected)
            }
            EnginePacket::Message(SocketPacket::Connect(_)) => {
                connected = true;
                info!("[Realtime] Connected");
                if events.send(ChannelEvent::Connected).await.is_err() {
                    return SessionEnd::SubscriberGone;
                }
                None
            }
            EnginePacket::Message(SocketPacket::ConnectError(data)) => {
                let message = data
                    .get("message")
                    .and_then(|value| value.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| data.to_string());
                return dropped(format!("connection refused: {}", message), connected);
            }
            EnginePacket::Message(SocketPacket::Disconnect) => {
                return dropped("server disconnected the socket".to_string(), connected)
            }
            EnginePacket::Message(SocketPacket::Event { name, data }) => {
                match channel.routes.translate(&name, data) {
                    Ok(Some(message)) => {
                        if events.send(ChannelEvent::Message(message)).await.is_err() {
                            return SessionEnd::SubscriberGone;
                        }
                    }
                    Ok(None) => debug!("[Realtime] Ignoring unrouted event '{}'", name),
                    Err(e) => warn!("[Realtime] Dropping malformed '{}' event: {}", name, e),
                }
                None
            }
            EnginePacket::Pong | EnginePacket::Upgrade | EnginePacket::Noop => None,
        };

        if let Some(reply) = reply {
            if let Err(e) = sink.send(Message::Text(reply.into())).await {
                return dropped(e.to_string(), connected);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use housekeeping_core::rooms::RoomStatus;
    use housekeeping_core::sync::PushMessage;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    const OPEN: &str = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;

    fn quick_policy() -> ReconnectPolicy {
        ReconnectPolicy {
            base: Duration::from_millis(10),
            max: Duration::from_millis(20),
        }
    }

    async fn next_event(subscription: &mut Subscription) -> ChannelEvent {
        timeout(Duration::from_secs(5), subscription.next())
            .await
            .expect("event before timeout")
            .expect("subscription open")
    }

    async fn next_text(
        socket: &mut tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    ) -> String {
        loop {
            match socket.next().await {
                Some(Ok(Message::Text(text))) => return text.as_str().to_string(),
                Some(Ok(_)) => continue,
                other => panic!("expected text frame, got {:?}", other),
            }
        }
    }

    #[test]
    fn endpoint_switches_scheme_and_adds_path() {
        assert_eq!(
            SocketChannel::new("http://localhost:4000/").endpoint(),
            "ws://localhost:4000/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(
            SocketChannel::new("https://motel.example").endpoint(),
            "wss://motel.example/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(
            SocketChannel::new("ws://h/socket.io/?EIO=4&transport=websocket").endpoint(),
            "ws://h/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let policy = ReconnectPolicy::default();
        let first = policy.delay(1);
        assert!(first >= Duration::from_millis(500) && first <= Duration::from_millis(600));
        let fourth = policy.delay(4);
        assert!(fourth >= Duration::from_millis(4_000) && fourth <= Duration::from_millis(4_800));
        let late = policy.delay(30);
        assert!(late >= Duration::from_millis(30_000) && late <= Duration::from_millis(36_000));
    }

    #[tokio::test]
    async fn handshake_routes_events_and_answers_pings() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (pong_tx, pong_rx) = oneshot::channel::<(String, String)>();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
            socket.send(Message::Text(OPEN.into())).await.unwrap();
            let connect = next_text(&mut socket).await;
            socket
                .send(Message::Text(r#"40{"sid":"s1"}"#.into()))
                .await
                .unwrap();
            for frame in [
                r#"42["roomStatusChanged",{"_id":"A","status":"dirty"}]"#,
                r#"42["chatMessage",{"text":"hi"}]"#,
                r#"42["roomStatusChanged",{"status":"clean"}]"#,
                r#"42["roomsUpdated",{"data":[{"_id":"C","status":"clean"}]}]"#,
                "2",
            ] {
                socket.send(Message::Text(frame.into())).await.unwrap();
            }
            let pong = next_text(&mut socket).await;
            let _ = pong_tx.send((connect, pong));
            // Hold the socket open until the client goes away.
            while let Some(Ok(_)) = socket.next().await {}
        });

        let channel = SocketChannel::new(&format!("http://{}", addr)).with_token("jwt");
        let mut subscription = channel.subscribe().unwrap();

        assert_eq!(next_event(&mut subscription).await, ChannelEvent::Connected);
        match next_event(&mut subscription).await {
            ChannelEvent::Message(PushMessage::Delta { room }) => {
                assert_eq!(room.id.as_str(), "A");
                assert_eq!(room.status, Some(RoomStatus::Dirty));
            }
            other => panic!("expected delta, got {:?}", other),
        }
        match next_event(&mut subscription).await {
            ChannelEvent::Message(PushMessage::Snapshot { rooms }) => {
                assert_eq!(rooms.len(), 1);
                assert_eq!(rooms[0].id.as_str(), "C");
            }
            other => panic!("expected snapshot, got {:?}", other),
        }

        let (connect, pong) = timeout(Duration::from_secs(5), pong_rx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(connect, r#"40{"token":"jwt"}"#);
        assert_eq!(pong, "3");

        drop(subscription);
        timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn dropped_connection_reports_and_reconnects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            for session in 0..2 {
                let (stream, _) = listener.accept().await.unwrap();
                let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
                socket.send(Message::Text(OPEN.into())).await.unwrap();
                assert_eq!(next_text(&mut socket).await, "40");
                socket.send(Message::Text("40".into())).await.unwrap();
                if session == 0 {
                    socket.send(Message::Text("41".into())).await.unwrap();
                    let _ = socket.close(None).await;
                } else {
                    while let Some(Ok(_)) = socket.next().await {}
                }
            }
        });

        let channel =
            SocketChannel::new(&format!("http://{}", addr)).with_reconnect_policy(quick_policy());
        let mut subscription = channel.subscribe().unwrap();

        assert_eq!(next_event(&mut subscription).await, ChannelEvent::Connected);
        match next_event(&mut subscription).await {
            ChannelEvent::Disconnected { reason } => {
                assert_eq!(reason, "server disconnected the socket")
            }
            other => panic!("expected disconnect, got {:?}", other),
        }
        assert_eq!(next_event(&mut subscription).await, ChannelEvent::Connected);

        drop(subscription);
        timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn unreachable_server_reports_disconnect_once() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let channel =
            SocketChannel::new(&format!("http://{}", addr)).with_reconnect_policy(quick_policy());
        let mut subscription = channel.subscribe().unwrap();

        assert!(matches!(
            next_event(&mut subscription).await,
            ChannelEvent::Disconnected { .. }
        ));
        // Retries keep failing, but the subscriber is only told once.
        let quiet = timeout(Duration::from_millis(200), subscription.next()).await;
        assert!(quiet.is_err());
    }
}
