use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use invocation_dashboard::api::{FeedServer, FeedState};
use invocation_dashboard::feed::{FeedClient, InvocationSubscription, InvocationUpdate};
use invocation_dashboard::invocation::{InvocationMap, InvocationRecord, Status};
use invocation_dashboard::{Dashboard, DashboardConfig, DashboardError, DashboardEvent};
use tokio::time::{sleep, timeout};

fn record(id: &str, status: &str, stdout: &str) -> InvocationRecord {
    InvocationRecord {
        instance_id: id.to_string(),
        status: status.to_string(),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

fn spawn_feed(state: FeedState) -> SocketAddr {
    let server = FeedServer::new(SocketAddr::from(([127, 0, 0, 1], 0)), state);
    let (addr, _handle) = server.spawn().expect("bind feed");
    addr
}

async fn spawn_router(app: Router) -> SocketAddr {
    let server = axum::Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(app.into_make_service());
    let addr = server.local_addr();
    tokio::spawn(server);
    addr
}

/// Serves the live update route with `session` run on every accepted socket.
async fn spawn_stream<F, Fut>(session: F) -> SocketAddr
where
    F: Fn(WebSocket) -> Fut + Clone + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let app = Router::new().route(
        "/api/invocations/stream",
        get(move |ws: WebSocketUpgrade| {
            let session = session.clone();
            async move { ws.on_upgrade(session) }
        }),
    );
    spawn_router(app).await
}

async fn next_two(sub: &mut InvocationSubscription) -> (DashboardError, DashboardError) {
    let first = timeout(Duration::from_secs(5), sub.next_update())
        .await
        .unwrap()
        .unwrap_err();
    let second = timeout(Duration::from_secs(5), sub.next_update())
        .await
        .unwrap()
        .unwrap_err();
    (first, second)
}

#[tokio::test]
async fn loads_collection_over_http() {
    let state = FeedState::new();
    let mut invocations = InvocationMap::new();
    invocations.insert("i-1".to_string(), record("i-1", "Success", "ok"));
    state.insert_command("cmd-1", invocations);
    let addr = spawn_feed(state);

    let client = FeedClient::new(&format!("http://{addr}"), Some(Duration::from_secs(5))).unwrap();
    let loaded = client.load_invocations("cmd-1").await.unwrap();

    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded["i-1"], record("i-1", "Success", "ok"));
}

#[tokio::test]
async fn unknown_command_is_feed_unavailable() {
    let addr = spawn_feed(FeedState::new());
    let client = FeedClient::new(&format!("http://{addr}"), None).unwrap();

    let err = client.load_invocations("missing").await.unwrap_err();
    match err {
        DashboardError::FeedUnavailable(message) => assert!(message.starts_with("http 404"), "{message}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_leaves_dashboard_unchanged() {
    let app = Router::new().route(
        "/api/invocations",
        get(|| async { (StatusCode::OK, "{\"Invocations\": [oops") }),
    );
    let addr = spawn_router(app).await;

    let mut dash = Dashboard::new(DashboardConfig::new(&format!("http://{addr}"), "cmd-1")).unwrap();
    let epoch = dash.begin_load();
    let mut prior = InvocationMap::new();
    prior.insert("i-1".to_string(), record("i-1", "InProgress", ""));
    dash.apply_load(epoch, Ok(prior)).unwrap();
    let before = dash.store().snapshot();

    let err = dash.reload().await.unwrap_err();

    assert!(matches!(err, DashboardError::FeedUnavailable(_)));
    assert_eq!(dash.store().snapshot(), before);
    assert!(dash.render().notice.is_some());
}

#[tokio::test]
async fn activation_populates_store_through_event_queue() {
    let state = FeedState::new();
    let mut invocations = InvocationMap::new();
    invocations.insert("i-2".to_string(), record("i-2", "Failed", ""));
    invocations.insert("i-1".to_string(), record("i-1", "Delayed", ""));
    state.insert_command("cmd-1", invocations);
    let addr = spawn_feed(state);

    let mut dash = Dashboard::new(DashboardConfig::new(&format!("http://{addr}"), "cmd-1")).unwrap();
    dash.activate();
    let event = timeout(Duration::from_secs(5), dash.next_event())
        .await
        .unwrap()
        .unwrap();
    dash.handle_event(event).unwrap();

    let pass = dash.render();
    let ids: Vec<&str> = pass.cards.iter().map(|c| c.instance_id.as_str()).collect();
    assert_eq!(ids, vec!["i-1", "i-2"]);
    assert_eq!(pass.summary.failure, 1);
    assert_eq!(pass.summary.neutral, 1);
    dash.teardown();
}

#[tokio::test]
async fn live_updates_flow_into_store() {
    let state = FeedState::new();
    let mut invocations = InvocationMap::new();
    invocations.insert("i-1".to_string(), record("i-1", "InProgress", "start\n"));
    state.insert_command("cmd-1", invocations);
    let addr = spawn_feed(state.clone());

    let mut dash = Dashboard::new(DashboardConfig::new(&format!("http://{addr}"), "cmd-1")).unwrap();
    dash.reload().await.unwrap();
    dash.subscribe().await.unwrap();
    assert!(dash.is_streaming());

    state.publish(
        "other-cmd",
        InvocationUpdate {
            instance_id: "i-x".to_string(),
            status: Some("Success".to_string()),
            ..InvocationUpdate::default()
        },
    );
    state.publish(
        "cmd-1",
        InvocationUpdate {
            instance_id: "i-1".to_string(),
            status: Some("Success".to_string()),
            stdout_chunk: Some("done\n".to_string()),
            ..InvocationUpdate::default()
        },
    );

    let event = timeout(Duration::from_secs(5), dash.next_event())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, DashboardEvent::Update { .. }));
    dash.handle_event(event).unwrap();

    let inv = dash.store().get("i-1").unwrap();
    assert_eq!(inv.status, Status::Success);
    assert_eq!(inv.stdout, "start\ndone\n");
    assert!(dash.store().get("i-x").is_none());
    assert!(dash.store().all_complete());
}

#[tokio::test]
async fn bogus_status_on_stream_is_rejected() {
    let state = FeedState::new();
    state.insert_command("cmd-1", InvocationMap::new());
    let addr = spawn_feed(state.clone());

    let mut sub = InvocationSubscription::connect(&format!("ws://{addr}"), "cmd-1")
        .await
        .unwrap();
    state.publish(
        "cmd-1",
        InvocationUpdate {
            instance_id: "i-1".to_string(),
            status: Some("Bogus".to_string()),
            ..InvocationUpdate::default()
        },
    );
    let update = timeout(Duration::from_secs(5), sub.next_update())
        .await
        .unwrap()
        .unwrap();

    let mut dash = Dashboard::new(DashboardConfig::new(&format!("http://{addr}"), "cmd-1")).unwrap();
    let err = dash.apply_update(update).unwrap_err();
    assert_eq!(err, DashboardError::InvalidStatus("Bogus".to_string()));
    assert!(dash.store().is_empty());
}

#[tokio::test]
async fn stream_loss_is_reported_and_final() {
    let app = Router::new();
    let addr = spawn_router(app).await;

    let err = InvocationSubscription::connect(&format!("ws://{addr}"), "cmd-1")
        .await
        .err()
        .unwrap();
    assert!(matches!(err, DashboardError::StreamLost(_)));

    let mut dash = Dashboard::new(DashboardConfig::new(&format!("http://{addr}"), "cmd-1")).unwrap();
    assert!(dash.subscribe().await.is_err());
    assert!(!dash.is_streaming());
    assert!(dash.notice().is_some());
}

#[tokio::test]
async fn close_reason_reaches_the_error() {
    let addr = spawn_stream(|mut socket: WebSocket| async move {
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: 1000,
                reason: "command finished".into(),
            })))
            .await;
    })
    .await;

    let mut sub = InvocationSubscription::connect(&format!("ws://{addr}"), "cmd-1")
        .await
        .unwrap();
    let (first, second) = next_two(&mut sub).await;

    assert_eq!(first, DashboardError::StreamLost("command finished".to_string()));
    assert_eq!(second, first);
    assert!(sub.is_lost());
}

#[tokio::test]
async fn undecodable_frame_ends_the_stream() {
    let addr = spawn_stream(|mut socket: WebSocket| async move {
        let _ = socket.send(Message::Text("not json".to_string())).await;
        sleep(Duration::from_secs(30)).await;
    })
    .await;

    let mut sub = InvocationSubscription::connect(&format!("ws://{addr}"), "cmd-1")
        .await
        .unwrap();
    let (first, second) = next_two(&mut sub).await;

    match &first {
        DashboardError::StreamLost(reason) => assert!(reason.starts_with("undecodable update"), "{reason}"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(second, first);
}

#[tokio::test]
async fn dropped_connection_ends_the_stream() {
    let addr = spawn_stream(|socket: WebSocket| async move { drop(socket) }).await;

    let mut sub = InvocationSubscription::connect(&format!("ws://{addr}"), "cmd-1")
        .await
        .unwrap();
    let (first, second) = next_two(&mut sub).await;

    assert!(matches!(first, DashboardError::StreamLost(_)));
    assert_eq!(second, first);
    assert!(sub.is_lost());
}

#[tokio::test]
async fn loss_of_a_replaced_stream_does_not_end_the_current_one() {
    let closing = spawn_stream(|mut socket: WebSocket| async move {
        let _ = socket.send(Message::Close(None)).await;
    })
    .await;
    let state = FeedState::new();
    state.insert_command("cmd-1", InvocationMap::new());
    let live = spawn_feed(state.clone());

    let mut dash = Dashboard::new(DashboardConfig::new(&format!("http://{live}"), "cmd-1")).unwrap();
    let first = InvocationSubscription::connect(&format!("ws://{closing}"), "cmd-1")
        .await
        .unwrap();
    dash.attach_stream(first);
    sleep(Duration::from_millis(200)).await;
    dash.subscribe().await.unwrap();

    let event = timeout(Duration::from_secs(5), dash.next_event())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, DashboardEvent::StreamLost { .. }));
    dash.handle_event(event).unwrap();
    assert!(dash.is_streaming());
    assert!(dash.notice().is_none());

    state.publish(
        "cmd-1",
        InvocationUpdate {
            instance_id: "i-1".to_string(),
            status: Some("InProgress".to_string()),
            ..InvocationUpdate::default()
        },
    );
    let event = timeout(Duration::from_secs(5), dash.next_event())
        .await
        .unwrap()
        .unwrap();
    dash.handle_event(event).unwrap();
    assert_eq!(dash.store().get("i-1").unwrap().status, Status::InProgress);
}

#[tokio::test]
async fn blank_instance_id_on_stream_is_rejected() {
    let state = FeedState::new();
    state.insert_command("cmd-1", InvocationMap::new());
    let addr = spawn_feed(state.clone());

    let mut dash = Dashboard::new(DashboardConfig::new(&format!("http://{addr}"), "cmd-1")).unwrap();
    dash.subscribe().await.unwrap();
    state.publish(
        "cmd-1",
        InvocationUpdate {
            instance_id: String::new(),
            status: Some("Success".to_string()),
            ..InvocationUpdate::default()
        },
    );

    let event = timeout(Duration::from_secs(5), dash.next_event())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(dash.handle_event(event), Err(DashboardError::MissingInstanceId));
    assert!(dash.render().cards.is_empty());
    assert!(dash.is_streaming());
}
