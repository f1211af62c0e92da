//! Versus 매칭/릴레이 서버

mod config;
mod error;
mod handlers;
mod leaderboard;
mod protocol;
mod relay;
mod state;
mod transport;

use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::HeaderValue,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use config::Config;
use futures::{SinkExt, StreamExt};
use protocol::{ClientMessage, ServerMessage};
use state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = Arc::new(AppState::new(config.clone()));

    // 빈 방 정리 스케줄러 (선택)
    if config.room.sweep_interval_secs > 0 {
        handlers::spawn_room_sweeper(
            state.clone(),
            Duration::from_secs(config.room.sweep_interval_secs),
        );
        tracing::info!(
            every_secs = config.room.sweep_interval_secs,
            "Empty room sweeper enabled"
        );
    }

    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("Versus relay server started");
    tracing::info!("Address: {}", addr);
    tracing::info!("WebSocket: ws://{}/ws", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .route(
            "/scores",
            get(handlers::list_scores).post(handlers::submit_score),
        )
        .route("/scores/stream", get(handlers::stream_scores))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = if config.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn index_handler() -> Html<&'static str> {
    Html("<h1>Versus Relay Server</h1><p>WebSocket endpoint: /ws</p>")
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let (rooms, connections) = {
        let relay = state.relay.lock().await;
        (relay.rooms().len(), relay.connection_count())
    };

    Json(serde_json::json!({
        "status": "ok",
        "server": env!("CARGO_PKG_NAME"),
        "rooms": rooms,
        "connections": connections,
        "timestamp": std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // 연결 처리
    let peer_id = handlers::handle_connection(&state, tx).await;

    // 송신 태스크
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(err) => tracing::error!(error = %err, "Failed to encode server message"),
            }
        }
    });

    // 수신 처리
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => handlers::handle_client_message(&state, &peer_id, msg).await,
                Err(err) => handlers::handle_bad_frame(&state, &peer_id, &err.to_string()),
            },
            Ok(Message::Close(_)) => break,
            Err(err) => {
                tracing::debug!(peer_id = %peer_id, error = %err, "WebSocket receive error");
                break;
            }
            _ => {}
        }
    }

    // 연결 해제
    handlers::handle_disconnect(&state, &peer_id).await;
    send_task.abort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use crate::leaderboard::ScoreEntry;
    use tower::ServiceExt;

    fn test_app() -> (Router, Arc<AppState>) {
        let state = Arc::new(AppState::new(Config::from_lookup(|_| None)));
        (router(state.clone()), state)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_score(label: &str, score: i64) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/scores")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "label": label, "score": score }).to_string(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_relay_counts() {
        let (app, state) = test_app();
        let a = relay::ConnectionId::from("a");
        {
            let mut engine = state.relay.lock().await;
            engine.connect(a.clone());
            engine.handle(&a, ClientMessage::JoinRoom("abc123".into()));
        }

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["rooms"], 1);
        assert_eq!(body["connections"], 1);
    }

    #[tokio::test]
    async fn submitted_scores_are_listed_highest_first() {
        let (app, _state) = test_app();

        for (label, score) in [("AAA", 1200), ("BBB", 5400), ("CCC", 300)] {
            let response = app.clone().oneshot(post_score(label, score)).await.unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/scores?limit=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let scores: Vec<ScoreEntry> =
            serde_json::from_value(body_json(response).await).unwrap();
        let labels: Vec<&str> = scores.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["BBB", "AAA"]);
    }

    #[tokio::test]
    async fn blank_label_is_rejected() {
        let (app, state) = test_app();

        let response = app.oneshot(post_score("  ", 10)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(state.leaderboard.top(10).is_empty());
    }

    #[tokio::test]
    async fn websocket_route_requires_upgrade() {
        let (app, _state) = test_app();

        let response = app
            .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[test]
    fn cors_accepts_listed_origins() {
        let config = Config::from_lookup(|key| {
            (key == "CORS_ORIGINS").then(|| "http://localhost:3500".to_string())
        });
        assert!(!config.allows_any_origin());
        let _layer = cors_layer(&config);
    }
}
