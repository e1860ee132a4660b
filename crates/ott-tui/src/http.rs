//! Local HTTP API for remote control of the guide.
//!
//! ```text
//! GET  /api/channels                         channel list with what is on air
//! GET  /api/live                             active channel / program
//! POST /api/select/:channel_id               watch live
//! POST /api/select/:channel_id/:program_id   watch one program
//! POST /api/auto-update/:enabled             toggle end-of-program refresh
//! POST /api/refresh                          refetch schedules now
//! ```
//! Errors come back as `{ "code", "message" }` with the user-facing message.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use ott_proto::clock::Clock;
use ott_proto::live_channels::{LiveChannelsHandle, LiveSnapshot};
use ott_proto::messages::user_message;
use ott_proto::models::Program;

#[derive(Clone)]
struct HttpState {
    live: LiveChannelsHandle,
    clock: Arc<dyn Clock>,
}

#[derive(Debug, Serialize)]
struct ChannelInfo {
    id: String,
    title: String,
    catchup_hours: u32,
    program_count: usize,
    outdated: bool,
    live_program: Option<Program>,
}

#[derive(Debug, Serialize)]
struct LiveInfo {
    channel_id: Option<String>,
    channel_title: Option<String>,
    program: Option<Program>,
    follow_live: bool,
    auto_update: bool,
    loading: bool,
    fetched_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl From<&LiveSnapshot> for LiveInfo {
    fn from(snapshot: &LiveSnapshot) -> Self {
        Self {
            channel_id: snapshot.channel_id().map(str::to_string),
            channel_title: snapshot.channel().map(|c| c.title.clone()),
            program: snapshot.program.clone(),
            follow_live: snapshot.follow_live,
            auto_update: snapshot.auto_update,
            loading: snapshot.loading,
            fetched_at: snapshot.fetched_at,
            last_error: snapshot.last_error.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiError {
    code: &'static str,
    message: &'static str,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

fn api_error(status: StatusCode, code: &'static str) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            code,
            message: user_message(code),
        }),
    )
}

pub fn router(live: LiveChannelsHandle, clock: Arc<dyn Clock>) -> Router {
    Router::new()
        .route("/api/channels", get(get_channels))
        .route("/api/live", get(get_live))
        .route("/api/select/:channel_id", post(select_channel))
        .route("/api/select/:channel_id/:program_id", post(select_program))
        .route("/api/auto-update/:enabled", post(set_auto_update))
        .route("/api/refresh", post(refresh))
        .layer(CorsLayer::permissive())
        .with_state(HttpState { live, clock })
}

pub fn start_server(
    bind_address: String,
    port: u16,
    live: LiveChannelsHandle,
    clock: Arc<dyn Clock>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let app = router(live, clock);

        let addr = format!("{}:{}", bind_address, port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("[http] failed to bind {}: {}", addr, e);
                return;
            }
        };

        info!("[http] listening on http://{}", addr);

        if let Err(e) = axum::serve(listener, app).await {
            error!("[http] server error: {}", e);
        }
    })
}

async fn get_channels(State(state): State<HttpState>) -> Json<Vec<ChannelInfo>> {
    let now = state.clock.now();
    let snapshot = state.live.snapshot();
    let channels = snapshot
        .channels
        .iter()
        .map(|c| ChannelInfo {
            id: c.id.clone(),
            title: c.title.clone(),
            catchup_hours: c.catchup_hours,
            program_count: c.programs.len(),
            outdated: c.is_outdated(now),
            live_program: c.live_program(now).cloned(),
        })
        .collect();
    Json(channels)
}

async fn get_live(State(state): State<HttpState>) -> Json<LiveInfo> {
    Json(LiveInfo::from(&state.live.snapshot()))
}

async fn select_channel(
    State(state): State<HttpState>,
    Path(channel_id): Path<String>,
) -> ApiResult<LiveInfo> {
    select(state, channel_id, None).await
}

async fn select_program(
    State(state): State<HttpState>,
    Path((channel_id, program_id)): Path<(String, String)>,
) -> ApiResult<LiveInfo> {
    select(state, channel_id, Some(program_id)).await
}

async fn select(
    state: HttpState,
    channel_id: String,
    program_id: Option<String>,
) -> ApiResult<LiveInfo> {
    info!("[http] select {} / {:?}", channel_id, program_id);
    let snapshot = state.live.snapshot();
    let Some(channel) = snapshot.channels.iter().find(|c| c.id == channel_id) else {
        return Err(api_error(StatusCode::NOT_FOUND, "unknown_channel"));
    };
    if let Some(program_id) = program_id.as_deref() {
        let Some(program) = channel.find_program(program_id) else {
            return Err(api_error(StatusCode::NOT_FOUND, "unknown_program"));
        };
        channel
            .check_watchable(program, state.clock.now())
            .map_err(|code| api_error(StatusCode::CONFLICT, code))?;
    }

    match state.live.set_active_channel(channel_id, program_id).await {
        Ok(true) => Ok(Json(LiveInfo::from(&state.live.snapshot()))),
        // The channel vanished between the check and the command.
        Ok(false) => Err(api_error(StatusCode::NOT_FOUND, "unknown_channel")),
        Err(e) => Err(api_error(StatusCode::SERVICE_UNAVAILABLE, e.code())),
    }
}

async fn set_auto_update(
    State(state): State<HttpState>,
    Path(enabled): Path<bool>,
) -> ApiResult<LiveInfo> {
    info!("[http] auto update {}", enabled);
    state
        .live
        .set_auto_update(enabled)
        .await
        .map_err(|e| api_error(StatusCode::SERVICE_UNAVAILABLE, e.code()))?;
    Ok(Json(LiveInfo::from(&state.live.snapshot())))
}

async fn refresh(State(state): State<HttpState>) -> ApiResult<LiveInfo> {
    info!("[http] refresh");
    match state.live.refresh().await {
        Ok(()) => Ok(Json(LiveInfo::from(&state.live.snapshot()))),
        Err(e) => Err(api_error(StatusCode::BAD_GATEWAY, e.code())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Method, Request};
    use futures_util::future::BoxFuture;
    use ott_proto::clock::AnchoredClock;
    use ott_proto::error::ScheduleError;
    use ott_proto::live_channels::{LiveChannels, LiveOptions};
    use ott_proto::models::{parse_schedule, Channel, PlaylistItem};
    use ott_proto::schedule::ScheduleService;
    use serde_json::Value;
    use tower::ServiceExt;

    struct FixtureService(Vec<Channel>);

    impl ScheduleService for FixtureService {
        fn get_schedules(
            &self,
            _playlist: Vec<PlaylistItem>,
        ) -> BoxFuture<'static, Result<Vec<Channel>, ScheduleError>> {
            let channels = self.0.clone();
            Box::pin(async move { Ok(channels) })
        }
    }

    fn item(id: &str) -> PlaylistItem {
        PlaylistItem {
            id: id.to_string(),
            title: format!("Title {}", id),
            catchup_hours: 8,
            schedule: None,
            content_type: Some("live".to_string()),
            image: None,
        }
    }

    fn channels() -> Vec<Channel> {
        let fixtures = [
            ("channel1", include_str!("../../ott-proto/tests/fixtures/channel1.json")),
            ("channel2", include_str!("../../ott-proto/tests/fixtures/channel2.json")),
        ];
        fixtures
            .iter()
            .map(|(id, json)| Channel::new(&item(id), parse_schedule(id, json).unwrap()))
            .collect()
    }

    async fn app() -> (Router, LiveChannelsHandle) {
        let now = DateTime::parse_from_rfc3339("2022-07-15T10:45:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let clock: Arc<dyn Clock> = Arc::new(AnchoredClock::new(now));
        let handle = LiveChannels::spawn(
            Arc::new(FixtureService(channels())),
            vec![item("channel1"), item("channel2")],
            LiveOptions::default(),
            Arc::clone(&clock),
        );
        handle.refresh().await.unwrap();
        (router(handle.clone(), clock), handle)
    }

    async fn call(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_channels_report_live_program() {
        let (app, _handle) = app().await;
        let (status, body) = call(&app, Method::GET, "/api/channels").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], "channel1");
        assert_eq!(body[0]["live_program"]["id"], "program2");
        assert_eq!(body[1]["live_program"]["id"], "program5");
        assert_eq!(body[1]["program_count"], 2);
    }

    #[tokio::test]
    async fn test_live_defaults_to_first_channel() {
        let (app, _handle) = app().await;
        let (status, body) = call(&app, Method::GET, "/api/live").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["channel_id"], "channel1");
        assert_eq!(body["program"]["id"], "program2");
        assert_eq!(body["follow_live"], true);
    }

    #[tokio::test]
    async fn test_select_channel_and_program() {
        let (app, handle) = app().await;
        let (status, body) = call(&app, Method::POST, "/api/select/channel2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["program"]["id"], "program5");

        let (status, body) = call(&app, Method::POST, "/api/select/channel1/program1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["program"]["id"], "program1");
        assert_eq!(body["follow_live"], false);
        assert_eq!(handle.snapshot().program_id(), Some("program1"));
    }

    #[tokio::test]
    async fn test_select_errors_carry_user_message() {
        let (app, handle) = app().await;

        let (status, body) = call(&app, Method::POST, "/api/select/channel3").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "unknown_channel");
        assert_eq!(body["message"], user_message("unknown_channel"));

        let (status, body) = call(&app, Method::POST, "/api/select/channel1/program9").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "unknown_program");

        let (status, body) = call(&app, Method::POST, "/api/select/channel1/program3").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "not_aired");

        // Nothing changed.
        assert_eq!(handle.snapshot().channel_id(), Some("channel1"));
        assert_eq!(handle.snapshot().program_id(), Some("program2"));
    }

    #[tokio::test]
    async fn test_refresh_and_auto_update() {
        let (app, handle) = app().await;
        let (status, body) = call(&app, Method::POST, "/api/refresh").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["fetched_at"].is_string());

        let (status, body) = call(&app, Method::POST, "/api/auto-update/false").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["auto_update"], false);
        assert!(!handle.snapshot().auto_update);

        let (status, body) = call(&app, Method::POST, "/api/auto-update/true").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["auto_update"], true);
    }
}
