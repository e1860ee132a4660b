//! Schedule service: fetches the program schedule of every channel in a playlist.

use std::time::Duration;

use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;
use tracing::{debug, warn};

use crate::error::ScheduleError;
use crate::models::{parse_schedule, Channel, PlaylistItem, Program};

/// External collaborator that turns a playlist into channels with programs.
///
/// Implementations own their retry policy; the tracker simply keeps the
/// previous schedule when a call fails.
pub trait ScheduleService: Send + Sync + 'static {
    fn get_schedules(
        &self,
        playlist: Vec<PlaylistItem>,
    ) -> BoxFuture<'static, Result<Vec<Channel>, ScheduleError>>;
}

/// Reads each channel's `schedule` source: `http(s)://` URLs through
/// reqwest, anything else as a local file.
#[derive(Clone)]
pub struct SourceScheduleService {
    client: reqwest::Client,
}

impl SourceScheduleService {
    pub fn new(request_timeout: Duration) -> Result<Self, ScheduleError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ott-epg/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl ScheduleService for SourceScheduleService {
    fn get_schedules(
        &self,
        playlist: Vec<PlaylistItem>,
    ) -> BoxFuture<'static, Result<Vec<Channel>, ScheduleError>> {
        let client = self.client.clone();
        async move { fetch_all(&client, &playlist).await }.boxed()
    }
}

/// Fetch all channels concurrently, keeping playlist order.
///
/// A failing channel comes back with an empty schedule; only when every
/// channel fails is the whole call an error.
async fn fetch_all(
    client: &reqwest::Client,
    playlist: &[PlaylistItem],
) -> Result<Vec<Channel>, ScheduleError> {
    let results = join_all(playlist.iter().map(|item| fetch_channel(client, item))).await;

    let mut failed = 0usize;
    let channels: Vec<Channel> = playlist
        .iter()
        .zip(results)
        .map(|(item, result)| match result {
            Ok(programs) => {
                debug!("[schedule] {}: {} programs", item.id, programs.len());
                Channel::new(item, programs)
            }
            Err(e) => {
                warn!("[schedule] {}: {}", item.id, e);
                failed += 1;
                Channel::new(item, Vec::new())
            }
        })
        .collect();

    if !playlist.is_empty() && failed == playlist.len() {
        return Err(ScheduleError::AllFailed);
    }
    Ok(channels)
}

async fn fetch_channel(
    client: &reqwest::Client,
    item: &PlaylistItem,
) -> Result<Vec<Program>, ScheduleError> {
    let Some(source) = item.schedule.as_deref() else {
        return Ok(Vec::new());
    };
    let body = read_source(client, source).await?;
    Ok(parse_schedule(&item.id, &body)?)
}

async fn read_source(client: &reqwest::Client, source: &str) -> Result<String, ScheduleError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let resp = client.get(source).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScheduleError::Status {
                status: status.as_u16(),
                url: source.to_string(),
            });
        }
        Ok(resp.text().await?)
    } else {
        let path = source.strip_prefix("file://").unwrap_or(source);
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ScheduleError::Io {
                path: path.to_string(),
                source: e,
            })
    }
}
