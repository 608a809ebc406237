//! Shared fixtures for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::errors::ClientError;
use crate::feed::{FilterSpec, PageSource};
use crate::models::{timestamp, MediaItem};

pub fn item(id: i64, file_name: &str) -> MediaItem {
    MediaItem {
        id,
        file_name: file_name.to_string(),
        file_path: format!("/library/{}", file_name),
        is_video: file_name.ends_with(".mp4"),
        thumbnail_small: None,
        thumbnail_medium: None,
        thumbnail_large: None,
        width: None,
        height: None,
        date_taken: None,
        location_name: None,
        city: None,
        country: None,
        is_processed: true,
    }
}

pub fn dated_item(id: i64, file_name: &str, taken: &str) -> MediaItem {
    MediaItem {
        date_taken: Some(timestamp::parse(taken).unwrap()),
        ..item(id, file_name)
    }
}

/// `count` items with consecutive ids starting at `first_id`.
pub fn items(first_id: i64, count: usize) -> Vec<MediaItem> {
    (0..count as i64)
        .map(|i| item(first_id + i, &format!("IMG_{:05}.jpg", first_id + i)))
        .collect()
}

type Reply = Result<Vec<MediaItem>, ClientError>;

/// Page source whose responses are scripted per `(filter, offset)`.
///
/// A reply is either queued up front with [`ScriptedSource::respond`] or
/// held behind a gate with [`ScriptedSource::gate`] so the test decides when
/// (and in which order) fetches complete. Unscripted pages come back empty.
#[derive(Default)]
pub struct ScriptedSource {
    calls: Mutex<Vec<(FilterSpec, u32, u32)>>,
    replies: Mutex<HashMap<(FilterSpec, u32), Reply>>,
    gates: Mutex<HashMap<(FilterSpec, u32), oneshot::Receiver<Reply>>>,
    invalidated: AtomicBool,
}

impl ScriptedSource {
    pub fn respond(&self, filter: &FilterSpec, offset: u32, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .insert((filter.clone(), offset), reply);
    }

    pub fn gate(&self, filter: &FilterSpec, offset: u32) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .unwrap()
            .insert((filter.clone(), offset), rx);
        tx
    }

    pub fn calls(&self) -> Vec<(FilterSpec, u32, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn set_invalidated(&self, invalidated: bool) {
        self.invalidated.store(invalidated, Ordering::SeqCst);
    }

    /// Yield until at least `n` fetches have started.
    pub async fn wait_for_calls(&self, n: usize) {
        for _ in 0..10_000 {
            if self.call_count() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {} calls, saw {}", n, self.call_count());
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(&self, filter: &FilterSpec, offset: u32, limit: u32) -> Reply {
        self.calls
            .lock()
            .unwrap()
            .push((filter.clone(), offset, limit));

        let gate = self.gates.lock().unwrap().remove(&(filter.clone(), offset));
        if let Some(rx) = gate {
            return rx
                .await
                .unwrap_or_else(|_| Err(ClientError::Transport("gate dropped".into())));
        }

        let reply = self.replies.lock().unwrap().remove(&(filter.clone(), offset));
        reply.unwrap_or_else(|| Ok(Vec::new()))
    }

    fn is_invalidated(&self, _filter: &FilterSpec, _offset: u32, _limit: u32) -> bool {
        self.invalidated.load(Ordering::SeqCst)
    }
}
