use std::collections::HashMap;

use bevy::log::{debug, warn};
use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PlacementError;

use super::AssetSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetHandle(Uuid);

impl AssetHandle {
    pub fn new() -> Self {
        AssetHandle(Uuid::new_v4())
    }
}

impl Default for AssetHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssetState {
    Loading,
    Ready,
    Failed(PlacementError),
    /// Released, or never issued by this source.
    Unknown,
}

/// Sent to the loader when a model is needed.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRequest {
    pub handle: AssetHandle,
    pub path: String,
}

/// Sent back by the loader once a model is usable or has failed.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetLoaded {
    pub handle: AssetHandle,
    pub result: Result<(), String>,
}

/// The loader's ends of the channels.
#[derive(Clone)]
pub struct AssetLoaderLink {
    pub requests: Receiver<AssetRequest>,
    pub completions: Sender<AssetLoaded>,
}

struct AssetEntry {
    path: String,
    state: AssetState,
}

/// Keeps track of model loads that finish some frames after they were started.
pub struct AssetTracker {
    entries: HashMap<AssetHandle, AssetEntry>,
    outbox: Sender<AssetRequest>,
    inbox: Receiver<AssetLoaded>,
}

impl AssetTracker {
    pub fn new() -> (Self, AssetLoaderLink) {
        let (request_tx, request_rx) = unbounded();
        let (loaded_tx, loaded_rx) = unbounded();
        let tracker = AssetTracker {
            entries: HashMap::new(),
            outbox: request_tx,
            inbox: loaded_rx,
        };
        let link = AssetLoaderLink {
            requests: request_rx,
            completions: loaded_tx,
        };
        (tracker, link)
    }

    /// Applies every completion the loader has reported so far.
    pub fn poll_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(loaded) = self.inbox.try_recv() {
            self.complete(loaded);
            applied += 1;
        }
        applied
    }

    fn complete(&mut self, loaded: AssetLoaded) {
        let Some(entry) = self.entries.get_mut(&loaded.handle) else {
            debug!("Dropping completion for released asset {}", loaded.handle);
            return;
        };
        entry.state = match loaded.result {
            Ok(()) => AssetState::Ready,
            Err(reason) => {
                let err = PlacementError::AssetLoadFailure {
                    path: entry.path.clone(),
                    reason,
                };
                warn!("{err}");
                AssetState::Failed(err)
            }
        };
    }

    pub fn pending(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.state == AssetState::Loading)
            .count()
    }
}

impl AssetSource for AssetTracker {
    fn load(&mut self, path: &str) -> AssetHandle {
        let handle = AssetHandle::new();
        self.entries.insert(
            handle,
            AssetEntry {
                path: path.to_string(),
                state: AssetState::Loading,
            },
        );
        let request = AssetRequest {
            handle,
            path: path.to_string(),
        };
        if self.outbox.send(request).is_err() {
            let err = PlacementError::AssetLoadFailure {
                path: path.to_string(),
                reason: "asset loader is gone".to_string(),
            };
            warn!("{err}");
            if let Some(entry) = self.entries.get_mut(&handle) {
                entry.state = AssetState::Failed(err);
            }
        }
        handle
    }

    fn state(&self, handle: AssetHandle) -> AssetState {
        self.entries
            .get(&handle)
            .map(|e| e.state.clone())
            .unwrap_or(AssetState::Unknown)
    }

    fn release(&mut self, handle: AssetHandle) {
        self.entries.remove(&handle);
    }
}
