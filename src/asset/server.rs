// asset/server.rs - asynchronous loads observed by polling once per frame

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use super::{AssetError, AssetKind, Assets, Handle};

/// Where asset bytes come from.
pub trait AssetSource: Send + Sync + 'static {
    /// Reads the whole asset, calling `progress` with the loaded fraction.
    fn read(&self, path: &str, progress: &mut dyn FnMut(f32)) -> Result<Vec<u8>, AssetError>;
}

/// Reads assets relative to a root directory (native) or the page URL (web).
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for FileSource {
    fn read(&self, path: &str, progress: &mut dyn FnMut(f32)) -> Result<Vec<u8>, AssetError> {
        crate::io::load_binary(&self.root.join(path), progress)
    }
}

/// In-memory asset table, used for embedded assets and headless runs.
#[derive(Default, Clone)]
pub struct MemorySource {
    files: HashMap<String, Arc<[u8]>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), Arc::from(bytes.into()));
    }
}

impl AssetSource for MemorySource {
    fn read(&self, path: &str, progress: &mut dyn FnMut(f32)) -> Result<Vec<u8>, AssetError> {
        let bytes = self.files.get(path).ok_or_else(|| AssetError::NotFound {
            path: path.to_string(),
        })?;
        progress(1.0);
        Ok(bytes.to_vec())
    }
}

/// Receipt for a requested load; redeem it with [`AssetServer::poll`].
pub struct LoadTicket<T> {
    id: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> LoadTicket<T> {
    fn new(id: u64) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<T> fmt::Debug for LoadTicket<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LoadTicket").field(&self.id).finish()
    }
}

#[derive(Debug)]
pub enum LoadStatus<T> {
    Pending { progress: f32 },
    Ready(Handle<T>),
    Failed(AssetError),
}

type Decoded = Box<dyn Any + Send>;
type StoreFn = fn(&mut Assets, Decoded, u64) -> Result<usize, AssetError>;

fn store_decoded<T: AssetKind>(
    assets: &mut Assets,
    decoded: Decoded,
    id: u64,
) -> Result<usize, AssetError> {
    let asset = decoded
        .downcast::<T>()
        .map_err(|_| AssetError::type_mismatch::<T>(id))?;
    Ok(T::cache_mut(assets).insert(*asset).index())
}

enum LoadEvent {
    Progress {
        id: u64,
        fraction: f32,
    },
    Finished {
        id: u64,
        result: Result<Decoded, AssetError>,
    },
}

enum RequestState {
    InFlight { progress: f32 },
    Done(Result<usize, AssetError>),
}

struct Request {
    path: String,
    type_id: TypeId,
    store: StoreFn,
    state: RequestState,
}

/// Fetches and decodes assets off the frame thread, on the rayon pool.
///
/// Each [`load`](Self::load) produces exactly one `Ready` or `Failed`
/// status. Results are only observed after [`pump`](Self::pump) drains the
/// loader channel, so scene mutation stays on the frame thread. Decoded
/// assets are cached per path; a repeated load of a cached path resolves
/// without touching the source.
pub struct AssetServer {
    source: Arc<dyn AssetSource>,
    assets: Assets,
    loaded: HashMap<(TypeId, String), usize>,
    requests: HashMap<u64, Request>,
    next_id: u64,
    sender: Sender<LoadEvent>,
    receiver: Receiver<LoadEvent>,
}

impl AssetServer {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            source,
            assets: Assets::new(),
            loaded: HashMap::new(),
            requests: HashMap::new(),
            next_id: 0,
            sender,
            receiver,
        }
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub fn get<T: AssetKind>(&self, handle: Handle<T>) -> Option<&T> {
        T::cache(&self.assets).get(handle)
    }

    pub fn load<T: AssetKind>(&mut self, path: impl Into<String>) -> LoadTicket<T> {
        let path = path.into();
        let id = self.next_id;
        self.next_id += 1;

        let type_id = TypeId::of::<T>();
        let state = match self.loaded.get(&(type_id, path.clone())) {
            Some(&index) => {
                log::debug!("{} already decoded, reusing cached copy", path);
                RequestState::Done(Ok(index))
            }
            None => {
                self.spawn_load::<T>(id, path.clone());
                RequestState::InFlight { progress: 0.0 }
            }
        };

        self.requests.insert(
            id,
            Request {
                path,
                type_id,
                store: store_decoded::<T>,
                state,
            },
        );

        LoadTicket::new(id)
    }

    fn spawn_load<T: AssetKind>(&self, id: u64, path: String) {
        let source = Arc::clone(&self.source);
        let sender = self.sender.clone();

        let job = move || {
            let progress_sender = sender.clone();
            let mut report = |fraction: f32| {
                progress_sender
                    .send(LoadEvent::Progress { id, fraction })
                    .ok();
            };
            let result = source
                .read(&path, &mut report)
                .and_then(|bytes| T::decode(&path, bytes))
                .map(|asset| Box::new(asset) as Decoded);
            sender.send(LoadEvent::Finished { id, result }).ok();
        };

        // No threads in the browser: the read runs now, the result is still
        // only observed on the next pump.
        #[cfg(target_arch = "wasm32")]
        job();

        #[cfg(not(target_arch = "wasm32"))]
        rayon::spawn(job);
    }

    /// Applies every loader event received since the last call.
    pub fn pump(&mut self) {
        while let Ok(event) = self.receiver.try_recv() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Progress { id, fraction } => {
                let Some(request) = self.requests.get_mut(&id) else {
                    return;
                };
                if let RequestState::InFlight { progress } = &mut request.state {
                    *progress = fraction;
                    log::debug!("{:.0}% loaded {}", fraction * 100.0, request.path);
                }
            }
            LoadEvent::Finished { id, result } => {
                let Some(request) = self.requests.get_mut(&id) else {
                    return;
                };

                let outcome =
                    result.and_then(|decoded| (request.store)(&mut self.assets, decoded, id));

                match &outcome {
                    Ok(index) => {
                        self.loaded
                            .insert((request.type_id, request.path.clone()), *index);
                        log::debug!("Finished loading {}", request.path);
                    }
                    Err(err) => log::debug!("Loading {} failed: {}", request.path, err),
                }

                request.state = RequestState::Done(outcome);
            }
        }
    }

    /// Reports the state of a load. `Ready` and `Failed` are returned once;
    /// the ticket is spent afterwards.
    pub fn poll<T: AssetKind>(&mut self, ticket: &LoadTicket<T>) -> LoadStatus<T> {
        match self.requests.get(&ticket.id) {
            None => return LoadStatus::Failed(AssetError::UnknownTicket(ticket.id)),
            Some(Request {
                state: RequestState::InFlight { progress },
                ..
            }) => return LoadStatus::Pending { progress: *progress },
            Some(_) => {}
        }

        match self.requests.remove(&ticket.id).map(|request| request.state) {
            Some(RequestState::Done(Ok(index))) => LoadStatus::Ready(Handle::new(index)),
            Some(RequestState::Done(Err(err))) => LoadStatus::Failed(err),
            _ => LoadStatus::Failed(AssetError::UnknownTicket(ticket.id)),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.requests
            .values()
            .filter(|request| matches!(request.state, RequestState::InFlight { .. }))
            .count()
    }

    /// Blocks until every in-flight load has finished or `timeout` passes.
    /// Returns whether all loads finished.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn finish_pending(&mut self, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        self.pump();

        while self.in_flight() > 0 {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.receiver.recv_timeout(remaining) {
                Ok(event) => self.handle_event(event),
                Err(_) => return false,
            }
        }

        true
    }

    #[cfg(target_arch = "wasm32")]
    pub fn finish_pending(&mut self, _timeout: Duration) -> bool {
        self.pump();
        self.in_flight() == 0
    }
}
