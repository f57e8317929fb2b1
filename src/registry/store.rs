//! Registry storage, persistence, and live reload.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::{Mutex, RwLock};
use serde_json::Map;

use super::error::{RegistryError, RegistryResult};
use super::var::{Slot, Var, VarBuilder, VarType};
use crate::codec::{Document, VERSION_KEY, ValueKind, VarValue};
use crate::config::Settings;
use crate::watcher::{ChangeCallback, NotifyWatchService, WatchService};

/// Handle identifying one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(u64);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var#{}", self.0)
    }
}

/// A registered variable. The registry never owns the value storage.
struct Entry {
    id: VarId,
    slot: Weak<dyn Slot>,
}

/// group -> name -> entry. Groups are never left empty.
type Groups = BTreeMap<String, BTreeMap<String, Entry>>;

#[derive(Debug)]
struct FileState {
    path: Option<PathBuf>,
    version: i32,
    loaded: bool,
    live: bool,
    /// Bumped whenever the watch subscription changes; reload requests from
    /// an older subscription are dropped.
    epoch: u64,
    /// Text of our last save, to recognise the watcher echoing it back.
    last_written: Option<String>,
}

impl Default for FileState {
    fn default() -> Self {
        Self {
            path: None,
            version: 0,
            loaded: false,
            live: true,
            epoch: 0,
            last_written: None,
        }
    }
}

/// Posted from the watch thread when the backing file changes.
#[derive(Debug, Clone)]
struct ReloadRequest {
    path: PathBuf,
    epoch: u64,
}

/// Outcome of a load.
///
/// Lookup and decode failures are skipped, not fatal; they are listed here
/// and logged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Version read from the document, if it had one.
    pub version: Option<i32>,
    /// Number of variables that received a value.
    pub applied: usize,
    /// Document groups with no registered counterpart.
    pub missing_groups: Vec<String>,
    /// `(group, name)` items with no registered counterpart.
    pub missing_items: Vec<(String, String)>,
    /// `(group, name)` items whose node could not be decoded.
    pub decode_failures: Vec<(String, String)>,
    /// The backing file did not exist, nothing was read.
    pub skipped: bool,
}

impl LoadReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.missing_groups.is_empty()
            && self.missing_items.is_empty()
            && self.decode_failures.is_empty()
    }
}

/// Snapshot of one registered variable, for editors and inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct VarInfo {
    pub id: VarId,
    pub group: String,
    pub name: String,
    pub kind: ValueKind,
    pub min: f32,
    pub max: f32,
    pub value: VarValue,
}

/// Maps `(group, name)` to live variables and persists them to one file.
pub struct Registry {
    items: RwLock<Groups>,
    state: Mutex<FileState>,
    watch: Arc<dyn WatchService>,
    reload_tx: Sender<ReloadRequest>,
    reload_rx: Receiver<ReloadRequest>,
    next_id: AtomicU64,
    errors: AtomicUsize,
}

impl Registry {
    /// Create a registry watching files through `notify`.
    pub fn new() -> Arc<Self> {
        Self::with_watch(Arc::new(NotifyWatchService::default()))
    }

    /// Create a registry using the given watch service.
    pub fn with_watch(watch: Arc<dyn WatchService>) -> Arc<Self> {
        let (reload_tx, reload_rx) = unbounded();
        Arc::new(Self {
            items: RwLock::new(Groups::new()),
            state: Mutex::new(FileState::default()),
            watch,
            reload_tx,
            reload_rx,
            next_id: AtomicU64::new(1),
            errors: AtomicUsize::new(0),
        })
    }

    /// Create a registry configured from settings.
    pub fn from_settings(settings: &Settings) -> RegistryResult<Arc<Self>> {
        let watch = NotifyWatchService::new(settings.watch.debounce_ms);
        let registry = Self::with_watch(Arc::new(watch));
        registry.configure(settings)?;
        Ok(registry)
    }

    /// Apply version, live mode and backing file from settings.
    pub fn configure(&self, settings: &Settings) -> RegistryResult<()> {
        self.set_version(settings.version);
        self.set_is_live(settings.live)?;
        self.set_filepath(&settings.file)
    }

    /// Create a variable registered in this registry.
    pub fn var<T: VarType>(
        self: &Arc<Self>,
        value: T,
        name: impl Into<String>,
        group: impl Into<String>,
    ) -> Var<T> {
        VarBuilder::new(name).group(group).register_in(self, value)
    }

    pub(crate) fn emplace(
        &self,
        slot: Weak<dyn Slot>,
        name: &str,
        group: &str,
    ) -> RegistryResult<VarId> {
        if group == VERSION_KEY {
            return Err(self.report(RegistryError::ReservedGroup(group.to_string())));
        }

        let mut items = self.items.write();
        let entries = items.entry(group.to_string()).or_default();
        if entries.contains_key(name) {
            drop(items);
            return Err(self.report(RegistryError::Duplicate {
                group: group.to_string(),
                name: name.to_string(),
            }));
        }

        let id = VarId(self.next_id.fetch_add(1, Ordering::Relaxed));
        entries.insert(name.to_string(), Entry { id, slot });
        crate::debug_event!("registry", "registered", "{group}/{name} as {id}");
        Ok(id)
    }

    /// Remove the entry registered under `id`, pruning its group if empty.
    pub(crate) fn unregister(&self, id: VarId) -> RegistryResult<()> {
        let mut items = self.items.write();

        let found = items.iter_mut().find_map(|(group, entries)| {
            let name = entries
                .iter()
                .find(|(_, entry)| entry.id == id)
                .map(|(name, _)| name.clone())?;
            entries.remove(&name);
            Some((group.clone(), name, entries.is_empty()))
        });

        match found {
            Some((group, name, now_empty)) => {
                if now_empty {
                    items.remove(&group);
                }
                crate::debug_event!("registry", "unregistered", "{group}/{name}");
                Ok(())
            }
            None => {
                drop(items);
                Err(self.report(RegistryError::UnknownTarget(id)))
            }
        }
    }

    /// Point the registry at a backing file.
    ///
    /// Same path: no-op. Otherwise the file is created empty if missing and,
    /// in live mode, the watch moves from the old path to the new one.
    pub fn set_filepath(&self, path: impl AsRef<Path>) -> RegistryResult<()> {
        let path = path.as_ref();
        let mut state = self.state.lock();
        if state.path.as_deref() == Some(path) {
            return Ok(());
        }

        if !path.exists() {
            fs::File::create(path).map_err(|source| RegistryError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            crate::log_event!("registry", "created", "{}", path.display());
        }

        let previous = state.path.replace(path.to_path_buf());
        state.last_written = None;

        if state.live {
            if let Some(previous) = previous {
                self.watch.unsubscribe(&previous);
            }
            state.epoch += 1;
            self.subscribe(path, state.epoch)?;
        }
        Ok(())
    }

    fn subscribe(&self, path: &Path, epoch: u64) -> RegistryResult<()> {
        let tx = self.reload_tx.clone();
        let on_change: ChangeCallback = Arc::new(move |changed: &Path| {
            let _ = tx.send(ReloadRequest {
                path: changed.to_path_buf(),
                epoch,
            });
        });
        self.watch.subscribe(path, on_change)?;
        Ok(())
    }

    /// Turn file watching on or off.
    ///
    /// Turning it off drops every subscription of the watch service, not
    /// only this registry's. Reloads already queued are discarded.
    pub fn set_is_live(&self, live: bool) -> RegistryResult<()> {
        let mut state = self.state.lock();
        let was_live = std::mem::replace(&mut state.live, live);

        if !live {
            state.epoch += 1;
            self.watch.unsubscribe_all();
            crate::debug_event!("registry", "live mode off");
        } else if !was_live {
            if let Some(path) = state.path.clone() {
                state.epoch += 1;
                self.subscribe(&path, state.epoch)?;
            }
            crate::debug_event!("registry", "live mode on");
        }
        Ok(())
    }

    /// Stop watching this registry's file. Live mode stays on.
    pub fn unwatch(&self) {
        let mut state = self.state.lock();
        if !state.live {
            return;
        }
        if let Some(path) = state.path.clone() {
            state.epoch += 1;
            self.watch.unsubscribe(&path);
        }
    }

    /// Write every registered variable to the backing file.
    ///
    /// The file must already exist; [`set_filepath`](Self::set_filepath)
    /// creates it.
    pub fn save(&self) -> RegistryResult<()> {
        let (path, version) = {
            let state = self.state.lock();
            (state.path.clone(), state.version)
        };
        let path = path.ok_or_else(|| self.report(RegistryError::NoFilepath))?;
        if !path.is_file() {
            return Err(self.report(RegistryError::MissingBackingFile { path }));
        }

        let text = self
            .build_document(version)
            .to_pretty_string()
            .map_err(|source| RegistryError::Document {
                path: path.clone(),
                source,
            })?;
        fs::write(&path, &text).map_err(|source| {
            self.report(RegistryError::Io {
                path: path.clone(),
                source,
            })
        })?;

        self.state.lock().last_written = Some(text);
        crate::log_event!("registry", "saved", "{}", path.display());
        Ok(())
    }

    /// Snapshot of all registered values as a document.
    pub fn to_document(&self) -> Document {
        let version = self.state.lock().version;
        self.build_document(version)
    }

    fn build_document(&self, version: i32) -> Document {
        let items = self.items.read();
        let mut doc = Document::new();

        for (group, entries) in items.iter() {
            let mut nodes = Map::new();
            for (name, entry) in entries {
                if let Some(slot) = entry.slot.upgrade() {
                    nodes.insert(name.clone(), slot.encode());
                }
            }
            doc.insert_group(group.clone(), nodes);
        }

        doc.set_version(version);
        doc
    }

    /// Read the backing file and push its values into matching variables.
    ///
    /// A missing file is a no-op. A file that fails to parse changes no
    /// variable but still marks the registry loaded. Otherwise unknown
    /// groups, unknown items and undecodable nodes are logged and skipped
    /// while everything else is applied.
    pub fn load(&self) -> RegistryResult<LoadReport> {
        let Some(path) = self.filepath() else {
            return Ok(LoadReport::skipped());
        };
        if !path.exists() {
            crate::debug_event!("registry", "no file to load", "{}", path.display());
            return Ok(LoadReport::skipped());
        }

        let text = fs::read_to_string(&path).map_err(|source| {
            self.report(RegistryError::Io {
                path: path.clone(),
                source,
            })
        })?;
        let doc = Document::parse(&text).map_err(|source| {
            self.state.lock().loaded = true;
            self.report(RegistryError::Document {
                path: path.clone(),
                source,
            })
        })?;

        self.state.lock().last_written = None;
        Ok(self.apply_document(&doc))
    }

    /// Push values from an already parsed document into matching variables.
    pub fn apply_document(&self, doc: &Document) -> LoadReport {
        let mut report = LoadReport::default();

        match doc.version() {
            Ok(Some(version)) => {
                self.state.lock().version = version;
                report.version = Some(version);
            }
            Ok(None) => {}
            Err(e) => self.log_error(format_args!("invalid version leaf: {e}")),
        }

        // Resolve targets under the lock, decode after releasing it so change
        // hooks may create or drop variables.
        let mut targets = Vec::new();
        {
            let items = self.items.read();
            for group in doc.groups() {
                let Some(entries) = items.get(group.name()) else {
                    self.log_error(format_args!("no group named {}", group.name()));
                    report.missing_groups.push(group.name().to_string());
                    continue;
                };

                for (name, node) in group.items() {
                    match entries.get(name).and_then(|entry| entry.slot.upgrade()) {
                        Some(slot) => targets.push((group.name(), name, slot, node)),
                        None => {
                            self.log_error(format_args!("no item named {name}"));
                            report
                                .missing_items
                                .push((group.name().to_string(), name.to_string()));
                        }
                    }
                }
            }
        }

        for (group, name, slot, node) in targets {
            match slot.decode(node) {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    self.log_error(format_args!("failed to decode {group}/{name}: {e}"));
                    report
                        .decode_failures
                        .push((group.to_string(), name.to_string()));
                }
            }
        }

        self.state.lock().loaded = true;
        crate::log_event!("registry", "loaded", "{} values", report.applied);
        report
    }

    /// Apply reloads queued by the watcher, on the calling thread.
    ///
    /// Call once per frame from the thread that owns the variables. Queued
    /// requests are coalesced into at most one load. Requests from a
    /// subscription that has since been dropped are discarded, as is the
    /// echo of this registry's own last save.
    pub fn process_reloads(&self) -> RegistryResult<Option<LoadReport>> {
        let (epoch, live, path, last_written) = {
            let state = self.state.lock();
            (
                state.epoch,
                state.live,
                state.path.clone(),
                state.last_written.clone(),
            )
        };

        let mut requested = false;
        for request in self.reload_rx.try_iter() {
            if live && request.epoch == epoch {
                requested = true;
            } else {
                crate::debug_event!("registry", "stale reload", "{}", request.path.display());
            }
        }
        if !requested {
            return Ok(None);
        }

        if let (Some(path), Some(written)) = (&path, &last_written) {
            let unchanged = fs::read_to_string(path)
                .map(|text| &text == written)
                .unwrap_or(false);
            if unchanged {
                crate::debug_event!("registry", "ignored own save", "{}", path.display());
                return Ok(None);
            }
        }

        self.load().map(Some)
    }

    /// Reload requests waiting for [`process_reloads`](Self::process_reloads).
    pub fn pending_reloads(&self) -> usize {
        self.reload_rx.len()
    }

    pub fn filepath(&self) -> Option<PathBuf> {
        self.state.lock().path.clone()
    }

    pub fn version(&self) -> i32 {
        self.state.lock().version
    }

    pub fn set_version(&self, version: i32) {
        self.state.lock().version = version;
    }

    /// Whether a load has completed since creation or the last reset.
    pub fn is_loaded(&self) -> bool {
        self.state.lock().loaded
    }

    pub fn is_live(&self) -> bool {
        self.state.lock().live
    }

    /// Number of error-level events logged by this registry.
    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Number of registered variables.
    pub fn len(&self) -> usize {
        self.items.read().values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn contains(&self, group: &str, name: &str) -> bool {
        self.items
            .read()
            .get(group)
            .is_some_and(|entries| entries.contains_key(name))
    }

    pub fn group_names(&self) -> Vec<String> {
        self.items.read().keys().cloned().collect()
    }

    /// Every registered variable, in save order.
    pub fn items(&self) -> Vec<VarInfo> {
        let items = self.items.read();
        let mut out = Vec::new();

        for (group, entries) in items.iter() {
            for (name, entry) in entries {
                let Some(slot) = entry.slot.upgrade() else {
                    continue;
                };
                let (min, max) = slot.range();
                out.push(VarInfo {
                    id: entry.id,
                    group: group.clone(),
                    name: name.clone(),
                    kind: slot.kind(),
                    min,
                    max,
                    value: slot.value(),
                });
            }
        }
        out
    }

    /// Return to the freshly created state.
    ///
    /// Drops all entries, watch subscriptions, queued reloads and the file
    /// path. Variables still alive become orphans; dropping them later logs
    /// a missing target. Intended for test teardown of the shared instance.
    pub fn reset(&self) {
        self.watch.unsubscribe_all();
        self.items.write().clear();
        {
            let mut state = self.state.lock();
            let epoch = state.epoch + 1;
            *state = FileState {
                epoch,
                ..FileState::default()
            };
        }
        self.reload_rx.try_iter().for_each(drop);
        self.errors.store(0, Ordering::Relaxed);
    }

    fn log_error(&self, message: fmt::Arguments<'_>) {
        tracing::error!("[registry] {message}");
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn report(&self, err: RegistryError) -> RegistryError {
        self.log_error(format_args!("{err}"));
        err
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Registry")
            .field("path", &state.path)
            .field("version", &state.version)
            .field("loaded", &state.loaded)
            .field("live", &state.live)
            .field("groups", &self.items.read().len())
            .finish()
    }
}
