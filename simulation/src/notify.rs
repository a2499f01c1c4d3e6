//! Kill notification sinks.
//!
//! Sinks may block on I/O. The threaded simulation therefore never calls them
//! from the combat worker: each resolution pass hands its events to a
//! [`KillDispatcher`], whose own thread delivers them to every sink in the
//! order they were discovered.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, warn};

use crate::components::KillEvent;
use crate::error::Result;

/// Receives `(killer, victim)` pairs.
pub trait KillObserver: Send + Sync {
    fn on_kill(&self, killer: &str, victim: &str);
}

/// Prints `[EVENT] <killer> killed <victim>` to stdout.
#[derive(Debug, Default)]
pub struct ConsoleObserver;

impl KillObserver for ConsoleObserver {
    fn on_kill(&self, killer: &str, victim: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "[EVENT] {killer} killed {victim}");
    }
}

/// Appends one timestamped line per kill to a log file.
#[derive(Debug, Clone)]
pub struct FileObserver {
    path: PathBuf,
}

impl FileObserver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append(&self, killer: &str, victim: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(
            file,
            "[{}] {killer} killed {victim}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f")
        )
    }
}

impl KillObserver for FileObserver {
    fn on_kill(&self, killer: &str, victim: &str) {
        if let Err(e) = self.append(killer, victim) {
            warn!("Kill log {} not written: {}", self.path.display(), e);
        }
    }
}

/// Ordered fan-out to zero or more sinks.
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn KillObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, observer: Arc<dyn KillObserver>) {
        self.observers.push(observer);
    }

    /// Drop a sink previously added, matched by identity.
    pub fn remove(&mut self, observer: &Arc<dyn KillObserver>) {
        self.observers.retain(|o| !Arc::ptr_eq(o, observer));
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn notify(&self, event: &KillEvent) {
        for observer in &self.observers {
            observer.on_kill(&event.killer, &event.victim);
        }
    }
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSet")
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Handle used by producers to queue a batch of kill events.
pub type KillSender = Sender<Vec<KillEvent>>;

/// Background thread delivering queued kill events to an [`ObserverSet`].
pub struct KillDispatcher {
    sender: Option<KillSender>,
    handle: Option<JoinHandle<()>>,
}

impl KillDispatcher {
    pub fn spawn(observers: ObserverSet) -> Result<Self> {
        let (sender, receiver) = unbounded();
        let handle = thread::Builder::new()
            .name("kill-dispatch".into())
            .spawn(move || deliver(receiver, observers))?;
        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// New producer handle. Delivery ends once every handle is dropped and
    /// [`KillDispatcher::shutdown`] has been called.
    pub fn sender(&self) -> Option<KillSender> {
        self.sender.clone()
    }

    /// Stop accepting events, deliver what is queued and join the thread.
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for KillDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn deliver(receiver: Receiver<Vec<KillEvent>>, observers: ObserverSet) {
    for batch in receiver {
        debug!("Delivering {} kill event(s)", batch.len());
        for event in &batch {
            observers.notify(event);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Sink that remembers every event it sees.
    #[derive(Default)]
    pub(crate) struct RecordingObserver {
        pub events: Mutex<Vec<KillEvent>>,
    }

    impl RecordingObserver {
        pub fn events(&self) -> Vec<KillEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl KillObserver for RecordingObserver {
        fn on_kill(&self, killer: &str, victim: &str) {
            self.events
                .lock()
                .unwrap()
                .push(KillEvent::new(killer, victim));
        }
    }

    #[test]
    fn test_fan_out_reaches_every_sink() {
        let first = Arc::new(RecordingObserver::default());
        let second = Arc::new(RecordingObserver::default());
        let mut set = ObserverSet::new();
        set.add(first.clone());
        set.add(second.clone());

        set.notify(&KillEvent::new("Bear1", "Bittern1"));

        assert_eq!(first.events(), vec![KillEvent::new("Bear1", "Bittern1")]);
        assert_eq!(first.events(), second.events());
    }

    #[test]
    fn test_remove_observer() {
        let kept = Arc::new(RecordingObserver::default());
        let removed: Arc<dyn KillObserver> = Arc::new(RecordingObserver::default());
        let mut set = ObserverSet::new();
        set.add(kept.clone());
        set.add(removed.clone());
        set.remove(&removed);

        assert_eq!(set.len(), 1);
        set.notify(&KillEvent::new("a", "b"));
        assert_eq!(kept.events().len(), 1);
    }

    #[test]
    fn test_file_observer_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let sink = FileObserver::new(&path);

        sink.on_kill("Bear1", "Bit1");
        sink.on_kill("Desman1", "Bear1");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("Bear1 killed Bit1"));
        assert!(lines[1].ends_with("Desman1 killed Bear1"));
    }

    #[test]
    fn test_dispatcher_preserves_order_and_drains() {
        let sink = Arc::new(RecordingObserver::default());
        let mut set = ObserverSet::new();
        set.add(sink.clone());

        let mut dispatcher = KillDispatcher::spawn(set).unwrap();
        let sender = dispatcher.sender().unwrap();
        sender
            .send(vec![KillEvent::new("a", "b"), KillEvent::new("c", "d")])
            .unwrap();
        sender.send(vec![KillEvent::new("e", "f")]).unwrap();
        drop(sender);

        dispatcher.shutdown();
        dispatcher.shutdown();

        assert_eq!(
            sink.events(),
            vec![
                KillEvent::new("a", "b"),
                KillEvent::new("c", "d"),
                KillEvent::new("e", "f"),
            ]
        );
        assert!(dispatcher.sender().is_none());
    }
}
