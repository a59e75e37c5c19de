use crate::comms::ToOverlordMessage;
use crate::error::Error;
use crate::post_card::VoteSink;
use crate::query::{Mutation, QueryCache, QueryKey, QuerySnapshot};
use crate::session::{Session, Viewer};
use crate::settings::Settings;
use crate::status::StatusQueue;
use crate::RunState;
use parking_lot::RwLock as PRwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, watch, Mutex, Notify};

/// Global data shared between threads. Access via the static ref `GLOBALS`.
pub struct Globals {
    /// This is a mpsc channel. The Overlord listens on it.
    /// To create a sender, just clone() it.
    pub to_overlord: mpsc::UnboundedSender<ToOverlordMessage>,

    /// This is ephemeral. It is filled during lazy_static initialization,
    /// and needs to be stolen away and given to the Overlord when the Overlord
    /// is created.
    pub tmp_overlord_receiver: Mutex<Option<mpsc::UnboundedReceiver<ToOverlordMessage>>>,

    /// This is a watch channel for making changes to the RunState.
    pub write_runstate: watch::Sender<RunState>,

    /// This is a watch channel for watching for changes to the RunState.
    pub read_runstate: watch::Receiver<RunState>,

    /// Set when the UI has closed
    pub shutting_down: AtomicBool,

    pub settings: PRwLock<Settings>,

    /// Who is signed in
    pub session: Session,

    /// Remote query results
    pub queries: QueryCache,

    /// UI status messages
    pub status_queue: PRwLock<StatusQueue>,

    /// Notify the UI to redraw.
    pub notify_ui_redraw: Notify,
}

lazy_static! {
    /// A static reference to global data shared between threads.
    pub static ref GLOBALS: Globals = {
        // Setup a communications channel from the UI to the Overlord.
        let (to_overlord, tmp_overlord_receiver) = mpsc::unbounded_channel();

        let (write_runstate, read_runstate) = watch::channel(RunState::Initializing);

        Globals {
            to_overlord,
            tmp_overlord_receiver: Mutex::new(Some(tmp_overlord_receiver)),
            write_runstate,
            read_runstate,
            shutting_down: AtomicBool::new(false),
            settings: PRwLock::new(Settings::default()),
            session: Session::new(),
            queries: QueryCache::new(),
            status_queue: PRwLock::new(StatusQueue::new(
                "Welcome to Upthread. Status messages will appear here. Click them to dismiss them.".to_owned()
            )),
            notify_ui_redraw: Notify::new(),
        }
    };
}

impl Globals {
    /// Read a query for rendering, asking the overlord to fetch it if it is
    /// missing or has been invalidated.
    pub fn watch_query(&self, key: QueryKey) -> Option<QuerySnapshot> {
        if self.queries.begin_fetch(&key) {
            if let Err(e) = self.to_overlord.send(ToOverlordMessage::Resolve(key.clone())) {
                tracing::error!("{}", e);
            }
        }
        self.queries.snapshot(&key)
    }

    pub fn write_status(&self, message: String) {
        self.status_queue.write().write(message);
        self.notify_ui_redraw.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Relaxed)
    }
}

impl VoteSink for Globals {
    fn viewer(&self) -> Option<Viewer> {
        self.session.viewer()
    }

    fn notify(&self, message: String) {
        self.write_status(message);
    }

    fn submit(&self, mutation: Mutation) -> Result<u64, Error> {
        self.to_overlord
            .send(ToOverlordMessage::Mutate(mutation.clone()))?;
        // a refused send must not leave a ticket behind
        Ok(self.queries.register_mutation(&mutation))
    }
}
