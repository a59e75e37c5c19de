use crate::api::RemoteApi;
use crate::comms::ToOverlordMessage;
use crate::error::Error;
use crate::globals::GLOBALS;
use crate::query::{Mutation, QueryKey};
use crate::RunState;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch::Receiver as WatchReceiver;
use tokio::task;

/// The overlord handles any operation that involves talking to the backend.
///
/// There are two ways to engage the Overlord to do something:
///
/// 1. Call a function on it. This works from an async context.
/// 2. Send it a message using `GLOBALS.to_overlord`. This works from a synchronous
///    context, but does not wait for or deliver a result. This is how the
///    immediate-mode renderer (egui) engages the Overlord.
pub struct Overlord {
    inbox: UnboundedReceiver<ToOverlordMessage>,
    api: Arc<dyn RemoteApi>,
    read_runstate: WatchReceiver<RunState>,

    // Resolves and mutations in flight
    tasks: task::JoinSet<()>,
}

impl Overlord {
    /// Create the overlord. You will have to steal the receiver from GLOBALS:
    ///
    /// ```
    /// # use std::ops::DerefMut;
    /// # #[tokio::main]
    /// # async fn main() {
    /// #   use upthread_lib::GLOBALS;
    /// let overlord_receiver = {
    ///   let mut mutex_option = GLOBALS.tmp_overlord_receiver.lock().await;
    ///   mutex_option.deref_mut().take()
    /// }.unwrap();
    ///
    /// let api = std::sync::Arc::new(upthread_lib::api::MemoryApi::demo());
    /// let mut overlord = upthread_lib::Overlord::new(overlord_receiver, api);
    /// # }
    /// ```
    pub fn new(inbox: UnboundedReceiver<ToOverlordMessage>, api: Arc<dyn RemoteApi>) -> Overlord {
        Overlord {
            inbox,
            api,
            read_runstate: GLOBALS.read_runstate.clone(),
            tasks: task::JoinSet::new(),
        }
    }

    /// This runs the overlord. This blocks for the entire duration and only exits
    /// when the overlord receives a signal to shutdown.
    pub async fn run(&mut self) {
        if let Err(e) = self.run_inner().await {
            tracing::error!("{}", e);
        }

        let _ = GLOBALS.write_runstate.send(RunState::ShuttingDown);

        // Outstanding requests have nobody left to show their results to
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}

        tracing::info!("Overlord has shut down");
    }

    async fn run_inner(&mut self) -> Result<(), Error> {
        if GLOBALS.settings.read().offline {
            let _ = GLOBALS.write_runstate.send(RunState::Offline);
        } else if *self.read_runstate.borrow() != RunState::ShuttingDown {
            let _ = GLOBALS.write_runstate.send(RunState::Online);
        }

        let mut invalidations = GLOBALS.queries.subscribe();

        'mainloop: loop {
            tokio::select! {
                message = self.inbox.recv() => {
                    let message = match message {
                        Some(m) => m,
                        None => {
                            // All senders dropped
                            return Ok(());
                        }
                    };
                    self.dispatch(message);
                },
                _ = self.read_runstate.changed() => {
                    if *self.read_runstate.borrow_and_update() == RunState::ShuttingDown {
                        break 'mainloop;
                    }
                },
                key = invalidations.recv() => {
                    match key {
                        // stale data on screen; wake the UI so it refetches
                        Ok(_) | Err(RecvError::Lagged(_)) => GLOBALS.notify_ui_redraw.notify_waiters(),
                        Err(RecvError::Closed) => break 'mainloop,
                    }
                },
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!("Request task panicked: {}", e);
                        }
                    }
                },
            }

            if GLOBALS.shutting_down.load(Ordering::Relaxed) {
                break 'mainloop;
            }
        }

        Ok(())
    }

    /// Handle a message. Errors land in the log and in front of the user.
    fn dispatch(&mut self, message: ToOverlordMessage) {
        if let Err(e) = self.handle_message(message) {
            tracing::error!("{}", e);
            GLOBALS.write_status(e.kind.to_string());
        }
    }

    fn handle_message(&mut self, message: ToOverlordMessage) -> Result<(), Error> {
        match message {
            ToOverlordMessage::Mutate(mutation) => {
                self.mutate(mutation);
            }
            ToOverlordMessage::RefreshAll => {
                GLOBALS.queries.invalidate_all();
            }
            ToOverlordMessage::Resolve(key) => {
                self.resolve(key);
            }
            ToOverlordMessage::SaveSettings => {
                GLOBALS.settings.read().save()?;
                GLOBALS.write_status("Settings saved.".to_owned());
            }
            ToOverlordMessage::SignIn(name) => {
                Self::sign_in(&name)?;
            }
            ToOverlordMessage::SignOut => {
                Self::sign_out()?;
            }
            ToOverlordMessage::Shutdown => {
                tracing::info!("Overlord shutting down");
                let _ = GLOBALS.write_runstate.send(RunState::ShuttingDown);
            }
        }

        Ok(())
    }

    /// Fetch a query in the background and store the result in `GLOBALS.queries`.
    /// The caller should have claimed the fetch with `begin_fetch` first.
    pub fn resolve(&mut self, key: QueryKey) {
        let api = self.api.clone();
        self.tasks.spawn(async move {
            tracing::debug!("Resolving {}", key);
            if let Err(e) = GLOBALS.queries.resolve(&key, &*api).await {
                tracing::warn!("{} failed: {}", key, e);
            }
            GLOBALS.notify_ui_redraw.notify_waiters();
        });
    }

    /// Execute a mutation in the background. Its dependent queries are
    /// invalidated when it finishes, successfully or not.
    pub fn mutate(&mut self, mutation: Mutation) {
        let api = self.api.clone();
        self.tasks.spawn(async move {
            if let Err(e) = GLOBALS.queries.mutate(&mutation, &*api).await {
                tracing::error!("{:?} failed: {}", mutation, e);
                GLOBALS.write_status(format!("Vote failed: {}", e.kind));
            }
        });
    }

    /// Start a session. Vote state depends on who is looking, so every vote
    /// query is refetched.
    pub fn sign_in(name: &str) -> Result<(), Error> {
        let viewer = GLOBALS.session.sign_in(name)?;
        tracing::info!("Signed in as {}", viewer.name);
        GLOBALS.settings.write().last_username = Some(viewer.name.clone());
        GLOBALS.queries.invalidate_votes();
        GLOBALS.write_status(format!("Signed in as {}", viewer.name));
        Ok(())
    }

    pub fn sign_out() -> Result<(), Error> {
        if let Some(viewer) = GLOBALS.session.sign_out() {
            tracing::info!("Signed out {}", viewer.name);
            GLOBALS.settings.write().last_username = None;
            GLOBALS.queries.invalidate_votes();
            GLOBALS.write_status("Signed out.".to_owned());
        }
        Ok(())
    }
}
