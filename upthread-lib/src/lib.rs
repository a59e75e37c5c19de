#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]

//! Upthread client library.
//!
//! Everything the UI needs apart from drawing: the backend clients, the query
//! cache, the per-post vote controller, the session and settings. The UI talks
//! to the [Overlord] through `GLOBALS.to_overlord` and reads results back out
//! of `GLOBALS.queries` on each frame.

/// Backend clients
pub mod api;

mod comms;
pub use comms::ToOverlordMessage;

mod error;
pub use error::{Error, ErrorKind};

mod globals;
pub use globals::{Globals, GLOBALS};

mod overlord;
pub use overlord::Overlord;

mod post;
pub use post::{Comment, Post, PostId, Route, Subreddit};

mod post_card;
pub use post_card::{PostCard, VoteOutcome, VoteSink};

mod query;
pub use query::{Mutation, QueryCache, QueryData, QueryKey, QuerySnapshot, QueryStatus};

mod session;
pub use session::{Session, Viewer};

mod settings;
pub use settings::Settings;

mod status;
pub use status::StatusQueue;

mod vote;
pub use vote::{display_count, tally, Vote, VoteState};

#[macro_use]
extern crate lazy_static;

use std::fmt;
use std::ops::DerefMut;

/// The USER_AGENT string sent with backend requests
pub static USER_AGENT: &str = concat!("upthread/", env!("CARGO_PKG_VERSION"));

/// The state that the Overlord is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Initializing,
    Offline,
    Online,
    ShuttingDown,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Initializing => write!(f, "Initializing"),
            RunState::Offline => write!(f, "Offline"),
            RunState::Online => write!(f, "Online"),
            RunState::ShuttingDown => write!(f, "Shutting Down"),
        }
    }
}

/// Initialize upthread-lib: load settings and restore the last session
pub fn init() -> Result<(), Error> {
    let settings = Settings::load()?;

    if let Some(name) = &settings.last_username {
        match GLOBALS.session.sign_in(name) {
            Ok(viewer) => tracing::info!("Restored session for {}", viewer.name),
            Err(e) => tracing::warn!("Could not restore session: {}", e),
        }
    }

    *GLOBALS.settings.write() = settings;

    Ok(())
}

/// Run the overlord until shutdown
pub async fn run() {
    let overlord_receiver = {
        let mut mutex_option = GLOBALS.tmp_overlord_receiver.lock().await;
        mutex_option.deref_mut().take()
    };
    let overlord_receiver = match overlord_receiver {
        Some(r) => r,
        None => {
            tracing::error!("The overlord is already running");
            return;
        }
    };

    // Without a backend the overlord still runs, so queries fail visibly
    let settings = GLOBALS.settings.read().clone();
    let (api, error) = api::connect(&settings);
    if let Some(e) = error {
        GLOBALS.write_status(format!("Cannot reach the backend: {}", e.kind));
    }

    let mut overlord = Overlord::new(overlord_receiver, api);
    overlord.run().await;
}

/// Shutdown upthread-lib, saving settings
pub fn shutdown() -> Result<(), Error> {
    GLOBALS.settings.read().save()?;
    tracing::info!("Settings saved.");
    Ok(())
}
