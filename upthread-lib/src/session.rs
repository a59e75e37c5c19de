use crate::error::{Error, ErrorKind};
use parking_lot::RwLock;

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub name: String,
}

/// Holds the current viewer, if anybody is signed in.
#[derive(Debug, Default)]
pub struct Session {
    viewer: RwLock<Option<Viewer>>,
}

impl Session {
    pub fn new() -> Session {
        Session::default()
    }

    pub fn sign_in(&self, name: &str) -> Result<Viewer, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ErrorKind::EmptyUsername.into());
        }
        let viewer = Viewer {
            name: name.to_owned(),
        };
        *self.viewer.write() = Some(viewer.clone());
        Ok(viewer)
    }

    pub fn sign_out(&self) -> Option<Viewer> {
        self.viewer.write().take()
    }

    pub fn viewer(&self) -> Option<Viewer> {
        self.viewer.read().clone()
    }
}
