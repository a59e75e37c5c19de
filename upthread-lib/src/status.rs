use std::time::{Duration, Instant};

/// A queue of up to three status messages for the UI, generally
/// representing notices or errors from disconnected backend processes.
/// Messages are transient: `expire` clears the ones older than a limit.
pub struct StatusQueue {
    head: usize,
    messages: [(String, Option<Instant>); 3],
}

impl Default for StatusQueue {
    fn default() -> StatusQueue {
        StatusQueue {
            head: 0,
            messages: [
                ("".to_owned(), None),
                ("".to_owned(), None),
                ("".to_owned(), None),
            ],
        }
    }
}

impl StatusQueue {
    pub fn new(initial: String) -> StatusQueue {
        let mut sq: StatusQueue = Default::default();
        sq.write(initial);
        sq
    }

    pub fn read_all(&self) -> [String; 3] {
        [
            self.messages[self.head].0.clone(),
            self.messages[(self.head + 1) % 3].0.clone(),
            self.messages[(self.head + 2) % 3].0.clone(),
        ]
    }

    pub fn read_last(&self) -> String {
        self.messages[self.head].0.clone()
    }

    pub fn write(&mut self, message: String) {
        self.head = (self.head + 2) % 3; // like -1, but modular safe
        self.messages[self.head] = (message, Some(Instant::now()));
    }

    pub fn dismiss(&mut self, offset: usize) {
        self.messages[(self.head + offset) % 3] = ("".to_owned(), None);
    }

    /// Clear every message written more than `max_age` ago
    pub fn expire(&mut self, max_age: Duration) {
        for slot in self.messages.iter_mut() {
            if let Some(when) = slot.1 {
                if when.elapsed() > max_age {
                    *slot = ("".to_owned(), None);
                }
            }
        }
    }
}
