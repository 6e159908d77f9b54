//! Forward-only cursor over record identifiers.

use parking_lot::Mutex;

/// Last fully-processed record identifier.
///
/// `None` until the first tick establishes the starting position. Movement
/// is monotonically non-decreasing; `advance_to` with an older id is a
/// no-op. Mutation happens only inside the detector's sequential tick; the
/// lock exists for concurrent status reads.
#[derive(Debug, Default)]
pub struct Cursor {
    value: Mutex<Option<i64>>,
}

impl Cursor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the starting position has been established.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.value.lock().is_some()
    }

    /// Current position, if initialized.
    #[must_use]
    pub fn get(&self) -> Option<i64> {
        *self.value.lock()
    }

    /// Establish the starting position. Later calls are ignored.
    pub fn initialize(&self, id: i64) {
        let mut value = self.value.lock();
        if value.is_none() {
            *value = Some(id);
        }
    }

    /// Move forward to `id`; never moves backwards.
    pub fn advance_to(&self, id: i64) {
        let mut value = self.value.lock();
        match *value {
            Some(current) if current >= id => {}
            _ => *value = Some(id),
        }
    }
}
