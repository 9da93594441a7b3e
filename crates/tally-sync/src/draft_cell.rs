//! Shared, observable draft state.

use std::sync::Arc;

use tally_core::draft::{ArgumentInput, DraftSnapshot};
use tokio::sync::watch;

/// The draft being edited, shared between the editing surface and the
/// auto-saver. Cloning shares the same draft.
#[derive(Debug, Clone)]
pub struct DraftCell {
    tx: Arc<watch::Sender<DraftSnapshot>>,
}

impl DraftCell {
    #[must_use]
    pub fn new(initial: DraftSnapshot) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Current value, cloned.
    #[must_use]
    pub fn snapshot(&self) -> DraftSnapshot {
        self.tx.borrow().clone()
    }

    /// Apply an in-place edit.
    pub fn edit(&self, f: impl FnOnce(&mut DraftSnapshot)) {
        self.tx.send_modify(f);
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.edit(|d| d.data.title = title);
    }

    pub fn set_description(&self, description: Option<String>) {
        self.edit(|d| d.data.description = description);
    }

    pub fn push_argument(&self, argument: ArgumentInput) {
        self.edit(|d| d.arguments.push(argument));
    }

    /// Remove the argument at `index`. Returns it if the index was valid.
    pub fn remove_argument(&self, index: usize) -> Option<ArgumentInput> {
        let mut removed = None;
        self.tx.send_if_modified(|d| {
            if index < d.arguments.len() {
                removed = Some(d.arguments.remove(index));
                true
            } else {
                false
            }
        });
        removed
    }

    /// Swap the title to `to` only if it still reads `from`. Returns whether
    /// it did.
    pub fn replace_title_if(&self, from: &str, to: &str) -> bool {
        self.tx.send_if_modified(|d| {
            if d.data.title == from && from != to {
                d.data.title = to.to_string();
                true
            } else {
                false
            }
        })
    }

    /// Receiver that sees every edit.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DraftSnapshot> {
        self.tx.subscribe()
    }
}

impl Default for DraftCell {
    fn default() -> Self {
        Self::new(DraftSnapshot::default())
    }
}
