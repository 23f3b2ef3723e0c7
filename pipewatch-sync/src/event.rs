//! One-shot notifications published beside the snapshot

/// Text shown to the operator when a run found no new mail
pub const NO_NEW_ITEMS_NOTICE: &str = "No new mails to fetch";

/// A transient notification, delivered once per occurrence
///
/// Events are not part of the snapshot: a consumer that subscribes late
/// does not see past events. An event tied to a snapshot change is published
/// before that snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A run finished without finding anything to process
    NoNewItems { message: String },
    /// Polling gave up after too many consecutive failed ticks
    ///
    /// The snapshot keeps its last good value until the view is
    /// re-initialized or reset.
    PollingSuspended {
        consecutive_failures: u32,
        last_error: String,
    },
}

impl SyncEvent {
    pub(crate) fn no_new_items() -> Self {
        Self::NoNewItems {
            message: NO_NEW_ITEMS_NOTICE.to_string(),
        }
    }
}
