//! Edit Queue
//!
//! FIFO of pending edits, coalesced per source unit: a later edit of the
//! same unit replaces the earlier one and moves to the back.

use super::event::EditEvent;

#[derive(Debug, Default)]
pub struct EditQueue {
    events: Vec<EditEvent>,
}

impl EditQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: EditEvent) {
        self.events.retain(|e| e.source_unit != event.source_unit);
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = EditEvent>) {
        for event in events {
            self.push(event);
        }
    }

    /// Put back a batch that was not processed. Edits queued since the batch
    /// was taken stay newer.
    pub fn requeue(&mut self, batch: Vec<EditEvent>) {
        let newer = std::mem::replace(&mut self.events, batch);
        self.extend(newer);
    }

    /// Take every pending edit, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<EditEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.source_unit.as_str())
    }
}

// =============================================================================
// Tests
// =============================================================================
