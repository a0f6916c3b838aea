// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Ordered slide collection.
//!
//! Insertion order is presentation order. New slides are labelled with
//! their 1-based position at creation time; labels are never renumbered
//! when slides move or go away.

use super::slide::{SlideEntry, SlideId, SlideKind};
use crate::error::{ProjectError, Result};
use serde_json::Value;
use std::path::Path;

/// Change notifications for whoever displays the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionEvent {
    Inserted(SlideId),
    Moved { id: SlideId, from: usize, to: usize },
    Removed(SlideId),
}

#[derive(Debug, Clone, Default)]
pub struct SlideCollection {
    entries: Vec<SlideEntry>,
    next_id: u64,
    events: Vec<CollectionEvent>,
}

impl SlideCollection {
    /// An empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an empty slide named after the next position.
    ///
    /// The slide is not inserted; call [`SlideCollection::insert`] for that.
    pub fn create_entry(&mut self, kind: SlideKind) -> SlideEntry {
        let id = self.allocate_id();
        SlideEntry::new(id, kind, (self.count() + 1).to_string())
    }

    /// Build a slide from a slide document, dispatching on its `type`.
    pub fn create_from_document(&mut self, doc: &Value, project_file: &Path) -> Result<SlideEntry> {
        let kind = SlideKind::from_document(doc)?;
        let mut entry = self.create_entry(kind);
        entry.deserialize(doc, project_file)?;
        Ok(entry)
    }

    /// Append a slide at the end.
    pub fn insert(&mut self, entry: SlideEntry) {
        log::debug!(
            "Inserted {} {} '{}' at {}",
            entry.kind().type_literal(),
            entry.id(),
            entry.name,
            self.entries.len()
        );
        self.events.push(CollectionEvent::Inserted(entry.id()));
        self.entries.push(entry);
    }

    /// Move a slide by `delta` positions.
    ///
    /// Returns `Ok(false)` without touching anything when the target
    /// position falls outside the collection.
    pub fn move_by(&mut self, id: SlideId, delta: isize) -> Result<bool> {
        let from = self.index_of(id).ok_or(ProjectError::NotFound(id))?;
        let to = match from.checked_add_signed(delta) {
            Some(to) if to < self.entries.len() => to,
            _ => return Ok(false),
        };
        if to == from {
            return Ok(false);
        }

        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        log::debug!("Moved slide {} from {} to {}", id, from, to);
        self.events.push(CollectionEvent::Moved { id, from, to });
        Ok(true)
    }

    /// Remove a slide. Remaining names are left as they are.
    pub fn remove(&mut self, id: SlideId) -> Result<SlideEntry> {
        let index = self.index_of(id).ok_or(ProjectError::NotFound(id))?;
        let entry = self.entries.remove(index);
        log::debug!("Removed slide {} '{}'", id, entry.name);
        self.events.push(CollectionEvent::Removed(id));
        Ok(entry)
    }

    /// Number of slides.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Current position of a slide, if it is in the collection.
    pub fn index_of(&self, id: SlideId) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    /// Look up a slide by handle.
    pub fn get(&self, id: SlideId) -> Option<&SlideEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Look up a slide by handle for editing.
    pub fn get_mut(&mut self, id: SlideId) -> Option<&mut SlideEntry> {
        self.entries.iter_mut().find(|e| e.id() == id)
    }

    /// Slides in presentation order.
    pub fn iter(&self) -> impl Iterator<Item = &SlideEntry> {
        self.entries.iter()
    }

    /// Take the change notifications recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<CollectionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Replace the slides wholesale, keeping the id counter monotonic.
    pub(crate) fn restore(&mut self, entries: Vec<SlideEntry>) {
        if let Some(max) = entries.iter().map(|e| e.id().0).max() {
            self.next_id = self.next_id.max(max + 1);
        }
        self.entries = entries;
    }

    pub(crate) fn snapshot(&self) -> Vec<SlideEntry> {
        self.entries.clone()
    }

    fn allocate_id(&mut self) -> SlideId {
        let id = SlideId(self.next_id);
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection_with(n: usize) -> (SlideCollection, Vec<SlideId>) {
        let mut collection = SlideCollection::new();
        let mut ids = Vec::new();
        for _ in 0..n {
            let entry = collection.create_entry(SlideKind::MediaComposition);
            ids.push(entry.id());
            collection.insert(entry);
        }
        (collection, ids)
    }

    fn names(collection: &SlideCollection) -> Vec<String> {
        collection.iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn test_create_does_not_insert() {
        let mut collection = SlideCollection::new();
        let entry = collection.create_entry(SlideKind::WaypointList);
        assert_eq!(entry.name, "1");
        assert_eq!(collection.count(), 0);

        // Same count, same label until something is inserted
        let again = collection.create_entry(SlideKind::MediaComposition);
        assert_eq!(again.name, "1");
        assert_ne!(entry.id(), again.id());
    }

    #[test]
    fn test_sequential_names() {
        let (collection, _) = collection_with(3);
        assert_eq!(names(&collection), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_names_not_renumbered_after_remove() {
        let (mut collection, ids) = collection_with(3);
        collection.remove(ids[1]).unwrap();
        assert_eq!(names(&collection), vec!["1", "3"]);

        let entry = collection.create_entry(SlideKind::MediaComposition);
        collection.insert(entry);
        assert_eq!(names(&collection), vec!["1", "3", "3"]);
    }

    #[test]
    fn test_move_by_swaps_with_neighbor() {
        let (mut collection, ids) = collection_with(4);
        assert!(collection.move_by(ids[1], 1).unwrap());
        assert_eq!(names(&collection), vec!["1", "3", "2", "4"]);

        assert!(collection.move_by(ids[1], -2).unwrap());
        assert_eq!(names(&collection), vec!["2", "1", "3", "4"]);
    }

    #[test]
    fn test_move_by_out_of_bounds_is_noop() {
        let (mut collection, ids) = collection_with(3);
        let before = collection.snapshot();

        assert!(!collection.move_by(ids[0], -1).unwrap());
        assert!(!collection.move_by(ids[2], 1).unwrap());
        assert!(!collection.move_by(ids[1], 5).unwrap());
        assert_eq!(collection.snapshot(), before);
    }

    #[test]
    fn test_unknown_handle_is_not_found() {
        let (mut collection, ids) = collection_with(2);
        let removed = collection.remove(ids[0]).unwrap();

        assert!(matches!(
            collection.move_by(removed.id(), 1),
            Err(ProjectError::NotFound(id)) if id == removed.id()
        ));
        assert!(matches!(
            collection.remove(removed.id()),
            Err(ProjectError::NotFound(_))
        ));
        assert_eq!(collection.count(), 1);
    }

    #[test]
    fn test_create_from_document() {
        let mut collection = SlideCollection::new();
        let doc = json!({"type": "gps_slide", "name": "Route", "gps_coordinates": ["1, 2"]});
        let entry = collection
            .create_from_document(&doc, Path::new("/p/story.json"))
            .unwrap();
        assert_eq!(entry.kind(), SlideKind::WaypointList);
        assert_eq!(entry.name, "Route");

        let err = collection
            .create_from_document(&json!({"type": "bogus_slide"}), Path::new("/p/story.json"))
            .unwrap_err();
        assert!(matches!(err, ProjectError::UnknownSlideType { .. }));
    }

    #[test]
    fn test_events_are_recorded_and_drained() {
        let (mut collection, ids) = collection_with(2);
        collection.move_by(ids[0], 1).unwrap();
        collection.move_by(ids[0], 1).unwrap();
        collection.remove(ids[1]).unwrap();

        let events = collection.drain_events();
        assert_eq!(
            events,
            vec![
                CollectionEvent::Inserted(ids[0]),
                CollectionEvent::Inserted(ids[1]),
                CollectionEvent::Moved { id: ids[0], from: 0, to: 1 },
                CollectionEvent::Removed(ids[1]),
            ]
        );
        assert!(collection.drain_events().is_empty());
    }

    #[test]
    fn test_restore_keeps_ids_unique() {
        let (mut collection, _) = collection_with(2);
        let snapshot = collection.snapshot();
        collection.restore(Vec::new());
        collection.restore(snapshot);

        let fresh = collection.create_entry(SlideKind::MediaComposition);
        assert!(collection.iter().all(|e| e.id() != fresh.id()));
    }
}
