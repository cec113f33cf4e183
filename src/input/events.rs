use crate::core::map::HandleId;
use crate::prelude::HashMap;
use std::collections::VecDeque;

/// State changes reported by the map lifecycle, the data source and layer sync
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// An engine instance was created for a mount target
    HandleCreated { handle: HandleId, container: String },
    /// The engine finished its first load
    Ready { handle: HandleId, container: String },
    /// The engine instance was destroyed
    HandleDestroyed { handle: HandleId, container: String },
    /// A feature collection replaced the previous value
    DataLoaded { url: String, features: usize },
    /// A fetch failed; the previous value is kept
    FetchFailed { url: String, message: String },
    /// Layer sync changed the engine
    LayersSynced {
        handle: HandleId,
        markers_added: usize,
        markers_removed: usize,
        source_added: bool,
        layers_added: usize,
    },
}

impl MapEvent {
    /// Listener key for this event
    pub fn kind(&self) -> &'static str {
        match self {
            MapEvent::HandleCreated { .. } => "handlecreated",
            MapEvent::Ready { .. } => "ready",
            MapEvent::HandleDestroyed { .. } => "handledestroyed",
            MapEvent::DataLoaded { .. } => "dataloaded",
            MapEvent::FetchFailed { .. } => "fetchfailed",
            MapEvent::LayersSynced { .. } => "layerssynced",
        }
    }
}

/// Event listener callback type
pub type EventCallback = Box<dyn Fn(&MapEvent) + Send + Sync>;

/// Queues map events and hands them to listeners when processed
#[derive(Default)]
pub struct EventManager {
    /// Event listeners by event kind
    listeners: HashMap<String, Vec<EventCallback>>,
    event_queue: VecDeque<MapEvent>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one event kind (see [`MapEvent::kind`])
    pub fn on<F>(&mut self, kind: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.listeners
            .entry(kind.to_string())
            .or_default()
            .push(Box::new(callback));
    }

    pub fn emit(&mut self, event: MapEvent) {
        self.event_queue.push_back(event);
    }

    pub fn emit_all(&mut self, events: impl IntoIterator<Item = MapEvent>) {
        self.event_queue.extend(events);
    }

    /// Dispatches all queued events in order and returns them
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        let events: Vec<_> = self.event_queue.drain(..).collect();

        for event in &events {
            if let Some(callbacks) = self.listeners.get(event.kind()) {
                for callback in callbacks {
                    callback(event);
                }
            }
        }

        events
    }

    pub fn clear_events(&mut self) {
        self.event_queue.clear();
    }

    pub fn pending_events(&self) -> usize {
        self.event_queue.len()
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventManager")
            .field("listeners", &self.listeners.len())
            .field("event_queue", &self.event_queue)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_listeners_receive_matching_events() {
        let mut manager = EventManager::new();
        let loaded = Arc::new(AtomicUsize::new(0));
        let counter = loaded.clone();
        manager.on("dataloaded", move |event| {
            if let MapEvent::DataLoaded { features, .. } = event {
                counter.fetch_add(*features, Ordering::SeqCst);
            }
        });

        manager.emit(MapEvent::DataLoaded {
            url: "http://localhost/a".into(),
            features: 3,
        });
        manager.emit(MapEvent::FetchFailed {
            url: "http://localhost/b".into(),
            message: "HTTP 500".into(),
        });
        assert_eq!(manager.pending_events(), 2);

        let processed = manager.process_events();
        assert_eq!(processed.len(), 2);
        assert_eq!(processed[1].kind(), "fetchfailed");
        assert_eq!(loaded.load(Ordering::SeqCst), 3);
        assert_eq!(manager.pending_events(), 0);
    }

    #[test]
    fn test_clear_events() {
        let mut manager = EventManager::new();
        manager.emit_all(vec![
            MapEvent::DataLoaded {
                url: String::new(),
                features: 0,
            };
            4
        ]);
        manager.clear_events();
        assert!(manager.process_events().is_empty());
    }
}
