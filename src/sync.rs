//! Playback synchronization between time-based media tags.
//!
//! Tags sharing a `sync` group name exchange play/pause/seek/speed events
//! through a [`SyncManager`]. An event sent into a group is delivered to
//! every member except its origin, and the (group, event name) pair is locked
//! for the rest of the frame so a receiver reacting by re-emitting the same
//! event cannot echo it back and forth. The host advances frames explicitly
//! with [`SyncManager::tick`].

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// One synchronization event. `name` selects the handler; the payload fields
/// are filled per event kind.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncEvent {
    pub name: String,
    /// Playback position in seconds.
    pub time: Option<f64>,
    pub playing: Option<bool>,
    /// Playback rate multiplier.
    pub speed: Option<f64>,
}

impl SyncEvent {
    #[must_use]
    pub fn play(time: f64) -> Self {
        Self { name: "play".to_string(), time: Some(time), playing: Some(true), speed: None }
    }

    #[must_use]
    pub fn pause(time: f64) -> Self {
        Self { name: "pause".to_string(), time: Some(time), playing: Some(false), speed: None }
    }

    #[must_use]
    pub fn seek(time: f64) -> Self {
        Self { name: "seek".to_string(), time: Some(time), playing: None, speed: None }
    }

    #[must_use]
    pub fn speed(speed: f64) -> Self {
        Self { name: "speed".to_string(), time: None, playing: None, speed: Some(speed) }
    }
}

/// A tag that participates in a sync group.
pub trait SyncTarget {
    /// Unique tag name; used for origin self-exclusion.
    fn name(&self) -> &str;

    /// Receive an event sent by another member of the group.
    fn sync_receive(&mut self, event: &SyncEvent);
}

/// Per-target handler table, for targets that register closures per event
/// name instead of matching in [`SyncTarget::sync_receive`]. Events with no
/// registered handler are silently ignored.
#[derive(Default)]
pub struct Handlers {
    table: HashMap<String, Box<dyn FnMut(&SyncEvent)>>,
}

impl Handlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the handler for an event name.
    pub fn on(&mut self, name: &str, handler: impl FnMut(&SyncEvent) + 'static) {
        self.table.insert(name.to_string(), Box::new(handler));
    }

    /// Invoke the handler for the event's name. Returns `false` when no
    /// handler is registered.
    pub fn dispatch(&mut self, event: &SyncEvent) -> bool {
        match self.table.get_mut(&event.name) {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handlers").field("events", &self.table.keys().collect::<Vec<_>>()).finish()
    }
}

/// Routes events between members of named sync groups, one lock per
/// (group, event name) per frame.
#[derive(Default)]
pub struct SyncManager {
    groups: HashMap<String, Vec<Rc<RefCell<dyn SyncTarget>>>>,
    /// (group, event name) pairs already propagated this frame.
    locks: HashSet<(String, String)>,
    frame: u64,
}

impl SyncManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target to a group. A target already present under the same name
    /// is replaced.
    pub fn register(&mut self, group: &str, target: Rc<RefCell<dyn SyncTarget>>) {
        let members = self.groups.entry(group.to_string()).or_default();
        let name = target.borrow().name().to_string();
        members.retain(|m| m.borrow().name() != name);
        members.push(target);
    }

    /// Remove a target from a group by name. The group disappears with its
    /// last member.
    pub fn unregister(&mut self, group: &str, name: &str) {
        if let Some(members) = self.groups.get_mut(group) {
            members.retain(|m| m.borrow().name() != name);
            if members.is_empty() {
                self.groups.remove(group);
            }
        }
    }

    /// Names of a group's members, in registration order.
    #[must_use]
    pub fn members(&self, group: &str) -> Vec<String> {
        self.groups.get(group).map_or_else(Vec::new, |members| {
            members.iter().map(|m| m.borrow().name().to_string()).collect()
        })
    }

    /// Send an event into a group on behalf of `origin`. Every member except
    /// the origin receives it once; repeats of the same event name in the
    /// same group are suppressed until the next [`SyncManager::tick`].
    /// Returns `false` when the event was suppressed or the group is unknown.
    pub fn sync(&mut self, group: &str, event: &SyncEvent, origin: &str) -> bool {
        let Some(members) = self.groups.get(group) else {
            return false;
        };
        let lock = (group.to_string(), event.name.clone());
        if self.locks.contains(&lock) {
            tracing::debug!(group, event = %event.name, frame = self.frame, "suppressing echoed sync event");
            return false;
        }
        self.locks.insert(lock);
        for member in members {
            if member.borrow().name() != origin {
                member.borrow_mut().sync_receive(event);
            }
        }
        true
    }

    /// Advance to the next frame, releasing all event locks.
    pub fn tick(&mut self) {
        self.locks.clear();
        self.frame += 1;
    }

    /// The current frame counter.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl std::fmt::Debug for SyncManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncManager")
            .field("groups", &self.groups.keys().collect::<Vec<_>>())
            .field("frame", &self.frame)
            .finish()
    }
}
