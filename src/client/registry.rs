//! Client registry
//!
//! A fixed-capacity table of client slots guarded by a single async mutex.
//! `SlotTable` holds the table logic and is only reachable through the
//! `Registry` lock, so no caller ever observes a half-updated slot.

use std::fmt;
use tokio::sync::{Mutex, MutexGuard};

use crate::client::{ClientHandle, ClientId};
use crate::error::RegistryError;

/// Reference to an allocated slot.
///
/// Carries the owning connection's id so a stale reference can never free or
/// rename a slot that has since been reused by another connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef {
    index: usize,
    client: ClientId,
}

impl SlotRef {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn client_id(&self) -> ClientId {
        self.client
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {} ({})", self.index, self.client)
    }
}

/// An occupied registry entry.
#[derive(Debug)]
pub struct ClientSlot {
    handle: ClientHandle,
    name: Option<String>,
}

impl ClientSlot {
    pub fn handle(&self) -> &ClientHandle {
        &self.handle
    }

    /// Display name, `None` until the handshake completes.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// The slot table itself. Obtain one through [`Registry::lock`].
#[derive(Debug)]
pub struct SlotTable {
    slots: Vec<Option<ClientSlot>>,
}

impl SlotTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Allocates the lowest free slot for `handle`.
    pub fn register(&mut self, handle: ClientHandle) -> Result<SlotRef, RegistryError> {
        let client = handle.id();

        if self.iter_occupied().any(|(slot, _)| slot.client == client) {
            return Err(RegistryError::AlreadyRegistered(client));
        }

        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(RegistryError::Full {
                capacity: self.capacity(),
            })?;

        self.slots[index] = Some(ClientSlot { handle, name: None });
        Ok(SlotRef { index, client })
    }

    /// Assigns the display name of a registered slot. Names are set once.
    pub fn set_name(&mut self, slot: SlotRef, name: &str) -> Result<(), RegistryError> {
        let entry = self
            .slot_mut(slot)
            .ok_or(RegistryError::StaleSlot(slot))?;

        if entry.name.is_some() {
            return Err(RegistryError::NameAlreadySet(slot));
        }

        entry.name = Some(name.to_string());
        Ok(())
    }

    /// Frees the slot. Returns `false` when the reference was already free or stale.
    pub fn unregister(&mut self, slot: SlotRef) -> bool {
        if self.slot(slot).is_none() {
            return false;
        }
        self.slots[slot.index] = None;
        true
    }

    /// First named slot, in slot order, whose name equals `name` exactly.
    pub fn find_by_name(&self, name: &str) -> Option<&ClientHandle> {
        self.named()
            .find(|(_, _, candidate)| *candidate == name)
            .map(|(_, handle, _)| handle)
    }

    /// Display name of the slot, if the reference is current and named.
    pub fn name_of(&self, slot: SlotRef) -> Option<&str> {
        self.slot(slot).and_then(ClientSlot::name)
    }

    /// Handle of the slot, if the reference is current.
    pub fn handle_of(&self, slot: SlotRef) -> Option<&ClientHandle> {
        self.slot(slot).map(ClientSlot::handle)
    }

    /// Ordered `(handle, name)` pairs for every named slot.
    pub fn snapshot_all(&self) -> Vec<(ClientHandle, String)> {
        self.named()
            .map(|(_, handle, name)| (handle.clone(), name.to_string()))
            .collect()
    }

    /// Named slots in slot order. Slots still in the handshake are skipped.
    pub fn named(&self) -> impl Iterator<Item = (SlotRef, &ClientHandle, &str)> {
        self.iter_occupied().filter_map(|(slot, entry)| {
            entry.name().map(|name| (slot, &entry.handle, name))
        })
    }

    fn iter_occupied(&self) -> impl Iterator<Item = (SlotRef, &ClientSlot)> {
        self.slots.iter().enumerate().filter_map(|(index, entry)| {
            entry.as_ref().map(|entry| {
                (
                    SlotRef {
                        index,
                        client: entry.handle.id(),
                    },
                    entry,
                )
            })
        })
    }

    fn slot(&self, slot: SlotRef) -> Option<&ClientSlot> {
        self.slots
            .get(slot.index)
            .and_then(Option::as_ref)
            .filter(|entry| entry.handle.id() == slot.client)
    }

    fn slot_mut(&mut self, slot: SlotRef) -> Option<&mut ClientSlot> {
        self.slots
            .get_mut(slot.index)
            .and_then(Option::as_mut)
            .filter(|entry| entry.handle.id() == slot.client)
    }
}

/// Registry for tracking connected clients
///
/// Every operation takes the single table lock. The router holds the same lock
/// while it scans recipients, so membership never changes mid-delivery.
#[derive(Debug)]
pub struct Registry {
    table: Mutex<SlotTable>,
    capacity: usize,
}

impl Registry {
    pub fn new(capacity: usize) -> Self {
        Self {
            table: Mutex::new(SlotTable::with_capacity(capacity)),
            capacity,
        }
    }

    /// Acquires the exclusive table lock.
    pub async fn lock(&self) -> MutexGuard<'_, SlotTable> {
        self.table.lock().await
    }

    pub async fn register(&self, handle: ClientHandle) -> Result<SlotRef, RegistryError> {
        self.lock().await.register(handle)
    }

    pub async fn set_name(&self, slot: SlotRef, name: &str) -> Result<(), RegistryError> {
        self.lock().await.set_name(slot, name)
    }

    pub async fn unregister(&self, slot: SlotRef) -> bool {
        self.lock().await.unregister(slot)
    }

    pub async fn find_by_name(&self, name: &str) -> Option<ClientHandle> {
        self.lock().await.find_by_name(name).cloned()
    }

    pub async fn snapshot_all(&self) -> Vec<(ClientHandle, String)> {
        self.lock().await.snapshot_all()
    }

    pub async fn occupied_count(&self) -> usize {
        self.lock().await.occupied_count()
    }

    /// Fixed at construction, readable without the lock.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn handle(id: u64) -> ClientHandle {
        ClientHandle::new(ClientId(id), tokio::io::sink())
    }

    fn named_table(names: &[&str]) -> (SlotTable, Vec<SlotRef>) {
        let mut table = SlotTable::with_capacity(names.len() + 2);
        let slots = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let slot = table.register(handle(i as u64 + 1)).unwrap();
                table.set_name(slot, name).unwrap();
                slot
            })
            .collect();
        (table, slots)
    }

    #[test]
    fn test_register_assigns_lowest_free_slot() {
        let mut table = SlotTable::with_capacity(3);
        let a = table.register(handle(1)).unwrap();
        let b = table.register(handle(2)).unwrap();
        let c = table.register(handle(3)).unwrap();
        assert_eq!((a.index(), b.index(), c.index()), (0, 1, 2));

        assert!(table.unregister(b));
        let d = table.register(handle(4)).unwrap();
        assert_eq!(d.index(), 1);
        assert_eq!(d.client_id(), ClientId(4));
        assert_eq!(table.occupied_count(), 3);
    }

    #[test]
    fn test_register_beyond_capacity_is_rejected() {
        let mut table = SlotTable::with_capacity(2);
        let a = table.register(handle(1)).unwrap();
        let b = table.register(handle(2)).unwrap();
        table.set_name(a, "alice").unwrap();
        table.set_name(b, "bob").unwrap();

        assert_eq!(
            table.register(handle(3)),
            Err(RegistryError::Full { capacity: 2 })
        );
        assert_eq!(table.occupied_count(), 2);
        assert_eq!(table.name_of(a), Some("alice"));
        assert_eq!(table.name_of(b), Some("bob"));
    }

    #[test]
    fn test_same_connection_cannot_register_twice() {
        let mut table = SlotTable::with_capacity(4);
        table.register(handle(1)).unwrap();
        assert_eq!(
            table.register(handle(1)),
            Err(RegistryError::AlreadyRegistered(ClientId(1)))
        );
        assert_eq!(table.occupied_count(), 1);
    }

    #[test]
    fn test_occupied_count_tracks_live_clients() {
        let mut table = SlotTable::with_capacity(5);
        let slots: Vec<_> = (1..=5).map(|id| table.register(handle(id)).unwrap()).collect();
        assert_eq!(table.occupied_count(), 5);

        table.unregister(slots[0]);
        table.unregister(slots[3]);
        assert_eq!(table.occupied_count(), 3);

        let unique: HashSet<_> = slots.iter().map(|slot| slot.client_id()).collect();
        assert_eq!(unique.len(), slots.len());
    }

    #[test]
    fn test_unregister_twice_is_noop() {
        let (mut table, slots) = named_table(&["alice", "bob"]);

        assert!(table.unregister(slots[0]));
        assert!(!table.unregister(slots[0]));
        assert_eq!(table.occupied_count(), 1);
        assert_eq!(table.name_of(slots[1]), Some("bob"));
    }

    #[test]
    fn test_stale_ref_does_not_touch_reused_slot() {
        let mut table = SlotTable::with_capacity(1);
        let old = table.register(handle(1)).unwrap();
        table.unregister(old);

        let new = table.register(handle(2)).unwrap();
        table.set_name(new, "carol").unwrap();
        assert_eq!(old.index(), new.index());

        assert!(!table.unregister(old));
        assert_eq!(
            table.set_name(old, "mallory"),
            Err(RegistryError::StaleSlot(old))
        );
        assert_eq!(table.name_of(new), Some("carol"));
    }

    #[test]
    fn test_name_is_set_once() {
        let mut table = SlotTable::with_capacity(1);
        let slot = table.register(handle(1)).unwrap();
        table.set_name(slot, "alice").unwrap();
        assert_eq!(
            table.set_name(slot, "alicia"),
            Err(RegistryError::NameAlreadySet(slot))
        );
        assert_eq!(table.name_of(slot), Some("alice"));
    }

    #[test]
    fn test_find_by_name_is_exact_and_case_sensitive() {
        let (table, _) = named_table(&["alice", "bob"]);

        assert_eq!(table.find_by_name("bob").map(ClientHandle::id), Some(ClientId(2)));
        assert!(table.find_by_name("Bob").is_none());
        assert!(table.find_by_name("bob ").is_none());
        assert!(table.find_by_name("carol").is_none());
    }

    #[test]
    fn test_duplicate_names_resolve_to_lowest_slot() {
        let (mut table, slots) = named_table(&["dup", "other", "dup"]);
        assert_eq!(table.find_by_name("dup").map(ClientHandle::id), Some(ClientId(1)));

        table.unregister(slots[0]);
        assert_eq!(table.find_by_name("dup").map(ClientHandle::id), Some(ClientId(3)));
    }

    #[test]
    fn test_unnamed_slots_are_not_routable() {
        let mut table = SlotTable::with_capacity(3);
        let pending = table.register(handle(1)).unwrap();
        let bob = table.register(handle(2)).unwrap();
        table.set_name(bob, "bob").unwrap();

        let snapshot = table.snapshot_all();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].1, "bob");
        assert_eq!(table.name_of(pending), None);
        assert!(table.handle_of(pending).is_some());
        assert_eq!(table.occupied_count(), 2);
    }

    #[test]
    fn test_snapshot_preserves_slot_order() {
        let (table, _) = named_table(&["alice", "bob", "carol"]);
        let names: Vec<_> = table.snapshot_all().into_iter().map(|(_, name)| name).collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn test_registry_after_removal_lookup_misses() {
        let registry = Registry::new(4);
        let slot = registry.register(handle(1)).await.unwrap();
        registry.set_name(slot, "alice").await.unwrap();
        assert!(registry.find_by_name("alice").await.is_some());

        assert!(registry.unregister(slot).await);
        assert!(registry.find_by_name("alice").await.is_none());
        assert_eq!(registry.occupied_count().await, 0);
        assert_eq!(registry.capacity(), 4);
    }
}
