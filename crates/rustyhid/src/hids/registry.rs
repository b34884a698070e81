//! Live service instances and per-stack locking
//!
//! Two locks guard the registry. Each Bluetooth stack has a reentrant lock
//! held for the whole of any call touching that stack, including while the
//! application callback runs, so the application can answer from inside its
//! callback. The instance list has a short-lived lock taken inside the stack
//! lock. A [`ListGuard`] can only be obtained from a held [`StackGuard`],
//! which fixes the order.

use super::event::HidsEvent;
use super::table::ServiceTable;
use super::types::ServiceFlags;
use crate::error::{HidsError, HidsResult};
use crate::gatt::HandleRange;
use log::debug;
use parking_lot::lock_api::ArcReentrantMutexGuard;
use parking_lot::{Mutex, MutexGuard, RawMutex, RawThreadId, ReentrantMutex};
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Application callback receiving the events of one service instance
pub type EventCallback = Arc<dyn Fn(HidsEvent) + Send + Sync>;

/// A registered HID service
pub struct ServiceInstance {
    instance_id: u32,
    stack_id: u32,
    service_id: u32,
    handle_range: HandleRange,
    flags: ServiceFlags,
    table: ServiceTable,
    callback: EventCallback,
}

impl ServiceInstance {
    pub(crate) fn new(
        instance_id: u32,
        stack_id: u32,
        service_id: u32,
        handle_range: HandleRange,
        flags: ServiceFlags,
        table: ServiceTable,
        callback: EventCallback,
    ) -> Self {
        Self {
            instance_id,
            stack_id,
            service_id,
            handle_range,
            flags,
            table,
            callback,
        }
    }

    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    pub fn stack_id(&self) -> u32 {
        self.stack_id
    }

    /// Service ID assigned by the GATT engine
    pub fn service_id(&self) -> u32 {
        self.service_id
    }

    pub fn handle_range(&self) -> HandleRange {
        self.handle_range
    }

    pub fn flags(&self) -> ServiceFlags {
        self.flags
    }

    pub fn table(&self) -> &ServiceTable {
        &self.table
    }

    pub(crate) fn callback(&self) -> &EventCallback {
        &self.callback
    }
}

impl std::fmt::Debug for ServiceInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceInstance")
            .field("instance_id", &self.instance_id)
            .field("stack_id", &self.stack_id)
            .field("service_id", &self.service_id)
            .field("handle_range", &self.handle_range)
            .field("flags", &self.flags)
            .field("attributes", &self.table.len())
            .finish()
    }
}

struct StackState {
    open: Cell<bool>,
}

type StackLock = Arc<ReentrantMutex<StackState>>;

enum InstanceSlot {
    /// ID handed out, engine registration still in progress
    Reserved { stack_id: u32 },
    Live(Arc<ServiceInstance>),
}

impl InstanceSlot {
    fn stack_id(&self) -> u32 {
        match self {
            InstanceSlot::Reserved { stack_id } => *stack_id,
            InstanceSlot::Live(instance) => instance.stack_id,
        }
    }
}

struct InstanceList {
    next_instance_id: u32,
    entries: BTreeMap<u32, InstanceSlot>,
}

impl InstanceList {
    /// Next free ID. Monotonic, never 0, never one still in use.
    fn allocate_id(&mut self) -> Option<u32> {
        for _ in 0..=self.entries.len() {
            let id = self.next_instance_id;
            self.next_instance_id = match self.next_instance_id.wrapping_add(1) {
                0 => 1,
                next => next,
            };
            if !self.entries.contains_key(&id) {
                return Some(id);
            }
        }
        None
    }
}

/// Owner of every live HID service instance
pub struct ServiceRegistry {
    stacks: Mutex<HashMap<u32, StackLock>>,
    list: Mutex<InstanceList>,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            stacks: Mutex::new(HashMap::new()),
            list: Mutex::new(InstanceList {
                next_instance_id: 1,
                entries: BTreeMap::new(),
            }),
        }
    }

    /// Make a stack available. Opening an open stack is a no-op.
    pub fn open_stack(&self, stack_id: u32) -> HidsResult<()> {
        if stack_id == 0 {
            return Err(HidsError::InvalidStackId(stack_id));
        }
        self.stacks.lock().entry(stack_id).or_insert_with(|| {
            debug!("Opened Bluetooth stack {}", stack_id);
            Arc::new(ReentrantMutex::new(StackState {
                open: Cell::new(true),
            }))
        });
        Ok(())
    }

    /// Close a stack and hand back every instance that was registered on it
    pub fn close_stack(&self, stack_id: u32) -> HidsResult<Vec<Arc<ServiceInstance>>> {
        let stack = self.acquire_stack(stack_id)?;
        let instances: Vec<Arc<ServiceInstance>> = {
            let mut list = stack.list();
            let ids: Vec<u32> = list.instance_ids();
            ids.into_iter().filter_map(|id| list.delete(id)).collect()
        };
        stack.guard.open.set(false);
        self.stacks.lock().remove(&stack_id);
        debug!(
            "Closed Bluetooth stack {} ({} instances)",
            stack_id,
            instances.len()
        );
        Ok(instances)
    }

    /// Take the lock of an open stack, blocking while another thread holds it
    pub fn acquire_stack(&self, stack_id: u32) -> HidsResult<StackGuard<'_>> {
        let lock = self
            .stacks
            .lock()
            .get(&stack_id)
            .cloned()
            .ok_or(HidsError::InvalidStackId(stack_id))?;

        let guard = lock.lock_arc();
        // The stack may have been closed while this thread waited
        if !guard.open.get() {
            return Err(HidsError::InvalidStackId(stack_id));
        }

        Ok(StackGuard {
            registry: self,
            stack_id,
            guard,
        })
    }

    /// Take the stack lock and look up an instance registered on it.
    ///
    /// The returned guard keeps the stack locked; drop it when done.
    pub fn acquire_instance(
        &self,
        stack_id: u32,
        instance_id: u32,
    ) -> HidsResult<(StackGuard<'_>, Arc<ServiceInstance>)> {
        let stack = self.acquire_stack(stack_id)?;
        let instance = stack
            .list()
            .lookup(instance_id)
            .ok_or(HidsError::InvalidInstanceId(instance_id))?;
        Ok((stack, instance))
    }

    /// Number of live instances across all stacks
    pub fn len(&self) -> usize {
        self.list
            .lock()
            .entries
            .values()
            .filter(|slot| matches!(slot, InstanceSlot::Live(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn set_next_instance_id(&self, next: u32) {
        self.list.lock().next_instance_id = next;
    }
}

/// Proof that the calling thread holds a stack's lock
pub struct StackGuard<'r> {
    registry: &'r ServiceRegistry,
    stack_id: u32,
    guard: ArcReentrantMutexGuard<RawMutex, RawThreadId, StackState>,
}

impl StackGuard<'_> {
    pub fn stack_id(&self) -> u32 {
        self.stack_id
    }

    /// Lock the instance list. Drop the guard before calling the engine or
    /// the application.
    pub fn list(&self) -> ListGuard<'_> {
        ListGuard {
            stack_id: self.stack_id,
            list: self.registry.list.lock(),
        }
    }
}

/// Access to the instance list, scoped to the stack whose lock is held
pub struct ListGuard<'s> {
    stack_id: u32,
    list: MutexGuard<'s, InstanceList>,
}

impl ListGuard<'_> {
    /// Reserve a fresh instance ID on this stack
    pub fn create(&mut self, max_instances: usize) -> HidsResult<u32> {
        if self.list.entries.len() >= max_instances {
            return Err(HidsError::InsufficientResources);
        }
        let instance_id = self
            .list
            .allocate_id()
            .ok_or(HidsError::InsufficientResources)?;
        self.list.entries.insert(
            instance_id,
            InstanceSlot::Reserved {
                stack_id: self.stack_id,
            },
        );
        Ok(instance_id)
    }

    /// Fill a reserved slot with the registered instance
    pub fn install(&mut self, instance: ServiceInstance) -> Arc<ServiceInstance> {
        let instance = Arc::new(instance);
        self.list
            .entries
            .insert(instance.instance_id, InstanceSlot::Live(Arc::clone(&instance)));
        instance
    }

    /// Live instance with this ID on this stack
    pub fn lookup(&self, instance_id: u32) -> Option<Arc<ServiceInstance>> {
        match self.list.entries.get(&instance_id) {
            Some(InstanceSlot::Live(instance)) if instance.stack_id == self.stack_id => {
                Some(Arc::clone(instance))
            }
            _ => None,
        }
    }

    /// Remove an instance or a reservation. Returns the instance if it was live.
    pub fn delete(&mut self, instance_id: u32) -> Option<Arc<ServiceInstance>> {
        match self.list.entries.get(&instance_id) {
            Some(slot) if slot.stack_id() == self.stack_id => {}
            _ => return None,
        }
        match self.list.entries.remove(&instance_id) {
            Some(InstanceSlot::Live(instance)) => Some(instance),
            _ => None,
        }
    }

    /// IDs of every slot on this stack, live or reserved
    pub fn instance_ids(&self) -> Vec<u32> {
        self.list
            .entries
            .iter()
            .filter(|(_, slot)| slot.stack_id() == self.stack_id)
            .map(|(id, _)| *id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hids::table::AttributeTableBuilder;
    use crate::hids::types::ServiceConfig;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn instance(instance_id: u32, stack_id: u32) -> ServiceInstance {
        let table = AttributeTableBuilder::new(&ServiceConfig::default())
            .build()
            .unwrap();
        ServiceInstance::new(
            instance_id,
            stack_id,
            instance_id.wrapping_add(100),
            HandleRange::new(1, table.len() as u16),
            ServiceFlags::empty(),
            table,
            Arc::new(|_| {}),
        )
    }

    fn register(registry: &ServiceRegistry, stack_id: u32) -> u32 {
        let stack = registry.acquire_stack(stack_id).unwrap();
        let mut list = stack.list();
        let id = list.create(16).unwrap();
        list.install(instance(id, stack_id));
        id
    }

    #[test]
    fn test_create_lookup_delete() {
        let registry = ServiceRegistry::new();
        registry.open_stack(1).unwrap();

        let first = register(&registry, 1);
        let second = register(&registry, 1);
        assert_eq!((first, second), (1, 2));
        assert_eq!(registry.len(), 2);

        let (stack, found) = registry.acquire_instance(1, first).unwrap();
        assert_eq!(found.service_id(), 101);
        drop(stack);

        {
            let stack = registry.acquire_stack(1).unwrap();
            assert!(stack.list().delete(first).is_some());
            assert!(stack.list().delete(first).is_none());
        }

        assert!(matches!(
            registry.acquire_instance(1, first),
            Err(HidsError::InvalidInstanceId(1))
        ));

        // Deleted IDs are not handed out again
        assert_eq!(register(&registry, 1), 3);
    }

    #[test]
    fn test_reserved_slot_is_not_visible() {
        let registry = ServiceRegistry::new();
        registry.open_stack(1).unwrap();

        let stack = registry.acquire_stack(1).unwrap();
        let id = stack.list().create(16).unwrap();
        assert!(stack.list().lookup(id).is_none());
        assert_eq!(registry.len(), 0);

        // Deleting a reservation frees it without returning an instance
        assert!(stack.list().delete(id).is_none());
        assert!(stack.list().instance_ids().is_empty());
    }

    #[test]
    fn test_instances_are_scoped_to_their_stack() {
        let registry = ServiceRegistry::new();
        registry.open_stack(1).unwrap();
        registry.open_stack(2).unwrap();

        let id = register(&registry, 1);
        assert!(matches!(
            registry.acquire_instance(2, id),
            Err(HidsError::InvalidInstanceId(_))
        ));
        let stack = registry.acquire_stack(2).unwrap();
        assert!(stack.list().delete(id).is_none());
    }

    #[test]
    fn test_invalid_stack() {
        let registry = ServiceRegistry::new();
        assert!(matches!(
            registry.acquire_stack(7),
            Err(HidsError::InvalidStackId(7))
        ));
        assert!(matches!(
            registry.open_stack(0),
            Err(HidsError::InvalidStackId(0))
        ));
    }

    #[test]
    fn test_close_stack_removes_instances() {
        let registry = ServiceRegistry::new();
        registry.open_stack(1).unwrap();
        registry.open_stack(2).unwrap();
        register(&registry, 1);
        register(&registry, 1);
        let survivor = register(&registry, 2);

        let closed = registry.close_stack(1).unwrap();
        assert_eq!(closed.len(), 2);
        assert!(matches!(
            registry.acquire_stack(1),
            Err(HidsError::InvalidStackId(1))
        ));
        assert!(registry.acquire_instance(2, survivor).is_ok());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_instance_id_wraps_past_zero() {
        let registry = ServiceRegistry::new();
        registry.open_stack(1).unwrap();
        let kept = register(&registry, 1);
        assert_eq!(kept, 1);

        registry.set_next_instance_id(u32::MAX);
        assert_eq!(register(&registry, 1), u32::MAX);
        // 0 is skipped and 1 is still live
        assert_eq!(register(&registry, 1), 2);
    }

    #[test]
    fn test_instance_limit() {
        let registry = ServiceRegistry::new();
        registry.open_stack(1).unwrap();
        let stack = registry.acquire_stack(1).unwrap();
        let mut list = stack.list();
        list.create(2).unwrap();
        list.create(2).unwrap();
        assert!(matches!(list.create(2), Err(HidsError::InsufficientResources)));
    }

    #[test]
    fn test_stack_lock_is_reentrant() {
        let registry = ServiceRegistry::new();
        registry.open_stack(1).unwrap();

        let outer = registry.acquire_stack(1).unwrap();
        let inner = registry.acquire_stack(1).unwrap();
        assert_eq!(inner.stack_id(), outer.stack_id());
    }

    #[test]
    fn test_stack_lock_serializes_threads() {
        let registry = Arc::new(ServiceRegistry::new());
        registry.open_stack(1).unwrap();
        registry.open_stack(2).unwrap();

        let held = registry.acquire_stack(1).unwrap();
        let (tx, rx) = mpsc::channel();
        let worker = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                // A different stack is not blocked
                let other = registry.acquire_stack(2).map(|guard| guard.stack_id());
                tx.send(other).unwrap();
                let same = registry.acquire_stack(1).map(|guard| guard.stack_id());
                tx.send(same).unwrap();
            })
        };

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), Ok(2));
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        drop(held);
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), Ok(1));
        worker.join().unwrap();
    }
}
