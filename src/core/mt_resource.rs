use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `MtResource` is the single lock abstraction of the crate. The chunk store,
/// the streamer's request table and the task statistics all live behind one.
/// Cloning the handle shares the same underlying value.
///
/// A poisoned lock is recovered rather than propagated: the guarded values are
/// plain data whose invariants are re-established by the call that panicked
/// (chunk insertion checks before it writes), so a panic on another thread must
/// not take the simulation thread down with it.
///
/// # Examples
///
/// ```
/// use voxel_world::core::MtResource;
///
/// let counter = MtResource::new(0);
/// let shared = counter.clone();
///
/// std::thread::spawn(move || *shared.get_mut() += 1)
///     .join()
///     .unwrap();
///
/// assert_eq!(*counter.get(), 1);
/// ```
#[derive(Debug)]
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync + 'static> MtResource<T> {
    /// Creates a new `MtResource` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read guard. Multiple readers may hold one at the same time.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap_or_else(|poisoned| {
            log::warn!("Recovered poisoned lock for read access");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Returns an exclusive write guard, blocking until every reader is gone.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap_or_else(|poisoned| {
            log::warn!("Recovered poisoned lock for write access");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Runs `f` with shared access and returns its result.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.get())
    }

    /// Runs `f` with exclusive access and returns its result.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.get_mut())
    }

    /// Returns `true` if both handles point at the same value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.resource, &other.resource)
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}
