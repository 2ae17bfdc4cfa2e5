//! Reusable-instance pools for short-lived entities
//!
//! Entities are moved out of the pool on `acquire` and moved back on
//! `release`, so a released instance cannot still be referenced by a live
//! collection. Pools grow on demand and never refuse an acquire.

/// Free list of reusable instances
#[derive(Debug)]
pub struct ObjectPool<T> {
    free: Vec<T>,
    create: fn() -> T,
    reset: fn(&mut T),
    created: usize,
}

impl<T> ObjectPool<T> {
    pub fn new(create: fn() -> T, reset: fn(&mut T)) -> Self {
        Self {
            free: Vec::new(),
            create,
            reset,
            created: 0,
        }
    }

    /// Pool with `count` instances constructed up front
    pub fn prewarmed(create: fn() -> T, reset: fn(&mut T), count: usize) -> Self {
        let mut pool = Self::new(create, reset);
        pool.free.reserve(count);
        for _ in 0..count {
            pool.free.push(create());
        }
        pool.created = count;
        pool
    }

    /// Take a reset instance, constructing one if the free list is empty
    pub fn acquire(&mut self) -> T {
        match self.free.pop() {
            Some(mut item) => {
                (self.reset)(&mut item);
                item
            }
            None => {
                self.created += 1;
                (self.create)()
            }
        }
    }

    /// Return an instance; fields are left as-is until the next acquire
    pub fn release(&mut self, item: T) {
        self.free.push(item);
    }

    /// Instances waiting on the free list
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Instances ever constructed by this pool
    pub fn created(&self) -> usize {
        self.created
    }
}

/// Move every inactive entry of `live` back into `pool`.
///
/// Uses `swap_remove`, so surviving entries may be reordered. Returns the
/// number of released instances.
pub fn recycle_inactive<T>(
    live: &mut Vec<T>,
    pool: &mut ObjectPool<T>,
    mut is_active: impl FnMut(&T) -> bool,
) -> usize {
    let mut released = 0;
    let mut i = 0;
    while i < live.len() {
        if is_active(&live[i]) {
            i += 1;
        } else {
            pool.release(live.swap_remove(i));
            released += 1;
        }
    }
    released
}

/// Release every entry of `live`, leaving it empty
pub fn release_all<T>(live: &mut Vec<T>, pool: &mut ObjectPool<T>) {
    for item in live.drain(..) {
        pool.release(item);
    }
}
