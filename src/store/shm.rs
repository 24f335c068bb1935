//! Result store backed by anonymous shared memory
//!
//! The whole store lives in one `MAP_SHARED | MAP_ANONYMOUS` mapping created
//! before any coarse unit is forked, so every child inherits the same physical
//! pages. The layout is:
//!
//! ```text
//! +-------------------------------+----------------------------+
//! | ShmHeader                     | values: [i64; capacity]    |
//! |  lock: pthread_mutex_t        |                            |
//! |  count: usize                 |                            |
//! |  capacity: usize              |                            |
//! +-------------------------------+----------------------------+
//! ```
//!
//! The mutex is initialised with `PTHREAD_PROCESS_SHARED`, which makes it
//! valid across the fork boundary. Every read or write of `count` and
//! `values` happens while holding it. `capacity` is written once before the
//! first fork and only read afterwards.
//!
//! # Teardown
//!
//! Only the process that created the mapping destroys the mutex. Children
//! must leave with `_exit` and never run destructors on inherited state.

use super::{ResultSink, StoreError};
use std::alloc::Layout;
use std::io;
use std::ptr::{self, NonNull};

#[repr(C)]
struct ShmHeader {
    lock: libc::pthread_mutex_t,
    count: usize,
    capacity: usize,
}

/// Fixed-capacity result store shared between forked processes
pub struct SharedMemoryStore {
    base: NonNull<u8>,
    map_len: usize,
    values_offset: usize,
    owner_pid: libc::pid_t,
}

// Safety: all access to the mapped header and values goes through the
// process-shared mutex. The pointer stays valid until Drop unmaps it.
unsafe impl Send for SharedMemoryStore {}
unsafe impl Sync for SharedMemoryStore {}

/// Holds the shared mutex for the lifetime of the guard
struct ShmLockGuard {
    lock: *mut libc::pthread_mutex_t,
}

impl Drop for ShmLockGuard {
    fn drop(&mut self) {
        unsafe {
            libc::pthread_mutex_unlock(self.lock);
        }
    }
}

impl SharedMemoryStore {
    /// Map a new store able to hold `capacity` values
    pub fn with_capacity(capacity: usize) -> Result<Self, StoreError> {
        let values = Layout::array::<i64>(capacity).map_err(layout_error)?;
        let (layout, values_offset) = Layout::new::<ShmHeader>()
            .extend(values)
            .map_err(layout_error)?;
        let map_len = layout.pad_to_align().size();

        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                map_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(StoreError::Allocation(io::Error::last_os_error()));
        }
        let base = NonNull::new(addr as *mut u8)
            .ok_or_else(|| StoreError::Allocation(io::Error::other("mmap returned null")))?;

        let header = base.as_ptr() as *mut ShmHeader;
        let rc = unsafe {
            // Anonymous mappings are zero-filled; only the fields need setting
            ptr::addr_of_mut!((*header).count).write(0);
            ptr::addr_of_mut!((*header).capacity).write(capacity);
            init_process_shared_mutex(ptr::addr_of_mut!((*header).lock))
        };
        if rc != 0 {
            unsafe {
                libc::munmap(addr, map_len);
            }
            return Err(StoreError::Allocation(io::Error::from_raw_os_error(rc)));
        }

        tracing::debug!(capacity, map_len, "mapped shared result store");

        Ok(Self {
            base,
            map_len,
            values_offset,
            owner_pid: unsafe { libc::getpid() },
        })
    }

    fn header(&self) -> *mut ShmHeader {
        self.base.as_ptr() as *mut ShmHeader
    }

    fn values(&self) -> *mut i64 {
        unsafe { self.base.as_ptr().add(self.values_offset) as *mut i64 }
    }

    fn lock(&self) -> Result<ShmLockGuard, StoreError> {
        let lock = unsafe { ptr::addr_of_mut!((*self.header()).lock) };
        let rc = unsafe { libc::pthread_mutex_lock(lock) };
        if rc != 0 {
            return Err(StoreError::Lock(io::Error::from_raw_os_error(rc)));
        }
        Ok(ShmLockGuard { lock })
    }
}

/// Initialise `lock` as a mutex usable from every process sharing the page
///
/// Returns the first non-zero pthread error code, or 0.
unsafe fn init_process_shared_mutex(lock: *mut libc::pthread_mutex_t) -> libc::c_int {
    let mut attr: libc::pthread_mutexattr_t = std::mem::zeroed();
    let mut rc = libc::pthread_mutexattr_init(&mut attr);
    if rc != 0 {
        return rc;
    }
    rc = libc::pthread_mutexattr_setpshared(&mut attr, libc::PTHREAD_PROCESS_SHARED);
    if rc == 0 {
        rc = libc::pthread_mutex_init(lock, &attr);
    }
    libc::pthread_mutexattr_destroy(&mut attr);
    rc
}

fn layout_error(err: std::alloc::LayoutError) -> StoreError {
    StoreError::Allocation(io::Error::new(io::ErrorKind::InvalidInput, err))
}

impl ResultSink for SharedMemoryStore {
    fn push(&self, value: i64) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        let header = self.header();
        unsafe {
            let count = (*header).count;
            let capacity = (*header).capacity;
            if count >= capacity {
                return Err(StoreError::CapacityExceeded {
                    capacity,
                    value,
                });
            }
            self.values().add(count).write(value);
            (*header).count = count + 1;
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<Vec<i64>, StoreError> {
        let _guard = self.lock()?;
        let values = unsafe {
            let count = (*self.header()).count;
            std::slice::from_raw_parts(self.values(), count).to_vec()
        };
        Ok(values)
    }

    fn len(&self) -> Result<usize, StoreError> {
        let _guard = self.lock()?;
        Ok(unsafe { (*self.header()).count })
    }

    fn capacity(&self) -> usize {
        unsafe { (*self.header()).capacity }
    }
}

impl std::fmt::Debug for SharedMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedMemoryStore")
            .field("capacity", &self.capacity())
            .field("map_len", &self.map_len)
            .field("owner_pid", &self.owner_pid)
            .finish()
    }
}

impl Drop for SharedMemoryStore {
    fn drop(&mut self) {
        unsafe {
            if libc::getpid() == self.owner_pid {
                libc::pthread_mutex_destroy(ptr::addr_of_mut!((*self.header()).lock));
            }
            libc::munmap(self.base.as_ptr() as *mut libc::c_void, self.map_len);
        }
    }
}
