//! Caller-side loans of a stateful, non-reentrant page.
//!
//! The extraction pipeline only ever sees `&mut P` for the duration of one
//! call. Serializing concurrent borrowers is the pool's job: a second
//! [`PagePool::acquire`] waits until the first lease is dropped, whether the
//! holder finished, failed or was cancelled.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// A single shared page behind an async mutex.
#[derive(Debug)]
pub struct PagePool<P> {
    page: Arc<Mutex<P>>,
}

impl<P> Clone for PagePool<P> {
    fn clone(&self) -> Self {
        Self {
            page: Arc::clone(&self.page),
        }
    }
}

/// Exclusive access to the pooled page; returned to the pool on drop.
#[derive(Debug)]
pub struct PageLease<P> {
    guard: OwnedMutexGuard<P>,
}

impl<P> PagePool<P> {
    pub fn new(page: P) -> Self {
        Self {
            page: Arc::new(Mutex::new(page)),
        }
    }

    /// Waits for the page to become free.
    pub async fn acquire(&self) -> PageLease<P> {
        PageLease {
            guard: Arc::clone(&self.page).lock_owned().await,
        }
    }

    /// Like [`PagePool::acquire`], giving up after `wait`.
    pub async fn acquire_timeout(&self, wait: Duration) -> Option<PageLease<P>> {
        tokio::time::timeout(wait, self.acquire()).await.ok()
    }

    /// The page if nobody holds it right now.
    #[must_use]
    pub fn try_acquire(&self) -> Option<PageLease<P>> {
        Arc::clone(&self.page)
            .try_lock_owned()
            .ok()
            .map(|guard| PageLease { guard })
    }
}

impl<P> Deref for PageLease<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.guard
    }
}

impl<P> DerefMut for PageLease<P> {
    fn deref_mut(&mut self) -> &mut P {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lease_is_exclusive_until_dropped() {
        let pool = PagePool::new(0u32);
        let mut lease = pool.acquire().await;
        *lease += 1;
        assert!(pool.try_acquire().is_none());
        drop(lease);

        let lease = pool.try_acquire().expect("page returned to pool");
        assert_eq!(*lease, 1);
    }

    #[tokio::test]
    async fn cancelled_holder_releases_the_page() {
        let pool = PagePool::new(String::from("session"));
        let holder = {
            let pool = pool.clone();
            tokio::spawn(async move {
                let _lease = pool.acquire().await;
                tokio::time::sleep(Duration::from_secs(60)).await;
            })
        };
        tokio::task::yield_now().await;
        holder.abort();
        let _ = holder.await;

        let lease = pool.acquire_timeout(Duration::from_secs(1)).await;
        assert_eq!(lease.as_deref().map(String::as_str), Some("session"));
    }
}
