//! Tenant store registry.
//!
//! Owns the mapping tenant → open store handle. A handle moves through
//!
//! ```text
//! UNOPENED ──acquire──▶ OPEN(idle) ⇄ OPEN(in-use) ──evict──▶ CLOSED
//! ```
//!
//! and is removed from the cache once closed, so the next `acquire` for that
//! tenant starts from `UNOPENED` again.
//!
//! Concurrency rules:
//!
//! - All cache bookkeeping (which tenants are cached, in-use counts, LRU
//!   timestamps) lives behind one coarse `std::sync::Mutex` that is only ever
//!   held for map operations, never across I/O.
//! - Each tenant's connection sits behind its own fair async mutex. Every
//!   statement for a tenant runs under it, so a tenant's statements execute one
//!   at a time and in submission order, while different tenants never contend.
//! - At most `max_open_handles` connections are open at once. A new tenant
//!   evicts the least-recently-used idle handle; when none is idle the caller
//!   waits, up to `acquire_timeout`, for a release.
//! - A handle being closed stays in the map (flagged `closing`) until the close
//!   finishes, so a tenant's file is never open twice.

use crate::error::StoreError;
use crate::storage::TenantStorage;
use sandql_core::{RegistryConfig, TenantId};
use sqlx::sqlite::SqliteConnection;
use sqlx::Connection;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::{Mutex as AsyncMutex, Notify, OwnedMappedMutexGuard, OwnedMutexGuard};
use tokio::task::JoinHandle;

/// A tenant's connection slot. `None` until the first holder opens it.
type StoreCell = AsyncMutex<Option<SqliteConnection>>;

/// Cache entry bookkeeping, guarded by the registry's coarse lock.
struct Slot {
    cell: Arc<StoreCell>,
    in_use: usize,
    last_used: Instant,
    closing: bool,
}

impl Slot {
    fn reserved() -> Self {
        Self {
            cell: Arc::new(AsyncMutex::new(None)),
            in_use: 1,
            last_used: Instant::now(),
            closing: false,
        }
    }

    fn is_evictable(&self) -> bool {
        self.in_use == 0 && !self.closing
    }
}

#[derive(Default)]
struct RegistryState {
    slots: HashMap<TenantId, Slot>,
}

enum Reservation {
    /// The caller holds a lease on `cell`; `victim` must be closed first.
    Ready {
        cell: Arc<StoreCell>,
        victim: Option<(TenantId, Arc<StoreCell>)>,
    },
    /// No capacity, or this tenant's previous handle is still closing.
    Wait,
}

impl RegistryState {
    fn reserve(&mut self, tenant: &TenantId, max_open: usize) -> Reservation {
        if let Some(slot) = self.slots.get_mut(tenant) {
            if slot.closing {
                return Reservation::Wait;
            }
            slot.in_use += 1;
            slot.last_used = Instant::now();
            return Reservation::Ready {
                cell: Arc::clone(&slot.cell),
                victim: None,
            };
        }

        let victim = if self.slots.len() >= max_open {
            match self.least_recently_used_idle() {
                Some(victim_tenant) => {
                    let Some(slot) = self.slots.get_mut(&victim_tenant) else {
                        return Reservation::Wait;
                    };
                    slot.closing = true;
                    Some((victim_tenant, Arc::clone(&slot.cell)))
                }
                None => return Reservation::Wait,
            }
        } else {
            None
        };

        let slot = Slot::reserved();
        let cell = Arc::clone(&slot.cell);
        self.slots.insert(tenant.clone(), slot);
        Reservation::Ready { cell, victim }
    }

    fn least_recently_used_idle(&self) -> Option<TenantId> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.is_evictable())
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(tenant, _)| tenant.clone())
    }
}

/// Point-in-time view of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Cached handles, excluding ones mid-close.
    pub open_handles: usize,
    /// Outstanding leases across all tenants.
    pub in_use: usize,
    pub max_open_handles: usize,
}

/// Bounded, LRU-evicting cache of per-tenant store handles.
pub struct TenantRegistry {
    storage: TenantStorage,
    config: RegistryConfig,
    state: Mutex<RegistryState>,
    /// Signalled whenever a lease ends or a close completes.
    released: Notify,
}

impl TenantRegistry {
    pub fn new(storage: TenantStorage, config: RegistryConfig) -> Self {
        Self {
            storage,
            config,
            state: Mutex::new(RegistryState::default()),
            released: Notify::new(),
        }
    }

    pub fn storage(&self) -> &TenantStorage {
        &self.storage
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn lock_state(&self) -> MutexGuard<'_, RegistryState> {
        // bookkeeping stays consistent even if a holder panicked
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Borrow a tenant's store for one operation.
    ///
    /// Waits while the handle budget is exhausted or another operation for
    /// the same tenant is running. Both waits share one deadline of
    /// `acquire_timeout`. The handle returns to the cache when dropped, on
    /// every exit path.
    pub async fn acquire(&self, tenant: &TenantId) -> Result<TenantHandle<'_>, StoreError> {
        let deadline = tokio::time::Instant::now() + self.config.acquire_timeout();

        let (cell, victim) = loop {
            // register interest before checking so a release in between is not lost
            let released = self.released.notified();
            let reservation = self.lock_state().reserve(tenant, self.config.max_open_handles);
            if let Reservation::Ready { cell, victim } = reservation {
                break (cell, victim);
            }

            tracing::debug!(tenant = %tenant, "Waiting for a free tenant handle");
            if tokio::time::timeout_at(deadline, released).await.is_err() {
                tracing::warn!(
                    tenant = %tenant,
                    max_open_handles = self.config.max_open_handles,
                    "Timed out waiting for a tenant handle"
                );
                return Err(StoreError::ResourceExhausted(format!(
                    "no tenant store handle became available within {} ms",
                    self.config.acquire_timeout_ms
                )));
            }
        };

        let lease = Lease {
            registry: self,
            tenant: tenant.clone(),
        };

        if let Some((victim_tenant, victim_cell)) = victim {
            tracing::info!(evicted = %victim_tenant, tenant = %tenant, "Evicting least recently used tenant store");
            self.close_slot(&victim_tenant, victim_cell).await;
        }

        let mut guard = match tokio::time::timeout_at(deadline, cell.lock_owned()).await {
            Ok(guard) => guard,
            Err(_) => {
                tracing::warn!(tenant = %tenant, "Timed out waiting for tenant's previous statement");
                return Err(StoreError::ResourceExhausted(format!(
                    "tenant is busy; statement did not start within {} ms",
                    self.config.acquire_timeout_ms
                )));
            }
        };

        if guard.is_none() {
            match self.storage.open(tenant).await {
                Ok(conn) => {
                    tracing::info!(tenant = %tenant, "Opened tenant store handle");
                    *guard = Some(conn);
                }
                Err(e) => {
                    tracing::warn!(tenant = %tenant, error = ?e, "Failed to open tenant store");
                    return Err(e);
                }
            }
        }

        let conn = OwnedMutexGuard::try_map(guard, Option::as_mut).map_err(|_| {
            StoreError::unavailable(tenant, "tenant store handle missing after open")
        })?;

        Ok(TenantHandle {
            conn,
            lease,
        })
    }

    fn release(&self, tenant: &TenantId) {
        {
            let mut state = self.lock_state();
            let remove = match state.slots.get_mut(tenant) {
                Some(slot) => {
                    slot.in_use = slot.in_use.saturating_sub(1);
                    slot.last_used = Instant::now();
                    // a store that never opened is dropped so the next
                    // acquire retries from scratch
                    slot.in_use == 0
                        && !slot.closing
                        && slot.cell.try_lock().is_ok_and(|conn| conn.is_none())
                }
                None => false,
            };
            if remove {
                state.slots.remove(tenant);
            }
        }
        self.released.notify_waiters();
    }

    /// Close a slot already flagged `closing`, then drop it from the cache.
    ///
    /// Cancel-safe: if this future is dropped part way, the guard still
    /// removes the slot and hands any connection it finds to a background
    /// close.
    async fn close_slot(&self, tenant: &TenantId, cell: Arc<StoreCell>) {
        let guard = ClosingSlot {
            registry: self,
            tenant,
            cell,
        };
        let conn = guard.cell.lock().await.take();
        if let Some(conn) = conn
            && let Err(e) = conn.close().await
        {
            tracing::error!(tenant = %tenant, error = %e, "Failed to close tenant store cleanly");
        }
        drop(guard);
        tracing::debug!(tenant = %tenant, "Closed tenant store handle");
    }

    fn finish_close(&self, tenant: &TenantId) {
        {
            let mut state = self.lock_state();
            if state.slots.get(tenant).is_some_and(|slot| slot.closing) {
                state.slots.remove(tenant);
            }
        }
        self.released.notify_waiters();
    }

    /// Flag every idle slot matching `pred` as closing and return them.
    fn take_idle(&self, pred: impl Fn(&Slot) -> bool) -> Vec<(TenantId, Arc<StoreCell>)> {
        let mut state = self.lock_state();
        state
            .slots
            .iter_mut()
            .filter(|(_, slot)| slot.is_evictable() && pred(slot))
            .map(|(tenant, slot)| {
                slot.closing = true;
                (tenant.clone(), Arc::clone(&slot.cell))
            })
            .collect()
    }

    /// Close handles idle for longer than `idle_timeout`. Returns how many closed.
    pub async fn evict_idle(&self) -> usize {
        let idle_timeout = self.config.idle_timeout();
        let victims = self.take_idle(|slot| slot.last_used.elapsed() >= idle_timeout);
        let count = victims.len();
        for (tenant, cell) in victims {
            self.close_slot(&tenant, cell).await;
        }
        if count > 0 {
            tracing::info!(closed = count, "Closed idle tenant stores");
        }
        count
    }

    /// Close every idle handle (shutdown path). Returns how many closed.
    pub async fn close_all(&self) -> usize {
        let victims = self.take_idle(|_| true);
        let count = victims.len();
        for (tenant, cell) in victims {
            self.close_slot(&tenant, cell).await;
        }
        count
    }

    /// Run [`evict_idle`](Self::evict_idle) every `reap_interval` until the
    /// registry is dropped.
    pub fn spawn_reaper(self: &Arc<Self>) -> JoinHandle<()> {
        let registry = Arc::downgrade(self);
        let period = self.config.reap_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                registry.evict_idle().await;
            }
        })
    }

    /// Whether a live handle is cached for this tenant.
    pub fn is_open(&self, tenant: &TenantId) -> bool {
        self.lock_state()
            .slots
            .get(tenant)
            .is_some_and(|slot| !slot.closing)
    }

    pub fn stats(&self) -> RegistryStats {
        let state = self.lock_state();
        RegistryStats {
            open_handles: state.slots.values().filter(|s| !s.closing).count(),
            in_use: state.slots.values().map(|s| s.in_use).sum(),
            max_open_handles: self.config.max_open_handles,
        }
    }
}

/// Finishes a close on every exit path, including cancellation.
struct ClosingSlot<'a> {
    registry: &'a TenantRegistry,
    tenant: &'a TenantId,
    cell: Arc<StoreCell>,
}

impl Drop for ClosingSlot<'_> {
    fn drop(&mut self) {
        // still holding a connection means the close was interrupted
        let leftover = self
            .cell
            .try_lock()
            .ok()
            .and_then(|mut conn| conn.take());
        if let Some(conn) = leftover {
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    runtime.spawn(async move {
                        if let Err(e) = conn.close().await {
                            tracing::error!(error = %e, "Failed to close tenant store cleanly");
                        }
                    });
                }
                // without a runtime the connection is dropped, which closes it
                Err(_) => drop(conn),
            }
        }
        self.registry.finish_close(self.tenant);
    }
}

/// Keeps a slot's in-use count raised; lowers it on drop.
struct Lease<'a> {
    registry: &'a TenantRegistry,
    tenant: TenantId,
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.registry.release(&self.tenant);
    }
}

/// Exclusive, scoped access to one tenant's store.
///
/// Derefs to the underlying connection. Dropping it releases the tenant's
/// turn and returns the handle to the cache.
pub struct TenantHandle<'a> {
    // dropped first: the tenant lock is released before the lease ends
    conn: OwnedMappedMutexGuard<Option<SqliteConnection>, SqliteConnection>,
    lease: Lease<'a>,
}

impl TenantHandle<'_> {
    pub fn tenant(&self) -> &TenantId {
        &self.lease.tenant
    }
}

impl Deref for TenantHandle<'_> {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for TenantHandle<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}
