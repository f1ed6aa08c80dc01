//! The connection pool: acquire/return semantics plus background ping and idle-standby cleanup,
//! driven by an [`EventLoopExecutor`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::config::StorageConfig;
use crate::connection::Connection;
use crate::driver::Driver;
use crate::error::{StorageError, StorageResult};
use crate::executor::{EventLoopExecutor, TaskKind};
use crate::types::{ConnectionStandbyMode, StorageType};

const DEFAULT_WORKER_MINIMAL: u16 = 1;
const DEFAULT_IDLE_PING: Duration = Duration::from_secs(30);
const DEFAULT_MAX_WAITING_FOR_CONNECTION: Duration = Duration::from_secs(5);
const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(160);

/// Builds a primary (always-kept) connection for `name` under `config`.
pub type PrimaryConnectionFactory<D> =
    Box<dyn Fn(&str, &StorageConfig) -> StorageResult<Connection<D>> + Send + Sync>;

/// Builds a standby connection, grown on demand and reclaimed by the cleanup cycle once idle.
pub type StandbyConnectionFactory<D> =
    Box<dyn Fn(&str, &StorageConfig) -> StorageResult<Connection<D>> + Send + Sync>;

struct Slots<D: Driver> {
    storages: HashMap<u64, Connection<D>>,
    free_queue: VecDeque<u64>,
    acquired: HashSet<u64>,
    is_run: bool,
}

struct Inner<D: Driver> {
    mutex: Mutex<Slots<D>>,
    cv: Condvar,
}

/// An owning lease on a pooled connection. Returns the connection to the pool on drop, the way
/// the original relies on an explicit `Return` call — here made unconditional via RAII so a
/// caller can't leak a lease by forgetting to give it back.
pub struct PooledConnection<D: Driver> {
    pool: Arc<Inner<D>>,
    key: Option<u64>,
}

impl<D: Driver> PooledConnection<D> {
    pub fn hash_key(&self) -> u64 {
        self.key.expect("hash key is only cleared on drop")
    }

    pub fn with_connection<R>(&self, f: impl FnOnce(&Connection<D>) -> R) -> R {
        let slots = self.pool.mutex.lock().unwrap();
        let conn = slots.storages.get(&self.key.unwrap()).expect("leased connection missing from pool storage");
        f(conn)
    }

    pub fn with_connection_mut<R>(&self, f: impl FnOnce(&mut Connection<D>) -> R) -> R {
        let mut slots = self.pool.mutex.lock().unwrap();
        let conn = slots.storages.get_mut(&self.key.unwrap()).expect("leased connection missing from pool storage");
        f(conn)
    }
}

impl<D: Driver> Drop for PooledConnection<D> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            let mut slots = self.pool.mutex.lock().unwrap();
            if slots.acquired.remove(&key) {
                if let Some(conn) = slots.storages.get(&key) {
                    conn.mark_returned();
                }
                slots.free_queue.push_back(key);
            }
            drop(slots);
            self.pool.cv.notify_all();
        }
    }
}

/// Fixed-size pool of primary connections, grown to standby connections on operator request,
/// with background ping and idle-standby cleanup maintenance.
pub struct ConnectionPool<D: Driver> {
    name: String,
    config: StorageConfig,
    driver: Arc<D>,
    inner: Arc<Inner<D>>,
    primary_factory: Option<PrimaryConnectionFactory<D>>,
    standby_factory: Option<StandbyConnectionFactory<D>>,
    services: Option<EventLoopExecutor>,
}

impl<D: Driver> ConnectionPool<D> {
    pub fn new(name: impl Into<String>, config: StorageConfig, driver: Arc<D>) -> Self {
        Self {
            name: name.into(),
            config,
            driver,
            inner: Arc::new(Inner {
                mutex: Mutex::new(Slots {
                    storages: HashMap::new(),
                    free_queue: VecDeque::new(),
                    acquired: HashSet::new(),
                    is_run: false,
                }),
                cv: Condvar::new(),
            }),
            primary_factory: None,
            standby_factory: None,
            services: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn set_primary_factory(&mut self, factory: PrimaryConnectionFactory<D>) {
        self.primary_factory = Some(factory);
    }

    pub fn set_standby_factory(&mut self, factory: StandbyConnectionFactory<D>) {
        self.standby_factory = Some(factory);
    }

    pub fn is_run(&self) -> bool {
        self.inner.mutex.lock().unwrap().is_run
    }

    /// Opens the initial set of primary connections and starts the ping/cleanup background
    /// tasks. Requires a primary factory to have been set.
    pub fn run(&mut self) -> StorageResult<()> {
        let factory = self
            .primary_factory
            .as_ref()
            .ok_or_else(|| StorageError::invalid_argument(self.config.ty, "no primary connection factory configured"))?;

        let min_connections = if self.config.pool_config.min_connections == 0 {
            DEFAULT_WORKER_MINIMAL
        } else {
            self.config.pool_config.min_connections
        };

        {
            let mut slots = self.inner.mutex.lock().unwrap();
            for _ in 0..min_connections {
                let mut conn = factory(&self.name, &self.config)?;
                conn.open(&self.driver, self.config.pool_config.connection_timeout)?;
                let key = conn.hash_key();
                if slots.storages.insert(key, conn).is_some() {
                    return Err(StorageError::bad_allocation(
                        self.config.ty,
                        "connection hash key collided during pool initialization",
                    ));
                }
                slots.free_queue.push_back(key);
            }
            slots.is_run = true;
        }

        self.initialize_services();
        self.inner.cv.notify_all();
        Ok(())
    }

    fn initialize_services(&mut self) {
        let ping_interval = if self.config.pool_config.ping_server_interval.is_zero() {
            DEFAULT_IDLE_PING
        } else {
            self.config.pool_config.ping_server_interval
        };
        let cleanup_interval = if self.config.pool_config.cleanup_interval.is_zero() {
            DEFAULT_CLEANUP_INTERVAL
        } else {
            self.config.pool_config.cleanup_interval
        };

        let executor = EventLoopExecutor::new();

        let ping_inner = Arc::clone(&self.inner);
        let ping_driver = Arc::clone(&self.driver);
        executor.submit(
            move || ping_service(&ping_inner, ping_driver.as_ref()),
            TaskKind::RunAtInterval,
            ping_interval,
            ping_interval,
        );

        let cleanup_inner = Arc::clone(&self.inner);
        let cleanup_driver = Arc::clone(&self.driver);
        executor.submit(
            move || cleanup_service(&cleanup_inner, cleanup_driver.as_ref()),
            TaskKind::RunAtInterval,
            cleanup_interval,
            cleanup_interval,
        );

        self.services = Some(executor);
    }

    /// Stops the pool: background services are stopped, every tracked connection is closed and
    /// dropped. Idempotent.
    pub fn stop(&mut self) {
        {
            let mut slots = self.inner.mutex.lock().unwrap();
            if !slots.is_run {
                return;
            }
            slots.is_run = false;
            slots.acquired.clear();
            slots.free_queue.clear();

            for (_, mut conn) in slots.storages.drain() {
                let _ = conn.close(&self.driver);
            }
        }
        self.inner.cv.notify_all();

        if let Some(mut services) = self.services.take() {
            services.stop();
        }
    }

    /// Leases a free connection, waiting up to `max_waiting_for_connection` (or the default of
    /// 5s) if none is immediately available. Returns `None` on timeout or if the pool is (or
    /// becomes) stopped.
    pub fn acquire(&self) -> Option<PooledConnection<D>> {
        let wait = if self.config.pool_config.max_waiting_for_connection.is_zero() {
            DEFAULT_MAX_WAITING_FOR_CONNECTION
        } else {
            self.config.pool_config.max_waiting_for_connection
        };

        let mut slots = self.inner.mutex.lock().unwrap();

        if slots.free_queue.is_empty() && slots.is_run {
            let (guard, timeout_result) =
                self.inner.cv.wait_timeout_while(slots, wait, |s| s.free_queue.is_empty() && s.is_run).unwrap();
            slots = guard;
            if timeout_result.timed_out() && slots.free_queue.is_empty() {
                return None;
            }
        }

        if !slots.is_run {
            return None;
        }

        let key = slots.free_queue.pop_front()?;
        slots.acquired.insert(key);
        if let Some(conn) = slots.storages.get(&key) {
            conn.acquire();
        }

        Some(PooledConnection { pool: Arc::clone(&self.inner), key: Some(key) })
    }

    /// Admits `conn` straight into the free queue, growing the pool the way a standby
    /// connection built from [`StandbyConnectionFactory`] would join it. Unlike the primary set
    /// built in [`ConnectionPool::run`], this can be called against an already-running pool.
    pub fn admit_standby(&self, conn: Connection<D>) -> StorageResult<()> {
        let mut slots = self.inner.mutex.lock().unwrap();
        if !slots.is_run {
            return Err(StorageError::connection(self.config.ty, "pool is not running"));
        }
        let max_connections = self.config.pool_config.max_connections as usize;
        if max_connections != 0 && slots.storages.len() >= max_connections {
            return Err(StorageError::connection(self.config.ty, "pool is already at max_connections"));
        }
        let key = conn.hash_key();
        if slots.storages.contains_key(&key) {
            return Err(StorageError::bad_allocation(
                self.config.ty,
                "connection hash key collided admitting a standby connection",
            ));
        }
        slots.storages.insert(key, conn);
        slots.free_queue.push_back(key);
        drop(slots);
        self.inner.cv.notify_all();
        Ok(())
    }

    pub fn acquired_count(&self) -> usize {
        self.inner.mutex.lock().unwrap().acquired.len()
    }

    pub fn free_count(&self) -> usize {
        self.inner.mutex.lock().unwrap().free_queue.len()
    }

    pub fn total_count(&self) -> usize {
        self.inner.mutex.lock().unwrap().storages.len()
    }
}

impl<D: Driver> Drop for ConnectionPool<D> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn ping_service<D: Driver>(inner: &Arc<Inner<D>>, driver: &D) {
    let mut slots = inner.mutex.lock().unwrap();
    if !slots.is_run {
        return;
    }

    let keys: Vec<u64> = slots.free_queue.iter().copied().collect();
    for key in keys {
        if let Some(conn) = slots.storages.get_mut(&key) {
            conn.ping_async(driver);
        }
    }
    inner.cv.notify_all();
}

fn cleanup_service<D: Driver>(inner: &Arc<Inner<D>>, driver: &D) {
    let mut slots = inner.mutex.lock().unwrap();
    if !slots.is_run || slots.free_queue.is_empty() {
        return;
    }

    let candidates: Vec<u64> = slots.free_queue.iter().copied().collect();
    let mut survivors = VecDeque::with_capacity(candidates.len());
    let mut to_release = Vec::new();

    for key in candidates {
        let should_release = slots
            .storages
            .get(&key)
            .map(|c| c.standby_mode() == ConnectionStandbyMode::Standby && c.is_idle())
            .unwrap_or(false);

        if should_release {
            to_release.push(key);
        } else {
            survivors.push_back(key);
        }
    }

    slots.free_queue = survivors;

    for key in to_release {
        if let Some(mut conn) = slots.storages.remove(&key) {
            let _ = conn.close(driver);
        }
    }
}

#[allow(dead_code)]
fn assert_storage_type(_: StorageType) {}
