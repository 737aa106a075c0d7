use crate::percpu::CounterBank;
use crate::state::{GraceState, parity};
use crate::sync::{AtomicU64, Condvar, Mutex, Ordering};
use crate::xcall::{CrossCall, InlineCrossCall};
use std::collections::TryReserveError;
use std::thread;
use thiserror::Error;
use tracing::{debug, trace};

/// Why a domain could not be created.
/// 域无法创建的原因。
#[derive(Debug, Error)]
pub enum CreateError {
    /// The per-CPU counter bank could not be allocated.
    /// 每 CPU 计数器组无法分配。
    #[error("per-cpu counter bank allocation failed")]
    OutOfMemory,
    /// A domain needs at least one CPU slot.
    /// 域至少需要一个 CPU 槽。
    #[error("domain requires at least one cpu")]
    NoCpus,
}

impl From<TryReserveError> for CreateError {
    fn from(_: TryReserveError) -> Self {
        CreateError::OutOfMemory
    }
}

/// Builder for configuring an `SrcuDomain`.
///
/// Use this builder to customize the domain:
/// - `cpus`: Set the number of per-CPU counter slots
/// - `cross_call`: Inject the cross-CPU broadcast implementation
///
/// # Example
/// ```
/// use srcu::SrcuDomain;
///
/// let domain = SrcuDomain::builder()
///     .cpus(4)
///     .build("route-cache")
///     .unwrap();
/// ```
///
/// 用于配置 `SrcuDomain` 的构建器。
pub struct SrcuDomainBuilder {
    cpus: usize,
    xcall: Box<dyn CrossCall>,
}

impl SrcuDomainBuilder {
    /// Create a new builder with default settings.
    /// 创建一个带有默认设置的新构建器。
    #[inline]
    pub fn new() -> Self {
        Self {
            cpus: default_cpus(),
            xcall: Box::new(InlineCrossCall),
        }
    }

    /// Set the number of per-CPU counter slots.
    ///
    /// Default: the host's available parallelism.
    ///
    /// 设置每 CPU 计数器槽的数量。默认值：主机的可用并行度。
    #[inline]
    pub fn cpus(mut self, cpus: usize) -> Self {
        self.cpus = cpus;
        self
    }

    /// Inject the cross-CPU broadcast used by `synchronize`.
    ///
    /// Default: `InlineCrossCall`, which visits every slot from the
    /// synchronizing thread.
    ///
    /// 注入 `synchronize` 使用的跨 CPU 广播。
    /// 默认值：`InlineCrossCall`，由同步线程依次访问每个槽。
    #[inline]
    pub fn cross_call(mut self, xcall: impl CrossCall + 'static) -> Self {
        self.xcall = Box::new(xcall);
        self
    }

    /// Build the domain with the configured settings.
    ///
    /// Allocates the zero-initialized counter bank; allocation failure
    /// is returned, not fatal.
    ///
    /// 使用配置的设置构建域。
    /// 分配零初始化的计数器组；分配失败以错误返回而非致命。
    pub fn build(self, name: impl Into<String>) -> Result<SrcuDomain, CreateError> {
        let name = name.into();
        let bank = CounterBank::with_cpus(self.cpus)?;

        debug!(name = %name, cpus = self.cpus, "srcu domain created");

        Ok(SrcuDomain {
            name,
            generation: AtomicU64::new(0),
            grace: Mutex::new(GraceState::new()),
            cv: Condvar::new(),
            bank,
            xcall: self.xcall,
        })
    }
}

impl Default for SrcuDomainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A sleepable-RCU synchronization domain.
///
/// A domain is the unit of reclamation, owned by whichever subsystem
/// created it. Arbitrarily many readers call `enter`/`exit` concurrently
/// and lock-free on the fast path; a writer calls `synchronize`, which
/// blocks until every reader that might have observed the old version of
/// the protected structure has exited its section.
///
/// **Typical Usage**:
/// ```
/// use srcu::SrcuDomain;
///
/// let domain = SrcuDomain::new("route-cache").unwrap();
///
/// // Reader side, any thread, any number of times:
/// let ticket = domain.enter();
/// // ... traverse the protected structure ...
/// domain.exit(ticket);
///
/// // Writer side, after unlinking the old version:
/// domain.synchronize();
/// // ... no reader can still see the old version; free it ...
/// ```
///
/// The domain is a long-lived explicit handle: destruction happens in
/// `Drop`, which debug-asserts that no grace period is in flight and
/// that every reader has exited.
///
/// 可睡眠 RCU 同步域。
/// 域是回收的基本单位，由创建它的子系统独占持有。任意多的读者可并发、
/// 在快路径上无锁地调用 `enter`/`exit`；写者调用 `synchronize`，
/// 它会阻塞直到所有可能看到旧版本受保护结构的读者退出其临界区。
/// 域是长生命周期的显式句柄：析构发生在 `Drop` 中，并以调试断言检查
/// 没有宽限期在进行且所有读者都已退出。
pub struct SrcuDomain {
    pub(crate) name: String,
    /// The generation counter. Its low bit selects the active epoch.
    /// Incremented exactly once per grace period, under the grace mutex;
    /// read lock-free by the reader fast path.
    /// 代数计数器。最低位选择活跃纪元。每个宽限期在宽限互斥锁下恰好
    /// 递增一次；读者快路径无锁读取。
    pub(crate) generation: AtomicU64,
    pub(crate) grace: Mutex<GraceState>,
    /// Wakes the grace-period waiter when the drain-count hits zero, and
    /// the next writer when a grace period finishes.
    /// 当排空计数归零时唤醒宽限期等待者；宽限期结束时唤醒下一个写者。
    pub(crate) cv: Condvar,
    pub(crate) bank: CounterBank,
    xcall: Box<dyn CrossCall>,
}

impl SrcuDomain {
    /// Create a new domain with default settings.
    /// 使用默认设置创建一个新域。
    #[inline]
    pub fn new(name: impl Into<String>) -> Result<Self, CreateError> {
        Self::builder().build(name)
    }

    /// Create a builder for configuring the domain.
    /// 创建一个用于配置域的构建器。
    #[inline]
    pub fn builder() -> SrcuDomainBuilder {
        SrcuDomainBuilder::new()
    }

    /// The domain's name, as given at creation.
    /// 域的名称，即创建时给定的名称。
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of per-CPU counter slots.
    /// 每 CPU 计数器槽的数量。
    #[inline]
    pub fn cpus(&self) -> usize {
        self.bank.cpus()
    }

    /// The current generation. Advances by exactly one per completed
    /// `synchronize` call.
    /// 当前代数。每完成一次 `synchronize` 恰好前进一。
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Wait for a full grace period: every reader section that began
    /// before this call's epoch flip has ended when it returns.
    ///
    /// Blocking; must be called from a context that may sleep. Concurrent
    /// callers on the same domain serialize: a second `synchronize`
    /// blocks until the first completes, then runs its own grace period.
    /// With no readers in flight the call returns without blocking.
    ///
    /// The steps are:
    /// 1. Serialize with any running grace period, then take ownership.
    /// 2. Flip the epoch by incrementing the generation under the mutex.
    /// 3. Broadcast the fold-in to every CPU: swap that CPU's
    ///    previously-active counter to zero and add it to the
    ///    drain-count. The broadcast is synchronous; once it returns,
    ///    every reader that entered before the flip is accounted for.
    /// 4. Sleep on the condition variable until the drain-count is zero.
    /// 5. Release ownership and wake the next writer.
    ///
    /// 等待一个完整的宽限期：返回时，所有在本次调用纪元翻转之前开始的
    /// 读者临界区都已结束。
    /// 阻塞调用；必须从可睡眠的上下文调用。同一域上的并发调用者串行化：
    /// 第二个 `synchronize` 会阻塞到第一个完成，再运行自己的宽限期。
    /// 没有在途读者时，调用不阻塞直接返回。
    pub fn synchronize(&self) {
        let mut grace = self.grace.lock();
        while grace.waiter.is_some() {
            grace = self.cv.wait(grace);
        }
        debug_assert_eq!(
            grace.drain, 0,
            "drain-count nonzero with no grace period in flight"
        );
        grace.waiter = Some(thread::current().id());

        // The epoch flip. Everything folded below belongs to the parity
        // that was active up to this store.
        // 纪元翻转。之后折叠的都属于此存储之前活跃的那个奇偶位。
        let old = self.generation.fetch_add(1, Ordering::SeqCst);
        let draining = parity(old);
        drop(grace);

        trace!(name = %self.name, generation = old + 1, "grace period: epoch flipped");

        self.xcall.broadcast(self.bank.cpus(), &mut |cpu| {
            let folded = {
                let mut counts = self.bank.slot(cpu).pin();
                std::mem::replace(&mut counts[draining], 0)
            };
            if folded != 0 {
                trace!(name = %self.name, cpu, folded, "grace period: fold-in");
                let mut grace = self.grace.lock();
                grace.drain += folded;
            }
        });

        let mut grace = self.grace.lock();
        while grace.drain != 0 {
            grace = self.cv.wait(grace);
        }
        grace.waiter = None;
        self.cv.notify_all();
        drop(grace);

        trace!(name = %self.name, generation = old + 1, "grace period: complete");
    }

    /// Drain-count snapshot, for test assertions.
    /// 排空计数快照，供测试断言使用。
    #[cfg(test)]
    pub(crate) fn drain_count(&self) -> i64 {
        self.grace.lock().drain
    }

    /// Sum of all per-CPU counters plus the drain-count. Zero whenever
    /// no reader is inside a section.
    /// 所有每 CPU 计数器与排空计数之和。只要没有读者在临界区内即为零。
    #[cfg(test)]
    pub(crate) fn counter_total(&self) -> i64 {
        self.bank.total() + self.grace.lock().drain
    }
}

impl std::fmt::Debug for SrcuDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SrcuDomain")
            .field("name", &self.name)
            .field("cpus", &self.bank.cpus())
            .finish_non_exhaustive()
    }
}

impl Drop for SrcuDomain {
    /// Destroying a domain requires that no grace period is in flight and
    /// no reader is still inside a section. The caller guarantees this
    /// externally; it is checked here by assertion, not by locking.
    ///
    /// 销毁域要求没有宽限期在进行、也没有读者仍在临界区内。
    /// 调用者在外部保证这一点；这里只用断言检查，不加锁等待。
    fn drop(&mut self) {
        let in_slots = self.bank.total();
        let grace = self.grace.lock();
        debug_assert!(
            grace.waiter.is_none(),
            "domain `{}` destroyed while a grace period is in flight",
            self.name
        );
        let leaked = grace.drain + in_slots;
        drop(grace);
        debug_assert_eq!(
            leaked, 0,
            "domain `{}` destroyed with readers still inside sections",
            self.name
        );
        debug!(name = %self.name, "srcu domain destroyed");
    }
}

#[cfg(not(feature = "loom"))]
fn default_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(feature = "loom")]
fn default_cpus() -> usize {
    2
}
