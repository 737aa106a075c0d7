use crate::domain::CreateError;
use crate::state::EPOCHS;
use crate::sync::{Mutex, MutexGuard};
use std::cell::Cell;

/// One counter pair, private to a single virtual CPU.
///
/// Cache-aligned so readers on different CPUs never write the same line.
/// The slot lock stands in for the kernel's preemption-disable window: it
/// is held only for the few instructions of a counter update, and it is
/// what keeps the cross-call fold-in from interleaving with a local
/// update on the same slot.
///
/// 单个虚拟 CPU 私有的一对计数器。
/// 缓存行对齐，使不同 CPU 上的读者永远不会写同一条缓存行。
/// 槽锁对应内核里的关抢占窗口：只在计数器更新的几条指令期间持有，
/// 它保证跨 CPU 调用的折叠不会与同一槽上的本地更新交错。
#[derive(Debug)]
#[repr(align(64))]
pub(crate) struct CpuSlot {
    /// Live reader counts, indexed by epoch parity. Signed: a reader may
    /// enter on one CPU and exit on another, so a single slot can go
    /// negative while the cross-CPU sum stays correct.
    /// 按纪元奇偶索引的活跃读者计数。带符号：读者可能在一个 CPU 进入、
    /// 在另一个 CPU 退出，因此单个槽可为负，而跨 CPU 总和保持正确。
    counts: Mutex<[i64; EPOCHS]>,
}

impl CpuSlot {
    fn new() -> Self {
        CpuSlot {
            counts: Mutex::new([0; EPOCHS]),
        }
    }

    /// Pin the slot for a counter update.
    /// 为一次计数器更新而锁住该槽。
    #[inline]
    pub(crate) fn pin(&self) -> MutexGuard<'_, [i64; EPOCHS]> {
        self.counts.lock()
    }
}

/// The per-CPU counter bank for one domain: the hosted rendition of a
/// per-CPU storage allocation. Allocated once at domain creation, freed
/// with the domain, no independent lifecycle.
///
/// 单个域的每 CPU 计数器组：每 CPU 存储分配的用户态形式。
/// 在域创建时一次性分配，随域释放，没有独立的生命周期。
#[derive(Debug)]
pub(crate) struct CounterBank {
    slots: Box<[CpuSlot]>,
}

impl CounterBank {
    /// Allocate a zero-initialized bank with one slot per CPU.
    /// Allocation failure surfaces as `CreateError::OutOfMemory` rather
    /// than aborting, per the crate's fallible-create contract.
    ///
    /// 分配一个零初始化的计数器组，每个 CPU 一个槽。
    /// 分配失败以 `CreateError::OutOfMemory` 返回而不是中止进程。
    pub(crate) fn with_cpus(cpus: usize) -> Result<Self, CreateError> {
        if cpus == 0 {
            return Err(CreateError::NoCpus);
        }

        let mut slots = Vec::new();
        slots.try_reserve_exact(cpus)?;
        for _ in 0..cpus {
            slots.push(CpuSlot::new());
        }

        Ok(CounterBank {
            slots: slots.into_boxed_slice(),
        })
    }

    #[inline]
    pub(crate) fn cpus(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn slot(&self, cpu: usize) -> &CpuSlot {
        &self.slots[cpu]
    }

    /// Sum of every counter in the bank, both epochs. With no reader
    /// inside a section and no grace period folding, this is zero.
    /// 计数器组中所有计数器（两个纪元）之和。
    /// 没有读者在临界区内且没有宽限期折叠时，该值为零。
    pub(crate) fn total(&self) -> i64 {
        self.slots
            .iter()
            .map(|slot| {
                let counts = slot.pin();
                counts[0] + counts[1]
            })
            .sum()
    }
}

// Thread-to-CPU placement. Placement only decides which slot a thread
// updates; it is not part of the synchronized state, so plain std
// primitives are used even under loom.
// 线程到 CPU 的放置。放置只决定线程更新哪个槽；它不属于被同步的状态，
// 因此即使在 loom 下也使用普通 std 原语。
static NEXT_SEED: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

std::thread_local! {
    static CPU_SEED: Cell<Option<usize>> = const { Cell::new(None) };
}

/// The calling thread's virtual CPU for a bank of `cpus` slots.
/// Seeded round-robin on first use; stable for the life of the thread.
/// 调用线程在 `cpus` 个槽中对应的虚拟 CPU。
/// 首次使用时轮转分配；在线程生命周期内保持稳定。
#[inline]
pub(crate) fn current_cpu(cpus: usize) -> usize {
    CPU_SEED.with(|seed| {
        let s = match seed.get() {
            Some(s) => s,
            None => {
                let s = NEXT_SEED.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                seed.set(Some(s));
                s
            }
        };
        s % cpus
    })
}
