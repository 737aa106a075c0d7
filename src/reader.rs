use crate::domain::SrcuDomain;
use crate::percpu::current_cpu;
use crate::state::parity;
use crate::sync::Ordering;
use tracing::trace;

/// An open reader section: the generation observed at `enter`, bound to
/// the domain it came from.
///
/// The ticket is single-use and `#[must_use]`: the section ends when the
/// ticket is handed back to `exit`, or when it is dropped. Because exit
/// consumes the ticket, double-exit and exiting a section that was never
/// entered are unrepresentable.
///
/// Tickets may cross threads: a section may end on a different thread
/// (a "migrated" reader) and stay correct, because only the cross-CPU
/// sum of the counters matters.
///
/// 一个打开的读者临界区：`enter` 时观察到的代数，绑定到其来源的域。
/// 票据一次性使用且 `#[must_use]`：把票据交还给 `exit` 或将其 drop 时
/// 临界区结束。由于 exit 消耗票据，重复退出和退出从未进入的临界区在
/// 类型上不可表达。
/// 票据可以跨线程：临界区可以在另一个线程上结束（"迁移"的读者）而保持
/// 正确，因为只有计数器的跨 CPU 总和才有意义。
#[must_use = "a reader section stays open until its ticket is returned to exit()"]
#[derive(Debug)]
pub struct ReadTicket<'a> {
    domain: &'a SrcuDomain,
    generation: u64,
}

impl ReadTicket<'_> {
    /// The generation observed when this section was entered.
    /// 进入该临界区时观察到的代数。
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub(crate) fn same_domain(&self, domain: &SrcuDomain) -> bool {
        std::ptr::eq(self.domain, domain)
    }
}

impl Drop for ReadTicket<'_> {
    /// Dropping the ticket ends the section.
    /// drop 票据即结束临界区。
    #[inline]
    fn drop(&mut self) {
        self.domain.release(self.generation);
    }
}

impl SrcuDomain {
    /// Enter a reader section.
    ///
    /// Lock-free with respect to writers and to readers on other CPUs:
    /// the only state touched is the current CPU's counter pair, pinned
    /// for the few instructions of the update. Never blocks on a grace
    /// period. No barrier stronger than the slot pin is needed here; a
    /// concurrent grace period supplies its own ordering through the
    /// cross-call fold-in.
    ///
    /// Sections may nest freely: each `enter` returns an independent
    /// ticket and each enter/exit pair is counted exactly once.
    ///
    /// 进入一个读者临界区。
    /// 对写者和其他 CPU 上的读者无锁：唯一触及的状态是当前 CPU 的一对
    /// 计数器，仅在更新的几条指令期间钉住。绝不会被宽限期阻塞。
    /// 这里不需要比槽钉住更强的屏障；并发的宽限期会通过跨 CPU 折叠
    /// 提供自己的内存顺序。
    /// 临界区可以自由嵌套：每次 `enter` 返回独立的票据，每对
    /// enter/exit 恰好被计数一次。
    #[inline]
    pub fn enter(&self) -> ReadTicket<'_> {
        let cpu = current_cpu(self.bank.cpus());
        let mut counts = self.bank.slot(cpu).pin();
        // The generation read and the counter increment must not be
        // separated by this slot's fold-in; the slot pin guarantees it.
        // 代数读取与计数器递增之间不允许插入本槽的折叠；槽钉住保证了这一点。
        let generation = self.generation.load(Ordering::Acquire);
        counts[parity(generation)] += 1;
        drop(counts);

        ReadTicket {
            domain: self,
            generation,
        }
    }

    /// Exit a reader section, consuming its ticket.
    ///
    /// Fast path (no epoch flip since `enter`): decrement the current
    /// CPU's counter for the ticket's epoch; no writer contention.
    /// Slow path (a grace period flipped the epoch while the reader was
    /// inside): the decrement goes to the domain drain-count under the
    /// grace mutex, waking the waiter when it reaches zero. Either way
    /// the section is accounted for exactly once.
    ///
    /// 退出一个读者临界区，消耗其票据。
    /// 快路径（`enter` 以来没有纪元翻转）：递减当前 CPU 上该票据纪元的
    /// 计数器；与写者无竞争。
    /// 慢路径（读者在临界区内时宽限期翻转了纪元）：递减落到宽限互斥锁
    /// 保护的域排空计数上，归零时唤醒等待者。无论哪条路径，临界区都
    /// 恰好被结算一次。
    #[inline]
    pub fn exit(&self, ticket: ReadTicket<'_>) {
        debug_assert!(
            ticket.same_domain(self),
            "ticket returned to a different domain than it was issued by"
        );
        drop(ticket);
    }

    /// Run `f` inside a reader section.
    /// 在一个读者临界区内运行 `f`。
    #[inline]
    pub fn read<R>(&self, f: impl FnOnce() -> R) -> R {
        let ticket = self.enter();
        let out = f();
        self.exit(ticket);
        out
    }

    /// End the section a ticket opened. Called from the ticket's `Drop`.
    /// 结束票据所打开的临界区。由票据的 `Drop` 调用。
    fn release(&self, ticket_generation: u64) {
        let cpu = current_cpu(self.bank.cpus());
        let slot = self.bank.slot(cpu);
        let mut counts = slot.pin();
        let generation = self.generation.load(Ordering::Acquire);

        if generation == ticket_generation {
            // Fast path: our epoch is still active, the decrement stays
            // local to this CPU.
            // 快路径：我们的纪元仍然活跃，递减只落在本 CPU 上。
            counts[parity(generation)] -= 1;
            return;
        }

        // Slow path: a grace period advanced the epoch while we were
        // inside. Our increment has been (or will be, before the waiter
        // sleeps) folded into the drain-count, so the decrement must land
        // there too. A grace period cannot complete while we are inside,
        // so the epoch can be at most one ahead of the ticket.
        // 慢路径：我们在临界区内时宽限期推进了纪元。我们的递增已经（或将在
        // 等待者睡眠之前）被折叠进排空计数，因此递减也必须落在那里。
        // 宽限期在我们还在临界区内时无法完成，所以纪元最多领先票据一代。
        drop(counts);
        debug_assert_eq!(
            generation,
            ticket_generation + 1,
            "reader outlived a completed grace period"
        );

        let mut grace = self.grace.lock();
        grace.drain -= 1;
        if grace.drain == 0 {
            trace!(name = %self.name, "last draining reader exited");
            self.cv.notify_all();
        }
    }
}
