use std::thread::ThreadId;

/// Number of epoch slots per counter pair. The generation's low bit
/// selects which slot is active for new readers.
/// 每对计数器的纪元槽数量。代数的最低位选择新读者使用哪个活跃槽。
pub(crate) const EPOCHS: usize = 2;

/// Epoch parity of a generation value.
/// 代数值的纪元奇偶性。
#[inline]
pub(crate) fn parity(generation: u64) -> usize {
    (generation & 1) as usize
}

/// Grace-period bookkeeping for one domain, guarded by the domain mutex.
///
/// `drain` counts readers from the previously-active epoch that have not
/// yet been accounted for. It is folded up from the per-CPU counters by
/// the cross-call and decremented by slow-path exits; between grace
/// periods it is exactly zero. `waiter` records which thread, if any, is
/// running a grace period; it exists for diagnostics and to serialize
/// writers, never for the reader fast path.
///
/// 单个域的宽限期簿记，由域互斥锁保护。
/// `drain` 统计上一个活跃纪元中尚未结算的读者。它由跨 CPU 调用从每 CPU
/// 计数器折叠而来，并由慢路径退出递减；两次宽限期之间恰好为零。
/// `waiter` 记录当前正在运行宽限期的线程（若有），仅用于诊断和写者串行化，
/// 绝不涉及读者快路径。
#[derive(Debug)]
pub(crate) struct GraceState {
    /// Readers from the draining epoch not yet accounted for.
    /// 正在排空的纪元中尚未结算的读者数。
    pub(crate) drain: i64,
    /// The thread currently running a grace period, if any.
    /// 当前正在运行宽限期的线程（若有）。
    pub(crate) waiter: Option<ThreadId>,
}

impl GraceState {
    pub(crate) fn new() -> Self {
        GraceState {
            drain: 0,
            waiter: None,
        }
    }
}
