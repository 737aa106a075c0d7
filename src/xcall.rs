/// A synchronous cross-CPU broadcast: run a routine once per CPU and
/// return only after every invocation has completed.
///
/// The grace-period synchronizer uses this to fold each CPU's
/// inactive-epoch counter into the domain drain-count. The wait-for-all
/// property is load-bearing: `synchronize` may not start waiting on the
/// drain-count until every CPU's fold-in has run.
///
/// Implementations decide *where* the routine runs (inline, on a worker
/// per CPU, on a pinned thread); the synchronizer only requires that the
/// routine runs exactly once per CPU index in `0..cpus` and that
/// `broadcast` does not return early.
///
/// 同步的跨 CPU 广播：在每个 CPU 上运行一次例程，并在全部完成后才返回。
/// 宽限期同步器用它把每个 CPU 的非活跃纪元计数折叠进域的排空计数。
/// "等待全部完成"这一点是正确性的关键：在每个 CPU 的折叠都执行之前，
/// `synchronize` 不得开始等待排空计数。
/// 实现决定例程在哪里运行；同步器只要求例程对 `0..cpus` 中的每个 CPU
/// 索引恰好运行一次，且 `broadcast` 不会提前返回。
pub trait CrossCall: Send + Sync {
    /// Run `routine` once for each CPU index in `0..cpus`, waiting for
    /// all invocations to complete before returning.
    /// 对 `0..cpus` 中的每个 CPU 索引运行一次 `routine`，
    /// 等待所有调用完成后返回。
    fn broadcast(&self, cpus: usize, routine: &mut dyn FnMut(usize));
}

/// The default broadcast: runs the routine inline on the calling thread,
/// one CPU index after another.
///
/// In the hosted model a "CPU" is a bank slot, so visiting the slots
/// sequentially from the synchronizing thread is a faithful
/// single-processor simulation; the per-slot lock supplies the ordering
/// a real cross-call would get from running on the target CPU.
///
/// 默认广播：在调用线程上按 CPU 索引逐个内联运行例程。
/// 在用户态模型中"CPU"就是计数器组中的槽，由同步线程顺序访问即是忠实的
/// 单处理器模拟；每槽锁提供了真实跨 CPU 调用在目标 CPU 上运行所获得的
/// 内存顺序。
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineCrossCall;

impl CrossCall for InlineCrossCall {
    fn broadcast(&self, cpus: usize, routine: &mut dyn FnMut(usize)) {
        for cpu in 0..cpus {
            routine(cpu);
        }
    }
}
