/// 生命周期测试模块
/// 测试域的创建、配置与销毁
use crate::{CreateError, CrossCall, SrcuDomain};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 测试1: 创建后立即销毁
#[test]
fn test_create_then_drop() {
    let domain = SrcuDomain::new("lifecycle").unwrap();
    drop(domain);
}

/// 测试2: 创建多个独立的域
#[test]
fn test_many_domains() {
    let domains: Vec<_> = (0..100)
        .map(|i| SrcuDomain::new(format!("domain-{i}")).unwrap())
        .collect();

    for (i, domain) in domains.iter().enumerate() {
        assert_eq!(domain.name(), format!("domain-{i}"));
    }
}

/// 测试3: 域之间互相独立
#[test]
fn test_domains_are_independent() {
    let a = SrcuDomain::new("a").unwrap();
    let b = SrcuDomain::new("b").unwrap();

    a.synchronize();
    a.synchronize();

    assert_eq!(a.generation(), 2);
    assert_eq!(b.generation(), 0);
}

/// 测试4: 有过活动的域可以安全销毁
#[test]
fn test_drop_after_activity() {
    let domain = SrcuDomain::new("lifecycle").unwrap();

    for _ in 0..10 {
        let ticket = domain.enter();
        domain.exit(ticket);
        domain.synchronize();
    }

    assert_eq!(domain.counter_total(), 0);
    drop(domain);
}

/// 测试5: 零个 CPU 槽是错误
#[test]
fn test_zero_cpus_is_error() {
    let err = SrcuDomain::builder().cpus(0).build("lifecycle").unwrap_err();
    assert!(matches!(err, CreateError::NoCpus));
}

/// 测试6: 单 CPU 槽的域完整可用
#[test]
fn test_single_cpu_domain() {
    let domain = SrcuDomain::builder().cpus(1).build("uni").unwrap();

    let ticket = domain.enter();
    domain.exit(ticket);
    domain.synchronize();

    assert_eq!(domain.generation(), 1);
    assert_eq!(domain.counter_total(), 0);
}

/// 记录每次广播访问了哪些 CPU 的跨 CPU 调用实现
#[derive(Clone)]
struct RecordingCrossCall {
    broadcasts: Arc<AtomicUsize>,
    visited: Arc<Mutex<Vec<usize>>>,
}

impl CrossCall for RecordingCrossCall {
    fn broadcast(&self, cpus: usize, routine: &mut dyn FnMut(usize)) {
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
        for cpu in 0..cpus {
            self.visited.lock().unwrap().push(cpu);
            routine(cpu);
        }
    }
}

/// 测试7: 注入的跨 CPU 广播在每个 CPU 上恰好运行一次
#[test]
fn test_injected_cross_call() {
    let xcall = RecordingCrossCall {
        broadcasts: Arc::new(AtomicUsize::new(0)),
        visited: Arc::new(Mutex::new(Vec::new())),
    };

    let domain = SrcuDomain::builder()
        .cpus(3)
        .cross_call(xcall.clone())
        .build("recorded")
        .unwrap();

    domain.synchronize();
    domain.synchronize();

    assert_eq!(xcall.broadcasts.load(Ordering::SeqCst), 2);
    assert_eq!(*xcall.visited.lock().unwrap(), vec![0, 1, 2, 0, 1, 2]);
}

/// 测试8: 错误类型实现了 Display
#[test]
fn test_error_display() {
    assert_eq!(
        CreateError::NoCpus.to_string(),
        "domain requires at least one cpu"
    );
    assert_eq!(
        CreateError::OutOfMemory.to_string(),
        "per-cpu counter bank allocation failed"
    );
}

/// 测试9: 默认构建器可用
#[test]
fn test_builder_defaults() {
    let domain = SrcuDomain::builder().build("defaults").unwrap();
    assert!(domain.cpus() >= 1);
    assert_eq!(domain.generation(), 0);
}
