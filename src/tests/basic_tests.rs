/// 基础测试模块
/// 测试核心功能的正确性
use crate::SrcuDomain;

/// 测试1: 创建域
#[test]
fn test_create_domain() {
    let domain = SrcuDomain::new("basic").unwrap();

    assert_eq!(domain.name(), "basic");
    assert!(domain.cpus() >= 1);
    assert_eq!(domain.generation(), 0);
}

/// 测试2: 进入并退出一个读者临界区（快路径）
#[test]
fn test_enter_exit_fast_path() {
    let domain = SrcuDomain::new("basic").unwrap();

    let ticket = domain.enter();
    assert_eq!(ticket.generation(), 0);
    domain.exit(ticket);

    // 没有读者在临界区内时，计数器守恒
    assert_eq!(domain.counter_total(), 0);
}

/// 测试3: read 闭包辅助方法
#[test]
fn test_read_closure() {
    let domain = SrcuDomain::new("basic").unwrap();

    let value = domain.read(|| 40 + 2);
    assert_eq!(value, 42);
    assert_eq!(domain.counter_total(), 0);
}

/// 测试4: 没有读者时 synchronize 立即返回
#[test]
fn test_synchronize_no_readers() {
    let domain = SrcuDomain::new("basic").unwrap();

    domain.synchronize();
    assert_eq!(domain.generation(), 1);

    // 每次 synchronize 使代数恰好前进一
    for expected in 2..=10 {
        domain.synchronize();
        assert_eq!(domain.generation(), expected);
    }
}

/// 测试5: 嵌套的读者临界区使用独立票据
#[test]
fn test_nested_sections() {
    let domain = SrcuDomain::new("basic").unwrap();

    let outer = domain.enter();
    let inner = domain.enter();

    domain.exit(inner);
    domain.exit(outer);

    assert_eq!(domain.counter_total(), 0);
}

/// 测试6: drop 票据等价于退出
#[test]
fn test_ticket_drop_is_exit() {
    let domain = SrcuDomain::new("basic").unwrap();

    {
        let _ticket = domain.enter();
        // 票据在作用域结束时被 drop
    }

    assert_eq!(domain.counter_total(), 0);
    domain.synchronize();
    assert_eq!(domain.counter_total(), 0);
}

/// 测试7: 构建器配置 CPU 数量
#[test]
fn test_builder_cpus() {
    let domain = SrcuDomain::builder().cpus(4).build("basic").unwrap();
    assert_eq!(domain.cpus(), 4);
}

/// 测试8: 票据记录进入时观察到的代数
#[test]
fn test_ticket_observes_generation() {
    let domain = SrcuDomain::new("basic").unwrap();

    domain.synchronize();
    domain.synchronize();
    assert_eq!(domain.generation(), 2);

    let ticket = domain.enter();
    assert_eq!(ticket.generation(), 2);
    domain.exit(ticket);
}

/// 测试9: 嵌套调用 read
#[test]
fn test_read_reentrant() {
    let domain = SrcuDomain::new("basic").unwrap();

    let value = domain.read(|| domain.read(|| 7));
    assert_eq!(value, 7);
    assert_eq!(domain.counter_total(), 0);
}

/// 测试10: Debug 输出包含域的名称
#[test]
fn test_domain_debug() {
    let domain = SrcuDomain::builder().cpus(2).build("debug-me").unwrap();
    let text = format!("{domain:?}");
    assert!(text.contains("debug-me"));
}
