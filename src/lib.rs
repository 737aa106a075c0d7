//! Sleepable RCU domains.
//!
//! A [`SrcuDomain`] lets many concurrent readers traverse a shared
//! structure without locks while a writer waits, sleeping rather than
//! spinning, until every reader that might have observed the old version
//! has finished:
//!
//! - Readers call [`SrcuDomain::enter`] / [`SrcuDomain::exit`]. The fast
//!   path touches only the calling CPU's cache-line-private counter pair
//!   and never blocks on a writer.
//! - Writers call [`SrcuDomain::synchronize`], which flips the domain's
//!   epoch, folds every CPU's old-epoch counter into a global drain-count
//!   through a synchronous cross-CPU broadcast, and sleeps until the
//!   drain-count reaches zero.
//!
//! The guarantee: any read performed inside a section that began before a
//! `synchronize` call's epoch flip completes before that call returns.
//!
//! 可睡眠 RCU 域。
//! [`SrcuDomain`] 允许大量并发读者无锁遍历共享结构，同时写者以睡眠而非
//! 自旋的方式等待，直到所有可能看到旧版本的读者结束。
//! 保证：任何在某次 `synchronize` 纪元翻转之前开始的临界区内的读取，
//! 都在该调用返回之前完成。

mod domain;
mod percpu;
mod reader;
mod state;
mod sync;
mod xcall;

pub use domain::{CreateError, SrcuDomain, SrcuDomainBuilder};
pub use reader::ReadTicket;
pub use xcall::{CrossCall, InlineCrossCall};

#[cfg(test)]
mod tests;
