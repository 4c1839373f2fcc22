//! 额度账本 - 业务能力层
//!
//! 每次生成开始前扣除一个单位，额度不足时不允许开始。可在多个任务间共享。

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::debug;

use crate::error::BusinessError;

/// 额度账本
#[derive(Debug)]
pub struct CreditLedger {
    balance: AtomicU32,
}

impl CreditLedger {
    pub fn new(initial: u32) -> Self {
        Self {
            balance: AtomicU32::new(initial),
        }
    }

    pub fn balance(&self) -> u32 {
        self.balance.load(Ordering::SeqCst)
    }

    /// 扣除一个单位，返回剩余额度
    pub fn try_consume(&self) -> Result<u32, BusinessError> {
        self.balance
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |b| b.checked_sub(1))
            .map(|previous| {
                debug!("扣除 1 个额度，剩余 {}", previous - 1);
                previous - 1
            })
            .map_err(|balance| BusinessError::InsufficientCredits { balance })
    }
}
