//! 最近記錄取樣窗
//!
//! 「最近 N 筆」的取樣規則與儲存引擎無關：依建立順序由新到舊排序後截取。

use crate::ids::ProductionLogId;
use crate::production::ProductionLog;

/// 依建立順序排序的記錄
pub trait Sequenced {
    /// 建立順序鍵，越大越新
    fn sequence(&self) -> u64;
}

impl Sequenced for ProductionLog {
    fn sequence(&self) -> u64 {
        self.id.value()
    }
}

impl Sequenced for ProductionLogId {
    fn sequence(&self) -> u64 {
        self.value()
    }
}

/// 有上限的最近記錄取樣窗
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyWindow {
    limit: usize,
}

impl RecencyWindow {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// 由新到舊取最多 `limit` 筆
    pub fn select<'a, T, I>(&self, records: I) -> Vec<&'a T>
    where
        T: Sequenced + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut selected: Vec<&T> = records.into_iter().collect();
        selected.sort_by(|a, b| b.sequence().cmp(&a.sequence()));
        selected.truncate(self.limit);
        selected
    }

    /// 同 [`select`](Self::select)，回傳擁有所有權的副本
    pub fn select_owned<'a, T, I>(&self, records: I) -> Vec<T>
    where
        T: Sequenced + Clone + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        self.select(records).into_iter().cloned().collect()
    }
}
