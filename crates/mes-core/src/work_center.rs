//! 工作中心

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::WorkCenterId;

/// 工作中心
///
/// 效率係數不儲存於此，每次讀取時由最近的生產日誌推算。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkCenter {
    pub id: WorkCenterId,
    pub code: String,
    pub name: String,

    /// 每日產能（小時）
    pub daily_capacity_hours: Decimal,

    /// 每小時成本
    pub hourly_rate: Decimal,
}

impl WorkCenter {
    /// 創建新的工作中心（每日 8 小時、每小時 100）
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: WorkCenterId(0),
            code: code.into(),
            name: name.into(),
            daily_capacity_hours: Decimal::from(8),
            hourly_rate: Decimal::ONE_HUNDRED,
        }
    }

    /// 建構器模式：設置每日產能
    pub fn with_daily_capacity_hours(mut self, hours: Decimal) -> Self {
        self.daily_capacity_hours = hours;
        self
    }

    /// 建構器模式：設置每小時成本
    pub fn with_hourly_rate(mut self, rate: Decimal) -> Self {
        self.hourly_rate = rate;
        self
    }
}
