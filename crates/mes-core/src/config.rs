//! 計算引擎配置

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{MesError, Result};

/// 計算引擎參數
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 效率係數取樣的最近日誌筆數
    pub efficiency_window: usize,

    /// 實際週期時間取樣的最近日誌筆數
    pub cycle_time_window: usize,

    /// 無日誌時的預設效率
    pub default_efficiency: Decimal,

    /// 效率上限
    pub efficiency_cap: Decimal,

    /// 實際耗時總和為零時的效率
    pub zero_actual_efficiency: Decimal,

    /// 帳冊寫入衝突的最大重試次數
    pub ledger_max_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            efficiency_window: 100,
            cycle_time_window: 50,
            default_efficiency: Decimal::new(80, 2),
            efficiency_cap: Decimal::new(120, 2),
            zero_actual_efficiency: Decimal::ONE,
            ledger_max_retries: 3,
        }
    }
}

impl EngineConfig {
    /// 從 JSON 載入配置，未提供的欄位使用預設值
    ///
    /// # 範例
    /// ```
    /// # use mes_core::EngineConfig;
    /// let config = EngineConfig::from_json_str(r#"{ "efficiency_window": 20 }"#).unwrap();
    /// assert_eq!(config.efficiency_window, 20);
    /// assert_eq!(config.cycle_time_window, 50);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| MesError::Validation(format!("無法解析引擎配置: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 建構器模式：設置效率取樣筆數
    pub fn with_efficiency_window(mut self, window: usize) -> Self {
        self.efficiency_window = window;
        self
    }

    /// 建構器模式：設置週期時間取樣筆數
    pub fn with_cycle_time_window(mut self, window: usize) -> Self {
        self.cycle_time_window = window;
        self
    }

    /// 建構器模式：設置預設效率
    pub fn with_default_efficiency(mut self, efficiency: Decimal) -> Self {
        self.default_efficiency = efficiency;
        self
    }

    /// 建構器模式：設置效率上限
    pub fn with_efficiency_cap(mut self, cap: Decimal) -> Self {
        self.efficiency_cap = cap;
        self
    }

    /// 建構器模式：設置帳冊重試次數
    pub fn with_ledger_max_retries(mut self, retries: u32) -> Self {
        self.ledger_max_retries = retries;
        self
    }

    /// 檢查參數一致性
    pub fn validate(&self) -> Result<()> {
        if self.efficiency_window == 0 || self.cycle_time_window == 0 {
            return Err(MesError::Validation("取樣筆數必須大於 0".to_string()));
        }
        if self.efficiency_cap <= Decimal::ZERO {
            return Err(MesError::Validation("效率上限必須大於 0".to_string()));
        }
        if self.default_efficiency < Decimal::ZERO || self.zero_actual_efficiency < Decimal::ZERO {
            return Err(MesError::Validation("預設效率不可為負".to_string()));
        }
        if self.default_efficiency > self.efficiency_cap
            || self.zero_actual_efficiency > self.efficiency_cap
        {
            return Err(MesError::Validation(format!(
                "預設效率不可超過上限 {}",
                self.efficiency_cap
            )));
        }
        Ok(())
    }
}
