//! # MES Calculation Engine
//!
//! 衍生值計算引擎：BOM 用量與成本、淨需求、工作中心績效、工單進度/成本/延遲、品質良率。
//! 所有衍生值都在讀取時由歷史記錄重新計算，不做快取。

mod arith;
pub mod bom;
pub mod capacity;
pub mod engine;
pub mod netting;
pub mod performance;
pub mod quality;
pub mod tracker;

// Re-export 主要類型
pub use bom::{BomCalculator, MaterialLine};
pub use capacity::{CapacityCalculator, WorkCenterLoad};
pub use engine::MesEngine;
pub use netting::{NetRequirement, NettingCalculator};
pub use performance::PerformanceEstimator;
pub use quality::{OutOfSpec, QualityScorer};
pub use tracker::{CostEstimate, OrderTracker};

use mes_core::ProductionOrderId;
use rust_decimal::Decimal;
use serde::Serialize;

/// 工單綜合報表
#[derive(Debug, Clone, Serialize)]
pub struct OrderReport {
    pub order_id: ProductionOrderId,

    /// 完成百分比
    pub progress: Decimal,

    pub is_delayed: bool,

    /// 尚未完成的數量（計劃 − 實際）
    pub remaining_quantity: Decimal,

    pub cost: CostEstimate,

    /// 所有檢驗的合計良率
    pub quality_yield: Decimal,

    /// 警告信息
    pub warnings: Vec<EngineWarning>,
}

impl OrderReport {
    /// 添加警告
    pub fn add_warning(&mut self, warning: EngineWarning) {
        self.warnings.push(warning);
    }
}

/// 計算警告
#[derive(Debug, Clone, Serialize)]
pub struct EngineWarning {
    pub entity: String,
    pub message: String,
    pub severity: WarningSeverity,
}

impl EngineWarning {
    pub fn new(entity: String, message: String, severity: WarningSeverity) -> Self {
        Self {
            entity,
            message,
            severity,
        }
    }

    pub fn info(entity: String, message: String) -> Self {
        Self::new(entity, message, WarningSeverity::Info)
    }

    pub fn warning(entity: String, message: String) -> Self {
        Self::new(entity, message, WarningSeverity::Warning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningSeverity {
    Info,
    Warning,
}
