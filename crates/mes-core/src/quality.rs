//! 品質檢驗模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{ProductId, ProductionOrderId, QualityCheckId, QualityParameterId};

/// 品質參數（每個產品的量測規格範圍）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityParameter {
    pub id: QualityParameterId,
    pub product_id: ProductId,
    pub name: String,
    pub min_value: Decimal,
    pub max_value: Decimal,
}

impl QualityParameter {
    pub fn new(
        product_id: ProductId,
        name: impl Into<String>,
        min_value: Decimal,
        max_value: Decimal,
    ) -> Self {
        Self {
            id: QualityParameterId(0),
            product_id,
            name: name.into(),
            min_value,
            max_value,
        }
    }

    /// 量測值是否落在規格內（含上下限）
    pub fn contains(&self, value: Decimal) -> bool {
        value >= self.min_value && value <= self.max_value
    }
}

/// 量測值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMeasurement {
    pub parameter_id: QualityParameterId,
    pub measured_value: Decimal,
}

/// 品質檢驗
///
/// 不檢查 approved + rejected 是否等於 checked，允許記錄進行中的檢驗。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityCheck {
    pub id: QualityCheckId,
    pub production_order_id: ProductionOrderId,
    pub checked_quantity: Decimal,
    pub approved_quantity: Decimal,
    pub rejected_quantity: Decimal,
    pub rejection_reason: Option<String>,
    pub measurements: Vec<QualityMeasurement>,
}

impl QualityCheck {
    pub fn new(
        production_order_id: ProductionOrderId,
        checked_quantity: Decimal,
        approved_quantity: Decimal,
        rejected_quantity: Decimal,
    ) -> Self {
        Self {
            id: QualityCheckId(0),
            production_order_id,
            checked_quantity,
            approved_quantity,
            rejected_quantity,
            rejection_reason: None,
            measurements: Vec::new(),
        }
    }

    /// 建構器模式：設置拒收原因
    pub fn with_rejection_reason(mut self, reason: impl Into<String>) -> Self {
        self.rejection_reason = Some(reason.into());
        self
    }

    /// 記錄一筆量測值
    pub fn record_measurement(&mut self, parameter_id: QualityParameterId, value: Decimal) {
        self.measurements.push(QualityMeasurement {
            parameter_id,
            measured_value: value,
        });
    }
}
