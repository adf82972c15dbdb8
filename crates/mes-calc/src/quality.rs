//! 品質良率

use mes_core::{MesError, QualityCheck, QualityParameter, QualityParameterId, Result};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::arith::{checked_sum, OrOverflow};

/// 超出規格的量測值
#[derive(Debug, Clone, Serialize)]
pub struct OutOfSpec {
    pub parameter_id: QualityParameterId,
    pub parameter_name: String,
    pub measured_value: Decimal,
    pub min_value: Decimal,
    pub max_value: Decimal,
}

/// 品質評分器
pub struct QualityScorer;

impl QualityScorer {
    /// 單次檢驗良率（%）= 合格數 / 檢驗數 × 100；檢驗數為 0 時為 0
    pub fn quality_score(check: &QualityCheck) -> Result<Decimal> {
        Self::ratio(check.approved_quantity, check.checked_quantity)
            .or_overflow(&check.id, "quality_score")
    }

    /// 工單合計良率（%）= Σ 合格數 / Σ 檢驗數 × 100
    ///
    /// 溢位錯誤以第一筆檢驗的工單標示。
    pub fn order_yield(checks: &[QualityCheck]) -> Result<Decimal> {
        const COMPUTATION: &str = "order_yield";
        let Some(first) = checks.first() else {
            return Ok(Decimal::ZERO);
        };
        let order = &first.production_order_id;

        let approved = checked_sum(
            checks.iter().map(|c| c.approved_quantity),
            order,
            COMPUTATION,
        )?;
        let checked = checked_sum(
            checks.iter().map(|c| c.checked_quantity),
            order,
            COMPUTATION,
        )?;
        Self::ratio(approved, checked)
            .or_overflow(order, COMPUTATION)
    }

    /// 列出超出規格範圍的量測值
    ///
    /// 量測值參照的參數不在 `parameters` 中時回傳參照錯誤。
    pub fn out_of_spec(
        check: &QualityCheck,
        parameters: &[QualityParameter],
    ) -> Result<Vec<OutOfSpec>> {
        let mut findings = Vec::new();

        for measurement in &check.measurements {
            let parameter_id = measurement.parameter_id;
            let param = parameters
                .iter()
                .find(|p| p.id == parameter_id)
                .ok_or_else(|| MesError::reference(parameter_id.to_string(), "out_of_spec"))?;

            if !param.contains(measurement.measured_value) {
                findings.push(OutOfSpec {
                    parameter_id: param.id,
                    parameter_name: param.name.clone(),
                    measured_value: measurement.measured_value,
                    min_value: param.min_value,
                    max_value: param.max_value,
                });
            }
        }

        Ok(findings)
    }

    fn ratio(approved: Decimal, checked: Decimal) -> Option<Decimal> {
        if checked > Decimal::ZERO {
            approved
                .checked_div(checked)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        } else {
            Some(Decimal::ZERO)
        }
    }
}
