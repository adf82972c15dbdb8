//! BOM 用量與材料成本

use mes_core::{Bom, BomItem, ProductId, Result};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::arith::{checked_sum, OrOverflow};

/// 單一明細的材料成本
#[derive(Debug, Clone, Serialize)]
pub struct MaterialLine {
    pub component_id: ProductId,

    /// 含損耗的需求量
    pub required_quantity: Decimal,

    pub unit_price: Decimal,

    /// 需求量 × 單價
    pub line_cost: Decimal,
}

/// BOM 計算器
pub struct BomCalculator;

impl BomCalculator {
    /// 含損耗的需求量
    ///
    /// 需求量 = 用量 / (1 − 損耗率/100)；損耗率為 0 時直接回傳用量。
    /// 損耗率 ≥ 100 時除數為零或負，結果溢位時同樣回傳配置錯誤。
    pub fn required_quantity(item: &BomItem) -> Result<Decimal> {
        if item.scrap_factor.is_zero() {
            return Ok(item.quantity);
        }
        item.validate()?;

        let multiplier = Decimal::ONE - item.scrap_factor / Decimal::ONE_HUNDRED;
        item.quantity
            .checked_div(multiplier)
            .or_overflow(&item.child_product_id, "required_quantity")
    }

    /// 逐明細材料成本
    ///
    /// `price_of` 查詢元件單價，元件不存在時應回傳參照錯誤。
    pub fn material_cost_breakdown<F>(bom: &Bom, mut price_of: F) -> Result<Vec<MaterialLine>>
    where
        F: FnMut(ProductId) -> Result<Decimal>,
    {
        bom.items()
            .iter()
            .map(|item| {
                let required_quantity = Self::required_quantity(item)?;
                let unit_price = price_of(item.child_product_id)?;
                let line_cost = required_quantity
                    .checked_mul(unit_price)
                    .or_overflow(&item.child_product_id, "material_cost")?;
                Ok(MaterialLine {
                    component_id: item.child_product_id,
                    required_quantity,
                    unit_price,
                    line_cost,
                })
            })
            .collect()
    }

    /// 材料成本合計 = Σ 含損耗需求量 × 元件單價
    pub fn material_cost<F>(bom: &Bom, price_of: F) -> Result<Decimal>
    where
        F: FnMut(ProductId) -> Result<Decimal>,
    {
        let lines = Self::material_cost_breakdown(bom, price_of)?;
        checked_sum(
            lines.iter().map(|line| line.line_cost),
            &bom.id,
            "material_cost",
        )
    }
}
