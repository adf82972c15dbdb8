//! 淨需求計算

use mes_core::{Product, ProductId, ProductionOrder, Result, SalesOrder};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::arith::{checked_sum, OrOverflow};

/// 淨需求計算結果
#[derive(Debug, Clone, Serialize)]
pub struct NetRequirement {
    /// 產品
    pub product_id: ProductId,
    /// 未出貨訂單需求
    pub demand: Decimal,
    /// 安全庫存（最低庫存水位）
    pub safety_stock: Decimal,
    /// 現有庫存
    pub on_hand: Decimal,
    /// 在製數量（已計劃/生產中工單的剩餘量）
    pub in_production: Decimal,
    /// 淨需求
    pub net_requirement: Decimal,
}

impl NetRequirement {
    /// 是否需要補貨
    pub fn is_short(&self) -> bool {
        self.net_requirement > Decimal::ZERO
    }
}

/// 淨需求計算器（單層）
pub struct NettingCalculator;

impl NettingCalculator {
    /// 計算淨需求
    ///
    /// 淨需求 = max(0, 需求 + 安全庫存 − (現有庫存 + 在製數量))
    ///
    /// 只計入屬於此產品的未出貨銷售訂單，以及狀態為 PLANNED/IN_PROGRESS 的工單。
    pub fn calculate(
        product: &Product,
        sales_orders: &[SalesOrder],
        production_orders: &[ProductionOrder],
    ) -> Result<NetRequirement> {
        const COMPUTATION: &str = "net_requirement";

        let demand = checked_sum(
            sales_orders
                .iter()
                .filter(|so| so.product_id == product.id && !so.is_shipped)
                .map(|so| so.quantity),
            &product.id,
            COMPUTATION,
        )?;

        let in_production = checked_sum(
            production_orders
                .iter()
                .filter(|order| order.product_id == product.id && order.status.is_in_flight())
                .map(|order| order.remaining_quantity()),
            &product.id,
            COMPUTATION,
        )?;

        let on_hand = product.stock_quantity();
        let safety_stock = product.min_stock_level;

        let requirement = demand
            .checked_add(safety_stock)
            .zip(on_hand.checked_add(in_production))
            .and_then(|(needed, covered)| needed.checked_sub(covered))
            .or_overflow(&product.id, COMPUTATION)?;

        Ok(NetRequirement {
            product_id: product.id,
            demand,
            safety_stock,
            on_hand,
            in_production,
            net_requirement: requirement.max(Decimal::ZERO),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mes_core::{CustomerId, MesError, OrderStatus, ProductKind, ProductionOrderId};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, day).unwrap()
    }

    fn product(stock: i64, min_level: i64) -> Product {
        let mut product = Product::new("BIKE-001", "Bike", ProductKind::Final)
            .with_min_stock_level(Decimal::from(min_level))
            .with_stock_snapshot(Decimal::from(stock));
        product.id = ProductId(1);
        product
    }

    fn sales_order(quantity: i64) -> SalesOrder {
        SalesOrder::new(
            CustomerId(1),
            ProductId(1),
            Decimal::from(quantity),
            date(1),
            date(20),
        )
    }

    fn order(planned: i64, actual: i64, status: OrderStatus) -> ProductionOrder {
        let mut order =
            ProductionOrder::new(ProductId(1), Decimal::from(planned), date(1), date(10))
                .with_actual_quantity(Decimal::from(actual))
                .with_status(status);
        order.id = ProductionOrderId(1);
        order
    }

    #[test]
    fn test_shortfall_with_safety_stock() {
        // 需求 20 + 安全庫存 10 − 現有 5 = 25
        let result = NettingCalculator::calculate(&product(5, 10), &[sales_order(20)], &[])
            .unwrap();

        assert_eq!(result.demand, Decimal::from(20));
        assert_eq!(result.in_production, Decimal::ZERO);
        assert_eq!(result.net_requirement, Decimal::from(25));
        assert!(result.is_short());
    }

    #[test]
    fn test_shipped_orders_ignored() {
        let result = NettingCalculator::calculate(
            &product(0, 0),
            &[sales_order(20).shipped(), sales_order(5)],
            &[],
        )
        .unwrap();
        assert_eq!(result.demand, Decimal::from(5));
        assert_eq!(result.net_requirement, Decimal::from(5));
    }

    #[test]
    fn test_in_flight_production_counts_remaining() {
        let orders = vec![
            order(30, 10, OrderStatus::Planned),
            order(15, 5, OrderStatus::InProgress),
            order(100, 0, OrderStatus::Draft),
            order(100, 0, OrderStatus::Completed),
            order(100, 0, OrderStatus::Cancelled),
        ];

        let result = NettingCalculator::calculate(&product(0, 0), &[sales_order(40)], &orders)
            .unwrap();

        // (30 − 10) + (15 − 5)
        assert_eq!(result.in_production, Decimal::from(30));
        assert_eq!(result.net_requirement, Decimal::from(10));
    }

    #[test]
    fn test_surplus_is_clamped_to_zero() {
        let result = NettingCalculator::calculate(&product(500, 10), &[sales_order(20)], &[])
            .unwrap();
        assert_eq!(result.net_requirement, Decimal::ZERO);
        assert!(!result.is_short());
    }

    #[test]
    fn test_other_products_ignored() {
        let mut foreign = sales_order(99);
        foreign.product_id = ProductId(2);

        let result = NettingCalculator::calculate(&product(0, 0), &[foreign], &[])
            .unwrap();
        assert_eq!(result.demand, Decimal::ZERO);
    }

    #[test]
    fn test_demand_overflow() {
        let mut huge = sales_order(1);
        huge.quantity = Decimal::MAX;

        let result = NettingCalculator::calculate(&product(0, 0), &[huge.clone(), huge], &[]);
        assert!(matches!(
            result,
            Err(MesError::Configuration { computation: "net_requirement", .. })
        ));
    }
}
