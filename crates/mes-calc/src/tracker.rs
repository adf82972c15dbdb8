//! 工單追蹤：進度、延遲、成本估算

use chrono::NaiveDate;
use mes_core::{
    Bom, OrderStatus, ProductId, ProductionLog, ProductionOrder, Result, WorkCenter, WorkCenterId,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::arith::{checked_sum, OrOverflow};
use crate::bom::BomCalculator;
use crate::capacity::CapacityCalculator;

/// 工單成本估算
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CostEstimate {
    /// 材料成本
    pub material: Decimal,
    /// 人工/機台成本
    pub labor: Decimal,
    pub total: Decimal,
}

/// 工單追蹤器
pub struct OrderTracker;

impl OrderTracker {
    /// 指定日期時工單是否延遲（未完成且已過交期）
    pub fn is_delayed_on(order: &ProductionOrder, today: NaiveDate) -> bool {
        order.status != OrderStatus::Completed && today > order.due_date
    }

    /// 完成百分比，四捨五入至小數 2 位
    ///
    /// 實際產量取自此工單的日誌，而非工單上的 `actual_quantity`。
    pub fn current_progress(order: &ProductionOrder, logs: &[ProductionLog]) -> Result<Decimal> {
        const COMPUTATION: &str = "current_progress";
        if order.planned_quantity <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }

        let produced = checked_sum(
            logs.iter()
                .filter(|log| log.production_order_id == Some(order.id))
                .map(|log| log.quantity_produced),
            &order.id,
            COMPUTATION,
        )?;

        let progress = produced
            .checked_div(order.planned_quantity)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .or_overflow(&order.id, COMPUTATION)?;
        Ok(progress.round_dp(2))
    }

    /// 工單總成本估算
    ///
    /// - 材料 = 單件材料成本 × 計劃數量
    /// - 人工 = Σ ((準備 + 週期 × 計劃數量) / 60) × 每小時成本
    ///
    /// 沒有 BOM 時兩項皆為 0。
    pub fn estimated_total_cost<P, W>(
        order: &ProductionOrder,
        bom: Option<&Bom>,
        price_of: P,
        mut work_center_of: W,
    ) -> Result<CostEstimate>
    where
        P: FnMut(ProductId) -> Result<Decimal>,
        W: FnMut(WorkCenterId) -> Result<WorkCenter>,
    {
        let Some(bom) = bom else {
            return Ok(CostEstimate::default());
        };

        const COMPUTATION: &str = "estimated_total_cost";
        let material = BomCalculator::material_cost(bom, price_of)?
            .checked_mul(order.planned_quantity)
            .or_overflow(&order.id, COMPUTATION)?;

        let mut labor = Decimal::ZERO;
        for op in bom.operations() {
            let work_center = work_center_of(op.work_center_id)?;
            let cost =
                CapacityCalculator::operation_cost(op, order.planned_quantity, &work_center)?;
            labor = labor
                .checked_add(cost)
                .or_overflow(&order.id, COMPUTATION)?;
        }

        Ok(CostEstimate {
            material,
            labor,
            total: material
                .checked_add(labor)
                .or_overflow(&order.id, COMPUTATION)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mes_core::{BomItem, MesError, Operation, ProductionOrderId};
    use rstest::rstest;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    fn order(planned: i64) -> ProductionOrder {
        let mut order =
            ProductionOrder::new(ProductId(1), Decimal::from(planned), date(11, 1), date(11, 10))
                .with_status(OrderStatus::InProgress);
        order.id = ProductionOrderId(7);
        order
    }

    fn log_for(order_id: Option<ProductionOrderId>, produced: i64) -> ProductionLog {
        let log = ProductionLog::new(
            WorkCenterId(1),
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::from(produced),
        );
        match order_id {
            Some(id) => log.with_order(id),
            None => log,
        }
    }

    #[rstest]
    #[case(OrderStatus::InProgress, date(11, 11), true)]
    #[case(OrderStatus::InProgress, date(11, 10), false)]
    #[case(OrderStatus::Completed, date(12, 31), false)]
    #[case(OrderStatus::Cancelled, date(12, 31), true)]
    fn test_is_delayed_on(
        #[case] status: OrderStatus,
        #[case] today: NaiveDate,
        #[case] expected: bool,
    ) {
        let order = order(10).with_status(status);
        assert_eq!(OrderTracker::is_delayed_on(&order, today), expected);
    }

    #[test]
    fn test_progress_from_logs() {
        let logs = vec![
            log_for(Some(ProductionOrderId(7)), 30),
            log_for(Some(ProductionOrderId(7)), 20),
            log_for(Some(ProductionOrderId(8)), 500),
            log_for(None, 500),
        ];

        // 50 / 200 × 100
        let progress = OrderTracker::current_progress(&order(200), &logs).unwrap();
        assert_eq!(progress, Decimal::from(25));
    }

    #[test]
    fn test_progress_rounding_and_zero_plan() {
        let logs = vec![log_for(Some(ProductionOrderId(7)), 1)];
        let progress = |planned: i64, logs: &[ProductionLog]| {
            OrderTracker::current_progress(&order(planned), logs)
                .unwrap()
        };
        assert_eq!(progress(3, &logs), Decimal::new(3333, 2));
        assert_eq!(progress(0, &logs), Decimal::ZERO);
        assert_eq!(progress(3, &[]), Decimal::ZERO);
    }

    #[test]
    fn test_progress_overflow() {
        let mut tiny = order(1);
        tiny.planned_quantity = Decimal::new(1, 28);
        let logs = vec![log_for(Some(ProductionOrderId(7)), 1_000_000)];

        let result = OrderTracker::current_progress(&tiny, &logs);
        assert!(matches!(
            result,
            Err(MesError::Configuration { computation: "current_progress", .. })
        ));
    }

    #[test]
    fn test_estimated_total_cost() {
        let bom = Bom::new(ProductId(1))
            .with_item(BomItem::new(ProductId(10), Decimal::from(2)))
            .with_operation(Operation::new(
                WorkCenterId(1),
                10,
                "assemble",
                Decimal::from(30),
                Decimal::from(3),
            ))
            .unwrap();
        let work_center = WorkCenter::new("ASM", "Assembly")
            .with_hourly_rate(Decimal::from(60));

        let estimate = OrderTracker::estimated_total_cost(
            &order(10),
            Some(&bom),
            |_| Ok(Decimal::from(5)),
            |_| Ok(work_center.clone()),
        )
        .unwrap();

        // 材料 2 × 5 × 10；人工 (30 + 3 × 10) / 60 × 60
        assert_eq!(estimate.material, Decimal::from(100));
        assert_eq!(estimate.labor, Decimal::from(60));
        assert_eq!(estimate.total, Decimal::from(160));
    }

    #[test]
    fn test_estimated_total_cost_without_bom() {
        let estimate = OrderTracker::estimated_total_cost(
            &order(10),
            None,
            |_| Ok(Decimal::ONE),
            |id| Err(MesError::reference(id.to_string(), "estimated_total_cost")),
        )
        .unwrap();
        assert_eq!(estimate, CostEstimate::default());
    }

    #[test]
    fn test_estimated_total_cost_missing_work_center() {
        let bom = Bom::new(ProductId(1))
            .with_operation(Operation::new(
                WorkCenterId(9),
                10,
                "paint",
                Decimal::ZERO,
                Decimal::ONE,
            ))
            .unwrap();

        let result = OrderTracker::estimated_total_cost(
            &order(10),
            Some(&bom),
            |_| Ok(Decimal::ONE),
            |id| Err(MesError::reference(id.to_string(), "estimated_total_cost")),
        );
        assert!(matches!(result, Err(MesError::Reference { .. })));
    }
}
