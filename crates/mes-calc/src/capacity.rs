//! 產能與工時成本彙總（不做排程）

use mes_core::{Bom, Operation, Result, WorkCenter, WorkCenterId};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::arith::OrOverflow;

const MINUTES_PER_HOUR: Decimal = Decimal::from_parts(60, 0, 0, false, 0);

/// 單一工作中心的負荷
#[derive(Debug, Clone, Serialize)]
pub struct WorkCenterLoad {
    pub work_center_id: WorkCenterId,

    /// 途程中使用此工作中心的作業數
    pub operations: usize,

    /// 總工時（分鐘）
    pub minutes: Decimal,

    pub hours: Decimal,

    /// 工時成本
    pub cost: Decimal,

    /// 所需產能天數（每日產能為 0 時為 None）
    pub days_required: Option<Decimal>,
}

/// 產能計算器
pub struct CapacityCalculator;

impl CapacityCalculator {
    /// 作業總工時（分鐘）= 準備時間 + 週期時間 × 數量
    pub fn operation_minutes(operation: &Operation, quantity: Decimal) -> Result<Decimal> {
        operation
            .cycle_time
            .checked_mul(quantity)
            .and_then(|run| run.checked_add(operation.setup_time))
            .or_overflow(&operation.id, "operation_minutes")
    }

    /// 作業工時成本 = (總工時 / 60) × 每小時成本
    pub fn operation_cost(
        operation: &Operation,
        quantity: Decimal,
        work_center: &WorkCenter,
    ) -> Result<Decimal> {
        Self::operation_minutes(operation, quantity)?
            .checked_mul(work_center.hourly_rate)
            .map(|cost| cost / MINUTES_PER_HOUR)
            .or_overflow(&operation.id, "operation_cost")
    }

    /// 依工作中心彙總途程負荷，順序為工作中心在途程中首次出現的順序
    pub fn load_by_work_center<F>(
        bom: &Bom,
        quantity: Decimal,
        mut work_center_of: F,
    ) -> Result<Vec<WorkCenterLoad>>
    where
        F: FnMut(WorkCenterId) -> Result<WorkCenter>,
    {
        let mut loads: Vec<WorkCenterLoad> = Vec::new();
        let mut centers: Vec<WorkCenter> = Vec::new();

        for op in bom.operations() {
            let index = match loads
                .iter()
                .position(|load| load.work_center_id == op.work_center_id)
            {
                Some(index) => index,
                None => {
                    centers.push(work_center_of(op.work_center_id)?);
                    loads.push(WorkCenterLoad {
                        work_center_id: op.work_center_id,
                        operations: 0,
                        minutes: Decimal::ZERO,
                        hours: Decimal::ZERO,
                        cost: Decimal::ZERO,
                        days_required: None,
                    });
                    loads.len() - 1
                }
            };

            let minutes = Self::operation_minutes(op, quantity)?;
            let cost = Self::operation_cost(op, quantity, &centers[index])?;
            let load = &mut loads[index];
            load.operations += 1;
            load.minutes = load
                .minutes
                .checked_add(minutes)
                .or_overflow(&op.work_center_id, "capacity_load")?;
            load.cost = load
                .cost
                .checked_add(cost)
                .or_overflow(&op.work_center_id, "capacity_load")?;
        }

        for (load, center) in loads.iter_mut().zip(&centers) {
            load.hours = load.minutes / MINUTES_PER_HOUR;
            if center.daily_capacity_hours > Decimal::ZERO {
                let days = load
                    .hours
                    .checked_div(center.daily_capacity_hours)
                    .or_overflow(&load.work_center_id, "capacity_load")?;
                load.days_required = Some(days);
            }
        }

        Ok(loads)
    }
}
