//! 工作中心績效估算
//!
//! 效率係數與實際週期時間都是滾動估計值，每次讀取時由最近的日誌重新計算。

use mes_core::{
    Bom, EngineConfig, MesError, Operation, ProductionLog, RecencyWindow, Result, WorkCenter,
    WorkCenterId,
};
use rust_decimal::Decimal;

use crate::arith::{checked_sum, OrOverflow};

/// 績效估算器
pub struct PerformanceEstimator;

impl PerformanceEstimator {
    /// 工作中心效率係數
    ///
    /// 取此工作中心最近 `efficiency_window` 筆日誌：
    /// - 沒有日誌 → `default_efficiency`（0.80）
    /// - 實際耗時合計為 0 → `zero_actual_efficiency`（1.00）
    /// - 否則 min(上限, 計劃合計 / 實際合計)，下限為 0
    pub fn efficiency_factor(
        work_center: &WorkCenter,
        logs: &[ProductionLog],
        config: &EngineConfig,
    ) -> Result<Decimal> {
        const COMPUTATION: &str = "efficiency_factor";
        let entity = &work_center.id;

        let window = RecencyWindow::new(config.efficiency_window);
        let recent = window.select(logs.iter().filter(|log| log.work_center_id == *entity));

        if recent.is_empty() {
            return Ok(config.default_efficiency);
        }

        let total_planned = checked_sum(
            recent.iter().map(|log| log.planned_duration),
            entity,
            COMPUTATION,
        )?;
        let total_actual = checked_sum(
            recent.iter().map(|log| log.actual_duration),
            entity,
            COMPUTATION,
        )?;

        if total_actual.is_zero() {
            return Ok(config.zero_actual_efficiency);
        }

        let ratio = total_planned
            .checked_div(total_actual)
            .or_overflow(entity, COMPUTATION)?;
        Ok(ratio.min(config.efficiency_cap).max(Decimal::ZERO))
    }

    /// 作業實際週期時間（分鐘/件）
    ///
    /// 每筆日誌代表一次「準備 + 生產」，因此準備時間按日誌筆數扣除，而非按件數。
    /// 沒有日誌或產出合計為 0 時回傳標準週期時間。
    pub fn actual_cycle_time(
        operation: &Operation,
        logs: &[ProductionLog],
        config: &EngineConfig,
    ) -> Result<Decimal> {
        const COMPUTATION: &str = "actual_cycle_time";
        let entity = &operation.id;

        let window = RecencyWindow::new(config.cycle_time_window);
        let recent = window.select(logs.iter().filter(|log| log.operation_id == Some(*entity)));

        if recent.is_empty() {
            return Ok(operation.cycle_time);
        }

        let total_actual = checked_sum(
            recent.iter().map(|log| log.actual_duration),
            entity,
            COMPUTATION,
        )?;
        let total_quantity = checked_sum(
            recent.iter().map(|log| log.quantity_produced),
            entity,
            COMPUTATION,
        )?;
        if total_quantity <= Decimal::ZERO {
            return Ok(operation.cycle_time);
        }

        Decimal::from(recent.len())
            .checked_mul(operation.setup_time)
            .and_then(|setup_overhead| total_actual.checked_sub(setup_overhead))
            .and_then(|run_time| run_time.checked_div(total_quantity))
            .or_overflow(entity, COMPUTATION)
    }

    /// 依效率修正的單件生產時間（分鐘），四捨五入至小數 2 位
    ///
    /// Σ (準備時間 + 週期時間) / 工作中心效率。沒有 BOM 或 BOM 未啟用時為 0。
    /// 效率為 0 或結果溢位時無法換算，回傳配置錯誤。
    pub fn production_time<F>(bom: Option<&Bom>, mut efficiency_of: F) -> Result<Decimal>
    where
        F: FnMut(WorkCenterId) -> Result<Decimal>,
    {
        let bom = match bom {
            Some(bom) if bom.is_active => bom,
            _ => return Ok(Decimal::ZERO),
        };

        let mut total = Decimal::ZERO;
        for op in bom.operations() {
            let efficiency = efficiency_of(op.work_center_id)?;
            if efficiency.is_zero() {
                return Err(MesError::configuration(
                    op.work_center_id.to_string(),
                    "calculated_production_time",
                    "效率係數為 0，無法換算生產時間",
                ));
            }
            total = op
                .setup_time
                .checked_add(op.cycle_time)
                .and_then(|minutes| minutes.checked_div(efficiency))
                .and_then(|minutes| total.checked_add(minutes))
                .or_overflow(&op.id, "calculated_production_time")?;
        }

        Ok(total.round_dp(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mes_core::{OperationId, ProductId, ProductionLogId};

    fn work_center() -> WorkCenter {
        let mut wc = WorkCenter::new("LATHE-01", "Lathe");
        wc.id = WorkCenterId(1);
        wc
    }

    fn log(id: u64, planned: i64, actual: i64, produced: i64) -> ProductionLog {
        let mut log = ProductionLog::new(
            WorkCenterId(1),
            Decimal::from(planned),
            Decimal::from(actual),
            Decimal::from(produced),
        )
        .with_operation(OperationId(5));
        log.id = ProductionLogId(id);
        log
    }

    fn operation() -> Operation {
        let mut op = Operation::new(
            WorkCenterId(1),
            10,
            "turn",
            Decimal::from(10),
            Decimal::from(3),
        );
        op.id = OperationId(5);
        op
    }

    fn efficiency(logs: &[ProductionLog], config: &EngineConfig) -> Decimal {
        PerformanceEstimator::efficiency_factor(&work_center(), logs, config)
            .unwrap()
    }

    fn cycle_time(logs: &[ProductionLog], config: &EngineConfig) -> Decimal {
        PerformanceEstimator::actual_cycle_time(&operation(), logs, config)
            .unwrap()
    }

    #[test]
    fn test_efficiency_without_logs_is_default() {
        let eff = efficiency(&[], &EngineConfig::default());
        assert_eq!(eff, Decimal::new(80, 2));
    }

    #[test]
    fn test_efficiency_ratio() {
        let logs = vec![log(1, 90, 100, 0), log(2, 90, 100, 0)];
        let eff = efficiency(&logs, &EngineConfig::default());
        assert_eq!(eff, Decimal::new(9, 1));
    }

    #[test]
    fn test_efficiency_capped() {
        let logs = vec![log(1, 200, 100, 0)];
        let eff = efficiency(&logs, &EngineConfig::default());
        assert_eq!(eff, Decimal::new(120, 2));
    }

    #[test]
    fn test_efficiency_zero_actual() {
        let logs = vec![log(1, 50, 0, 0)];
        let eff = efficiency(&logs, &EngineConfig::default());
        assert_eq!(eff, Decimal::ONE);
    }

    #[test]
    fn test_efficiency_uses_most_recent_window() {
        // 舊日誌效率極差，但落在取樣窗外
        let mut logs = vec![log(1, 10, 1000, 0)];
        logs.extend((2..=4).map(|id| log(id, 100, 100, 0)));

        let config = EngineConfig::default().with_efficiency_window(3);
        let eff = efficiency(&logs, &config);
        assert_eq!(eff, Decimal::ONE);
    }

    #[test]
    fn test_efficiency_ignores_other_work_centers() {
        let mut foreign = log(1, 10, 100, 0);
        foreign.work_center_id = WorkCenterId(2);

        let eff = efficiency(&[foreign], &EngineConfig::default());
        assert_eq!(eff, Decimal::new(80, 2));
    }

    #[test]
    fn test_actual_cycle_time_subtracts_setup_per_log() {
        // 兩筆日誌：實際 (40 + 70) − 準備 2×10 = 90，產出 30 → 3
        let logs = vec![log(1, 0, 40, 10), log(2, 0, 70, 20)];
        let cycle = cycle_time(&logs, &EngineConfig::default());
        assert_eq!(cycle, Decimal::from(3));
    }

    #[test]
    fn test_actual_cycle_time_falls_back_to_nominal() {
        let config = EngineConfig::default();
        assert_eq!(cycle_time(&[], &config), Decimal::from(3));

        let idle = vec![log(1, 0, 30, 0)];
        assert_eq!(cycle_time(&idle, &config), Decimal::from(3));
    }

    #[test]
    fn test_actual_cycle_time_window() {
        let mut logs = vec![log(1, 0, 1010, 1)];
        logs.push(log(2, 0, 60, 10));

        let config = EngineConfig::default().with_cycle_time_window(1);
        let cycle = cycle_time(&logs, &config);
        // 只取最新一筆：(60 − 10) / 10
        assert_eq!(cycle, Decimal::from(5));
    }

    #[test]
    fn test_efficiency_overflow_is_configuration_error() {
        let config = EngineConfig::default();

        // 計劃耗時合計溢位
        let mut huge = log(1, 0, 1, 0);
        huge.planned_duration = Decimal::MAX;
        let logs = vec![huge.clone(), huge];
        let result = PerformanceEstimator::efficiency_factor(&work_center(), &logs, &config);
        assert!(matches!(result, Err(MesError::Configuration { .. })));

        // 比值溢位
        let mut tiny = log(2, 0, 1, 0);
        tiny.planned_duration = Decimal::MAX;
        tiny.actual_duration = Decimal::new(1, 10);
        let result = PerformanceEstimator::efficiency_factor(&work_center(), &[tiny], &config);
        assert!(matches!(
            result,
            Err(MesError::Configuration { computation: "efficiency_factor", .. })
        ));
    }

    #[test]
    fn test_cycle_time_overflow_is_configuration_error() {
        let mut op = operation();
        op.setup_time = Decimal::MAX;
        let logs = vec![log(1, 0, 10, 5), log(2, 0, 10, 5)];

        let result = PerformanceEstimator::actual_cycle_time(&op, &logs, &EngineConfig::default());
        assert!(matches!(result, Err(MesError::Configuration { .. })));
    }

    #[test]
    fn test_production_time() {
        let bom = Bom::new(ProductId(1))
            .with_operation(operation())
            .unwrap();

        // (10 + 3) / 0.8 = 16.25
        let minutes =
            PerformanceEstimator::production_time(Some(&bom), |_| Ok(Decimal::new(80, 2)))
                .unwrap();
        assert_eq!(minutes, Decimal::new(1625, 2));
    }

    #[test]
    fn test_production_time_rounds_to_two_places() {
        let bom = Bom::new(ProductId(1))
            .with_operation(operation())
            .unwrap();

        // 13 / 0.9 = 14.444…
        let minutes =
            PerformanceEstimator::production_time(Some(&bom), |_| Ok(Decimal::new(9, 1)))
                .unwrap();
        assert_eq!(minutes, Decimal::new(1444, 2));
    }

    #[test]
    fn test_production_time_without_bom_is_zero() {
        let minutes = PerformanceEstimator::production_time(None, |_| Ok(Decimal::ONE))
            .unwrap();
        assert_eq!(minutes, Decimal::ZERO);

        let inactive = Bom::new(ProductId(1))
            .with_active(false)
            .with_operation(operation())
            .unwrap();
        let minutes = PerformanceEstimator::production_time(Some(&inactive), |_| Ok(Decimal::ONE))
            .unwrap();
        assert_eq!(minutes, Decimal::ZERO);
    }

    #[test]
    fn test_production_time_zero_efficiency() {
        let bom = Bom::new(ProductId(1))
            .with_operation(operation())
            .unwrap();

        let result = PerformanceEstimator::production_time(Some(&bom), |_| Ok(Decimal::ZERO));
        assert!(matches!(result, Err(MesError::Configuration { .. })));
    }
}
