//! 資料存取層之上的計算引擎
//!
//! 每次呼叫都由資料存取層讀取最新記錄並重新計算，引擎本身不保存任何衍生值。

use chrono::{NaiveDate, Utc};
use mes_core::{
    Bom, DataStore, EngineConfig, MesError, OperationId, OrderStatus, ProductId,
    ProductionOrderId, QualityCheckId, RecencyWindow, Result, StockStatus, WorkCenterId,
};
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::bom::{BomCalculator, MaterialLine};
use crate::capacity::{CapacityCalculator, WorkCenterLoad};
use crate::netting::{NetRequirement, NettingCalculator};
use crate::performance::PerformanceEstimator;
use crate::quality::{OutOfSpec, QualityScorer};
use crate::tracker::{CostEstimate, OrderTracker};
use crate::{EngineWarning, OrderReport};

const IN_FLIGHT: [OrderStatus; 2] = [OrderStatus::Planned, OrderStatus::InProgress];

/// MES 計算引擎
pub struct MesEngine<S> {
    store: Arc<S>,
    config: EngineConfig,
}

impl<S: DataStore> MesEngine<S> {
    /// 創建新的計算引擎（配置不合法時回傳錯誤）
    pub fn new(store: Arc<S>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 產品庫存狀態
    pub fn stock_status(&self, product_id: ProductId) -> Result<StockStatus> {
        let product = self
            .store
            .product(product_id)
            .map_err(|e| e.in_computation("stock_status"))?;
        Ok(product.stock_status())
    }

    /// 產品淨需求
    pub fn net_requirement(&self, product_id: ProductId) -> Result<NetRequirement> {
        let computation = "net_requirement";
        let product = self
            .store
            .product(product_id)
            .map_err(|e| e.in_computation(computation))?;
        let sales_orders = self.store.unshipped_sales_orders(product_id)?;
        let production_orders = self
            .store
            .production_orders_for_product(product_id, &IN_FLIGHT)?;

        let result = NettingCalculator::calculate(&product, &sales_orders, &production_orders)
            .map_err(|e| e.in_computation(computation))?;
        tracing::debug!(
            "淨需求 {}: 需求 {} + 安全庫存 {} − (庫存 {} + 在製 {}) → {}",
            product.sku,
            result.demand,
            result.safety_stock,
            result.on_hand,
            result.in_production,
            result.net_requirement
        );
        Ok(result)
    }

    /// BOM 單件材料成本（產品沒有 BOM 時回傳配置錯誤）
    pub fn material_cost(&self, product_id: ProductId) -> Result<Decimal> {
        let computation = "material_cost";
        let bom = self.require_bom(product_id, computation)?;
        BomCalculator::material_cost(&bom, |id| self.price_of(id))
            .map_err(|e| e.in_computation(computation))
    }

    /// BOM 逐明細材料成本
    pub fn material_breakdown(&self, product_id: ProductId) -> Result<Vec<MaterialLine>> {
        let computation = "material_breakdown";
        let bom = self.require_bom(product_id, computation)?;
        BomCalculator::material_cost_breakdown(&bom, |id| self.price_of(id))
            .map_err(|e| e.in_computation(computation))
    }

    /// 工作中心效率係數
    pub fn efficiency_factor(&self, work_center_id: WorkCenterId) -> Result<Decimal> {
        let work_center = self
            .store
            .work_center(work_center_id)
            .map_err(|e| e.in_computation("efficiency_factor"))?;
        let logs = self.store.recent_logs_for_work_center(
            work_center_id,
            RecencyWindow::new(self.config.efficiency_window),
        )?;

        let efficiency =
            PerformanceEstimator::efficiency_factor(&work_center, &logs, &self.config)?;
        tracing::debug!(
            "工作中心 {} 效率 {}（{} 筆日誌）",
            work_center.code,
            efficiency,
            logs.len()
        );
        Ok(efficiency)
    }

    /// 作業實際週期時間
    pub fn actual_cycle_time(&self, operation_id: OperationId) -> Result<Decimal> {
        let operation = self
            .store
            .operation(operation_id)
            .map_err(|e| e.in_computation("actual_cycle_time"))?;
        let logs = self.store.recent_logs_for_operation(
            operation_id,
            RecencyWindow::new(self.config.cycle_time_window),
        )?;

        PerformanceEstimator::actual_cycle_time(&operation, &logs, &self.config)
    }

    /// 依效率修正的單件生產時間（分鐘）
    pub fn calculated_production_time(&self, product_id: ProductId) -> Result<Decimal> {
        let computation = "calculated_production_time";
        self.store
            .product(product_id)
            .map_err(|e| e.in_computation(computation))?;
        let bom = self.store.bom_for_product(product_id)?;
        if bom.is_none() {
            tracing::debug!("產品 {} 沒有 BOM，生產時間為 0", product_id);
        }

        PerformanceEstimator::production_time(bom.as_ref(), |wc| self.efficiency_factor(wc))
            .map_err(|e| e.in_computation(computation))
    }

    /// 工單是否延遲（以今天為準）
    pub fn is_delayed(&self, order_id: ProductionOrderId) -> Result<bool> {
        self.is_delayed_on(order_id, Utc::now().date_naive())
    }

    /// 工單在指定日期是否延遲
    pub fn is_delayed_on(&self, order_id: ProductionOrderId, today: NaiveDate) -> Result<bool> {
        let order = self
            .store
            .production_order(order_id)
            .map_err(|e| e.in_computation("is_delayed"))?;
        Ok(OrderTracker::is_delayed_on(&order, today))
    }

    /// 工單完成百分比
    pub fn current_progress(&self, order_id: ProductionOrderId) -> Result<Decimal> {
        let order = self
            .store
            .production_order(order_id)
            .map_err(|e| e.in_computation("current_progress"))?;
        let logs = self.store.logs_for_order(order_id)?;
        OrderTracker::current_progress(&order, &logs)
    }

    /// 工單總成本估算
    pub fn estimated_total_cost(&self, order_id: ProductionOrderId) -> Result<CostEstimate> {
        let computation = "estimated_total_cost";
        let order = self
            .store
            .production_order(order_id)
            .map_err(|e| e.in_computation(computation))?;
        let bom = self.store.bom_for_product(order.product_id)?;

        OrderTracker::estimated_total_cost(
            &order,
            bom.as_ref(),
            |id| self.price_of(id),
            |wc| self.store.work_center(wc),
        )
        .map_err(|e| e.in_computation(computation))
    }

    /// 工單在各工作中心的負荷（產品沒有 BOM 時為空）
    pub fn capacity_load(&self, order_id: ProductionOrderId) -> Result<Vec<WorkCenterLoad>> {
        let computation = "capacity_load";
        let order = self
            .store
            .production_order(order_id)
            .map_err(|e| e.in_computation(computation))?;
        let Some(bom) = self.store.bom_for_product(order.product_id)? else {
            return Ok(Vec::new());
        };

        CapacityCalculator::load_by_work_center(&bom, order.planned_quantity, |wc| {
            self.store.work_center(wc)
        })
        .map_err(|e| e.in_computation(computation))
    }

    /// 單次檢驗良率
    pub fn quality_score(&self, check_id: QualityCheckId) -> Result<Decimal> {
        let check = self
            .store
            .quality_check(check_id)
            .map_err(|e| e.in_computation("quality_score"))?;
        QualityScorer::quality_score(&check)
    }

    /// 工單合計良率
    pub fn order_yield(&self, order_id: ProductionOrderId) -> Result<Decimal> {
        self.store
            .production_order(order_id)
            .map_err(|e| e.in_computation("order_yield"))?;
        let checks = self.store.quality_checks_for_order(order_id)?;
        QualityScorer::order_yield(&checks)
    }

    /// 檢驗中超出規格的量測值
    pub fn out_of_spec(&self, check_id: QualityCheckId) -> Result<Vec<OutOfSpec>> {
        let computation = "out_of_spec";
        let check = self
            .store
            .quality_check(check_id)
            .map_err(|e| e.in_computation(computation))?;
        let order = self
            .store
            .production_order(check.production_order_id)
            .map_err(|e| e.in_computation(computation))?;
        let parameters = self.store.quality_parameters(order.product_id)?;

        QualityScorer::out_of_spec(&check, &parameters)
    }

    /// 工單綜合報表
    pub fn order_report(
        &self,
        order_id: ProductionOrderId,
        today: NaiveDate,
    ) -> Result<OrderReport> {
        tracing::info!("產生工單報表: {}", order_id);

        let order = self
            .store
            .production_order(order_id)
            .map_err(|e| e.in_computation("order_report"))?;
        let progress = self.current_progress(order_id)?;
        let cost = self.estimated_total_cost(order_id)?;
        let quality_yield = self.order_yield(order_id)?;
        let is_delayed = OrderTracker::is_delayed_on(&order, today);

        let mut report = OrderReport {
            order_id,
            progress,
            is_delayed,
            remaining_quantity: order.remaining_quantity(),
            cost,
            quality_yield,
            warnings: Vec::new(),
        };

        if self.store.bom_for_product(order.product_id)?.is_none() {
            tracing::warn!("工單 {} 的產品 {} 沒有 BOM", order_id, order.product_id);
            report.add_warning(EngineWarning::warning(
                order.product_id.to_string(),
                "產品沒有 BOM，成本估算為 0".to_string(),
            ));
        }

        if is_delayed {
            report.add_warning(EngineWarning::warning(
                order_id.to_string(),
                format!("已超過交期 {}", order.due_date),
            ));
        }

        if progress > Decimal::ONE_HUNDRED {
            report.add_warning(EngineWarning::info(
                order_id.to_string(),
                format!("實際產量超過計劃數量（{}%）", progress),
            ));
        }

        tracing::info!(
            "工單 {} 進度 {}%，成本 {}，警告 {} 筆",
            order_id,
            report.progress,
            report.cost.total,
            report.warnings.len()
        );
        Ok(report)
    }

    fn price_of(&self, product_id: ProductId) -> Result<Decimal> {
        self.store.product(product_id).map(|p| p.price)
    }

    fn require_bom(&self, product_id: ProductId, computation: &'static str) -> Result<Bom> {
        self.store
            .product(product_id)
            .map_err(|e| e.in_computation(computation))?;
        self.store.bom_for_product(product_id)?.ok_or_else(|| {
            tracing::warn!("產品 {} 沒有 BOM", product_id);
            MesError::configuration(product_id.to_string(), computation, "產品沒有 BOM")
        })
    }
}

impl<S: DataStore + Sync + Send> MesEngine<S> {
    /// 並行計算多個產品的淨需求，結果順序與輸入相同
    pub fn net_requirements(&self, product_ids: &[ProductId]) -> Result<Vec<NetRequirement>> {
        tracing::info!("計算 {} 個產品的淨需求", product_ids.len());
        product_ids
            .par_iter()
            .map(|&id| self.net_requirement(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mes_core::{
        BomId, BomItem, Customer, MemoryStore, Operation, Product, ProductKind, ProductionLog,
        ProductionOrder, QualityCheck, QualityParameter, SalesOrder, TransactionKind, WorkCenter,
    };
    use mes_ledger::Ledger;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, day).unwrap()
    }

    struct Plant {
        store: Arc<MemoryStore>,
        bike: ProductId,
        tube: ProductId,
        welding: WorkCenterId,
        bom_id: BomId,
        weld_op: OperationId,
    }

    fn receive(store: &Arc<MemoryStore>, product_id: ProductId, quantity: i64) {
        Ledger::new(store.clone(), EngineConfig::default())
            .unwrap()
            .update_stock(product_id, Decimal::from(quantity), TransactionKind::In)
            .unwrap();
    }

    fn plant() -> Plant {
        let store = Arc::new(MemoryStore::new());
        let bike = store
            .insert_product(
                Product::new("BIKE-001", "Bike", ProductKind::Final)
                    .with_min_stock_level(Decimal::from(10)),
            )
            .unwrap();
        let tube = store
            .insert_product(
                Product::new("TUBE-001", "Tube", ProductKind::Raw)
                    .with_price(Decimal::from(4)),
            )
            .unwrap();
        let welding = store
            .insert_work_center(
                WorkCenter::new("WELD", "Welding")
                    .with_hourly_rate(Decimal::from(60)),
            )
            .unwrap();
        let bom = Bom::new(bike)
            .with_item(
                BomItem::new(tube, Decimal::from(100))
                    .with_scrap_factor(Decimal::from(20))
                    .unwrap(),
            )
            .with_operation(Operation::new(
                welding,
                10,
                "weld",
                Decimal::from(10),
                Decimal::from(6),
            ))
            .unwrap();
        let bom_id = store.insert_bom(bom).unwrap();
        let weld_op = store.bom(bom_id).unwrap().operations()[0].id;

        Plant {
            store,
            bike,
            tube,
            welding,
            bom_id,
            weld_op,
        }
    }

    fn engine(plant: &Plant) -> MesEngine<MemoryStore> {
        MesEngine::new(plant.store.clone(), EngineConfig::default())
            .unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let plant = plant();
        let config = EngineConfig::default().with_efficiency_window(0);
        assert!(MesEngine::new(plant.store.clone(), config).is_err());
    }

    #[test]
    fn test_net_requirement_from_store() {
        let plant = plant();
        receive(&plant.store, plant.bike, 5);
        let customer = plant.store.insert_customer(Customer::new("Acme")).unwrap();
        plant
            .store
            .insert_sales_order(SalesOrder::new(
                customer,
                plant.bike,
                Decimal::from(20),
                date(1),
                date(20),
            ))
            .unwrap();

        let engine = engine(&plant);
        let result = engine.net_requirement(plant.bike).unwrap();
        assert_eq!(result.net_requirement, Decimal::from(25));

        let batch = engine.net_requirements(&[plant.bike, plant.tube]).unwrap();
        assert_eq!(batch[0].net_requirement, Decimal::from(25));
        assert_eq!(batch[1].product_id, plant.tube);
    }

    #[test]
    fn test_material_cost_requires_bom() {
        let plant = plant();
        let engine = engine(&plant);

        // 100 / 0.8 × 4
        assert_eq!(
            engine.material_cost(plant.bike).unwrap(),
            Decimal::from(500)
        );
        assert!(matches!(
            engine.material_cost(plant.tube),
            Err(MesError::Configuration { computation: "material_cost", .. })
        ));
    }

    #[test]
    fn test_unknown_product_reports_computation() {
        let plant = plant();
        let engine = engine(&plant);

        let result = engine.net_requirement(ProductId(9999));
        assert!(matches!(
            result,
            Err(MesError::Reference { computation: "net_requirement", .. })
        ));
    }

    #[test]
    fn test_production_time_uses_live_efficiency() {
        let plant = plant();
        let engine = engine(&plant);

        // 沒有日誌 → 0.80：(10 + 6) / 0.8 = 20
        let minutes = |product| engine.calculated_production_time(product).unwrap();
        assert_eq!(minutes(plant.bike), Decimal::from(20));
        assert_eq!(minutes(plant.tube), Decimal::ZERO);

        let hundred = Decimal::from(100);
        plant
            .store
            .append_log(ProductionLog::new(plant.welding, hundred, hundred, Decimal::ONE))
            .unwrap();
        assert_eq!(
            engine.efficiency_factor(plant.welding).unwrap(),
            Decimal::ONE
        );
        assert_eq!(minutes(plant.bike), Decimal::from(16));
    }

    #[test]
    fn test_inactive_bom_has_no_production_time() {
        let plant = plant();
        let engine = engine(&plant);

        plant.store.set_bom_active(plant.bom_id, false).unwrap();
        assert_eq!(
            engine.calculated_production_time(plant.bike).unwrap(),
            Decimal::ZERO
        );

        plant.store.set_bom_active(plant.bom_id, true).unwrap();
        assert_eq!(
            engine.calculated_production_time(plant.bike).unwrap(),
            Decimal::from(20)
        );
    }

    #[test]
    fn test_overflow_reports_computation() {
        let plant = plant();
        plant
            .store
            .update_product(plant.tube, |tube| tube.price = Decimal::MAX)
            .unwrap();

        let result = engine(&plant).material_cost(plant.bike);
        assert!(matches!(
            result,
            Err(MesError::Configuration { computation: "material_cost", .. })
        ));
    }

    #[test]
    fn test_actual_cycle_time_from_logs() {
        let plant = plant();
        let engine = engine(&plant);
        assert_eq!(
            engine.actual_cycle_time(plant.weld_op).unwrap(),
            Decimal::from(6)
        );

        plant
            .store
            .append_log(
                ProductionLog::new(
                    plant.welding,
                    Decimal::ZERO,
                    Decimal::from(50),
                    Decimal::from(10),
                )
                .with_operation(plant.weld_op),
            )
            .unwrap();
        // (50 − 10) / 10
        assert_eq!(
            engine.actual_cycle_time(plant.weld_op).unwrap(),
            Decimal::from(4)
        );
    }

    #[test]
    fn test_order_report() {
        let plant = plant();
        let order_id = plant
            .store
            .insert_production_order(
                ProductionOrder::new(plant.bike, Decimal::from(200), date(1), date(10))
                    .with_status(OrderStatus::InProgress),
            )
            .unwrap();
        plant
            .store
            .append_log(
                ProductionLog::new(
                    plant.welding,
                    Decimal::from(60),
                    Decimal::from(60),
                    Decimal::from(50),
                )
                .with_order(order_id),
            )
            .unwrap();
        let check_id = plant
            .store
            .insert_quality_check(QualityCheck::new(
                order_id,
                Decimal::from(100),
                Decimal::from(90),
                Decimal::from(10),
            ))
            .unwrap();

        let engine = engine(&plant);
        let report = engine.order_report(order_id, date(11)).unwrap();

        assert_eq!(report.progress, Decimal::from(25));
        assert!(report.is_delayed);
        assert_eq!(report.quality_yield, Decimal::from(90));
        assert_eq!(engine.quality_score(check_id).unwrap(), Decimal::from(90));

        // 材料 500 × 200；人工 (10 + 6 × 200) / 60 × 60 = 1210
        assert_eq!(report.cost.material, Decimal::from(100_000));
        assert_eq!(report.cost.labor, Decimal::from(1210));
        assert_eq!(report.warnings.len(), 1);

        let loads = engine.capacity_load(order_id).unwrap();
        assert_eq!(loads.len(), 1);
        assert_eq!(loads[0].cost, report.cost.labor);
    }

    #[test]
    fn test_out_of_spec_uses_product_parameters() {
        let plant = plant();
        let order_id = plant
            .store
            .insert_production_order(ProductionOrder::new(
                plant.bike,
                Decimal::from(10),
                date(1),
                date(10),
            ))
            .unwrap();
        let param = plant
            .store
            .insert_quality_parameter(QualityParameter::new(
                plant.bike,
                "frame length",
                Decimal::from(99),
                Decimal::from(101),
            ))
            .unwrap();

        let mut check = QualityCheck::new(order_id, Decimal::from(2), Decimal::ONE, Decimal::ONE);
        check.record_measurement(param, Decimal::from(100));
        check.record_measurement(param, Decimal::from(103));
        let check_id = plant.store.insert_quality_check(check).unwrap();

        let findings = engine(&plant).out_of_spec(check_id).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].measured_value, Decimal::from(103));
    }
}
