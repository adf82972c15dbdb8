//! 腳踏車工廠範例
//!
//! 建立主資料、過帳庫存、登錄生產日誌，再由引擎計算各項衍生值。
//! 執行：`RUST_LOG=debug cargo run --example bike_shop`

use anyhow::Result;
use chrono::NaiveDate;
use mes::mes_core::{
    Bom, BomItem, Customer, Operation, OrderStatus, Product, ProductKind, ProductionLog,
    ProductionOrder, QualityCheck, QualityParameter, SalesOrder, StockMovement, TransactionKind,
    Warehouse, WarehouseKind, WorkCenter,
};
use mes::{logging, EngineConfig, Ledger, MemoryStore, MesEngine};
use rust_decimal::Decimal;
use std::sync::Arc;

fn main() -> Result<()> {
    logging::init();
    println!("===== Bike Shop MES Example =====\n");

    let store = Arc::new(MemoryStore::new());
    let config = EngineConfig::default();
    let engine = MesEngine::new(store.clone(), config.clone())?;
    let ledger = Ledger::new(store.clone(), config)?;

    // [1] 主資料
    println!("[1] Master data");
    let bike = store.insert_product(
        Product::new("BIKE-001", "City Bike", ProductKind::Final)
            .with_price(Decimal::from(450))
            .with_min_stock_level(Decimal::from(10)),
    )?;
    let frame = store.insert_product(
        Product::new("FRAME-001", "Frame", ProductKind::Raw)
            .with_price(Decimal::from(80)),
    )?;
    let wheel = store.insert_product(
        Product::new("WHEEL-001", "Wheel", ProductKind::Raw)
            .with_price(Decimal::from(40)),
    )?;
    let raw_store = store.insert_warehouse(Warehouse::new("Raw materials", WarehouseKind::Raw))?;

    let welding = store.insert_work_center(
        WorkCenter::new("WELD-01", "Welding")
            .with_hourly_rate(Decimal::from(60)),
    )?;
    let assembly = store.insert_work_center(
        WorkCenter::new("ASM-01", "Assembly")
            .with_hourly_rate(Decimal::from(30)),
    )?;

    let bom = Bom::new(bike)
        .with_description("City bike, standard routing")
        .with_item(BomItem::new(frame, Decimal::ONE))
        .with_item(BomItem::new(wheel, Decimal::from(2)).with_scrap_factor(Decimal::from(5))?)
        .with_operation(Operation::new(
            welding,
            10,
            "weld frame",
            Decimal::from(30),
            Decimal::from(12),
        ))?
        .with_operation(Operation::new(
            assembly,
            20,
            "final assembly",
            Decimal::from(15),
            Decimal::from(9),
        ))?;
    store.insert_bom(bom)?;
    println!("    BIKE-001 BOM: 1 × FRAME-001, 2 × WHEEL-001 (5% scrap)\n");

    // [2] 庫存
    println!("[2] Stock movements");
    ledger.apply_movement(
        StockMovement::new(frame, Decimal::from(40), TransactionKind::In)
            .with_warehouse(raw_store)
            .with_notes("PO-1001"),
    )?;
    ledger.update_stock(wheel, Decimal::from(60), TransactionKind::In)?;
    ledger.update_stock(bike, Decimal::from(5), TransactionKind::In)?;
    ledger.update_stock(wheel, Decimal::from(3), TransactionKind::Scrap)?;
    for product in [frame, wheel, bike] {
        let reconciliation = ledger.reconcile(product)?;
        println!(
            "    {}: {} ({:?})",
            product,
            reconciliation.recorded,
            engine.stock_status(product)?
        );
    }
    println!();

    // [3] 需求與工單
    println!("[3] Demand and production");
    let customer = store.insert_customer(Customer::new("Velo Shop"))?;
    store.insert_sales_order(SalesOrder::new(
        customer,
        bike,
        Decimal::from(20),
        NaiveDate::from_ymd_opt(2025, 11, 1).unwrap_or_default(),
        NaiveDate::from_ymd_opt(2025, 11, 15).unwrap_or_default(),
    ))?;

    let start = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap_or_default();
    let due = NaiveDate::from_ymd_opt(2025, 11, 12).unwrap_or_default();
    let order =
        store.insert_production_order(ProductionOrder::new(bike, Decimal::from(20), start, due))?;
    store.set_order_status(order, OrderStatus::Planned)?;
    store.set_order_status(order, OrderStatus::InProgress)?;

    let net = engine.net_requirement(bike)?;
    println!(
        "    Net requirement: {} + {} − ({} + {}) = {}",
        net.demand, net.safety_stock, net.on_hand, net.in_production, net.net_requirement
    );

    for (produced, actual) in [(6, 80), (8, 95)] {
        store.append_log(
            ProductionLog::new(
                welding,
                Decimal::from(72),
                Decimal::from(actual),
                Decimal::from(produced),
            )
            .with_order(order),
        )?;
    }
    println!("    Welding efficiency: {}", engine.efficiency_factor(welding)?);
    println!(
        "    Production time per bike: {} min\n",
        engine.calculated_production_time(bike)?
    );

    // [4] 品質
    println!("[4] Quality");
    let length = store.insert_quality_parameter(QualityParameter::new(
        bike,
        "frame length",
        Decimal::from(540),
        Decimal::from(560),
    ))?;
    let mut check = QualityCheck::new(order, Decimal::from(14), Decimal::from(13), Decimal::ONE)
        .with_rejection_reason("misaligned fork");
    check.record_measurement(length, Decimal::from(552));
    check.record_measurement(length, Decimal::from(563));
    let check_id = store.insert_quality_check(check)?;
    println!("    Score: {}%", engine.quality_score(check_id)?);
    for finding in engine.out_of_spec(check_id)? {
        println!(
            "    Out of spec: {} = {} (range {}..={})",
            finding.parameter_name, finding.measured_value, finding.min_value, finding.max_value
        );
    }
    println!();

    // [5] 工單報表
    println!("[5] Order report");
    let today = NaiveDate::from_ymd_opt(2025, 11, 14).unwrap_or_default();
    let report = engine.order_report(order, today)?;
    println!("    Progress: {}%", report.progress);
    println!("    Delayed: {}", report.is_delayed);
    println!(
        "    Cost: material {} + labor {} = {}",
        report.cost.material, report.cost.labor, report.cost.total
    );
    for load in engine.capacity_load(order)? {
        println!(
            "    {}: {} min across {} operation(s), cost {}",
            load.work_center_id, load.minutes, load.operations, load.cost
        );
    }
    for warning in &report.warnings {
        println!("    [{:?}] {}: {}", warning.severity, warning.entity, warning.message);
    }

    Ok(())
}
