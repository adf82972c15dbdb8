//! 記憶體資料存放區
//!
//! 以穩定整數ID為索引的 arena。所有ID共用一個遞增序號，因此ID順序即建立順序。
//! 每個產品列有自己的互斥鎖：同一產品的庫存異動互相排隊，不同產品可平行過帳。

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use rust_decimal::Decimal;

use crate::bom::{Bom, Operation};
use crate::ids::*;
use crate::product::Product;
use crate::production::{OrderStatus, ProductionLog, ProductionOrder};
use crate::quality::{QualityCheck, QualityParameter};
use crate::reference::{
    Category, Customer, Employee, Maintenance, MaintenanceReason, SalesOrder, Shift, Warehouse,
};
use crate::stock::{StockMovement, StockTransaction};
use crate::store::{DataStore, LedgerStore};
use crate::window::RecencyWindow;
use crate::work_center::WorkCenter;
use crate::{MesError, Result};

const LOOKUP: &str = "lookup";

fn poisoned<T>(_: PoisonError<T>) -> MesError {
    MesError::Storage("資料表鎖已毀損".to_string())
}

#[derive(Default)]
struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    boms: BTreeMap<BomId, Bom>,
    bom_by_product: HashMap<ProductId, BomId>,
    work_centers: BTreeMap<WorkCenterId, WorkCenter>,
    orders: BTreeMap<ProductionOrderId, ProductionOrder>,
    logs: Vec<ProductionLog>,
    sales_orders: BTreeMap<SalesOrderId, SalesOrder>,
    quality_parameters: BTreeMap<QualityParameterId, QualityParameter>,
    quality_checks: BTreeMap<QualityCheckId, QualityCheck>,
    customers: BTreeMap<CustomerId, Customer>,
    warehouses: BTreeMap<WarehouseId, Warehouse>,
    shifts: BTreeMap<ShiftId, Shift>,
    employees: BTreeMap<EmployeeId, Employee>,
    maintenance_reasons: BTreeMap<MaintenanceReasonId, MaintenanceReason>,
    maintenances: Vec<Maintenance>,
}

impl Tables {
    fn find_operation(&self, id: OperationId) -> Option<&Operation> {
        self.boms.values().find_map(|bom| bom.operation(id))
    }
}

/// 記憶體資料存放區
#[derive(Default)]
pub struct MemoryStore {
    sequence: AtomicU64,
    products: RwLock<HashMap<ProductId, Arc<Mutex<Product>>>>,
    transactions: Mutex<Vec<StockTransaction>>,
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn read_tables(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(poisoned)
    }

    fn write_tables(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(poisoned)
    }

    fn product_row(&self, id: ProductId) -> Result<Arc<Mutex<Product>>> {
        let products = self.products.read().map_err(poisoned)?;
        products
            .get(&id)
            .cloned()
            .ok_or_else(|| MesError::reference(id.to_string(), LOOKUP))
    }

    fn contains_product(&self, id: ProductId) -> Result<bool> {
        Ok(self.products.read().map_err(poisoned)?.contains_key(&id))
    }

    // ---------- 產品與分類 ----------

    /// 新增產品；期初庫存必須經由帳冊過帳，因此庫存須為零
    pub fn insert_product(&self, mut product: Product) -> Result<ProductId> {
        if product.stock_quantity() != Decimal::ZERO {
            return Err(MesError::Validation(format!(
                "產品 {} 的期初庫存必須以庫存異動登錄",
                product.sku
            )));
        }
        if let Some(category_id) = product.category_id {
            if !self.read_tables()?.categories.contains_key(&category_id) {
                return Err(MesError::reference(category_id.to_string(), "insert_product"));
            }
        }

        let id = ProductId(self.allocate());
        product.id = id;
        self.products
            .write()
            .map_err(poisoned)?
            .insert(id, Arc::new(Mutex::new(product)));
        Ok(id)
    }

    /// 刪除產品
    ///
    /// 仍被任何 BOM 明細引用的元件不可刪除。產品擁有的 BOM、工單（含日誌與檢驗）、
    /// 銷售訂單、品質參數與庫存異動一併刪除。
    pub fn delete_product(&self, id: ProductId) -> Result<()> {
        let mut products = self.products.write().map_err(poisoned)?;
        if !products.contains_key(&id) {
            return Err(MesError::reference(id.to_string(), "delete_product"));
        }

        let mut tables = self.write_tables()?;
        if let Some(bom) = tables
            .boms
            .values()
            .find(|bom| bom.references_component(id))
        {
            return Err(MesError::Validation(format!(
                "{} 仍被 {} 引用，無法刪除",
                id, bom.id
            )));
        }

        if let Some(bom_id) = tables.bom_by_product.remove(&id) {
            if let Some(bom) = tables.boms.remove(&bom_id) {
                let removed: HashSet<OperationId> =
                    bom.operations().iter().map(|op| op.id).collect();
                for log in tables.logs.iter_mut() {
                    if log.operation_id.is_some_and(|op| removed.contains(&op)) {
                        log.operation_id = None;
                    }
                }
            }
        }

        let order_ids: HashSet<ProductionOrderId> = tables
            .orders
            .values()
            .filter(|order| order.product_id == id)
            .map(|order| order.id)
            .collect();
        tables.orders.retain(|order_id, _| !order_ids.contains(order_id));
        tables.logs.retain(|log| {
            log.production_order_id
                .map_or(true, |order_id| !order_ids.contains(&order_id))
        });
        tables
            .quality_checks
            .retain(|_, check| !order_ids.contains(&check.production_order_id));
        tables.sales_orders.retain(|_, so| so.product_id != id);
        tables.quality_parameters.retain(|_, param| param.product_id != id);
        drop(tables);

        self.transactions
            .lock()
            .map_err(poisoned)?
            .retain(|txn| txn.product_id != id);
        products.remove(&id);

        tracing::debug!("刪除 {}，連帶刪除工單 {} 筆", id, order_ids.len());
        Ok(())
    }

    /// 更新產品主檔（庫存除外）
    pub fn update_product<F>(&self, id: ProductId, edit: F) -> Result<Product>
    where
        F: FnOnce(&mut Product),
    {
        let row = self.product_row(id)?;
        let mut guard = row.lock().map_err(poisoned)?;
        let before = guard.stock_quantity();
        let mut draft = guard.clone();
        edit(&mut draft);
        if draft.stock_quantity() != before || draft.id != id {
            return Err(MesError::Validation(format!(
                "{} 的庫存與ID不可在主檔維護中變更",
                id
            )));
        }
        *guard = draft.clone();
        Ok(draft)
    }

    pub fn insert_category(&self, mut category: Category) -> Result<CategoryId> {
        let mut tables = self.write_tables()?;
        if let Some(parent_id) = category.parent_id {
            if !tables.categories.contains_key(&parent_id) {
                return Err(MesError::reference(parent_id.to_string(), "insert_category"));
            }
        }
        let id = CategoryId(self.allocate());
        category.id = id;
        tables.categories.insert(id, category);
        Ok(id)
    }

    pub fn category(&self, id: CategoryId) -> Result<Category> {
        self.read_tables()?
            .categories
            .get(&id)
            .cloned()
            .ok_or_else(|| MesError::reference(id.to_string(), LOOKUP))
    }

    /// 刪除分類及其所有下層分類，回傳被刪除的ID；引用這些分類的產品改為無分類
    pub fn delete_category(&self, id: CategoryId) -> Result<Vec<CategoryId>> {
        let products = self.products.read().map_err(poisoned)?;
        let mut tables = self.write_tables()?;
        if !tables.categories.contains_key(&id) {
            return Err(MesError::reference(id.to_string(), "delete_category"));
        }

        let mut removed = vec![id];
        let mut cursor = 0;
        while cursor < removed.len() {
            let parent = removed[cursor];
            removed.extend(
                tables
                    .categories
                    .values()
                    .filter(|c| c.parent_id == Some(parent))
                    .map(|c| c.id),
            );
            cursor += 1;
        }

        for category_id in &removed {
            tables.categories.remove(category_id);
        }

        let removed_set: HashSet<CategoryId> = removed.iter().copied().collect();
        for row in products.values() {
            let mut product = row.lock().map_err(poisoned)?;
            if product.category_id.is_some_and(|c| removed_set.contains(&c)) {
                product.category_id = None;
            }
        }

        tracing::debug!("刪除分類 {}，共 {} 筆（含下層）", id, removed.len());
        Ok(removed)
    }

    // ---------- BOM 與作業 ----------

    /// 新增 BOM
    ///
    /// 擁有者必須是半成品/成品且尚無 BOM；元件與工作中心必須存在；損耗率須在 [0, 100)。
    pub fn insert_bom(&self, mut bom: Bom) -> Result<BomId> {
        let owner = self.product(bom.product_id)?;
        if !owner.kind.is_producible() {
            return Err(MesError::Validation(format!(
                "{} 類型為 {:?}，不可擁有 BOM",
                owner.id, owner.kind
            )));
        }
        for item in bom.items() {
            item.validate()?;
            if !self.contains_product(item.child_product_id)? {
                return Err(MesError::reference(
                    item.child_product_id.to_string(),
                    "insert_bom",
                ));
            }
        }

        let mut tables = self.write_tables()?;
        if tables.bom_by_product.contains_key(&bom.product_id) {
            return Err(MesError::Validation(format!(
                "{} 已擁有 BOM",
                bom.product_id
            )));
        }
        for op in bom.operations() {
            if !tables.work_centers.contains_key(&op.work_center_id) {
                return Err(MesError::reference(op.work_center_id.to_string(), "insert_bom"));
            }
        }

        let id = BomId(self.allocate());
        bom.assign_id(id);
        for item in bom.items_mut() {
            item.id = BomItemId(self.allocate());
        }
        for op in bom.operations_mut() {
            op.id = OperationId(self.allocate());
        }
        tables.bom_by_product.insert(bom.product_id, id);
        tables.boms.insert(id, bom);
        Ok(id)
    }

    pub fn bom(&self, id: BomId) -> Result<Bom> {
        self.read_tables()?
            .boms
            .get(&id)
            .cloned()
            .ok_or_else(|| MesError::reference(id.to_string(), LOOKUP))
    }

    /// 對既有 BOM 追加作業
    pub fn add_operation(&self, bom_id: BomId, mut operation: Operation) -> Result<OperationId> {
        let mut tables = self.write_tables()?;
        if !tables.work_centers.contains_key(&operation.work_center_id) {
            return Err(MesError::reference(
                operation.work_center_id.to_string(),
                "add_operation",
            ));
        }
        let id = OperationId(self.allocate());
        operation.id = id;
        let bom = tables
            .boms
            .get_mut(&bom_id)
            .ok_or_else(|| MesError::reference(bom_id.to_string(), "add_operation"))?;
        bom.add_operation(operation)?;
        Ok(id)
    }

    /// 刪除作業；引用它的歷史日誌保留，作業欄位清空
    pub fn delete_operation(&self, id: OperationId) -> Result<()> {
        let mut tables = self.write_tables()?;
        let removed = tables
            .boms
            .values_mut()
            .find_map(|bom| bom.remove_operation(id));
        if removed.is_none() {
            return Err(MesError::reference(id.to_string(), "delete_operation"));
        }
        for log in tables.logs.iter_mut() {
            if log.operation_id == Some(id) {
                log.operation_id = None;
            }
        }
        Ok(())
    }

    pub fn set_bom_active(&self, id: BomId, is_active: bool) -> Result<()> {
        let mut tables = self.write_tables()?;
        let bom = tables
            .boms
            .get_mut(&id)
            .ok_or_else(|| MesError::reference(id.to_string(), "set_bom_active"))?;
        bom.is_active = is_active;
        Ok(())
    }

    // ---------- 工作中心與生產 ----------

    pub fn insert_work_center(&self, mut work_center: WorkCenter) -> Result<WorkCenterId> {
        let id = WorkCenterId(self.allocate());
        work_center.id = id;
        self.write_tables()?.work_centers.insert(id, work_center);
        Ok(id)
    }

    /// 新增工單；只能為半成品/成品開立
    pub fn insert_production_order(&self, mut order: ProductionOrder) -> Result<ProductionOrderId> {
        let product = self.product(order.product_id)?;
        if !product.kind.is_producible() {
            return Err(MesError::Validation(format!(
                "{} 類型為 {:?}，不可開立工單",
                product.id, product.kind
            )));
        }
        let id = ProductionOrderId(self.allocate());
        order.id = id;
        self.write_tables()?.orders.insert(id, order);
        Ok(id)
    }

    /// 變更工單狀態（由外部協作者驅動）
    pub fn set_order_status(&self, id: ProductionOrderId, status: OrderStatus) -> Result<()> {
        let mut tables = self.write_tables()?;
        let order = tables
            .orders
            .get_mut(&id)
            .ok_or_else(|| MesError::reference(id.to_string(), "set_order_status"))?;
        if !order.status.can_transition_to(status) {
            return Err(MesError::Validation(format!(
                "{} 不可由 {:?} 轉為 {:?}",
                id, order.status, status
            )));
        }
        order.status = status;
        Ok(())
    }

    /// 登錄工單實際完成數量
    pub fn set_actual_quantity(&self, id: ProductionOrderId, quantity: Decimal) -> Result<()> {
        let mut tables = self.write_tables()?;
        let order = tables
            .orders
            .get_mut(&id)
            .ok_or_else(|| MesError::reference(id.to_string(), "set_actual_quantity"))?;
        order.actual_quantity = quantity;
        Ok(())
    }

    /// 追加生產日誌（日誌建立後不可修改）
    pub fn append_log(&self, mut log: ProductionLog) -> Result<ProductionLogId> {
        let mut tables = self.write_tables()?;
        if !tables.work_centers.contains_key(&log.work_center_id) {
            return Err(MesError::reference(log.work_center_id.to_string(), "append_log"));
        }
        if let Some(order_id) = log.production_order_id {
            if !tables.orders.contains_key(&order_id) {
                return Err(MesError::reference(order_id.to_string(), "append_log"));
            }
        }
        if let Some(operation_id) = log.operation_id {
            if tables.find_operation(operation_id).is_none() {
                return Err(MesError::reference(operation_id.to_string(), "append_log"));
            }
        }
        if let Some(shift_id) = log.shift_id {
            if !tables.shifts.contains_key(&shift_id) {
                return Err(MesError::reference(shift_id.to_string(), "append_log"));
            }
        }
        if let Some(operator_id) = log.operator_id {
            if !tables.employees.contains_key(&operator_id) {
                return Err(MesError::reference(operator_id.to_string(), "append_log"));
            }
        }
        let id = ProductionLogId(self.allocate());
        log.id = id;
        tables.logs.push(log);
        Ok(id)
    }

    // ---------- 銷售與品質 ----------

    pub fn insert_sales_order(&self, mut order: SalesOrder) -> Result<SalesOrderId> {
        if !self.contains_product(order.product_id)? {
            return Err(MesError::reference(
                order.product_id.to_string(),
                "insert_sales_order",
            ));
        }
        let mut tables = self.write_tables()?;
        if !tables.customers.contains_key(&order.customer_id) {
            return Err(MesError::reference(
                order.customer_id.to_string(),
                "insert_sales_order",
            ));
        }
        let id = SalesOrderId(self.allocate());
        order.id = id;
        tables.sales_orders.insert(id, order);
        Ok(id)
    }

    pub fn mark_shipped(&self, id: SalesOrderId) -> Result<()> {
        let mut tables = self.write_tables()?;
        let order = tables
            .sales_orders
            .get_mut(&id)
            .ok_or_else(|| MesError::reference(id.to_string(), "mark_shipped"))?;
        order.is_shipped = true;
        Ok(())
    }

    pub fn insert_quality_parameter(
        &self,
        mut param: QualityParameter,
    ) -> Result<QualityParameterId> {
        if !self.contains_product(param.product_id)? {
            return Err(MesError::reference(
                param.product_id.to_string(),
                "insert_quality_parameter",
            ));
        }
        let id = QualityParameterId(self.allocate());
        param.id = id;
        self.write_tables()?.quality_parameters.insert(id, param);
        Ok(id)
    }

    pub fn insert_quality_check(&self, mut check: QualityCheck) -> Result<QualityCheckId> {
        let mut tables = self.write_tables()?;
        if !tables.orders.contains_key(&check.production_order_id) {
            return Err(MesError::reference(
                check.production_order_id.to_string(),
                "insert_quality_check",
            ));
        }
        for measurement in &check.measurements {
            if !tables
                .quality_parameters
                .contains_key(&measurement.parameter_id)
            {
                return Err(MesError::reference(
                    measurement.parameter_id.to_string(),
                    "insert_quality_check",
                ));
            }
        }
        let id = QualityCheckId(self.allocate());
        check.id = id;
        tables.quality_checks.insert(id, check);
        Ok(id)
    }

    // ---------- 參考資料 ----------

    pub fn insert_customer(&self, mut customer: Customer) -> Result<CustomerId> {
        let id = CustomerId(self.allocate());
        customer.id = id;
        self.write_tables()?.customers.insert(id, customer);
        Ok(id)
    }

    pub fn insert_warehouse(&self, mut warehouse: Warehouse) -> Result<WarehouseId> {
        let id = WarehouseId(self.allocate());
        warehouse.id = id;
        self.write_tables()?.warehouses.insert(id, warehouse);
        Ok(id)
    }

    pub fn insert_shift(&self, mut shift: Shift) -> Result<ShiftId> {
        let id = ShiftId(self.allocate());
        shift.id = id;
        self.write_tables()?.shifts.insert(id, shift);
        Ok(id)
    }

    pub fn insert_employee(&self, mut employee: Employee) -> Result<EmployeeId> {
        let id = EmployeeId(self.allocate());
        employee.id = id;
        self.write_tables()?.employees.insert(id, employee);
        Ok(id)
    }

    pub fn insert_maintenance_reason(
        &self,
        mut reason: MaintenanceReason,
    ) -> Result<MaintenanceReasonId> {
        let id = MaintenanceReasonId(self.allocate());
        reason.id = id;
        self.write_tables()?.maintenance_reasons.insert(id, reason);
        Ok(id)
    }

    pub fn insert_maintenance(&self, mut maintenance: Maintenance) -> Result<MaintenanceId> {
        let mut tables = self.write_tables()?;
        if !tables.work_centers.contains_key(&maintenance.work_center_id) {
            return Err(MesError::reference(
                maintenance.work_center_id.to_string(),
                "insert_maintenance",
            ));
        }
        if let Some(reason_id) = maintenance.reason_id {
            if !tables.maintenance_reasons.contains_key(&reason_id) {
                return Err(MesError::reference(reason_id.to_string(), "insert_maintenance"));
            }
        }
        let id = MaintenanceId(self.allocate());
        maintenance.id = id;
        tables.maintenances.push(maintenance);
        Ok(id)
    }

    /// 工作中心的保養記錄，依建立順序
    pub fn maintenance_for_work_center(&self, id: WorkCenterId) -> Result<Vec<Maintenance>> {
        Ok(self
            .read_tables()?
            .maintenances
            .iter()
            .filter(|m| m.work_center_id == id)
            .cloned()
            .collect())
    }

    pub fn warehouse(&self, id: WarehouseId) -> Result<Warehouse> {
        self.read_tables()?
            .warehouses
            .get(&id)
            .cloned()
            .ok_or_else(|| MesError::reference(id.to_string(), LOOKUP))
    }
}

impl DataStore for MemoryStore {
    fn product(&self, id: ProductId) -> Result<Product> {
        let row = self.product_row(id)?;
        let product = row.lock().map_err(poisoned)?;
        Ok(product.clone())
    }

    fn bom_for_product(&self, product_id: ProductId) -> Result<Option<Bom>> {
        let tables = self.read_tables()?;
        Ok(tables
            .bom_by_product
            .get(&product_id)
            .and_then(|bom_id| tables.boms.get(bom_id))
            .cloned())
    }

    fn work_center(&self, id: WorkCenterId) -> Result<WorkCenter> {
        self.read_tables()?
            .work_centers
            .get(&id)
            .cloned()
            .ok_or_else(|| MesError::reference(id.to_string(), LOOKUP))
    }

    fn operation(&self, id: OperationId) -> Result<Operation> {
        self.read_tables()?
            .find_operation(id)
            .cloned()
            .ok_or_else(|| MesError::reference(id.to_string(), LOOKUP))
    }

    fn production_order(&self, id: ProductionOrderId) -> Result<ProductionOrder> {
        self.read_tables()?
            .orders
            .get(&id)
            .cloned()
            .ok_or_else(|| MesError::reference(id.to_string(), LOOKUP))
    }

    fn quality_check(&self, id: QualityCheckId) -> Result<QualityCheck> {
        self.read_tables()?
            .quality_checks
            .get(&id)
            .cloned()
            .ok_or_else(|| MesError::reference(id.to_string(), LOOKUP))
    }

    fn quality_parameters(&self, product_id: ProductId) -> Result<Vec<QualityParameter>> {
        Ok(self
            .read_tables()?
            .quality_parameters
            .values()
            .filter(|p| p.product_id == product_id)
            .cloned()
            .collect())
    }

    fn recent_logs_for_work_center(
        &self,
        work_center_id: WorkCenterId,
        window: RecencyWindow,
    ) -> Result<Vec<ProductionLog>> {
        let tables = self.read_tables()?;
        Ok(window.select_owned(
            tables
                .logs
                .iter()
                .filter(|log| log.work_center_id == work_center_id),
        ))
    }

    fn recent_logs_for_operation(
        &self,
        operation_id: OperationId,
        window: RecencyWindow,
    ) -> Result<Vec<ProductionLog>> {
        let tables = self.read_tables()?;
        Ok(window.select_owned(
            tables
                .logs
                .iter()
                .filter(|log| log.operation_id == Some(operation_id)),
        ))
    }

    fn logs_for_order(&self, order_id: ProductionOrderId) -> Result<Vec<ProductionLog>> {
        Ok(self
            .read_tables()?
            .logs
            .iter()
            .filter(|log| log.production_order_id == Some(order_id))
            .cloned()
            .collect())
    }

    fn unshipped_sales_orders(&self, product_id: ProductId) -> Result<Vec<SalesOrder>> {
        Ok(self
            .read_tables()?
            .sales_orders
            .values()
            .filter(|so| so.product_id == product_id && !so.is_shipped)
            .cloned()
            .collect())
    }

    fn production_orders_for_product(
        &self,
        product_id: ProductId,
        statuses: &[OrderStatus],
    ) -> Result<Vec<ProductionOrder>> {
        Ok(self
            .read_tables()?
            .orders
            .values()
            .filter(|order| order.product_id == product_id && statuses.contains(&order.status))
            .cloned()
            .collect())
    }

    fn quality_checks_for_order(&self, order_id: ProductionOrderId) -> Result<Vec<QualityCheck>> {
        Ok(self
            .read_tables()?
            .quality_checks
            .values()
            .filter(|check| check.production_order_id == order_id)
            .cloned()
            .collect())
    }
}

impl LedgerStore for MemoryStore {
    fn transact_stock(&self, movement: StockMovement) -> Result<StockTransaction> {
        // 產品表讀鎖與產品列鎖都持有到寫入完成，刪除產品須等過帳結束
        let products = self.products.read().map_err(poisoned)?;
        let row = products
            .get(&movement.product_id)
            .ok_or_else(|| MesError::reference(movement.product_id.to_string(), "update_stock"))?;
        let mut guard = row.lock().map_err(poisoned)?;

        let mut draft = guard.clone();
        let balance = draft.post_movement(movement.kind, movement.quantity)?;
        let transaction =
            movement.into_transaction(StockTransactionId(self.allocate()), balance, Utc::now());

        self.transactions
            .lock()
            .map_err(poisoned)?
            .push(transaction.clone());
        *guard = draft;
        Ok(transaction)
    }

    fn stock_transactions(&self, product_id: ProductId) -> Result<Vec<StockTransaction>> {
        Ok(self
            .transactions
            .lock()
            .map_err(poisoned)?
            .iter()
            .filter(|txn| txn.product_id == product_id)
            .cloned()
            .collect())
    }
}
