//! 資料存取介面
//!
//! 計算引擎只透過這些介面讀取記錄；持久化方式由實作決定。

use crate::bom::{Bom, Operation};
use crate::ids::*;
use crate::product::Product;
use crate::production::{OrderStatus, ProductionLog, ProductionOrder};
use crate::quality::{QualityCheck, QualityParameter};
use crate::reference::SalesOrder;
use crate::stock::{StockMovement, StockTransaction};
use crate::window::RecencyWindow;
use crate::work_center::WorkCenter;
use crate::Result;

/// 唯讀查詢（單筆查找與篩選區間查詢）
///
/// 單筆查找找不到記錄時回傳 [`MesError::Reference`](crate::MesError::Reference)。
pub trait DataStore {
    fn product(&self, id: ProductId) -> Result<Product>;

    /// 產品擁有的 BOM（沒有時為 `None`）
    fn bom_for_product(&self, product_id: ProductId) -> Result<Option<Bom>>;

    fn work_center(&self, id: WorkCenterId) -> Result<WorkCenter>;

    fn operation(&self, id: OperationId) -> Result<Operation>;

    fn production_order(&self, id: ProductionOrderId) -> Result<ProductionOrder>;

    fn quality_check(&self, id: QualityCheckId) -> Result<QualityCheck>;

    fn quality_parameters(&self, product_id: ProductId) -> Result<Vec<QualityParameter>>;

    /// 工作中心最近的日誌，由新到舊
    fn recent_logs_for_work_center(
        &self,
        work_center_id: WorkCenterId,
        window: RecencyWindow,
    ) -> Result<Vec<ProductionLog>>;

    /// 作業最近的日誌，由新到舊
    fn recent_logs_for_operation(
        &self,
        operation_id: OperationId,
        window: RecencyWindow,
    ) -> Result<Vec<ProductionLog>>;

    /// 工單的全部日誌，依建立順序
    fn logs_for_order(&self, order_id: ProductionOrderId) -> Result<Vec<ProductionLog>>;

    fn unshipped_sales_orders(&self, product_id: ProductId) -> Result<Vec<SalesOrder>>;

    /// 產品在指定狀態集合內的工單
    fn production_orders_for_product(
        &self,
        product_id: ProductId,
        statuses: &[OrderStatus],
    ) -> Result<Vec<ProductionOrder>>;

    fn quality_checks_for_order(&self, order_id: ProductionOrderId) -> Result<Vec<QualityCheck>>;
}

/// 帳冊所需的交易式寫入
pub trait LedgerStore: DataStore {
    /// 過帳一筆庫存異動
    ///
    /// 實作在產品列鎖定期間依異動類型計算新餘額，並將異動記錄與產品列一起寫入；
    /// 任一步失敗時兩者皆不得寫入。採樂觀並行的實作在偵測到遺失更新時回傳
    /// [`MesError::WriteConflict`](crate::MesError::WriteConflict)。
    fn transact_stock(&self, movement: StockMovement) -> Result<StockTransaction>;

    /// 產品的異動歷史，依建立順序
    fn stock_transactions(&self, product_id: ProductId) -> Result<Vec<StockTransaction>>;
}
