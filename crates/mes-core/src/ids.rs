//! 實體識別碼
//!
//! 所有識別碼皆為由資料存放區依建立順序配發的穩定整數，
//! 因此數值較大者即為較新的記錄。

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// 取得原始數值
            pub fn value(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(
    /// 產品
    ProductId,
    "Product"
);
entity_id!(
    /// 產品分類
    CategoryId,
    "Category"
);
entity_id!(
    /// 物料清單表頭
    BomId,
    "Bom"
);
entity_id!(
    /// 物料清單明細
    BomItemId,
    "BomItem"
);
entity_id!(
    /// 工作中心
    WorkCenterId,
    "WorkCenter"
);
entity_id!(
    /// 製程作業
    OperationId,
    "Operation"
);
entity_id!(
    /// 生產工單
    ProductionOrderId,
    "ProductionOrder"
);
entity_id!(
    /// 生產日誌
    ProductionLogId,
    "ProductionLog"
);
entity_id!(
    /// 庫存異動
    StockTransactionId,
    "StockTransaction"
);
entity_id!(
    /// 品質檢驗
    QualityCheckId,
    "QualityCheck"
);
entity_id!(
    /// 品質參數
    QualityParameterId,
    "QualityParameter"
);
entity_id!(
    /// 客戶
    CustomerId,
    "Customer"
);
entity_id!(
    /// 銷售訂單
    SalesOrderId,
    "SalesOrder"
);
entity_id!(
    /// 倉庫
    WarehouseId,
    "Warehouse"
);
entity_id!(
    /// 班別
    ShiftId,
    "Shift"
);
entity_id!(
    /// 員工
    EmployeeId,
    "Employee"
);
entity_id!(
    /// 停機原因代碼
    MaintenanceReasonId,
    "MaintenanceReason"
);
entity_id!(
    /// 保養記錄
    MaintenanceId,
    "Maintenance"
);
