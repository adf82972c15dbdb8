//! 參考資料（無衍生行為的平面記錄）

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{
    CategoryId, CustomerId, EmployeeId, MaintenanceId, MaintenanceReasonId, ProductId,
    SalesOrderId, ShiftId, WarehouseId, WorkCenterId,
};

/// 產品分類（子分類以 parent_id 回指上層，刪除時向下串聯）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub code: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CategoryId(0),
            parent_id: None,
            code: None,
            name: name.into(),
            description: None,
            is_active: true,
        }
    }

    /// 建構器模式：設置上層分類
    pub fn with_parent(mut self, parent_id: CategoryId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// 建構器模式：設置分類代碼
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub tax_number: String,
    pub email: String,
    pub address: String,
}

impl Customer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CustomerId(0),
            name: name.into(),
            tax_number: String::new(),
            email: String::new(),
            address: String::new(),
        }
    }
}

/// 銷售訂單
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesOrder {
    pub id: SalesOrderId,
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub order_date: NaiveDate,

    /// 承諾交期
    pub delivery_date: NaiveDate,

    pub is_shipped: bool,
}

impl SalesOrder {
    /// 創建新的銷售訂單（未出貨）
    pub fn new(
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: Decimal,
        order_date: NaiveDate,
        delivery_date: NaiveDate,
    ) -> Self {
        Self {
            id: SalesOrderId(0),
            customer_id,
            product_id,
            quantity,
            order_date,
            delivery_date,
            is_shipped: false,
        }
    }

    /// 建構器模式：標記為已出貨
    pub fn shipped(mut self) -> Self {
        self.is_shipped = true;
        self
    }
}

/// 倉庫類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarehouseKind {
    /// 原料倉
    Raw,
    /// 在製品暫存
    Wip,
    /// 成品倉
    Final,
    /// 廢料倉
    Scrap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    pub kind: WarehouseKind,
}

impl Warehouse {
    pub fn new(name: impl Into<String>, kind: WarehouseKind) -> Self {
        Self {
            id: WarehouseId(0),
            name: name.into(),
            kind,
        }
    }
}

/// 班別
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl Shift {
    pub fn new(name: impl Into<String>, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            id: ShiftId(0),
            name: name.into(),
            start_time,
            end_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,

    /// 員工編號
    pub employee_code: String,

    pub skill_set: String,
}

impl Employee {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        employee_code: impl Into<String>,
    ) -> Self {
        Self {
            id: EmployeeId(0),
            first_name: first_name.into(),
            last_name: last_name.into(),
            employee_code: employee_code.into(),
            skill_set: String::new(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// 停機原因類別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceCategory {
    Mechanical,
    Electrical,
    Operator,
    External,
}

/// 停機原因代碼
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceReason {
    pub id: MaintenanceReasonId,
    pub code: String,
    pub description: String,
    pub category: MaintenanceCategory,
}

impl MaintenanceReason {
    pub fn new(
        code: impl Into<String>,
        description: impl Into<String>,
        category: MaintenanceCategory,
    ) -> Self {
        Self {
            id: MaintenanceReasonId(0),
            code: code.into(),
            description: description.into(),
            category,
        }
    }
}

/// 保養類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceKind {
    /// 定期保養
    Preventive,
    /// 故障維修
    Repair,
    /// 改善
    Upgrade,
}

/// 保養記錄
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Maintenance {
    pub id: MaintenanceId,
    pub work_center_id: WorkCenterId,
    pub reason_id: Option<MaintenanceReasonId>,
    pub kind: MaintenanceKind,

    /// 停機時間（分鐘）
    pub downtime_minutes: Decimal,

    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Maintenance {
    /// 創建新的保養記錄
    pub fn new(
        work_center_id: WorkCenterId,
        kind: MaintenanceKind,
        downtime_minutes: Decimal,
    ) -> Self {
        Self {
            id: MaintenanceId(0),
            work_center_id,
            reason_id: None,
            kind,
            downtime_minutes,
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    /// 建構器模式：設置停機原因
    pub fn with_reason(mut self, reason_id: MaintenanceReasonId) -> Self {
        self.reason_id = Some(reason_id);
        self
    }

    /// 建構器模式：設置說明
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
