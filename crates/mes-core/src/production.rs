//! 生產工單與生產日誌

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{
    EmployeeId, OperationId, ProductId, ProductionLogId, ProductionOrderId, ShiftId, WorkCenterId,
};

/// 工單狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Draft,
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// 是否為終止狀態
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// 是否視為在製（計入淨需求的供應）
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Planned | Self::InProgress)
    }

    /// 狀態轉換是否合法
    ///
    /// DRAFT → PLANNED → IN_PROGRESS → COMPLETED，非終止狀態皆可取消。
    /// 引擎只回報狀態，不會自動推進。
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        match (self, next) {
            (Self::Draft, Self::Planned)
            | (Self::Planned, Self::InProgress)
            | (Self::InProgress, Self::Completed) => true,
            (from, Self::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// 生產工單
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionOrder {
    pub id: ProductionOrderId,

    /// 生產的產品（半成品/成品）
    pub product_id: ProductId,

    pub planned_quantity: Decimal,
    pub actual_quantity: Decimal,

    /// 計劃開工日
    pub start_date: NaiveDate,

    /// 交期
    pub due_date: NaiveDate,

    pub status: OrderStatus,
}

impl ProductionOrder {
    /// 創建新的工單（草稿）
    pub fn new(
        product_id: ProductId,
        planned_quantity: Decimal,
        start_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id: ProductionOrderId(0),
            product_id,
            planned_quantity,
            actual_quantity: Decimal::ZERO,
            start_date,
            due_date,
            status: OrderStatus::Draft,
        }
    }

    /// 建構器模式：設置狀態
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    /// 建構器模式：設置實際完成數量
    pub fn with_actual_quantity(mut self, quantity: Decimal) -> Self {
        self.actual_quantity = quantity;
        self
    }

    /// 尚未完成的數量（計劃 − 實際）
    pub fn remaining_quantity(&self) -> Decimal {
        self.planned_quantity - self.actual_quantity
    }
}

/// 生產日誌（一次準備加生產的實績，只可新增）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionLog {
    /// 依建立順序遞增
    pub id: ProductionLogId,

    pub production_order_id: Option<ProductionOrderId>,
    pub work_center_id: WorkCenterId,

    /// 作業刪除後清空
    pub operation_id: Option<OperationId>,

    /// 計劃耗時（分鐘）
    pub planned_duration: Decimal,

    /// 實際耗時（分鐘）
    pub actual_duration: Decimal,

    pub quantity_produced: Decimal,
    pub scrap_quantity: Decimal,

    pub shift_id: Option<ShiftId>,
    pub operator_id: Option<EmployeeId>,

    pub created_at: DateTime<Utc>,
}

impl ProductionLog {
    /// 創建新的生產日誌
    pub fn new(
        work_center_id: WorkCenterId,
        planned_duration: Decimal,
        actual_duration: Decimal,
        quantity_produced: Decimal,
    ) -> Self {
        Self {
            id: ProductionLogId(0),
            production_order_id: None,
            work_center_id,
            operation_id: None,
            planned_duration,
            actual_duration,
            quantity_produced,
            scrap_quantity: Decimal::ZERO,
            shift_id: None,
            operator_id: None,
            created_at: Utc::now(),
        }
    }

    /// 建構器模式：設置工單
    pub fn with_order(mut self, order_id: ProductionOrderId) -> Self {
        self.production_order_id = Some(order_id);
        self
    }

    /// 建構器模式：設置作業
    pub fn with_operation(mut self, operation_id: OperationId) -> Self {
        self.operation_id = Some(operation_id);
        self
    }

    /// 建構器模式：設置報廢數量
    pub fn with_scrap_quantity(mut self, quantity: Decimal) -> Self {
        self.scrap_quantity = quantity;
        self
    }

    /// 建構器模式：設置班別
    pub fn with_shift(mut self, shift_id: ShiftId) -> Self {
        self.shift_id = Some(shift_id);
        self
    }

    /// 建構器模式：設置作業員
    pub fn with_operator(mut self, operator_id: EmployeeId) -> Self {
        self.operator_id = Some(operator_id);
        self
    }

    /// 建構器模式：設置記錄時間
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}
