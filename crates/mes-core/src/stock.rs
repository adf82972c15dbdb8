//! 庫存異動模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{ProductId, StockTransactionId, WarehouseId};
use crate::product::Product;

/// 異動類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// 入庫（採購/生產）
    In,
    /// 出庫（銷售/領用）
    Out,
    /// 報廢
    Scrap,
    /// 盤點調整
    #[serde(alias = "ADJ")]
    Adjustment,
}

impl TransactionKind {
    /// 是否為扣減庫存的異動
    pub fn is_outbound(self) -> bool {
        matches!(self, Self::Out | Self::Scrap)
    }

    /// 將數量轉為帶方向的庫存變化量
    ///
    /// 輸入的正負號不影響結果：出庫/報廢一律扣減，入庫/調整一律增加。
    pub fn signed_delta(self, quantity: Decimal) -> Decimal {
        let magnitude = quantity.abs();
        if self.is_outbound() {
            -magnitude
        } else {
            magnitude
        }
    }
}

/// 庫存狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    /// 庫存耗盡（≤ 0）
    Depleted,
    /// 低於或等於最低水位
    Critical,
    /// 安全
    Safe,
}

impl StockStatus {
    /// 依現有庫存與最低水位判定狀態
    pub fn of(product: &Product) -> Self {
        let quantity = product.stock_quantity();
        if quantity <= Decimal::ZERO {
            Self::Depleted
        } else if quantity <= product.min_stock_level {
            Self::Critical
        } else {
            Self::Safe
        }
    }
}

/// 庫存異動請求（尚未過帳）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub kind: TransactionKind,
    pub warehouse_id: Option<WarehouseId>,
    pub notes: String,
}

impl StockMovement {
    /// 創建新的異動請求
    pub fn new(product_id: ProductId, quantity: Decimal, kind: TransactionKind) -> Self {
        Self {
            product_id,
            quantity,
            kind,
            warehouse_id: None,
            notes: String::new(),
        }
    }

    /// 建構器模式：設置倉庫
    pub fn with_warehouse(mut self, warehouse_id: WarehouseId) -> Self {
        self.warehouse_id = Some(warehouse_id);
        self
    }

    /// 建構器模式：設置備註
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// 帶方向的庫存變化量
    pub fn delta(&self) -> Decimal {
        self.kind.signed_delta(self.quantity)
    }

    /// 轉為已過帳的異動記錄
    pub fn into_transaction(
        self,
        id: StockTransactionId,
        balance_after: Decimal,
        created_at: DateTime<Utc>,
    ) -> StockTransaction {
        StockTransaction {
            id,
            product_id: self.product_id,
            warehouse_id: self.warehouse_id,
            quantity: self.quantity,
            kind: self.kind,
            notes: self.notes,
            balance_after,
            created_at,
        }
    }
}

/// 庫存異動記錄（只可新增，不可修改）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTransaction {
    pub id: StockTransactionId,
    pub product_id: ProductId,
    pub warehouse_id: Option<WarehouseId>,

    /// 原始輸入數量（保留正負號供稽核）
    pub quantity: Decimal,

    pub kind: TransactionKind,
    pub notes: String,

    /// 過帳後的產品庫存餘額
    pub balance_after: Decimal,

    pub created_at: DateTime<Utc>,
}

impl StockTransaction {
    /// 帶方向的庫存變化量
    pub fn delta(&self) -> Decimal {
        self.kind.signed_delta(self.quantity)
    }
}
