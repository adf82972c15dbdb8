//! 產品主檔

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{CategoryId, ProductId};
use crate::stock::{StockStatus, TransactionKind};
use crate::{MesError, Result};

/// 產品類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductKind {
    /// 原物料
    Raw,
    /// 半成品
    Semi,
    /// 成品
    Final,
    /// 買賣品
    Trading,
    /// 消耗品
    Consumable,
    /// 維修保養零件
    MaintenancePart,
    /// 服務
    Service,
    /// 廢料
    Scrap,
    /// 包材
    Packaging,
}

impl ProductKind {
    /// 是否為可生產（可擁有 BOM、可開立工單）的類型
    pub fn is_producible(self) -> bool {
        matches!(self, Self::Semi | Self::Final)
    }
}

/// 計量單位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitOfMeasure {
    Unit,
    Kg,
    Lt,
    Meter,
    M2,
}

/// 產品
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// 產品ID（由資料存放區配發）
    pub id: ProductId,

    /// 料號
    pub sku: String,

    /// 品名
    pub name: String,

    /// 分類（分類刪除時清空）
    pub category_id: Option<CategoryId>,

    /// 產品類型
    pub kind: ProductKind,

    /// 計量單位
    pub unit_of_measure: UnitOfMeasure,

    /// 單價
    pub price: Decimal,

    /// 採購提前期（天）
    pub lead_time_days: u32,

    /// 最低庫存水位
    pub min_stock_level: Decimal,

    /// 現有庫存，只能經由帳冊過帳變動
    stock_quantity: Decimal,
}

impl Product {
    /// 創建新的產品，庫存為零
    pub fn new(sku: impl Into<String>, name: impl Into<String>, kind: ProductKind) -> Self {
        Self {
            id: ProductId(0),
            sku: sku.into(),
            name: name.into(),
            category_id: None,
            kind,
            unit_of_measure: UnitOfMeasure::Unit,
            price: Decimal::ZERO,
            lead_time_days: 0,
            min_stock_level: Decimal::ZERO,
            stock_quantity: Decimal::ZERO,
        }
    }

    /// 建構器模式：設置單價
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = price;
        self
    }

    /// 建構器模式：設置最低庫存水位
    pub fn with_min_stock_level(mut self, level: Decimal) -> Self {
        self.min_stock_level = level;
        self
    }

    /// 建構器模式：設置分類
    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// 建構器模式：設置計量單位
    pub fn with_unit_of_measure(mut self, uom: UnitOfMeasure) -> Self {
        self.unit_of_measure = uom;
        self
    }

    /// 建構器模式：設置採購提前期
    pub fn with_lead_time_days(mut self, days: u32) -> Self {
        self.lead_time_days = days;
        self
    }

    /// 現有庫存
    pub fn stock_quantity(&self) -> Decimal {
        self.stock_quantity
    }

    /// 庫存狀態
    pub fn stock_status(&self) -> StockStatus {
        StockStatus::of(self)
    }

    /// 建構器模式：設置庫存快照
    ///
    /// 只用於建立計算輸入；資料存放區不接受非零庫存的新增。
    pub fn with_stock_snapshot(mut self, quantity: Decimal) -> Self {
        self.stock_quantity = quantity;
        self
    }

    /// 依異動類型過帳，回傳過帳後餘額
    ///
    /// 數量一律取絕對值，方向由異動類型決定；餘額允許為負。
    /// 只由資料存放區在鎖定產品列並寫入異動記錄時呼叫。
    pub(crate) fn post_movement(
        &mut self,
        kind: TransactionKind,
        quantity: Decimal,
    ) -> Result<Decimal> {
        self.stock_quantity = self
            .stock_quantity
            .checked_add(kind.signed_delta(quantity))
            .ok_or_else(|| MesError::overflow(self.id.to_string(), "update_stock"))?;
        Ok(self.stock_quantity)
    }
}
