//! 物料清單（BOM）與製程作業

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{BomId, BomItemId, OperationId, ProductId, WorkCenterId};
use crate::{MesError, Result};

/// 損耗率上限（百分比，不含）
pub const SCRAP_FACTOR_LIMIT: Decimal = Decimal::ONE_HUNDRED;

/// 物料清單表頭，由單一半成品/成品擁有
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bom {
    pub id: BomId,

    /// 生產的產品（1:1）
    pub product_id: ProductId,

    pub version: String,
    pub is_active: bool,
    pub description: String,

    items: Vec<BomItem>,

    /// 依作業序號排序
    operations: Vec<Operation>,
}

impl Bom {
    /// 創建新的 BOM（版本 1.0、啟用）
    pub fn new(product_id: ProductId) -> Self {
        Self {
            id: BomId(0),
            product_id,
            version: "1.0".to_string(),
            is_active: true,
            description: String::new(),
            items: Vec::new(),
            operations: Vec::new(),
        }
    }

    /// 建構器模式：設置版本
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// 建構器模式：設置啟用狀態
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// 建構器模式：設置生產備註
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// 建構器模式：加入明細
    pub fn with_item(mut self, item: BomItem) -> Self {
        self.add_item(item);
        self
    }

    /// 建構器模式：加入作業（序號重複時回傳錯誤）
    pub fn with_operation(mut self, operation: Operation) -> Result<Self> {
        self.add_operation(operation)?;
        Ok(self)
    }

    /// 加入明細
    pub fn add_item(&mut self, item: BomItem) {
        self.items.push(item);
    }

    /// 加入作業，維持依序號排序
    pub fn add_operation(&mut self, mut operation: Operation) -> Result<()> {
        if self
            .operations
            .iter()
            .any(|op| op.step_number == operation.step_number)
        {
            return Err(MesError::Validation(format!(
                "{} 已存在作業序號 {}",
                self.id, operation.step_number
            )));
        }

        operation.bom_id = self.id;
        let position = self
            .operations
            .partition_point(|op| op.step_number < operation.step_number);
        self.operations.insert(position, operation);
        Ok(())
    }

    /// 移除作業
    pub fn remove_operation(&mut self, operation_id: OperationId) -> Option<Operation> {
        let index = self.operations.iter().position(|op| op.id == operation_id)?;
        Some(self.operations.remove(index))
    }

    /// 明細（依加入順序）
    pub fn items(&self) -> &[BomItem] {
        &self.items
    }

    /// 作業（依序號）
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// 依ID查找作業
    pub fn operation(&self, operation_id: OperationId) -> Option<&Operation> {
        self.operations.iter().find(|op| op.id == operation_id)
    }

    /// 是否引用了某個元件
    pub fn references_component(&self, product_id: ProductId) -> bool {
        self.items
            .iter()
            .any(|item| item.child_product_id == product_id)
    }

    pub(crate) fn assign_id(&mut self, id: BomId) {
        self.id = id;
        for op in &mut self.operations {
            op.bom_id = id;
        }
    }

    pub(crate) fn items_mut(&mut self) -> &mut [BomItem] {
        &mut self.items
    }

    pub(crate) fn operations_mut(&mut self) -> &mut [Operation] {
        &mut self.operations
    }
}

/// BOM 明細
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomItem {
    pub id: BomItemId,

    /// 元件（被引用時不可刪除）
    pub child_product_id: ProductId,

    /// 單位用量
    pub quantity: Decimal,

    /// 損耗率（%），範圍 [0, 100)
    pub scrap_factor: Decimal,
}

impl BomItem {
    /// 創建新的明細，損耗率為 0
    pub fn new(child_product_id: ProductId, quantity: Decimal) -> Self {
        Self {
            id: BomItemId(0),
            child_product_id,
            quantity,
            scrap_factor: Decimal::ZERO,
        }
    }

    /// 建構器模式：設置損耗率
    pub fn with_scrap_factor(mut self, scrap_factor: Decimal) -> Result<Self> {
        Self::check_scrap_factor(self.id, scrap_factor)?;
        self.scrap_factor = scrap_factor;
        Ok(self)
    }

    /// 檢查損耗率是否落在 [0, 100)
    pub fn validate(&self) -> Result<()> {
        Self::check_scrap_factor(self.id, self.scrap_factor)
    }

    fn check_scrap_factor(id: BomItemId, scrap_factor: Decimal) -> Result<()> {
        if scrap_factor < Decimal::ZERO || scrap_factor >= SCRAP_FACTOR_LIMIT {
            return Err(MesError::configuration(
                id.to_string(),
                "scrap_factor",
                format!("損耗率 {} 必須介於 0 與 100 之間（不含 100）", scrap_factor),
            ));
        }
        Ok(())
    }
}

/// 製程作業
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub bom_id: BomId,
    pub work_center_id: WorkCenterId,

    /// 作業序號（同一 BOM 內唯一）
    pub step_number: u32,

    pub description: String,

    /// 準備時間（分鐘）
    pub setup_time: Decimal,

    /// 單件加工時間（分鐘/件）
    pub cycle_time: Decimal,
}

impl Operation {
    /// 創建新的作業
    pub fn new(
        work_center_id: WorkCenterId,
        step_number: u32,
        description: impl Into<String>,
        setup_time: Decimal,
        cycle_time: Decimal,
    ) -> Self {
        Self {
            id: OperationId(0),
            bom_id: BomId(0),
            work_center_id,
            step_number,
            description: description.into(),
            setup_time,
            cycle_time,
        }
    }
}
