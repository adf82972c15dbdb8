//! # MES Core
//!
//! 核心資料模型、錯誤類型、引擎配置與資料存取介面

pub mod bom;
pub mod config;
pub mod ids;
pub mod memory;
pub mod product;
pub mod production;
pub mod quality;
pub mod reference;
pub mod stock;
pub mod store;
pub mod window;
pub mod work_center;

// Re-export 主要類型
pub use bom::{Bom, BomItem, Operation};
pub use config::EngineConfig;
pub use ids::*;
pub use memory::MemoryStore;
pub use product::{Product, ProductKind, UnitOfMeasure};
pub use production::{OrderStatus, ProductionLog, ProductionOrder};
pub use quality::{QualityCheck, QualityMeasurement, QualityParameter};
pub use reference::{
    Category, Customer, Employee, Maintenance, MaintenanceCategory, MaintenanceKind,
    MaintenanceReason, SalesOrder, Shift, Warehouse, WarehouseKind,
};
pub use stock::{StockMovement, StockStatus, StockTransaction, TransactionKind};
pub use store::{DataStore, LedgerStore};
pub use window::RecencyWindow;
pub use work_center::WorkCenter;

/// MES 錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum MesError {
    #[error("配置錯誤 [{computation}] {entity}: {message}")]
    Configuration {
        entity: String,
        computation: &'static str,
        message: String,
    },

    #[error("參照錯誤 [{computation}]: 找不到 {entity}")]
    Reference {
        entity: String,
        computation: &'static str,
    },

    #[error("庫存寫入衝突: 產品 {product}")]
    WriteConflict { product: ProductId },

    #[error("並行錯誤: 產品 {product} 庫存更新重試 {attempts} 次後仍失敗")]
    Concurrency { product: ProductId, attempts: u32 },

    #[error("資料驗證失敗: {0}")]
    Validation(String),

    #[error("資料存取錯誤: {0}")]
    Storage(String),
}

impl MesError {
    /// 建立配置錯誤
    pub fn configuration(
        entity: impl Into<String>,
        computation: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            entity: entity.into(),
            computation,
            message: message.into(),
        }
    }

    /// 建立數值溢位錯誤
    pub fn overflow(entity: impl Into<String>, computation: &'static str) -> Self {
        Self::configuration(entity, computation, "數值溢位")
    }

    /// 建立參照錯誤
    pub fn reference(entity: impl Into<String>, computation: &'static str) -> Self {
        Self::Reference {
            entity: entity.into(),
            computation,
        }
    }

    /// 以實際執行的計算名稱標註配置/參照錯誤
    pub fn in_computation(self, name: &'static str) -> Self {
        match self {
            Self::Configuration {
                entity, message, ..
            } => Self::Configuration {
                entity,
                computation: name,
                message,
            },
            Self::Reference { entity, .. } => Self::Reference {
                entity,
                computation: name,
            },
            other => other,
        }
    }

    /// 是否可由呼叫端整筆重試
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::WriteConflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, MesError>;
