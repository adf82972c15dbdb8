//! # MES Stock Ledger
//!
//! 庫存帳冊：唯一會改變產品庫存的入口。
//!
//! 每筆異動與新餘額在同一個交易中寫入；資料存取層回報寫入衝突時整筆重試，
//! 超過 `ledger_max_retries` 次後回傳 [`MesError::Concurrency`]。

use mes_core::{
    EngineConfig, LedgerStore, MesError, ProductId, Result, StockMovement, StockTransaction,
    TransactionKind,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

/// 帳冊與產品庫存的核對結果
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub product_id: ProductId,

    /// 產品列上的庫存
    pub recorded: Decimal,

    /// 由異動歷史重新加總的庫存
    pub derived: Decimal,

    /// recorded − derived
    pub drift: Decimal,

    pub is_consistent: bool,
}

/// 庫存帳冊
pub struct Ledger<S> {
    store: Arc<S>,
    config: EngineConfig,
}

impl<S: LedgerStore> Ledger<S> {
    /// 創建新的帳冊（配置不合法時回傳錯誤）
    pub fn new(store: Arc<S>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// 以數量與類型直接過帳
    pub fn update_stock(
        &self,
        product_id: ProductId,
        quantity: Decimal,
        kind: TransactionKind,
    ) -> Result<StockTransaction> {
        self.apply_movement(StockMovement::new(product_id, quantity, kind))
    }

    /// 過帳一筆庫存異動
    ///
    /// - IN/ADJUSTMENT：庫存 + |數量|
    /// - OUT/SCRAP：庫存 − |數量|
    ///
    /// 允許負庫存，但會記錄警告。
    pub fn apply_movement(&self, movement: StockMovement) -> Result<StockTransaction> {
        let product_id = movement.product_id;
        let max_retries = self.config.ledger_max_retries;
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match self.store.transact_stock(movement.clone()) {
                Ok(txn) => {
                    tracing::info!(
                        "庫存異動 {}: {} {:?} {} → 餘額 {}",
                        txn.id,
                        product_id,
                        txn.kind,
                        txn.quantity,
                        txn.balance_after
                    );
                    if txn.balance_after < Decimal::ZERO {
                        tracing::warn!("產品 {} 庫存為負: {}", product_id, txn.balance_after);
                    }
                    return Ok(txn);
                }
                Err(e) if e.is_retryable() => {
                    if attempts > max_retries {
                        tracing::warn!(
                            "產品 {} 庫存更新重試 {} 次後放棄",
                            product_id,
                            attempts
                        );
                        return Err(MesError::Concurrency {
                            product: product_id,
                            attempts,
                        });
                    }
                    tracing::warn!("產品 {} 寫入衝突，重試第 {} 次", product_id, attempts);
                }
                Err(e) => return Err(e.in_computation("update_stock")),
            }
        }
    }

    /// 產品的異動歷史，依建立順序
    pub fn history(&self, product_id: ProductId) -> Result<Vec<StockTransaction>> {
        // 先確認產品存在，避免把不存在的產品當成空歷史
        self.store
            .product(product_id)
            .map_err(|e| e.in_computation("stock_history"))?;
        self.store.stock_transactions(product_id)
    }

    /// 由異動歷史重算庫存並與產品列比對
    pub fn reconcile(&self, product_id: ProductId) -> Result<Reconciliation> {
        let product = self
            .store
            .product(product_id)
            .map_err(|e| e.in_computation("reconcile"))?;
        let derived: Decimal = self
            .store
            .stock_transactions(product_id)?
            .iter()
            .map(StockTransaction::delta)
            .sum();

        let recorded = product.stock_quantity();
        let drift = recorded - derived;
        if !drift.is_zero() {
            tracing::warn!("產品 {} 帳冊差異 {}", product.sku, drift);
        }

        Ok(Reconciliation {
            product_id,
            recorded,
            derived,
            drift,
            is_consistent: drift.is_zero(),
        })
    }
}
