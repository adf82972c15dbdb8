//! # MES
//!
//! 製造執行計算引擎：庫存帳冊、BOM 用量與成本、淨需求、工作中心績效、
//! 工單進度/成本/延遲與品質良率。
//!
//! ```no_run
//! use mes::{logging, EngineConfig, Ledger, MemoryStore, MesEngine};
//! use std::sync::Arc;
//!
//! logging::init();
//! let store = Arc::new(MemoryStore::new());
//! let engine = MesEngine::new(store.clone(), EngineConfig::default()).unwrap();
//! let ledger = Ledger::new(store, EngineConfig::default()).unwrap();
//! # let _ = (engine, ledger);
//! ```

pub mod logging;

pub use mes_calc;
pub use mes_core;
pub use mes_ledger;

pub use mes_calc::{
    CostEstimate, EngineWarning, MaterialLine, MesEngine, NetRequirement, OrderReport, OutOfSpec,
    WarningSeverity, WorkCenterLoad,
};
pub use mes_core::{EngineConfig, MemoryStore, MesError, Result};
pub use mes_ledger::{Ledger, Reconciliation};
