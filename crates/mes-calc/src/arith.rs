//! 溢位檢查的 Decimal 運算

use std::fmt::Display;

use mes_core::{MesError, Result};
use rust_decimal::Decimal;

/// 將 `checked_*` 的結果轉為帶實體ID的配置錯誤
pub(crate) trait OrOverflow {
    fn or_overflow<E>(self, entity: &E, computation: &'static str) -> Result<Decimal>
    where
        E: Display + ?Sized;
}

impl OrOverflow for Option<Decimal> {
    fn or_overflow<E>(self, entity: &E, computation: &'static str) -> Result<Decimal>
    where
        E: Display + ?Sized,
    {
        self.ok_or_else(|| MesError::overflow(entity.to_string(), computation))
    }
}

/// 逐項加總，溢位時回傳配置錯誤
pub(crate) fn checked_sum<I, E>(values: I, entity: &E, computation: &'static str) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
    E: Display + ?Sized,
{
    values.into_iter().try_fold(Decimal::ZERO, |total, value| {
        total.checked_add(value).or_overflow(entity, computation)
    })
}
