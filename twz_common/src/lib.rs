mod money;

pub mod helpers;
pub mod op;
mod secret;

pub use money::{Money, MoneyConversionError, KES_CURRENCY_CODE, USD_CURRENCY_CODE};
pub use secret::Secret;
