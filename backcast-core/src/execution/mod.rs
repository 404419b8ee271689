//! Execution rules: fill detection against OHLC ranges and slippage.

pub mod fill;
pub mod slippage;

pub use fill::fill_price;
pub use slippage::apply_slippage;
