// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the chart indicators served by the
// dashboard API. Each file documents its warm-up and degenerate-input policy;
// none of them ever looks past the index it is computing (no look-ahead bias).
// The engine submodule composes them into annotated bar sequences.

pub mod bollinger;
pub mod ema;
pub mod engine;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use engine::{
    AnnotatedBar, IndicatorDefaults, IndicatorEngine, IndicatorSelection,
};
