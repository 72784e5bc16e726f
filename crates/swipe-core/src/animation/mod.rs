#![forbid(unsafe_code)]

//! Time-based animation primitives for row motion.

pub mod affordance;
pub mod settle;
pub mod spring;

pub use affordance::AffordanceFade;
pub use settle::{SettleAnimator, SettleHandle, SettleProgress, SettleStatus};
pub use spring::Spring;
