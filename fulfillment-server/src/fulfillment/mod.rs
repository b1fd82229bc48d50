//! Online order fulfillment
//!
//! # 模块结构
//!
//! - [`orchestrator`] - 确认编排: Sale → Ticket → 小费 → 优惠券 → 配送单 → 订单
//! - [`reconcile`] - 小费 / 优惠券占位记录的查找或创建
//! - [`address`] - 配送地址归一化
//! - [`report`] - 对账报表

pub mod address;
mod error;
pub mod orchestrator;
pub mod reconcile;
pub mod report;

pub use error::{FulfillmentError, FulfillmentStep};
pub use orchestrator::{
    Cancellation, ConfirmOptions, ConfirmationOutcome, DegradedStep, MAX_ESTIMATED_MINUTES,
    Orchestrator,
};
pub use report::ReconciliationReport;
