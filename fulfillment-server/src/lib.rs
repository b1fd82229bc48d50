//! Fulfillment Server - 线上订单履约编排
//!
//! # 架构概述
//!
//! 线上订单 (web / app / WhatsApp) 确认后，由编排器依次生成：
//!
//! - **销售单** (`Sale` + 明细) 与 **厨房单** (`ProductionTicket`)：失败即中止
//! - **小费** / **优惠券核销** / **配送单**：失败仅降级，订单照常确认
//!
//! 配送单由 `shipping::ShipmentTracker` 驱动：派车、取件、签收、失败投递、退回、取消。
//!
//! # 模块结构
//!
//! ```text
//! fulfillment-server/src/
//! ├── core/          # 配置、状态、错误、HTTP 服务器
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # SQLite 连接池 + 仓储函数
//! ├── stores/        # 协作方 trait (订单、销售、厨房、小费、优惠券、车队、配送)
//! ├── fulfillment/   # 确认编排 + 对账
//! ├── orders/        # 订单状态机、金额校验
//! ├── shipping/      # 配送单状态机、运单号
//! └── utils/         # 错误转换、日志
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod fulfillment;
pub mod orders;
pub mod shipping;
pub mod stores;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use fulfillment::{ConfirmOptions, ConfirmationOutcome, Orchestrator};
pub use shipping::ShipmentTracker;
pub use stores::Collaborators;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// 环境准备: `.env` → 配置 → 日志
pub fn setup_environment() -> anyhow::Result<Config> {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;
    init_logger_with_file(
        &config.log_level,
        config.log_json,
        config.log_dir.as_deref(),
    )?;
    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
    ______      ______ _ ____                     __
   / ____/_  __/ / __/(_) / /___ ___  ___  ____  / /_
  / /_  / / / / / /_ / / / / __ `__ \/ _ \/ __ \/ __/
 / __/ / /_/ / / __// / / / / / / / /  __/ / / / /_
/_/    \__,_/_/_/  /_/_/_/_/ /_/ /_/\___/_/ /_/\__/
    "#
    );
}
