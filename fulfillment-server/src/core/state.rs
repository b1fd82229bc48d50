use std::path::PathBuf;

use sqlx::SqlitePool;

use crate::core::{Config, Result, ServerError};
use crate::db::DbService;
use crate::fulfillment::Orchestrator;
use crate::orders::OrderStatusMachine;
use crate::shipping::ShipmentTracker;
use crate::stores::Collaborators;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 所有字段都是廉价克隆 (`SqlitePool` 与 `Arc<dyn ...>`)，每个请求一份。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | db | SQLite 连接池 |
/// | collaborators | 订单 / 销售 / 厨房 / 小费 / 优惠券 / 车队 / 配送存储 |
/// | orchestrator | 订单确认编排 |
/// | tracker | 配送单跟踪 |
/// | order_status | 订单状态机 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub collaborators: Collaborators,
    pub orchestrator: Orchestrator,
    pub tracker: ShipmentTracker,
    pub order_status: OrderStatusMachine,
}

impl ServerState {
    /// 由已打开的数据库组装全部服务
    pub fn new(config: Config, db: DbService) -> Self {
        let collaborators = Collaborators::sqlite(db.pool.clone());
        Self::with_collaborators(config, db, collaborators)
    }

    /// 使用自定义 collaborators (测试注入失败实现)
    pub fn with_collaborators(config: Config, db: DbService, collaborators: Collaborators) -> Self {
        let tracker = ShipmentTracker::new(&collaborators, config.tracking_prefix.clone());
        let orchestrator = Orchestrator::new(
            collaborators.clone(),
            tracker.clone(),
            config.delivery_buffer_minutes,
        );
        let order_status = OrderStatusMachine::new(collaborators.orders.clone());
        Self {
            config,
            db,
            collaborators,
            orchestrator,
            tracker,
            order_status,
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 工作目录结构 (确保数据库目录存在)
    /// 2. 数据库 (打开 + 迁移)
    /// 3. 各服务
    pub async fn initialize(config: &Config) -> Result<Self> {
        let db_path = PathBuf::from(&config.database_path);
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db_path = db_path
            .to_str()
            .ok_or_else(|| ServerError::Config(format!("Invalid database path: {db_path:?}")))?;

        let db = DbService::new(db_path).await?;
        tracing::info!(
            work_dir = %config.work_dir,
            database = %config.database_path,
            environment = %config.environment,
            "Server state initialized"
        );
        Ok(Self::new(config.clone(), db))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }
}
