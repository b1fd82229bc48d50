//! Reconciliation report
//!
//! 确认流程没有补偿动作，部分完成的确认留下的不一致记录在这里汇总，供人工处理。

use serde::Serialize;
use shared::Scope;
use shared::models::Gratuity;
use sqlx::SqlitePool;

use crate::db::repository::reconciliation::{OrderGap, OrphanedSale, SaleWithoutTicket};
use crate::db::repository::{RepoResult, gratuity, reconciliation};

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub generated_at: i64,
    /// Sales whose order never got linked to them (hard step or finalize failed)
    pub orphaned_sales: Vec<OrphanedSale>,
    pub sales_without_ticket: Vec<SaleWithoutTicket>,
    pub orders_missing_gratuity: Vec<OrderGap>,
    pub orders_missing_redemption: Vec<OrderGap>,
    pub orders_missing_shipment: Vec<OrderGap>,
    /// Tips never attached to a sale
    pub unlinked_gratuities: Vec<Gratuity>,
}

impl ReconciliationReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned_sales.is_empty()
            && self.sales_without_ticket.is_empty()
            && self.orders_missing_gratuity.is_empty()
            && self.orders_missing_redemption.is_empty()
            && self.orders_missing_shipment.is_empty()
            && self.unlinked_gratuities.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        self.orphaned_sales.len()
            + self.sales_without_ticket.len()
            + self.orders_missing_gratuity.len()
            + self.orders_missing_redemption.len()
            + self.orders_missing_shipment.len()
            + self.unlinked_gratuities.len()
    }
}

/// Run every check for `scope` concurrently
pub async fn build(pool: &SqlitePool, scope: Scope) -> RepoResult<ReconciliationReport> {
    let (
        orphaned_sales,
        sales_without_ticket,
        orders_missing_gratuity,
        orders_missing_redemption,
        orders_missing_shipment,
        unlinked_gratuities,
    ) = tokio::try_join!(
        reconciliation::find_orphaned_sales(pool, scope),
        reconciliation::find_sales_without_ticket(pool, scope),
        reconciliation::find_orders_missing_gratuity(pool, scope),
        reconciliation::find_orders_missing_redemption(pool, scope),
        reconciliation::find_orders_missing_shipment(pool, scope),
        gratuity::find_unlinked(pool, scope),
    )?;

    let report = ReconciliationReport {
        generated_at: shared::util::now_millis(),
        orphaned_sales,
        sales_without_ticket,
        orders_missing_gratuity,
        orders_missing_redemption,
        orders_missing_shipment,
        unlinked_gratuities,
    };

    if !report.is_clean() {
        tracing::warn!(
            target: "fulfillment",
            organization_id = scope.organization_id,
            branch_id = scope.branch_id,
            issues = report.issue_count(),
            "Reconciliation report has open issues"
        );
    }
    Ok(report)
}
