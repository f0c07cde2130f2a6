//! The fixed set of analytical queries run against an orders snapshot.

use snafu::prelude::*;

use crate::{
    error::{BatterySnafu, QueryError},
    session::{AnalyticsSession, TabularResult, quote_identifier},
};

/// One titled query in a [`QueryBattery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatteryQuery {
    /// Human-facing heading printed above the result.
    pub title: String,
    /// SQL text, already bound to a table name.
    pub sql: String,
}

/// A titled query together with its result.
#[derive(Debug, Clone)]
pub struct BatteryReport {
    /// Heading of the query that produced `result`.
    pub title: String,
    /// Query output.
    pub result: TabularResult,
}

/// An ordered list of read-only queries evaluated against one session.
#[derive(Debug, Clone)]
pub struct QueryBattery {
    queries: Vec<BatteryQuery>,
}

impl QueryBattery {
    /// Build a battery from arbitrary queries.
    pub fn new(queries: Vec<BatteryQuery>) -> Self {
        Self { queries }
    }

    /// The e-commerce orders battery: totals, revenue by status, orders by
    /// payment method, top customers, and a sample of rows.
    ///
    /// Expects the columns `order_id`, `customer_id`, `timestamp`,
    /// `total_amount`, `status`, and `payment_method`.
    pub fn ecommerce_orders(table_name: &str) -> Self {
        let t = quote_identifier(table_name);
        let q = |title: &str, sql: String| BatteryQuery {
            title: title.to_string(),
            sql,
        };

        Self::new(vec![
            q(
                "Total Orders",
                format!("SELECT COUNT(*) AS total_orders FROM {t}"),
            ),
            q(
                "Revenue by Status",
                format!(
                    "SELECT
                        status,
                        COUNT(*) AS order_count,
                        ROUND(SUM(total_amount), 2) AS total_revenue,
                        ROUND(AVG(total_amount), 2) AS avg_order_value
                    FROM {t}
                    GROUP BY status
                    ORDER BY total_revenue DESC"
                ),
            ),
            q(
                "Orders by Payment Method",
                format!(
                    "SELECT
                        payment_method,
                        COUNT(*) AS order_count,
                        ROUND(SUM(total_amount), 2) AS total_revenue
                    FROM {t}
                    GROUP BY payment_method
                    ORDER BY order_count DESC"
                ),
            ),
            q(
                "Top Customers by Spend",
                format!(
                    "SELECT
                        customer_id,
                        COUNT(*) AS order_count,
                        ROUND(SUM(total_amount), 2) AS total_spend,
                        ROUND(AVG(total_amount), 2) AS avg_order_value
                    FROM {t}
                    GROUP BY customer_id
                    ORDER BY total_spend DESC
                    LIMIT 10"
                ),
            ),
            q(
                "Sample Orders (first 10)",
                format!(
                    "SELECT
                        order_id,
                        customer_id,
                        \"timestamp\",
                        ROUND(total_amount, 2) AS total_amount,
                        status,
                        payment_method
                    FROM {t}
                    LIMIT 10"
                ),
            ),
        ])
    }

    /// Queries in evaluation order.
    pub fn queries(&self) -> &[BatteryQuery] {
        &self.queries
    }

    /// Evaluate every query in order. The first failure aborts the run and
    /// names the failing query.
    pub async fn run(&self, session: &AnalyticsSession) -> Result<Vec<BatteryReport>, QueryError> {
        let mut reports = Vec::with_capacity(self.queries.len());
        for query in &self.queries {
            let result = session
                .query(&query.sql)
                .await
                .context(BatterySnafu {
                    title: query.title.as_str(),
                })?;

            tracing::debug!(title = %query.title, rows = result.num_rows(), "battery query done");
            reports.push(BatteryReport {
                title: query.title.clone(),
                result,
            });
        }
        Ok(reports)
    }
}
