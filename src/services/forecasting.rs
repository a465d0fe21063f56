use crate::{
    entities::{material, reorder_request, usage_log_entry},
    errors::ServiceError,
};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// Minimum number of ledger entries for a meaningful regression
const MIN_SAMPLES: usize = 3;

/// Outcome of a depletion forecast.
///
/// The three non-`Depletes` variants are all "unknown" for display purposes;
/// they stay distinct so callers can log why no prediction was produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DepletionForecast {
    /// Fewer than three usage-ledger entries
    InsufficientData,
    /// Remaining quantity is flat or rising; nothing to project
    NoTrend,
    /// Projected days until the trend line crosses zero stock.
    /// `days` is 0.0 when the crossing is already in the past.
    Depletes { days: f64 },
    /// Degenerate regression input (e.g. every entry on the same day)
    Unpredictable,
}

impl DepletionForecast {
    pub fn days(&self) -> Option<f64> {
        match self {
            Self::Depletes { days } => Some(*days),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        !matches!(self, Self::Depletes { .. })
    }
}

/// Fits an ordinary-least-squares line over `(elapsed_days, remaining_quantity)`
/// samples and projects the day count until the line crosses zero.
///
/// Samples must be ordered oldest-first with elapsed days relative to the
/// first entry. Never panics; degenerate inputs degrade to a non-predictive
/// variant.
pub fn fit_depletion(samples: &[(i64, f64)]) -> DepletionForecast {
    if samples.len() < MIN_SAMPLES {
        return DepletionForecast::InsufficientData;
    }

    let first_qty = samples[0].1;
    if samples.iter().all(|(_, qty)| *qty == first_qty) {
        return DepletionForecast::NoTrend;
    }

    let n = samples.len() as f64;
    let sum_x: f64 = samples.iter().map(|(x, _)| *x as f64).sum();
    let sum_y: f64 = samples.iter().map(|(_, y)| *y).sum();
    let sum_xx: f64 = samples.iter().map(|(x, _)| (*x as f64) * (*x as f64)).sum();
    let sum_xy: f64 = samples.iter().map(|(x, y)| (*x as f64) * *y).sum();

    let denom = n * sum_xx - sum_x * sum_x;
    if denom == 0.0 {
        // All samples share one elapsed-day value; the slope is undefined
        return DepletionForecast::Unpredictable;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;

    if !slope.is_finite() || !intercept.is_finite() {
        return DepletionForecast::Unpredictable;
    }

    if slope >= 0.0 {
        return DepletionForecast::NoTrend;
    }

    // 0 = slope * x + intercept  =>  x = -intercept / slope
    let zero_crossing_day = -intercept / slope;
    let last_day = samples[samples.len() - 1].0 as f64;
    let days_remaining = zero_crossing_day - last_day;

    if !days_remaining.is_finite() {
        return DepletionForecast::Unpredictable;
    }

    if days_remaining <= 0.0 {
        // Stock is already more depleted than the trend predicts
        return DepletionForecast::Depletes { days: 0.0 };
    }

    DepletionForecast::Depletes {
        days: (days_remaining * 10.0).round() / 10.0,
    }
}

/// One row of the low-stock notifications view
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LowStockEntry {
    pub material: material::Model,
    pub status: material::StockStatus,
    pub forecast: DepletionForecast,
    pub reorder_requests: Vec<reorder_request::Model>,
}

/// Service producing depletion forecasts from the usage ledger
#[derive(Clone)]
pub struct ForecastingService {
    db: Arc<DatabaseConnection>,
}

impl ForecastingService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Forecasts days-to-depletion for a single material.
    #[instrument(skip(self))]
    pub async fn forecast_depletion(
        &self,
        material_id: Uuid,
    ) -> Result<DepletionForecast, ServiceError> {
        let material = material::Entity::find_by_id(material_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Material {} not found", material_id))
            })?;

        self.forecast_for(&material).await
    }

    async fn forecast_for(
        &self,
        material: &material::Model,
    ) -> Result<DepletionForecast, ServiceError> {
        let ledger = usage_log_entry::Entity::find()
            .filter(usage_log_entry::Column::MaterialId.eq(material.id))
            .order_by_asc(usage_log_entry::Column::RecordedAt)
            .all(&*self.db)
            .await?;

        if ledger.len() < MIN_SAMPLES {
            return Ok(DepletionForecast::InsufficientData);
        }

        let first = ledger[0].recorded_at;
        let samples: Vec<(i64, f64)> = ledger
            .iter()
            .map(|entry| {
                (
                    (entry.recorded_at - first).num_days(),
                    entry.remaining_quantity as f64,
                )
            })
            .collect();

        Ok(fit_depletion(&samples))
    }

    /// Builds the low-stock notifications view: every LOW material with its
    /// forecast and reorder requests, newest request first.
    #[instrument(skip(self))]
    pub async fn low_stock_report(&self) -> Result<Vec<LowStockEntry>, ServiceError> {
        let low_materials = material::Entity::find()
            .filter(
                Expr::col(material::Column::Quantity)
                    .lte(Expr::col(material::Column::ReorderPoint)),
            )
            .order_by_asc(material::Column::Name)
            .all(&*self.db)
            .await?;

        let mut report = Vec::with_capacity(low_materials.len());
        for material in low_materials {
            let forecast = self.forecast_for(&material).await?;
            let reorder_requests = reorder_request::Entity::find()
                .filter(reorder_request::Column::MaterialId.eq(material.id))
                .order_by_desc(reorder_request::Column::RequestedAt)
                .all(&*self.db)
                .await?;

            report.push(LowStockEntry {
                status: material.status(),
                material,
                forecast,
                reorder_requests,
            });
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn fewer_than_three_samples_is_insufficient() {
        assert_matches!(fit_depletion(&[]), DepletionForecast::InsufficientData);
        assert_matches!(
            fit_depletion(&[(0, 100.0)]),
            DepletionForecast::InsufficientData
        );
        assert_matches!(
            fit_depletion(&[(0, 100.0), (5, 80.0)]),
            DepletionForecast::InsufficientData
        );
    }

    #[test]
    fn constant_quantities_have_no_trend() {
        let samples = [(0, 50.0), (3, 50.0), (9, 50.0), (14, 50.0)];
        assert_matches!(fit_depletion(&samples), DepletionForecast::NoTrend);
    }

    #[test]
    fn rising_stock_has_no_trend() {
        let samples = [(0, 40.0), (5, 60.0), (10, 80.0)];
        assert_matches!(fit_depletion(&samples), DepletionForecast::NoTrend);
    }

    #[test]
    fn linear_decline_projects_zero_crossing() {
        // Slope -4/day from 100: crosses zero at day 25, last sample at
        // day 15, so 10 days remain.
        let samples = [(0, 100.0), (5, 80.0), (10, 60.0), (15, 40.0)];
        assert_eq!(fit_depletion(&samples).days(), Some(10.0));
    }

    #[test]
    fn past_zero_crossing_reports_zero_days() {
        let samples = [(0, 30.0), (5, 10.0), (10, 0.0), (20, 0.0)];
        assert_matches!(fit_depletion(&samples), DepletionForecast::Depletes { days } if days == 0.0);
    }

    #[test]
    fn single_day_cluster_is_unpredictable() {
        let samples = [(0, 100.0), (0, 80.0), (0, 60.0)];
        assert_matches!(fit_depletion(&samples), DepletionForecast::Unpredictable);
    }

    #[rstest]
    #[case(&[(0, 90.0), (1, 60.0), (2, 30.0)], 1.0)] // zero at day 3
    #[case(&[(0, 10.0), (1, 9.0), (2, 8.0)], 8.0)] // zero at day 10
    fn known_trends(#[case] samples: &[(i64, f64)], #[case] expected_days: f64) {
        assert_eq!(fit_depletion(samples).days(), Some(expected_days));
    }

    #[test]
    fn rounds_to_one_decimal() {
        // Slope -3 from 100: zero at 33.333..., last day 2 => 31.3 remaining
        let samples = [(0, 100.0), (1, 97.0), (2, 94.0)];
        assert_eq!(fit_depletion(&samples).days(), Some(31.3));
    }

    #[test]
    fn unknown_classification() {
        assert!(DepletionForecast::InsufficientData.is_unknown());
        assert!(DepletionForecast::NoTrend.is_unknown());
        assert!(DepletionForecast::Unpredictable.is_unknown());
        assert!(!DepletionForecast::Depletes { days: 4.2 }.is_unknown());
    }

    proptest! {
        /// A perfectly linear decline is recovered exactly: projected days
        /// equal the true zero crossing minus the last observed day.
        #[test]
        fn recovers_exact_linear_decline(
            start in 50i64..5_000,
            slope in 1i64..50,
            step in 1i64..10,
        ) {
            let samples: Vec<(i64, f64)> = (0..6)
                .map(|i| (i * step, (start - slope * i * step) as f64))
                .collect();

            let expected = (start as f64 / slope as f64) - (5 * step) as f64;
            let expected = (expected.max(0.0) * 10.0).round() / 10.0;

            prop_assert_eq!(fit_depletion(&samples).days(), Some(expected));
        }
    }
}
