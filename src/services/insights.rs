//! Dashboard-level re-aggregation of forecast bundles: the monthly
//! forecast/actual series, the MAPE summary figure, and the linear
//! trend shown in the stat cards.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    entities::CompanySize,
    errors::ServiceError,
    services::{aggregation::CustomerForecastBundle, forecasts::CustomerForecastService},
};

/// Which slice of the customer set the dashboard is looking at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InsightView {
    #[default]
    All,
    Size,
    Customer,
}

#[derive(Debug, Clone, Default)]
pub struct InsightSelection {
    pub view: InsightView,
    pub size: Option<CompanySize>,
    pub customer_id: Option<i64>,
    /// Optional month range; when both bounds are set every month in
    /// the range appears in the series, zero rows included.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// One month of the combined chart series.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPoint {
    /// First day of the month
    pub month: NaiveDate,
    pub predicted_quantity: Decimal,
    pub actual_sales: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForecastInsights {
    pub series: Vec<MonthlyPoint>,
    /// Mean across the selected customers' own mean MAPE
    pub mape: f64,
    /// OLS slope of the monthly forecast series over its mean, in percent
    pub trend_pct: f64,
    /// Floored mean of forecast quantity over months with a forecast
    pub avg_predicted: f64,
    /// Floored mean of actual sales over months with revenue
    pub avg_actual: f64,
    pub customer_count: usize,
}

/// Service producing dashboard aggregations on top of the bundle fetch.
#[derive(Clone)]
pub struct ForecastInsightsService {
    forecasts: Arc<CustomerForecastService>,
}

impl ForecastInsightsService {
    pub fn new(forecasts: Arc<CustomerForecastService>) -> Self {
        Self { forecasts }
    }

    pub async fn customer_forecast_insights(
        &self,
        selection: InsightSelection,
    ) -> Result<ForecastInsights, ServiceError> {
        let bundles = self.forecasts.list_customer_forecasts().await?;
        let insights = build_insights(&bundles, &selection)?;
        info!(
            customer_count = insights.customer_count,
            months = insights.series.len(),
            "Forecast insights computed"
        );
        Ok(insights)
    }
}

/// Pure computation over already-assembled bundles.
pub fn build_insights(
    bundles: &[CustomerForecastBundle],
    selection: &InsightSelection,
) -> Result<ForecastInsights, ServiceError> {
    let selected = select_bundles(bundles, selection)?;

    let mape = mean_of_customer_mapes(&selected);

    let mut months: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
    if let (Some(from), Some(to)) = (selection.from, selection.to) {
        let mut month = month_start(from);
        let last = month_start(to);
        while month <= last {
            months.entry(month).or_insert((Decimal::ZERO, Decimal::ZERO));
            let Some(next) = next_month(month) else {
                break;
            };
            month = next;
        }
    }

    for bundle in &selected {
        for forecast in &bundle.forecasts {
            let entry = months
                .entry(month_start(forecast.predicted_date))
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            entry.0 += forecast.predicted_quantity;
        }
        for point in &bundle.actual_sales {
            let entry = months
                .entry(month_start(point.date))
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            entry.1 += point.quantity;
        }
    }

    let from_month = selection.from.map(month_start);
    let to_month = selection.to.map(month_start);
    let series: Vec<MonthlyPoint> = months
        .into_iter()
        .filter(|(month, _)| {
            from_month.map_or(true, |from| *month >= from)
                && to_month.map_or(true, |to| *month <= to)
        })
        .map(|(month, (predicted_quantity, actual_sales))| MonthlyPoint {
            month,
            predicted_quantity,
            actual_sales,
        })
        .collect();

    let predicted: Vec<f64> = series
        .iter()
        .filter(|p| p.predicted_quantity > Decimal::ZERO)
        .map(|p| p.predicted_quantity.to_f64().unwrap_or(0.0))
        .collect();
    let actual: Vec<f64> = series
        .iter()
        .filter(|p| p.actual_sales > Decimal::ZERO)
        .map(|p| p.actual_sales.to_f64().unwrap_or(0.0))
        .collect();

    Ok(ForecastInsights {
        trend_pct: linear_trend_pct(&predicted),
        avg_predicted: floored_mean(&predicted),
        avg_actual: floored_mean(&actual),
        customer_count: selected.len(),
        mape,
        series,
    })
}

fn select_bundles<'a>(
    bundles: &'a [CustomerForecastBundle],
    selection: &InsightSelection,
) -> Result<Vec<&'a CustomerForecastBundle>, ServiceError> {
    match selection.view {
        InsightView::All => Ok(bundles.iter().collect()),
        InsightView::Size => {
            let size = selection.size.ok_or_else(|| {
                ServiceError::ValidationError("size is required when view=size".to_string())
            })?;
            Ok(bundles
                .iter()
                .filter(|b| b.company_size == Some(size))
                .collect())
        }
        InsightView::Customer => {
            let customer_id = selection.customer_id.ok_or_else(|| {
                ServiceError::ValidationError(
                    "customer_id is required when view=customer".to_string(),
                )
            })?;
            Ok(bundles
                .iter()
                .filter(|b| b.customer_id == customer_id)
                .collect())
        }
    }
}

/// Mean of each customer's own mean MAPE. Customers without any
/// recorded mape do not count toward the denominator. Deliberately not
/// quantity-weighted: the dashboard has always shown the unweighted
/// figure.
fn mean_of_customer_mapes(bundles: &[&CustomerForecastBundle]) -> f64 {
    let mut total = 0.0;
    let mut counted = 0usize;
    for bundle in bundles {
        let mapes: Vec<f64> = bundle.forecasts.iter().filter_map(|f| f.mape).collect();
        if !mapes.is_empty() {
            total += mapes.iter().sum::<f64>() / mapes.len() as f64;
            counted += 1;
        }
    }
    if counted == 0 {
        0.0
    } else {
        total / counted as f64
    }
}

/// Ordinary least-squares slope over a 0-based index, reported as
/// percent of the series mean. Fewer than 2 points, a flat index
/// denominator, or a zero mean all yield 0.
fn linear_trend_pct(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let n_f = n as f64;
    let x_mean = (0..n).map(|i| i as f64).sum::<f64>() / n_f;
    let y_mean = values.iter().sum::<f64>() / n_f;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        numerator += (x - x_mean) * (y - y_mean);
        denominator += (x - x_mean) * (x - x_mean);
    }

    if denominator.abs() < 1e-10 || y_mean == 0.0 {
        return 0.0;
    }

    (numerator / denominator) / y_mean * 100.0
}

fn floored_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().sum::<f64>() / values.len() as f64).floor()
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn next_month(month: NaiveDate) -> Option<NaiveDate> {
    let (year, next) = if month.month() == 12 {
        (month.year() + 1, 1)
    } else {
        (month.year(), month.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, next, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::aggregation::{ActualSalesPoint, ForecastData};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn bundle(customer_id: i64, size: Option<CompanySize>) -> CustomerForecastBundle {
        CustomerForecastBundle {
            customer_id,
            company_name: Some(format!("Company {customer_id}")),
            customer_name: None,
            company_size: size,
            forecasts: Vec::new(),
            actual_sales: Vec::new(),
        }
    }

    fn forecast_on(
        customer_id: i64,
        predicted_date: &str,
        qty: Decimal,
        mape: Option<f64>,
    ) -> ForecastData {
        ForecastData {
            cof_id: 1,
            customer_id,
            company_name: None,
            customer_name: None,
            company_size: None,
            predicted_date: date(predicted_date),
            predicted_quantity: qty,
            mape,
            prediction_model: "prophet".to_string(),
            probability: None,
            forecast_generation_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn assert_close(left: f64, right: f64) {
        assert!(
            (left - right).abs() < 1e-9,
            "expected {right}, got {left}"
        );
    }

    #[test]
    fn monthly_series_sums_across_customers_and_days() {
        let mut a = bundle(1, None);
        a.forecasts.push(forecast_on(1, "2024-03-05", dec!(10), None));
        a.actual_sales.push(ActualSalesPoint {
            date: date("2024-03-01"),
            quantity: dec!(100),
        });
        a.actual_sales.push(ActualSalesPoint {
            date: date("2024-03-20"),
            quantity: dec!(50),
        });

        let mut b = bundle(2, None);
        b.forecasts.push(forecast_on(2, "2024-03-12", dec!(5), None));

        let insights =
            build_insights(&[a, b], &InsightSelection::default()).unwrap();

        assert_eq!(insights.series.len(), 1);
        let point = &insights.series[0];
        assert_eq!(point.month, date("2024-03-01"));
        assert_eq!(point.predicted_quantity, dec!(15));
        assert_eq!(point.actual_sales, dec!(150));
        assert_eq!(insights.customer_count, 2);
    }

    #[test]
    fn mape_is_mean_of_per_customer_means() {
        let mut a = bundle(1, None);
        a.forecasts.push(forecast_on(1, "2024-01-01", dec!(1), Some(0.1)));
        a.forecasts.push(forecast_on(1, "2024-02-01", dec!(1), Some(0.3)));

        let mut b = bundle(2, None);
        b.forecasts.push(forecast_on(2, "2024-01-01", dec!(1), Some(0.4)));

        // No mape at all: excluded from the denominator
        let mut c = bundle(3, None);
        c.forecasts.push(forecast_on(3, "2024-01-01", dec!(1), None));

        let insights =
            build_insights(&[a, b, c], &InsightSelection::default()).unwrap();

        // Customer means: 0.2 and 0.4 -> overall 0.3
        assert_close(insights.mape, 0.3);
    }

    #[test]
    fn trend_is_zero_for_short_series() {
        assert_close(linear_trend_pct(&[]), 0.0);
        assert_close(linear_trend_pct(&[10.0]), 0.0);
    }

    #[test]
    fn trend_is_zero_for_zero_mean() {
        assert_close(linear_trend_pct(&[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn trend_is_slope_over_mean_in_percent() {
        // Slope 10 over mean 15 -> 66.67%
        assert_close(linear_trend_pct(&[10.0, 20.0]), 10.0 / 15.0 * 100.0);
        // Perfectly declining series
        assert!(linear_trend_pct(&[30.0, 20.0, 10.0]) < 0.0);
    }

    #[test]
    fn size_view_selects_only_the_cohort() {
        let mut a = bundle(1, Some(CompanySize::Large));
        a.forecasts.push(forecast_on(1, "2024-01-05", dec!(10), None));
        let mut b = bundle(2, Some(CompanySize::Small));
        b.forecasts.push(forecast_on(2, "2024-01-05", dec!(99), None));

        let selection = InsightSelection {
            view: InsightView::Size,
            size: Some(CompanySize::Large),
            ..Default::default()
        };
        let insights = build_insights(&[a, b], &selection).unwrap();

        assert_eq!(insights.customer_count, 1);
        assert_eq!(insights.series[0].predicted_quantity, dec!(10));
    }

    #[test]
    fn size_view_without_size_is_a_validation_error() {
        let selection = InsightSelection {
            view: InsightView::Size,
            ..Default::default()
        };
        let err = build_insights(&[], &selection).unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn customer_view_selects_one_customer() {
        let mut a = bundle(1, None);
        a.forecasts.push(forecast_on(1, "2024-01-05", dec!(10), None));
        let mut b = bundle(2, None);
        b.forecasts.push(forecast_on(2, "2024-01-05", dec!(99), None));

        let selection = InsightSelection {
            view: InsightView::Customer,
            customer_id: Some(2),
            ..Default::default()
        };
        let insights = build_insights(&[a, b], &selection).unwrap();

        assert_eq!(insights.customer_count, 1);
        assert_eq!(insights.series[0].predicted_quantity, dec!(99));
    }

    #[test]
    fn explicit_range_materializes_empty_months_and_clips_outliers() {
        let mut a = bundle(1, None);
        a.forecasts.push(forecast_on(1, "2024-02-10", dec!(10), None));
        a.forecasts.push(forecast_on(1, "2024-09-10", dec!(70), None));

        let selection = InsightSelection {
            from: Some(date("2024-01-15")),
            to: Some(date("2024-03-15")),
            ..Default::default()
        };
        let insights = build_insights(&[a], &selection).unwrap();

        let months: Vec<NaiveDate> = insights.series.iter().map(|p| p.month).collect();
        assert_eq!(
            months,
            vec![date("2024-01-01"), date("2024-02-01"), date("2024-03-01")]
        );
        assert_eq!(insights.series[0].predicted_quantity, dec!(0));
        assert_eq!(insights.series[1].predicted_quantity, dec!(10));
    }

    #[test]
    fn averages_are_floored_means_over_nonzero_months() {
        let mut a = bundle(1, None);
        a.forecasts.push(forecast_on(1, "2024-01-05", dec!(10), None));
        a.forecasts.push(forecast_on(1, "2024-02-05", dec!(15), None));
        a.actual_sales.push(ActualSalesPoint {
            date: date("2024-01-02"),
            quantity: dec!(7),
        });

        let insights = build_insights(&[a], &InsightSelection::default()).unwrap();

        // Predicted months: 10 and 15 -> mean 12.5 -> floor 12
        assert_close(insights.avg_predicted, 12.0);
        assert_close(insights.avg_actual, 7.0);
    }
}
