//! Query-time assembly of per-customer forecast bundles.
//!
//! Everything here is pure: the service layer fetches rows and resolves
//! the wall clock, then hands both to these functions. The moving
//! "today" bound is always a parameter so the pipeline stays
//! deterministic under test.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::entities::CompanySize;

/// How many customers are promoted to the top of the dashboard,
/// ranked by total actual sales.
pub const TOP_CUSTOMER_COUNT: usize = 5;

/// One forecast record as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForecastData {
    pub cof_id: i64,
    pub customer_id: i64,
    pub company_name: Option<String>,
    pub customer_name: Option<String>,
    pub company_size: Option<CompanySize>,
    pub predicted_date: NaiveDate,
    pub predicted_quantity: Decimal,
    pub mape: Option<f64>,
    pub prediction_model: String,
    pub probability: Option<f64>,
    pub forecast_generation_date: DateTime<Utc>,
}

/// One day of summed revenue. The series a bundle carries is contiguous
/// and zero-filled from the customer's first sale through "today".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ActualSalesPoint {
    pub date: NaiveDate,
    pub quantity: Decimal,
}

/// Per-customer aggregate exposed by `GET /customer-forecasts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerForecastBundle {
    pub customer_id: i64,
    pub company_name: Option<String>,
    pub customer_name: Option<String>,
    pub company_size: Option<CompanySize>,
    pub forecasts: Vec<ForecastData>,
    pub actual_sales: Vec<ActualSalesPoint>,
}

/// One order row after the service has resolved its joins: the product
/// price and the contact's (possibly missing) customer linkage.
#[derive(Debug, Clone)]
pub struct OrderRevenueRow {
    pub order_id: i64,
    pub customer_id: Option<i64>,
    /// Local calendar date of the transaction
    pub order_date: NaiveDate,
    pub quantity: i32,
    pub selling_price: Option<Decimal>,
}

impl OrderRevenueRow {
    fn revenue(&self) -> Decimal {
        Decimal::from(self.quantity) * self.selling_price.unwrap_or(Decimal::ZERO)
    }
}

/// Step 1: per-customer, per-day revenue sums.
///
/// Rows whose customer linkage cannot be resolved are dropped with a
/// diagnostic; a bad contact row must not fail the whole request.
pub fn daily_revenue_by_customer(
    rows: &[OrderRevenueRow],
) -> HashMap<i64, BTreeMap<NaiveDate, Decimal>> {
    let mut by_customer: HashMap<i64, BTreeMap<NaiveDate, Decimal>> = HashMap::new();

    for row in rows {
        let Some(customer_id) = row.customer_id else {
            warn!(
                order_id = row.order_id,
                "Skipping order with unresolved customer linkage"
            );
            counter!("forecast_api.orders.unresolved_linkage", 1);
            continue;
        };

        let daily = by_customer.entry(customer_id).or_default();
        let entry = daily.entry(row.order_date).or_insert(Decimal::ZERO);
        *entry += row.revenue();
    }

    by_customer
}

/// Step 2: gap fill. Produces one point per calendar day over the
/// inclusive range `[first recorded sale, today]`, zero where no
/// revenue was recorded. An empty input map yields an empty series:
/// without a first sale there is nothing to anchor the fill.
pub fn fill_daily_series(
    daily: &BTreeMap<NaiveDate, Decimal>,
    today: NaiveDate,
) -> Vec<ActualSalesPoint> {
    let Some((&first_sale_date, _)) = daily.iter().next() else {
        return Vec::new();
    };

    let mut series = Vec::new();
    let mut date = first_sale_date;
    while date <= today {
        series.push(ActualSalesPoint {
            date,
            quantity: daily.get(&date).copied().unwrap_or(Decimal::ZERO),
        });
        let Some(next) = date.succ_opt() else {
            break;
        };
        date = next;
    }

    series
}

/// Steps 3 and 4: group forecasts by customer, attach the gap-filled
/// sales series, and order the result for display.
///
/// Only customers present in the forecast source get a bundle; order
/// revenue for anyone else is ignored.
pub fn assemble_bundles(
    forecasts: Vec<ForecastData>,
    orders: &[OrderRevenueRow],
    today: NaiveDate,
) -> Vec<CustomerForecastBundle> {
    let mut encounter_order: Vec<i64> = Vec::new();
    let mut by_customer: HashMap<i64, CustomerForecastBundle> = HashMap::new();

    for forecast in forecasts {
        let bundle = by_customer.entry(forecast.customer_id).or_insert_with(|| {
            encounter_order.push(forecast.customer_id);
            CustomerForecastBundle {
                customer_id: forecast.customer_id,
                company_name: forecast.company_name.clone(),
                customer_name: forecast.customer_name.clone(),
                company_size: forecast.company_size,
                forecasts: Vec::new(),
                actual_sales: Vec::new(),
            }
        });
        bundle.forecasts.push(forecast);
    }

    let revenue = daily_revenue_by_customer(orders);

    let mut bundles: Vec<CustomerForecastBundle> = encounter_order
        .into_iter()
        .filter_map(|customer_id| by_customer.remove(&customer_id))
        .map(|mut bundle| {
            if let Some(daily) = revenue.get(&bundle.customer_id) {
                bundle.actual_sales = fill_daily_series(daily, today);
            }
            bundle
        })
        .collect();

    rank_and_order(&mut bundles);
    bundles
}

/// Display order: the top customers by total actual sales first (sales
/// descending), everyone else after, alphabetically by display name.
/// `totalSales` is a transient ranking key and never serialized.
///
/// Equal totals keep their fetch order: both sorts are stable.
pub fn rank_and_order(bundles: &mut Vec<CustomerForecastBundle>) {
    let totals: HashMap<i64, Decimal> = bundles
        .iter()
        .map(|bundle| {
            let total: Decimal = bundle.actual_sales.iter().map(|p| p.quantity).sum();
            (bundle.customer_id, total)
        })
        .collect();
    let total_of = |bundle: &CustomerForecastBundle| -> Decimal {
        totals
            .get(&bundle.customer_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    };

    let mut ranked: Vec<&CustomerForecastBundle> = bundles.iter().collect();
    ranked.sort_by(|a, b| total_of(b).cmp(&total_of(a)));
    let top_ids: Vec<i64> = ranked
        .iter()
        .take(TOP_CUSTOMER_COUNT)
        .map(|bundle| bundle.customer_id)
        .collect();

    let mut top: Vec<CustomerForecastBundle> = Vec::with_capacity(top_ids.len());
    let mut rest: Vec<CustomerForecastBundle> = Vec::new();
    for bundle in bundles.drain(..) {
        if top_ids.contains(&bundle.customer_id) {
            top.push(bundle);
        } else {
            rest.push(bundle);
        }
    }

    top.sort_by(|a, b| total_of(b).cmp(&total_of(a)));
    rest.sort_by_key(|bundle| display_name(bundle).to_lowercase());

    bundles.extend(top);
    bundles.extend(rest);
}

/// Company name with the synthesized fallback used across the dashboard.
pub fn display_name(bundle: &CustomerForecastBundle) -> String {
    bundle
        .company_name
        .clone()
        .unwrap_or_else(|| format!("Customer {}", bundle.customer_id))
}
