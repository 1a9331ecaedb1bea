use crate::{
    db::DbPool,
    entities::{
        contact::Entity as ContactEntity,
        customer::Entity as CustomerEntity,
        customer_order_forecast::{
            self, ActiveModel as ForecastActiveModel, Entity as ForecastEntity,
        },
        order::{self, Entity as OrderEntity},
        product::Entity as ProductEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::aggregation::{
        assemble_bundles, CustomerForecastBundle, ForecastData, OrderRevenueRow,
    },
};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, ModelTrait, QueryOrder, Set};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Partial update of a forecast record. Absent (or null) fields are
/// left unchanged; identity and customer linkage are not editable.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateForecastRequest {
    pub predicted_date: Option<NaiveDate>,
    #[validate(custom = "validate_non_negative_quantity")]
    pub predicted_quantity: Option<Decimal>,
    #[validate(range(min = 0.0, message = "mape must be non-negative"))]
    pub mape: Option<f64>,
    #[validate(range(min = 0.0, max = 1.0, message = "probability must be within [0, 1]"))]
    pub probability: Option<f64>,
    #[validate(length(min = 1, message = "predictionModel must not be empty"))]
    pub prediction_model: Option<String>,
}

fn validate_non_negative_quantity(quantity: &Decimal) -> Result<(), ValidationError> {
    if quantity.is_sign_negative() {
        let mut err = ValidationError::new("predicted_quantity_negative");
        err.message = Some("predictedQuantity must be non-negative".into());
        return Err(err);
    }
    Ok(())
}

/// Service joining forecast and sales records into dashboard bundles
/// and managing individual forecast rows.
#[derive(Clone)]
pub struct CustomerForecastService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl CustomerForecastService {
    /// Creates a new customer forecast service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Full bundle recompute against the current wall clock.
    #[instrument(skip(self))]
    pub async fn list_customer_forecasts(
        &self,
    ) -> Result<Vec<CustomerForecastBundle>, ServiceError> {
        self.list_customer_forecasts_as_of(Local::now().date_naive())
            .await
    }

    /// Full bundle recompute with a pinned "today" bound. The two source
    /// reads are sequential and independent; any failure aborts the
    /// whole operation with no partial output.
    #[instrument(skip(self))]
    pub async fn list_customer_forecasts_as_of(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<CustomerForecastBundle>, ServiceError> {
        let db = &*self.db_pool;

        let forecast_rows = ForecastEntity::find()
            .find_also_related(CustomerEntity)
            .order_by_asc(customer_order_forecast::Column::PredictedDate)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch forecast rows");
                ServiceError::DataSourceError(e)
            })?;

        let order_rows = self.fetch_order_revenue_rows().await?;

        let forecasts: Vec<ForecastData> = forecast_rows
            .into_iter()
            .map(|(row, customer)| ForecastData {
                cof_id: row.cof_id,
                customer_id: row.customer_id,
                company_name: customer.as_ref().and_then(|c| c.company_name.clone()),
                customer_name: customer.as_ref().and_then(|c| c.contact_name.clone()),
                company_size: customer.as_ref().and_then(|c| c.company_size),
                predicted_date: row.predicted_date,
                predicted_quantity: row.predicted_quantity,
                mape: row.mape,
                prediction_model: row.prediction_model,
                probability: row.probability,
                forecast_generation_date: row.forecast_generation_datetime,
            })
            .collect();

        let bundles = assemble_bundles(forecasts, &order_rows, today);

        info!(
            customer_count = bundles.len(),
            order_rows = order_rows.len(),
            "Customer forecast bundles assembled"
        );

        Ok(bundles)
    }

    /// Fetches order rows and resolves their joins into flat revenue
    /// rows: the product's selling price and the contact's customer
    /// linkage, each via a lookup map.
    async fn fetch_order_revenue_rows(&self) -> Result<Vec<OrderRevenueRow>, ServiceError> {
        let db = &*self.db_pool;

        let contacts: HashMap<i64, Option<i64>> = ContactEntity::find()
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch contacts");
                ServiceError::DataSourceError(e)
            })?
            .into_iter()
            .map(|c| (c.id, c.customer_id))
            .collect();

        let prices: HashMap<i64, Option<Decimal>> = ProductEntity::find()
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch products");
                ServiceError::DataSourceError(e)
            })?
            .into_iter()
            .map(|p| (p.id, p.selling_price))
            .collect();

        let orders = OrderEntity::find()
            .order_by_asc(order::Column::OrderDate)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch orders");
                ServiceError::DataSourceError(e)
            })?;

        Ok(orders
            .into_iter()
            .map(|o| OrderRevenueRow {
                order_id: o.id,
                customer_id: contacts.get(&o.contact_id).copied().flatten(),
                order_date: o.order_date.with_timezone(&Local).date_naive(),
                quantity: o.quantity,
                selling_price: prices.get(&o.product_id).copied().flatten(),
            })
            .collect())
    }

    /// Applies a partial edit to one forecast record.
    #[instrument(skip(self, request), fields(cof_id = %cof_id))]
    pub async fn update_forecast(
        &self,
        cof_id: i64,
        request: UpdateForecastRequest,
    ) -> Result<(), ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let existing = ForecastEntity::find_by_id(cof_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, cof_id = cof_id, "Failed to fetch forecast record for update");
                ServiceError::DataSourceError(e)
            })?
            .ok_or_else(|| {
                warn!(cof_id = cof_id, "Forecast record not found for update");
                ServiceError::NotFound(format!("Forecast record {} not found", cof_id))
            })?;

        let mut active: ForecastActiveModel = existing.into();
        if let Some(predicted_date) = request.predicted_date {
            active.predicted_date = Set(predicted_date);
        }
        if let Some(predicted_quantity) = request.predicted_quantity {
            active.predicted_quantity = Set(predicted_quantity);
        }
        if let Some(mape) = request.mape {
            active.mape = Set(Some(mape));
        }
        if let Some(probability) = request.probability {
            active.probability = Set(Some(probability));
        }
        if let Some(prediction_model) = request.prediction_model {
            active.prediction_model = Set(prediction_model);
        }

        active.update(db).await.map_err(|e| {
            error!(error = %e, cof_id = cof_id, "Failed to update forecast record");
            ServiceError::DataSourceError(e)
        })?;

        info!(cof_id = cof_id, "Forecast record updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ForecastUpdated(cof_id)).await {
                warn!(error = %e, cof_id = cof_id, "Failed to send forecast updated event");
            }
        }

        Ok(())
    }

    /// Removes one forecast record.
    #[instrument(skip(self), fields(cof_id = %cof_id))]
    pub async fn delete_forecast(&self, cof_id: i64) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let existing = ForecastEntity::find_by_id(cof_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, cof_id = cof_id, "Failed to fetch forecast record for delete");
                ServiceError::DataSourceError(e)
            })?
            .ok_or_else(|| {
                warn!(cof_id = cof_id, "Forecast record not found for delete");
                ServiceError::NotFound(format!("Forecast record {} not found", cof_id))
            })?;

        existing.delete(db).await.map_err(|e| {
            error!(error = %e, cof_id = cof_id, "Failed to delete forecast record");
            ServiceError::DataSourceError(e)
        })?;

        info!(cof_id = cof_id, "Forecast record deleted");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ForecastDeleted(cof_id)).await {
                warn!(error = %e, cof_id = cof_id, "Failed to send forecast deleted event");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn negative_quantity_fails_validation() {
        let request = UpdateForecastRequest {
            predicted_date: None,
            predicted_quantity: Some(dec!(-1)),
            mape: None,
            probability: None,
            prediction_model: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn probability_outside_unit_interval_fails_validation() {
        let request = UpdateForecastRequest {
            predicted_date: None,
            predicted_quantity: None,
            mape: None,
            probability: Some(1.5),
            prediction_model: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn empty_model_label_fails_validation() {
        let request = UpdateForecastRequest {
            predicted_date: None,
            predicted_quantity: None,
            mape: None,
            probability: None,
            prediction_model: Some(String::new()),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn partial_payload_with_valid_fields_passes_validation() {
        let request = UpdateForecastRequest {
            predicted_date: Some("2024-06-01".parse().unwrap()),
            predicted_quantity: Some(dec!(12.5)),
            mape: Some(0.2),
            probability: Some(0.9),
            prediction_model: Some("prophet".to_string()),
        };
        assert!(request.validate().is_ok());
    }
}
