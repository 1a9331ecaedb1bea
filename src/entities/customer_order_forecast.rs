use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One predicted-quantity estimate for a customer on a calendar date.
///
/// Rows are written by the external forecasting job and edited or
/// deleted one at a time through the API; identity and customer
/// linkage never change after creation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer_order_forecast")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub cof_id: i64,
    pub customer_id: i64,
    pub predicted_date: NaiveDate,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub predicted_quantity: Decimal,
    pub mape: Option<f64>,
    pub prediction_model: String,
    pub probability: Option<f64>,
    pub forecast_generation_datetime: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
