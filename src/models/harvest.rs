use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calc::{self, round2, LossRates};
use crate::error::{Error, Result};

/// How a plot was harvested.
///
/// Manual cutting loses less cane in the field than mechanized harvesting,
/// so the method picks which loss rate applies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HarvestMethod {
    Manual,
    // Documents written by the earlier tool spell it "mecanica".
    #[serde(alias = "mecanica")]
    Mechanized,
}

impl HarvestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Mechanized => "mechanized",
        }
    }
}

impl FromStr for HarvestMethod {
    type Err = Error;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "mechanized" => Ok(Self::Mechanized),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

impl fmt::Display for HarvestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for registering a harvest.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHarvest {
    pub plot_name: String,
    pub area_ha: f64,
    pub yield_t_per_ha: f64,
    pub method: HarvestMethod,
    pub price_per_ton: f64,
}

impl NewHarvest {
    /// Reject values a harvest can't have: blank plot, non-positive area or
    /// yield, negative price. Non-finite numbers are rejected as well.
    pub fn validate(&self) -> Result<()> {
        if self.plot_name.trim().is_empty() {
            return Err(Error::InvalidInput("plot name must not be empty".into()));
        }
        if !(self.area_ha.is_finite() && self.area_ha > 0.0) {
            return Err(Error::InvalidInput(format!(
                "area must be positive, got {}",
                self.area_ha
            )));
        }
        if !(self.yield_t_per_ha.is_finite() && self.yield_t_per_ha > 0.0) {
            return Err(Error::InvalidInput(format!(
                "yield must be positive, got {}",
                self.yield_t_per_ha
            )));
        }
        if !(self.price_per_ton.is_finite() && self.price_per_ton >= 0.0) {
            return Err(Error::InvalidInput(format!(
                "price must not be negative, got {}",
                self.price_per_ton
            )));
        }
        Ok(())
    }
}

/// One harvest event.
///
/// The loss figures are computed once, when the record is registered, and
/// stored alongside the inputs. They are never recomputed on read, so a record
/// keeps the rates that were in force on the day it was created.
///
/// Serialized keys follow the ledger document format shared with the
/// relational table (`data`, `talhao`, `perda_ton`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarvestRecord {
    pub(crate) id: Uuid,
    #[serde(rename = "data")]
    pub(crate) date: NaiveDate,
    #[serde(rename = "talhao")]
    pub(crate) plot_name: String,
    pub(crate) area_ha: f64,
    #[serde(rename = "produtividade_t_ha")]
    pub(crate) yield_t_per_ha: f64,
    #[serde(rename = "metodo")]
    pub(crate) method: HarvestMethod,
    #[serde(rename = "preco_ton")]
    pub(crate) price_per_ton: f64,
    #[serde(rename = "perda_pct")]
    pub(crate) loss_pct: f64,
    #[serde(rename = "perda_ton")]
    pub(crate) loss_tons: f64,
    #[serde(rename = "perda_reais")]
    pub(crate) loss_cost: f64,
    #[serde(rename = "total_ton")]
    pub(crate) total_tons: f64,
}

impl HarvestRecord {
    /// Register a harvest dated today (local clock).
    pub fn register(input: NewHarvest, rates: &LossRates) -> Result<Self> {
        Self::register_on(input, rates, Local::now().date_naive())
    }

    /// Register a harvest with an explicit date.
    pub fn register_on(input: NewHarvest, rates: &LossRates, date: NaiveDate) -> Result<Self> {
        input.validate()?;

        let estimate = calc::estimate(input.yield_t_per_ha, input.area_ha, input.method, rates);
        let loss_cost = round2(estimate.loss_tons * input.price_per_ton);

        Ok(Self {
            id: Uuid::new_v4(),
            date,
            plot_name: input.plot_name.trim().to_string(),
            area_ha: round2(input.area_ha),
            yield_t_per_ha: round2(input.yield_t_per_ha),
            method: input.method,
            price_per_ton: round2(input.price_per_ton),
            loss_pct: estimate.loss_pct,
            loss_tons: estimate.loss_tons,
            loss_cost,
            total_tons: estimate.total_tons,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn plot_name(&self) -> &str {
        &self.plot_name
    }

    pub fn area_ha(&self) -> f64 {
        self.area_ha
    }

    pub fn yield_t_per_ha(&self) -> f64 {
        self.yield_t_per_ha
    }

    pub fn method(&self) -> HarvestMethod {
        self.method
    }

    pub fn price_per_ton(&self) -> f64 {
        self.price_per_ton
    }

    pub fn loss_pct(&self) -> f64 {
        self.loss_pct
    }

    pub fn loss_tons(&self) -> f64 {
        self.loss_tons
    }

    pub fn loss_cost(&self) -> f64 {
        self.loss_cost
    }

    pub fn total_tons(&self) -> f64 {
        self.total_tons
    }
}
