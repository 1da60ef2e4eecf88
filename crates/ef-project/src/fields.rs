//! Field identifiers and the static property table.
//!
//! Parameter identifiers like `S13` resolve against the `Amount<digits>`
//! suffix of the table names, so the names are load-bearing: they are kept
//! identical to the upstream configuration vocabulary.

use crate::schema::ConfigSnapshot;
use crate::ProjectError;
use serde::{Deserialize, Serialize};

/// Addressable configuration field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FieldId {
    PlantLifetime,
    BareErectedCost,
    NumberOfUnits,
    InitialSellingPrice,
    OperatingCostPct,
    EpcContingency,
    ProcessContingency,
    ProjectContingency,
    ConstructionYears,
    GeneralInflationRate,
    InternalRateOfReturn,
    StateTaxRate,
    FederalTaxRate,
    VariableCosts,
    VariableQuantities,
    FixedCosts,
}

/// A field's value, scalar or vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(f64),
    Vector(Vec<f64>),
}

/// Static property table: upstream field name -> field id.
pub const PROPERTY_TABLE: &[(&str, FieldId)] = &[
    ("plantLifetimeAmount10", FieldId::PlantLifetime),
    ("bareErectedCostAmount11", FieldId::BareErectedCost),
    ("numberOfUnitsAmount12", FieldId::NumberOfUnits),
    ("initialSellingPriceAmount13", FieldId::InitialSellingPrice),
    (
        "totalOperatingCostPercentageAmount14",
        FieldId::OperatingCostPct,
    ),
    (
        "engineeringProcurementAndConstructionAmount15",
        FieldId::EpcContingency,
    ),
    ("processContingencyAmount16", FieldId::ProcessContingency),
    ("projectContingencyAmount17", FieldId::ProjectContingency),
    ("constructionYearsAmount18", FieldId::ConstructionYears),
    ("generalInflationRateAmount23", FieldId::GeneralInflationRate),
    ("internalRateOfReturnAmount30", FieldId::InternalRateOfReturn),
    ("stateTaxRateAmount32", FieldId::StateTaxRate),
    ("federalTaxRateAmount33", FieldId::FederalTaxRate),
    ("variableCostsAmount40", FieldId::VariableCosts),
    ("variableQuantitiesAmount50", FieldId::VariableQuantities),
    ("fixedCostsAmount60", FieldId::FixedCosts),
];

impl FieldId {
    /// The upstream name of this field in the property table.
    pub fn name(self) -> &'static str {
        PROPERTY_TABLE
            .iter()
            .find(|(_, id)| *id == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }

    pub fn is_vector(self) -> bool {
        matches!(
            self,
            Self::VariableCosts | Self::VariableQuantities | Self::FixedCosts
        )
    }
}

impl ConfigSnapshot {
    /// Current value of a field.
    pub fn value(&self, field: FieldId) -> FieldValue {
        match field {
            FieldId::PlantLifetime => FieldValue::Scalar(f64::from(self.plant_lifetime)),
            FieldId::BareErectedCost => FieldValue::Scalar(self.bare_erected_cost),
            FieldId::NumberOfUnits => FieldValue::Scalar(self.number_of_units),
            FieldId::InitialSellingPrice => FieldValue::Scalar(self.initial_selling_price),
            FieldId::OperatingCostPct => FieldValue::Scalar(self.operating_cost_pct),
            FieldId::EpcContingency => FieldValue::Scalar(self.epc_contingency),
            FieldId::ProcessContingency => FieldValue::Scalar(self.process_contingency),
            FieldId::ProjectContingency => FieldValue::Scalar(self.project_contingency),
            FieldId::ConstructionYears => FieldValue::Scalar(f64::from(self.construction_years)),
            FieldId::GeneralInflationRate => FieldValue::Scalar(self.general_inflation_rate),
            FieldId::InternalRateOfReturn => FieldValue::Scalar(self.internal_rate_of_return),
            FieldId::StateTaxRate => FieldValue::Scalar(self.state_tax_rate),
            FieldId::FederalTaxRate => FieldValue::Scalar(self.federal_tax_rate),
            FieldId::VariableCosts => FieldValue::Vector(self.variable_costs.clone()),
            FieldId::VariableQuantities => FieldValue::Vector(self.variable_quantities.clone()),
            FieldId::FixedCosts => FieldValue::Vector(self.fixed_costs.clone()),
        }
    }

    /// Set a field to a new value. Kind mismatches (scalar value for a
    /// vector field or vice versa) are rejected.
    pub fn set_value(&mut self, field: FieldId, value: &FieldValue) -> Result<(), ProjectError> {
        match (field, value) {
            (FieldId::PlantLifetime, FieldValue::Scalar(v)) => {
                self.plant_lifetime = v.round().max(0.0) as u32;
            }
            (FieldId::ConstructionYears, FieldValue::Scalar(v)) => {
                self.construction_years = v.round().max(0.0) as u32;
            }
            (FieldId::BareErectedCost, FieldValue::Scalar(v)) => self.bare_erected_cost = *v,
            (FieldId::NumberOfUnits, FieldValue::Scalar(v)) => self.number_of_units = *v,
            (FieldId::InitialSellingPrice, FieldValue::Scalar(v)) => {
                self.initial_selling_price = *v;
            }
            (FieldId::OperatingCostPct, FieldValue::Scalar(v)) => self.operating_cost_pct = *v,
            (FieldId::EpcContingency, FieldValue::Scalar(v)) => self.epc_contingency = *v,
            (FieldId::ProcessContingency, FieldValue::Scalar(v)) => self.process_contingency = *v,
            (FieldId::ProjectContingency, FieldValue::Scalar(v)) => self.project_contingency = *v,
            (FieldId::GeneralInflationRate, FieldValue::Scalar(v)) => {
                self.general_inflation_rate = *v;
            }
            (FieldId::InternalRateOfReturn, FieldValue::Scalar(v)) => {
                self.internal_rate_of_return = *v;
            }
            (FieldId::StateTaxRate, FieldValue::Scalar(v)) => self.state_tax_rate = *v,
            (FieldId::FederalTaxRate, FieldValue::Scalar(v)) => self.federal_tax_rate = *v,
            (FieldId::VariableCosts, FieldValue::Vector(v)) => self.variable_costs = v.clone(),
            (FieldId::VariableQuantities, FieldValue::Vector(v)) => {
                self.variable_quantities = v.clone();
            }
            (FieldId::FixedCosts, FieldValue::Vector(v)) => self.fixed_costs = v.clone(),
            (field, FieldValue::Scalar(_)) => {
                return Err(ProjectError::FieldKind {
                    field: field.name(),
                    expected: "vector",
                })
            }
            (field, FieldValue::Vector(_)) => {
                return Err(ProjectError::FieldKind {
                    field: field.name(),
                    expected: "scalar",
                })
            }
        }
        Ok(())
    }
}
