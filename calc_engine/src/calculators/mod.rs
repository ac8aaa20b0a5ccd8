//! Built-in calculators.
//!
//! Each module pairs an embedded JSON configuration (`configs/<id>.json`) with a
//! typed `*Input`, a typed `*Result`, a pure `calculate()` and a [`Calculator`]
//! implementation that reads resolved inputs and fills the envelope.

pub mod auto_loan;
pub mod bmi;
pub mod caloric_deficit;
pub mod calories_burned;
pub mod ideal_weight;
pub mod ovulation;
pub mod retirement;
pub mod roofing;
pub mod tip;
pub mod transfer_time;
pub mod water_intake;

use serde::{Deserialize, Serialize};

use crate::compute::{Calculator, ComputeInput};
use crate::errors::{CalcError, CalcResult};

pub use auto_loan::AutoLoan;
pub use bmi::Bmi;
pub use caloric_deficit::CaloricDeficit;
pub use calories_burned::CaloriesBurned;
pub use ideal_weight::IdealWeight;
pub use ovulation::Ovulation;
pub use retirement::Retirement;
pub use roofing::Roofing;
pub use tip::Tip;
pub use transfer_time::TransferTime;
pub use water_intake::WaterIntake;

/// Every built-in calculator, in catalogue order.
pub fn builtin() -> Vec<Box<dyn Calculator>> {
    vec![
        Box::new(AutoLoan),
        Box::new(Tip),
        Box::new(CaloricDeficit),
        Box::new(IdealWeight),
        Box::new(Bmi),
        Box::new(WaterIntake),
        Box::new(CaloriesBurned),
        Box::new(TransferTime),
        Box::new(Roofing),
        Box::new(Retirement),
        Box::new(Ovulation),
    ]
}

/// Biological sex, as used by the body-composition formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Read a `male`/`female` option input.
    pub(crate) fn read(input: &ComputeInput<'_>, id: &str) -> CalcResult<Self> {
        match input.require_choice(id)?.as_str() {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            other => Err(CalcError::invalid_input(id, other, "Expected male or female")),
        }
    }

    /// Commonly cited floor for unsupervised daily intake, kcal.
    pub fn minimum_intake(self) -> f64 {
        match self {
            Sex::Male => 1500.0,
            Sex::Female => 1200.0,
        }
    }
}
