//! Unit conversion constants for translating raw model units into reporting units.
//!
//! The optimisation model works in terawatt-years (TWa) for energy and trillions of US
//! dollars for money; reports use exajoules (EJ) and billions of US dollars.

/// Conversion factor from terawatt-years to exajoules (1 TWa = 31.536 EJ).
pub const TWA_TO_EJ: f64 = 31.536;

/// Conversion factor from trillions to billions, used for all monetary quantities.
pub const TRILLION_TO_BILLION: f64 = 1000.0;

/// Conversion factor from US$/GJ to trillion US$/TWa.
///
/// Energy-input derivatives of the production function are reported in US$/GJ by dividing
/// by this constant.
pub const DOLLAR_PER_GJ_TO_TDOLLAR_PER_TWA: f64 = TWA_TO_EJ / TRILLION_TO_BILLION;
