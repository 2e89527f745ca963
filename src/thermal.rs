//! Lumped steady-state heat balance of a cold coil.
//!
//! Zero-dimensional screening model: one temperature for the whole winding, no
//! spatial hot-spots. The coil sees an intermediate radiation shield rather than
//! room temperature, and multi-layer insulation leaks a fixed flux per unit area.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{require_non_negative, require_positive, CoilResult};
use crate::STEFAN_BOLTZMANN;

/// Inputs of the heat balance. Conductor length is supplied separately since it
/// follows from the winding geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalState {
    /// (K) cold-head temperature the coil sits at when cooling keeps up
    #[serde(default = "default_base_temperature")]
    pub base_temperature: f64,
    /// (W) external radiative load on the cold mass
    #[serde(default = "default_external_load")]
    pub external_load: f64,
    /// (m) tape width; radiating area is `length * tape_width`
    #[serde(default = "default_tape_width")]
    pub tape_width: f64,
    /// Fraction of cryocooler electrical power delivered as cooling
    #[serde(default = "default_cryocooler_efficiency")]
    pub cryocooler_efficiency: f64,
    /// (W) cryocooler electrical input power
    #[serde(default = "default_cryocooler_power")]
    pub cryocooler_power: f64,
    /// (K) temperature of the radiation shield the coil sees
    #[serde(default = "default_shield_temperature")]
    pub shield_temperature: f64,
    /// Emissivity of the coil surface
    #[serde(default = "default_emissivity")]
    pub emissivity: f64,
    /// (W/m^2) heat leak through multi-layer insulation
    #[serde(default = "default_mli_flux")]
    pub mli_flux: f64,
}

fn default_base_temperature() -> f64 {
    20.0
}
fn default_external_load() -> f64 {
    10.0
}
fn default_tape_width() -> f64 {
    4e-3
}
fn default_cryocooler_efficiency() -> f64 {
    0.02
}
fn default_cryocooler_power() -> f64 {
    5000.0
}
fn default_shield_temperature() -> f64 {
    100.0
}
fn default_emissivity() -> f64 {
    0.05
}
fn default_mli_flux() -> f64 {
    1.0
}

impl Default for ThermalState {
    fn default() -> Self {
        Self {
            base_temperature: default_base_temperature(),
            external_load: default_external_load(),
            tape_width: default_tape_width(),
            cryocooler_efficiency: default_cryocooler_efficiency(),
            cryocooler_power: default_cryocooler_power(),
            shield_temperature: default_shield_temperature(),
            emissivity: default_emissivity(),
            mli_flux: default_mli_flux(),
        }
    }
}

/// Result of [`ThermalState::balance`]; every term is kept for the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalBalance {
    /// (m^2)
    pub area: f64,
    /// (W)
    pub mli_load: f64,
    /// (W) net radiative gain from the shield, clipped at zero
    pub environment_load: f64,
    /// (W) external + MLI + environment
    pub total_load: f64,
    /// (W) efficiency * electrical power
    pub cooling_capacity: f64,
    /// (K) rise above base; zero when cooling keeps up
    pub temperature_rise: f64,
    /// (K)
    pub final_temperature: f64,
}

impl ThermalState {
    fn validate(&self) -> CoilResult<()> {
        require_positive("base_temperature", self.base_temperature)?;
        require_non_negative("external_load", self.external_load)?;
        require_positive("tape_width", self.tape_width)?;
        require_non_negative("cryocooler_efficiency", self.cryocooler_efficiency)?;
        require_non_negative("cryocooler_power", self.cryocooler_power)?;
        require_non_negative("shield_temperature", self.shield_temperature)?;
        require_positive("emissivity", self.emissivity)?;
        require_non_negative("mli_flux", self.mli_flux)?;
        Ok(())
    }

    /// Balance the heat load of a conductor of `conductor_length` (m) against the cryocooler.
    ///
    /// When the load exceeds the cooling capacity, the excess is radiated away by a
    /// temperature rise from the linearized balance `Q = 4 sigma A eps T^3 dT`.
    pub fn balance(&self, conductor_length: f64) -> CoilResult<ThermalBalance> {
        self.validate()?;
        require_positive("conductor_length", conductor_length)?;

        let t = self.base_temperature;
        let area = conductor_length * self.tape_width; // [m^2]
        let radiative = STEFAN_BOLTZMANN * self.emissivity * area; // [W/K^4]

        let mli_load = self.mli_flux * area;
        let environment_load = (radiative * (self.shield_temperature.powi(4) - t.powi(4))).max(0.0);
        let total_load = self.external_load + mli_load + environment_load;
        let cooling_capacity = self.cryocooler_efficiency * self.cryocooler_power;

        let temperature_rise = if total_load > cooling_capacity {
            (total_load - cooling_capacity) / (4.0 * radiative * t.powi(3))
        } else {
            0.0
        };

        debug!(
            "heat load {total_load:.3} W vs capacity {cooling_capacity:.3} W, rise {temperature_rise:.4} K"
        );

        Ok(ThermalBalance {
            area,
            mli_load,
            environment_load,
            total_load,
            cooling_capacity,
            temperature_rise,
            final_temperature: t + temperature_rise,
        })
    }
}

impl ThermalBalance {
    /// (K) `max(0, tc - final_temperature)`.
    pub fn thermal_margin(&self, tc: f64) -> f64 {
        (tc - self.final_temperature).max(0.0)
    }
}
