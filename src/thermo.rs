//! Moist thermodynamics used by the mixed layer model and the plume.
//!
//! Everything here is a pure function of its arguments. Temperatures are in Kelvin, pressures in
//! Pascal and humidities in kg/kg unless noted otherwise.

use metfor::{Celsius, HectoPascal};

/// Specific heat of dry air at constant pressure (J/kg/K).
pub const CP: f64 = 1005.0;
/// Latent heat of vaporization (J/kg).
pub const LV: f64 = 2.5e6;
/// Gas constant of dry air (J/kg/K).
pub const RD: f64 = 287.04;
/// Gas constant of water vapor (J/kg/K).
pub const RV: f64 = 461.5;
/// Reference pressure (Pa).
pub const P0: f64 = 1.0e5;
/// Gravitational acceleration (m/s^2).
pub const G: f64 = 9.81;
/// Ratio of the gas constants of dry air and water vapor.
pub const EP: f64 = 0.622;

// Newton solve for the saturation adjustment.
const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f64 = 1.0e-5;

/// Virtual temperature from a temperature, total water and liquid water.
///
/// Works the same for potential temperatures, so this is also used to get the virtual potential
/// temperature.
#[inline]
pub fn virtual_temperature(t: f64, q_total: f64, q_liquid: f64) -> f64 {
    t * (1.0 - (1.0 - RV / RD) * q_total - RV / RD * q_liquid)
}

/// Saturation vapor pressure over liquid water (Pa).
///
/// The temperature is capped at 50C before evaluating the exponential so the curve is never
/// extrapolated to unphysical values.
#[inline]
pub fn saturation_vapor_pressure(t: f64) -> f64 {
    let t_c = (t - 273.15).min(50.0);
    611.21 * (17.502 * t_c / (240.97 + t_c)).exp()
}

/// Saturation specific humidity over liquid water at pressure `p` and temperature `t`.
#[inline]
pub fn saturation_specific_humidity(p: f64, t: f64) -> f64 {
    let esat = saturation_vapor_pressure(t);
    EP * esat / (p - (1.0 - EP) * esat)
}

/// Derivative of the saturation specific humidity with respect to temperature at constant
/// pressure.
#[inline]
pub fn dqsat_dt(p: f64, t: f64) -> f64 {
    let esat = saturation_vapor_pressure(t);
    let den = p - esat * (1.0 - EP);
    (EP / den + (1.0 - EP) * EP * esat / (den * den)) * LV * esat / (RV * t * t)
}

/// The Exner function (p / p0)^(Rd / cp).
#[inline]
pub fn exner(p: f64) -> f64 {
    (p / P0).powf(RD / CP)
}

/// Dew point from pressure (Pa) and specific humidity, used for drawing soundings.
pub fn dew_point(p: f64, q: f64) -> Option<Celsius> {
    metfor::dew_point_from_p_and_specific_humidity(HectoPascal(p / 100.0), q)
}

/// Result of a saturation adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    /// Virtual potential temperature of the adjusted state.
    pub thetav: f64,
    /// Liquid water specific humidity, zero for an unsaturated state.
    pub q_liquid: f64,
    /// Number of Newton iterations used, zero for an unsaturated state.
    pub iterations: usize,
    /// False if the iteration budget ran out before the tolerance was met. The last iterate is
    /// still used in that case.
    pub converged: bool,
}

impl Adjustment {
    /// Did any water condense?
    #[inline]
    pub fn is_saturated(&self) -> bool {
        self.q_liquid > 0.0
    }
}

/// Find the temperature and condensate split that is in phase equilibrium with the total water.
///
/// # Arguments
///  - theta_liquid is the liquid water potential temperature.
///  - q_total is the total water specific humidity.
///  - p is the pressure in Pa.
///  - exner is the Exner function at `p`.
///
/// The Newton iteration stops when the change between successive iterates, relative to the
/// previous iterate, drops to 1e-5 or after 100 iterations.
pub fn saturation_adjustment(theta_liquid: f64, q_total: f64, p: f64, exner: f64) -> Adjustment {
    let t_liquid = exner * theta_liquid;

    if q_total - saturation_specific_humidity(p, t_liquid) <= 0.0 {
        return Adjustment {
            thetav: virtual_temperature(theta_liquid, q_total, 0.0),
            q_liquid: 0.0,
            iterations: 0,
            converged: true,
        };
    }

    let mut t = t_liquid;
    let mut iterations = 0;
    let mut converged = false;
    while iterations < MAX_ITERATIONS {
        iterations += 1;

        let t_prev = t;
        let f = t - t_liquid - LV / CP * (q_total - saturation_specific_humidity(p, t));
        let f_prime = 1.0 + LV / CP * dqsat_dt(p, t);
        t -= f / f_prime;

        if ((t - t_prev) / t_prev).abs() <= TOLERANCE {
            converged = true;
            break;
        }
    }

    let q_liquid = q_total - saturation_specific_humidity(p, t);

    Adjustment {
        thetav: virtual_temperature(t / exner, q_total, q_liquid),
        q_liquid,
        iterations,
        converged,
    }
}
