//! The vertical column of air a plume rises through.
//!
//! The column is rebuilt from a single row of output every time a plume is launched.
use super::DZ;
use crate::{
    output::OutputRow,
    thermo::{dew_point, exner, saturation_adjustment, CP, G, P0, RD},
};
use itertools::izip;
use metfor::{Celsius, HectoPascal, Kelvin, Meters};
use optional::Optioned;
use tracing::warn;

/// Top of the column used for drawing the environment on a skew-t.
const SKEW_T_TOP: f64 = 5_000.0;

/// The environment a plume rises through, derived from one row of model output.
///
/// Below the top of the mixed layer potential temperature and specific humidity are constant. At
/// the top they jump, and above it they follow the free tropospheric lapse rates. Pressure follows
/// from hydrostatic balance starting at 1000 hPa at the surface.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentColumn {
    altitude: Vec<f64>,
    theta: Vec<f64>,
    q: Vec<f64>,
    thetav: Vec<f64>,
    pressure: Vec<f64>,
    exner: Vec<f64>,
    density: Vec<f64>,
    saturated: Vec<bool>,
}

/// A level of the environment in skew-t coordinates.
#[derive(Debug, Clone, Copy)]
pub struct SkewTLevel {
    /// Pressure.
    pub pressure: HectoPascal,
    /// Temperature.
    pub temperature: Celsius,
    /// Dew point, missing if it could not be calculated.
    pub dew_point: Optioned<Celsius>,
}

impl EnvironmentColumn {
    /// Build the column on a grid from the surface up to `z_top` meters.
    ///
    /// # Arguments
    ///  - row is the model output at the time of interest.
    ///  - gammatheta and gammaq are the free tropospheric lapse rates.
    ///  - z_top is the top of the grid, the last level is within `DZ / 2` of it.
    ///
    /// The column ends early if the pressure would drop to zero before `z_top`.
    pub fn build(row: &OutputRow, gammatheta: f64, gammaq: f64, z_top: f64) -> Self {
        let num_levels = ((z_top + DZ / 2.0) / DZ).ceil().max(0.0) as usize;

        let mut col = EnvironmentColumn {
            altitude: Vec::with_capacity(num_levels),
            theta: Vec::with_capacity(num_levels),
            q: Vec::with_capacity(num_levels),
            thetav: Vec::with_capacity(num_levels),
            pressure: Vec::with_capacity(num_levels),
            exner: Vec::with_capacity(num_levels),
            density: Vec::with_capacity(num_levels),
            saturated: Vec::with_capacity(num_levels),
        };

        // Integrate p^(Rd/cp) instead of p, it is linear in height for a constant thetav.
        let p0_rdcp = P0.powf(RD / CP);
        let mut p_rdcp = p0_rdcp;

        for i in 0..num_levels {
            let z = i as f64 * DZ;

            if let Some(&thetav_below) = col.thetav.last() {
                p_rdcp -= G / CP * p0_rdcp / thetav_below * DZ;
                if p_rdcp <= 0.0 {
                    break;
                }
            }

            let (theta, q) = if z < row.h {
                (row.theta, row.q)
            } else {
                (
                    row.theta + row.dtheta + (z - row.h) * gammatheta,
                    row.q + row.dq + (z - row.h) * gammaq,
                )
            };

            let p = p_rdcp.powf(CP / RD);
            let ex = exner(p);
            let adj = saturation_adjustment(theta, q, p, ex);

            col.altitude.push(z);
            col.theta.push(theta);
            col.q.push(q);
            col.thetav.push(adj.thetav);
            col.pressure.push(p);
            col.exner.push(ex);
            col.density.push(p / (RD * ex * adj.thetav));
            col.saturated.push(adj.is_saturated());
        }

        if let Some(lowest) = col.saturated_levels().next() {
            warn!(
                lowest = lowest.0,
                levels = col.saturated_levels().count(),
                "environmental profile is saturated, the plume model assumes it is not"
            );
        }

        col
    }

    /// A column with a single level at the surface.
    #[cfg(test)]
    pub(crate) fn single_level(theta: f64, q: f64, p: f64, ex: f64) -> Self {
        let adj = saturation_adjustment(theta, q, p, ex);

        EnvironmentColumn {
            altitude: vec![0.0],
            theta: vec![theta],
            q: vec![q],
            thetav: vec![adj.thetav],
            pressure: vec![p],
            exner: vec![ex],
            density: vec![p / (RD * ex * adj.thetav)],
            saturated: vec![adj.is_saturated()],
        }
    }

    /// Build the column for plotting on a skew-t, from the surface up to 5 km.
    pub fn for_skew_t(row: &OutputRow, gammatheta: f64, gammaq: f64) -> Self {
        Self::build(row, gammatheta, gammaq, SKEW_T_TOP)
    }

    /// The number of levels.
    #[inline]
    pub fn len(&self) -> usize {
        self.altitude.len()
    }

    /// Is the column empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.altitude.is_empty()
    }

    /// Height above the surface of each level (m).
    #[inline]
    pub fn altitude(&self) -> &[f64] {
        &self.altitude
    }

    /// Potential temperature (K).
    #[inline]
    pub fn theta(&self) -> &[f64] {
        &self.theta
    }

    /// Specific humidity (kg/kg).
    #[inline]
    pub fn q(&self) -> &[f64] {
        &self.q
    }

    /// Virtual potential temperature (K).
    #[inline]
    pub fn thetav(&self) -> &[f64] {
        &self.thetav
    }

    /// Pressure (Pa).
    #[inline]
    pub fn pressure(&self) -> &[f64] {
        &self.pressure
    }

    /// Exner function.
    #[inline]
    pub fn exner(&self) -> &[f64] {
        &self.exner
    }

    /// Air density (kg/m^3).
    #[inline]
    pub fn density(&self) -> &[f64] {
        &self.density
    }

    /// Is there condensate at each level?
    #[inline]
    pub fn saturated(&self) -> &[bool] {
        &self.saturated
    }

    /// Iterate over the heights of the saturated levels.
    pub fn saturated_levels(&self) -> impl Iterator<Item = Meters> + '_ {
        izip!(&self.altitude, &self.saturated)
            .filter(|&(_, &sat)| sat)
            .map(|(&z, _)| Meters(z))
    }

    /// Pressure, temperature, and dew point of every level.
    pub fn skew_t_lines(&self) -> Vec<SkewTLevel> {
        izip!(&self.pressure, &self.exner, &self.theta, &self.q)
            .map(|(&p, &ex, &theta, &q)| SkewTLevel {
                pressure: HectoPascal(p / 100.0),
                temperature: Celsius::from(Kelvin(ex * theta)),
                dew_point: dew_point(p, q).into(),
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use itertools::Itertools;

    fn make_row(h: f64, theta: f64, q: f64) -> OutputRow {
        OutputRow {
            time: 1.0,
            h,
            theta,
            dtheta: 2.0,
            q,
            dq: -0.001,
            thetav: 0.0,
            dthetav: 0.0,
        }
    }

    #[test]
    fn test_grid() {
        let row = make_row(500.0, 290.0, 0.006);
        let col = EnvironmentColumn::build(&row, 0.006, 0.0, 1000.0);

        assert_eq!(col.len(), 101);
        assert_eq!(col.altitude()[0], 0.0);
        assert_eq!(col.altitude()[100], 1000.0);
        assert_eq!(col.theta().len(), col.len());
        assert_eq!(col.density().len(), col.len());
        assert_eq!(col.saturated().len(), col.len());
    }

    #[test]
    fn test_profiles() {
        let row = make_row(500.0, 290.0, 0.006);
        let col = EnvironmentColumn::build(&row, 0.006, -1.0e-6, 1000.0);

        // Well mixed below h
        assert_eq!(col.theta()[0], 290.0);
        assert_eq!(col.theta()[49], 290.0);
        assert_eq!(col.q()[49], 0.006);

        // Jump at h, then the lapse rate
        assert_eq!(col.theta()[50], 292.0);
        assert_relative_eq!(col.theta()[100], 295.0, max_relative = 1.0e-12);
        assert_relative_eq!(col.q()[100], 0.0045, max_relative = 1.0e-9);
    }

    #[test]
    fn test_hydrostatic() {
        let row = make_row(500.0, 290.0, 0.006);
        let col = EnvironmentColumn::build(&row, 0.006, 0.0, 2000.0);

        assert_relative_eq!(col.pressure()[0], P0, max_relative = 1.0e-12);
        assert_relative_eq!(col.exner()[0], 1.0, max_relative = 1.0e-12);

        // Pressure and density decrease with height.
        assert!(col.pressure().iter().tuple_windows().all(|(p0, p1)| p1 < p0));
        assert!(col.density().iter().tuple_windows().all(|(r0, r1)| r1 < r0));

        // Roughly 11-12 hPa per 100 m near the surface.
        let dp = col.pressure()[0] - col.pressure()[10];
        assert!(dp > 1_100.0 && dp < 1_250.0, "dp = {}", dp);

        // Surface density of warm, moist air.
        assert!(col.density()[0] > 1.1 && col.density()[0] < 1.25);
    }

    #[test]
    fn test_saturated_environment_is_flagged() {
        let row = make_row(300.0, 290.0, 0.02);
        let col = EnvironmentColumn::build(&row, 0.006, 0.0, 600.0);

        assert_eq!(col.len(), 61);
        assert!(col.saturated()[0]);
        assert_eq!(col.saturated_levels().next(), Some(Meters(0.0)));
    }

    #[test]
    fn test_skew_t_lines() {
        let row = make_row(500.0, 290.0, 0.006);
        let col = EnvironmentColumn::for_skew_t(&row, 0.006, 0.0);

        assert_eq!(col.len(), 501);

        let lines = col.skew_t_lines();
        assert_eq!(lines.len(), col.len());

        let sfc = lines[0];
        assert_relative_eq!(sfc.pressure.0, 1000.0, max_relative = 1.0e-9);
        assert_relative_eq!(sfc.temperature.0, 290.0 - 273.15, max_relative = 1.0e-9);

        let dp = sfc.dew_point.into_option().unwrap();
        assert!(dp < sfc.temperature);
        assert!(dp.0 > 0.0 && dp.0 < 10.0, "dew point = {:?}", dp);
    }

    #[test]
    fn test_empty_column() {
        let row = make_row(500.0, 290.0, 0.006);
        let col = EnvironmentColumn::build(&row, 0.006, 0.0, -100.0);
        assert!(col.is_empty());
        assert!(col.skew_t_lines().is_empty());
    }
}
