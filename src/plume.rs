//! Launch an entraining plume, such as the plume above a fire, through the modeled environment.
//!
//! The plume is a steady, one dimensional updraft that mixes with its environment at a rate
//! proportional to its mass flux. It is marched upward on a fixed grid until its vertical velocity
//! or area vanish.
use crate::{
    output::OutputRow,
    settings::RunSettings,
    thermo::{saturation_adjustment, Adjustment, G},
};
use itertools::izip;
use metfor::{Celsius, HectoPascal, Kelvin, Meters, MetersPSec, Quantity};
use optional::Optioned;
use tracing::{debug, warn};

mod environment;
pub use environment::{EnvironmentColumn, SkewTLevel};

/// Vertical grid spacing (m).
pub const DZ: f64 = 10.0;

// TODO: move these into RunSettings once plumes need tuning per run.
const INITIAL_AREA: f64 = 300_000.0; // m^2
const INITIAL_W: f64 = 0.1; // m/s
const ENTRAINMENT_BETA: f64 = 0.75;
const ENTRAINMENT: f64 = 0.0025 * ENTRAINMENT_BETA; // 1/m
const DETRAINMENT: f64 = ENTRAINMENT / ENTRAINMENT_BETA; // 1/m
const A_W: f64 = 1.0;
const B_W: f64 = 0.1;
const W_EPS: f64 = 1.0e-6;

/// Why the plume stopped rising.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Termination {
    /// The plume lost all its vertical velocity or area trying to reach `altitude`. That level is
    /// not part of the profile.
    Collapsed {
        /// The first level the plume could not reach.
        altitude: Meters,
    },
    /// The plume was still rising at the top of the grid. Every level of the grid, including the
    /// top one, is part of the profile.
    ReachedTop,
    /// The requested time is not part of the run, so no plume was launched.
    OutsideRun,
}

/// Things worth knowing about a plume that are not part of its profile.
#[derive(Debug, Clone, PartialEq)]
pub struct PlumeDiagnostics {
    /// How the ascent ended.
    pub termination: Termination,
    /// Levels where the saturation adjustment of the plume ran out of iterations.
    pub unconverged_levels: Vec<Meters>,
    /// Levels where the environment itself is saturated.
    pub saturated_environment: Vec<Meters>,
}

/// The vertical profile of a plume.
///
/// All the vectors have the same length, one entry per level the plume reached, starting at the
/// surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PlumeProfile {
    /// Height above the surface.
    pub altitude: Vec<Meters>,
    /// Pressure of the environment.
    pub pressure: Vec<HectoPascal>,
    /// Exner function of the environment.
    pub exner: Vec<f64>,
    /// Liquid water potential temperature of the plume.
    pub theta: Vec<Kelvin>,
    /// Total water specific humidity of the plume (kg/kg).
    pub q: Vec<f64>,
    /// Virtual potential temperature of the plume.
    pub thetav: Vec<Kelvin>,
    /// Does the plume contain condensate?
    pub saturated: Vec<bool>,
    /// Vertical velocity of the plume.
    pub w: Vec<MetersPSec>,
    /// Diagnostics of the ascent.
    pub diagnostics: PlumeDiagnostics,
}

impl PlumeProfile {
    fn with_capacity(capacity: usize, termination: Termination) -> Self {
        PlumeProfile {
            altitude: Vec::with_capacity(capacity),
            pressure: Vec::with_capacity(capacity),
            exner: Vec::with_capacity(capacity),
            theta: Vec::with_capacity(capacity),
            q: Vec::with_capacity(capacity),
            thetav: Vec::with_capacity(capacity),
            saturated: Vec::with_capacity(capacity),
            w: Vec::with_capacity(capacity),
            diagnostics: PlumeDiagnostics {
                termination,
                unconverged_levels: vec![],
                saturated_environment: vec![],
            },
        }
    }

    /// An empty profile for a time that is not part of the run.
    pub(crate) fn outside_run() -> Self {
        Self::with_capacity(0, Termination::OutsideRun)
    }

    fn push(&mut self, env: &EnvironmentColumn, idx: usize, level: &PlumeLevel, adj: &Adjustment) {
        let z = Meters(env.altitude()[idx]);

        if !adj.converged {
            warn!(
                altitude = z.0,
                iterations = adj.iterations,
                "plume saturation adjustment did not converge"
            );
            self.diagnostics.unconverged_levels.push(z);
        }

        self.altitude.push(z);
        self.pressure.push(HectoPascal(env.pressure()[idx] / 100.0));
        self.exner.push(env.exner()[idx]);
        self.theta.push(Kelvin(level.theta));
        self.q.push(level.q);
        self.thetav.push(Kelvin(level.thetav));
        self.saturated.push(adj.is_saturated());
        self.w.push(MetersPSec(level.w));
    }

    /// The number of levels.
    #[inline]
    pub fn len(&self) -> usize {
        self.altitude.len()
    }

    /// Did the plume not rise at all?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.altitude.is_empty()
    }

    /// Pressure and temperature of each level for plotting on a skew-t, along with a flag for
    /// saturated levels.
    pub fn skew_t_coords(&self) -> Vec<(HectoPascal, Celsius, bool)> {
        izip!(&self.pressure, &self.exner, &self.theta, &self.saturated)
            .map(|(&p, &ex, &theta, &sat)| (p, Celsius::from(Kelvin(ex * theta.unpack())), sat))
            .collect()
    }

    /// The lowest level with condensate in the plume.
    pub fn condensation_level(&self) -> Optioned<Meters> {
        izip!(&self.altitude, &self.saturated)
            .find(|&(_, &sat)| sat)
            .map(|(&z, _)| z)
            .into()
    }

    /// The highest level the plume reached.
    pub fn max_height(&self) -> Optioned<Meters> {
        self.altitude.last().copied().into()
    }
}

/// The state of the plume at one level, everything needed to march to the next level.
#[derive(Debug, Clone, Copy)]
struct PlumeLevel {
    theta: f64,
    q: f64,
    thetav: f64,
    w: f64,
    mass_flux: f64,
    entrainment: f64,
    detrainment: f64,
}

/// Launch a plume from the surface using the state of the mixed layer in `row`.
///
/// The environment is built up to `z_top`, and the plume starts `fire_multiplier` times the
/// plume forcing in `settings` warmer and moister than the surface air.
pub fn launch_entraining_plume(
    settings: &RunSettings,
    row: &OutputRow,
    z_top: f64,
    fire_multiplier: f64,
) -> PlumeProfile {
    let env = EnvironmentColumn::build(row, settings.gammatheta, settings.gammaq, z_top);

    ascend(
        &env,
        fire_multiplier * settings.dtheta_plume,
        fire_multiplier * settings.dq_plume,
    )
}

/// March a plume up through `env`, starting with an excess of `dtheta` potential temperature and
/// `dq` specific humidity over the lowest level.
pub fn ascend(env: &EnvironmentColumn, dtheta: f64, dq: f64) -> PlumeProfile {
    let mut profile = PlumeProfile::with_capacity(env.len(), Termination::ReachedTop);
    profile.diagnostics.saturated_environment = env.saturated_levels().collect();

    if env.is_empty() {
        return profile;
    }

    let theta = env.theta()[0] + dtheta;
    let q = env.q()[0] + dq;
    let adj = saturation_adjustment(theta, q, env.pressure()[0], env.exner()[0]);
    let mass_flux = env.density()[0] * INITIAL_AREA * INITIAL_W;

    let mut prev = PlumeLevel {
        theta,
        q,
        thetav: adj.thetav,
        w: INITIAL_W,
        mass_flux,
        entrainment: ENTRAINMENT * mass_flux,
        detrainment: 0.0,
    };
    profile.push(env, 0, &prev, &adj);

    for k in 1..env.len() {
        // Mixing and buoyancy use the environment at the level the plume is leaving.
        let theta_env = env.theta()[k - 1];
        let q_env = env.q()[k - 1];
        let thetav_env = env.thetav()[k - 1];

        let mass_flux = prev.mass_flux + (prev.entrainment - prev.detrainment) * DZ;
        let mixing = prev.entrainment / prev.mass_flux * DZ;
        let theta = prev.theta - mixing * (prev.theta - theta_env);
        let q = prev.q - mixing * (prev.q - q_env);

        let adj = saturation_adjustment(theta, q, env.pressure()[k], env.exner()[k]);

        let buoyancy = G / thetav_env * (prev.thetav - thetav_env);
        let w_sq = prev.w * prev.w
            + 2.0 * (A_W * buoyancy - B_W * ENTRAINMENT * prev.w * prev.w) * DZ;
        let w = w_sq.max(0.0).sqrt();

        let area = mass_flux / (env.density()[k] * (w + W_EPS));

        let mass_flux_ok = mass_flux.is_finite() && mass_flux > 0.0;
        if !mass_flux_ok || !(area > 0.0) || w < W_EPS {
            profile.diagnostics.termination = Termination::Collapsed {
                altitude: Meters(env.altitude()[k]),
            };
            break;
        }

        prev = PlumeLevel {
            theta,
            q,
            thetav: adj.thetav,
            w,
            mass_flux,
            entrainment: ENTRAINMENT * mass_flux,
            detrainment: DETRAINMENT * mass_flux,
        };
        profile.push(env, k, &prev, &adj);
    }

    debug!(
        levels = profile.len(),
        termination = ?profile.diagnostics.termination,
        "plume ascent finished"
    );

    profile
}
