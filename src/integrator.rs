//! Time integration of the mixed layer model.
//!
//! The mixed layer is described by its depth, its potential temperature and specific humidity, and
//! the jumps of those two at the top of the layer. The growth of the layer is closed by assuming
//! the buoyancy flux at the top is a fixed fraction (`beta`) of the surface buoyancy flux.

use crate::{
    error::{ModelError, Result},
    output::{Output, OutputRow},
    settings::RunSettings,
    thermo::{virtual_temperature, RD, RV},
};
use tracing::debug;

/// The prognostic variables of the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunState {
    /// Time since the start of the run (s).
    pub time: f64,
    /// Mixed layer depth (m).
    pub h: f64,
    /// Mixed layer potential temperature (K).
    pub theta: f64,
    /// Potential temperature jump at the top of the mixed layer (K).
    pub dtheta: f64,
    /// Mixed layer specific humidity (kg/kg).
    pub q: f64,
    /// Specific humidity jump at the top of the mixed layer (kg/kg).
    pub dq: f64,
}

impl RunState {
    /// The initial state described by the settings.
    pub fn initial(settings: &RunSettings) -> Self {
        RunState {
            time: 0.0,
            h: settings.h,
            theta: settings.theta,
            dtheta: settings.dtheta,
            q: settings.q,
            dq: settings.dq,
        }
    }

    /// Virtual potential temperature of the mixed layer, assuming no condensate.
    #[inline]
    pub fn thetav(&self) -> f64 {
        virtual_temperature(self.theta, self.q, 0.0)
    }

    /// Virtual potential temperature jump at the top of the mixed layer.
    #[inline]
    pub fn dthetav(&self) -> f64 {
        virtual_temperature(self.theta + self.dtheta, self.q + self.dq, 0.0) - self.thetav()
    }

    fn to_row(&self) -> OutputRow {
        OutputRow {
            time: self.time / 3600.0,
            h: self.h,
            theta: self.theta,
            dtheta: self.dtheta,
            q: self.q,
            dq: self.dq,
            thetav: self.thetav(),
            dthetav: self.dthetav(),
        }
    }
}

/// Time derivatives of the prognostic variables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tendencies {
    /// Entrainment velocity (m/s).
    pub we: f64,
    /// Subsidence velocity (m/s).
    pub ws: f64,
    /// Growth rate of the mixed layer.
    pub dhdt: f64,
    /// Rate of change of the potential temperature.
    pub dthetadt: f64,
    /// Rate of change of the potential temperature jump.
    pub ddthetadt: f64,
    /// Rate of change of the specific humidity.
    pub dqdt: f64,
    /// Rate of change of the specific humidity jump.
    pub ddqdt: f64,
}

/// Evaluate the tendencies of the model in a given state.
///
/// Fails if the virtual potential temperature jump is zero, which leaves the entrainment velocity
/// undefined, or if the mixed layer has no depth.
pub fn tendencies(settings: &RunSettings, state: &RunState) -> Result<Tendencies> {
    let RunState {
        time,
        h,
        theta,
        dtheta,
        q,
        dq,
    } = *state;

    if h <= 0.0 {
        return Err(ModelError::NonPositiveDepth { time, h });
    }

    // No condensation in the mixed layer.
    let wthetav =
        settings.wtheta * (1.0 + (RV / RD - 1.0) * q) + (RV / RD - 1.0) * theta * settings.wq;
    let dthetav = state.dthetav();
    if dthetav == 0.0 {
        return Err(ModelError::DivisionByZero { time });
    }

    let we = settings.beta * wthetav / dthetav;
    let ws = -h * settings.div;

    let dhdt = we + ws;

    let dthetadt = (settings.wtheta + we * dtheta) / h;
    let ddthetadt = we * settings.gammatheta - dthetadt;

    let dqdt = (settings.wq + we * dq) / h;
    let ddqdt = we * settings.gammaq - dqdt;

    Ok(Tendencies {
        we,
        ws,
        dhdt,
        dthetadt,
        ddthetadt,
        dqdt,
        ddqdt,
    })
}

/// Advance the state one forward Euler step of length `settings.dt`.
pub fn step(settings: &RunSettings, state: &RunState) -> Result<RunState> {
    let tend = tendencies(settings, state)?;
    let dt = settings.dt;

    let next = RunState {
        time: state.time + dt,
        h: state.h + dt * tend.dhdt,
        theta: state.theta + dt * tend.dthetadt,
        dtheta: state.dtheta + dt * tend.ddthetadt,
        q: state.q + dt * tend.dqdt,
        dq: state.dq + dt * tend.ddqdt,
    };

    check_finite(&next)?;
    if next.h <= 0.0 {
        return Err(ModelError::NonPositiveDepth {
            time: next.time,
            h: next.h,
        });
    }

    Ok(next)
}

fn check_finite(state: &RunState) -> Result<()> {
    let values = [
        ("h", state.h),
        ("theta", state.theta),
        ("dtheta", state.dtheta),
        ("q", state.q),
        ("dq", state.dq),
    ];

    for &(variable, val) in values.iter() {
        if !val.is_finite() {
            return Err(ModelError::NonFiniteState {
                variable,
                time: state.time,
            });
        }
    }

    Ok(())
}

/// A finished integration.
#[derive(Debug, Clone, PartialEq)]
pub struct Integration {
    /// The time series.
    pub output: Output,
    /// The state at the end of the run.
    pub final_state: RunState,
}

/// Integrates the model described by a set of settings.
///
/// Creating an `Integrator` validates the settings and captures the initial state, `integrate`
/// consumes it and runs the model to the end. Nothing of a failed integration is returned.
#[derive(Debug)]
pub struct Integrator {
    settings: RunSettings,
    state: RunState,
    output: Output,
}

impl Integrator {
    /// Validate the settings and prepare the output with the initial state as its first row.
    pub fn new(settings: &RunSettings) -> Result<Self> {
        settings.validate()?;

        let state = RunState::initial(settings);
        let mut output = Output::with_capacity(settings.output_rows());
        output.push(state.to_row());

        Ok(Integrator {
            settings: *settings,
            state,
            output,
        })
    }

    /// Run the model until the end of the run.
    pub fn integrate(self) -> Result<Integration> {
        let Integrator {
            settings,
            mut state,
            mut output,
        } = self;

        let total_steps = settings.total_steps();
        let output_ratio = settings.output_ratio();
        debug!(
            total_steps,
            output_ratio,
            rows = settings.output_rows(),
            "starting mixed layer integration"
        );

        for i in 1..=total_steps {
            state = step(&settings, &state)?;

            if i % output_ratio == 0 {
                output.push(state.to_row());
            }
        }

        debug_assert_eq!(output.len(), settings.output_rows());
        debug!(
            h = state.h,
            theta = state.theta,
            q = state.q,
            "finished mixed layer integration"
        );

        Ok(Integration {
            output,
            final_state: state,
        })
    }
}

/// Integrate the model described by `settings`.
pub fn integrate(settings: &RunSettings) -> Result<Integration> {
    Integrator::new(settings)?.integrate()
}
