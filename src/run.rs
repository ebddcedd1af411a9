//! A finished run of the model, and the queries that can be made of it.

use crate::{
    error::Result,
    integrator::{Integration, Integrator, RunState},
    output::{Output, OutputRow},
    plume::{launch_entraining_plume, EnvironmentColumn, PlumeProfile, SkewTLevel},
    settings::RunSettings,
};
use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::debug;

/// The settings of a run paired with the output they produced.
///
/// A `Run` is never modified after it is created, so it can be shared freely between threads. The
/// output is reference counted so readers can hold on to it independently of the run.
#[derive(Debug, Clone)]
pub struct Run {
    settings: RunSettings,
    output: Arc<Output>,
    final_state: RunState,
}

impl Run {
    /// Integrate the model described by `settings` to the end of the run.
    pub fn new(settings: &RunSettings) -> Result<Self> {
        let Integration {
            output,
            final_state,
        } = Integrator::new(settings)?.integrate()?;

        Ok(Run {
            settings: *settings,
            output: Arc::new(output),
            final_state,
        })
    }

    /// The settings used for this run.
    #[inline]
    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// The time series.
    #[inline]
    pub fn output(&self) -> &Output {
        &self.output
    }

    /// A shared handle to the time series.
    #[inline]
    pub fn shared_output(&self) -> Arc<Output> {
        Arc::clone(&self.output)
    }

    /// The prognostic state at the end of the run.
    #[inline]
    pub fn final_state(&self) -> &RunState {
        &self.final_state
    }

    /// The date and time of every output row, if the run has a start date and time.
    pub fn times_utc(&self) -> Option<Vec<NaiveDateTime>> {
        self.settings
            .start_datetime()
            .map(|start| self.output.times_utc(start))
    }

    /// The output row nearest to `elapsed` seconds into the run.
    pub fn row_at_elapsed(&self, elapsed: f64) -> Option<&OutputRow> {
        self.output.row_at_elapsed(elapsed, self.settings.dt_output)
    }

    // Plumes and their environment go up to twice the depth of the mixed layer at the end of the
    // run, so the grid is the same for every time in the run.
    fn plume_top(&self) -> f64 {
        self.output.last().map(|row| 2.0 * row.h).unwrap_or(0.0)
    }

    /// Launch a plume `elapsed` seconds into the run.
    ///
    /// The plume starts `fire_multiplier` times the plume forcing warmer and moister than the
    /// mixed layer. If `elapsed` is not part of the run the profile is empty and its termination is
    /// `Termination::OutsideRun`.
    pub fn launch_plume(&self, elapsed: f64, fire_multiplier: f64) -> PlumeProfile {
        match self.row_at_elapsed(elapsed) {
            Some(row) => {
                launch_entraining_plume(&self.settings, row, self.plume_top(), fire_multiplier)
            }
            None => {
                debug!(elapsed, "no plume launched, time is outside the run");
                PlumeProfile::outside_run()
            }
        }
    }

    /// The environment a plume launched `elapsed` seconds into the run would rise through.
    pub fn environment_at(&self, elapsed: f64) -> Option<EnvironmentColumn> {
        let top = self.plume_top();
        self.row_at_elapsed(elapsed).map(|row| {
            EnvironmentColumn::build(row, self.settings.gammatheta, self.settings.gammaq, top)
        })
    }

    /// The environment `elapsed` seconds into the run, from the surface to 5 km, for plotting on a
    /// skew-t.
    pub fn skew_t_environment(&self, elapsed: f64) -> Option<Vec<SkewTLevel>> {
        self.row_at_elapsed(elapsed).map(|row| {
            EnvironmentColumn::for_skew_t(row, self.settings.gammatheta, self.settings.gammaq)
                .skew_t_lines()
        })
    }
}

/// Create a run by integrating the model described by `settings`.
pub fn create_run(settings: &RunSettings) -> Result<Run> {
    Run::new(settings)
}

/// Launch a plume `elapsed` seconds into `run`.
pub fn launch_plume(run: &Run, elapsed: f64, fire_multiplier: f64) -> PlumeProfile {
    run.launch_plume(elapsed, fire_multiplier)
}
