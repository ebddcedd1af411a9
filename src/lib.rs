#![warn(missing_docs)]
//! A mixed layer model of the convective boundary layer, with an entraining plume that can be
//! launched through the modeled atmosphere to see how high a fire plume would rise.
//!
//! The boundary layer is integrated in time from a set of [`RunSettings`]. The resulting
//! [`Run`] holds the time series of the mixed layer, and plumes are launched from any output time.
//!
//! ```
//! use mixed_layer::{create_run, launch_plume, RunSettings, Variable};
//!
//! let run = create_run(&RunSettings::default()).unwrap();
//! let depths = run.output().column(Variable::H);
//! assert!(depths.last().unwrap() > &depths[0]);
//!
//! let plume = launch_plume(&run, 1800.0, 1.0);
//! assert!(!plume.is_empty());
//! ```

//
// API
//
pub use crate::error::{ModelError, Result};
pub use crate::integrator::{Integration, Integrator, RunState, Tendencies};
pub use crate::output::{Output, OutputRow, Variable};
pub use crate::plume::{
    EnvironmentColumn, PlumeDiagnostics, PlumeProfile, SkewTLevel, Termination,
};
pub use crate::run::{create_run, launch_plume, Run};
pub use crate::settings::{NamedSettings, RunSettings, SettingsRecord};

pub mod integrator;
pub mod plume;
pub mod thermo;

//
// Internal use only
//
mod error;
mod output;
mod run;
mod settings;
