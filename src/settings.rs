//! Configuration of a mixed layer run.
//!
//! A run is configured by a flat record of scalar values. The record can be read from JSON, either
//! as a single settings object or as a [`SettingsRecord`] holding several named runs.

use crate::error::{ModelError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// The settings of a single run. Humidities are in kg/kg, times in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Total simulated time.
    pub runtime: f64,
    /// Time step of the integration.
    pub dt: f64,
    /// Interval between output rows.
    pub dt_output: f64,

    /// Initial mixed layer depth (m).
    pub h: f64,
    /// Entrainment ratio of the buoyancy flux at the top of the layer to that at the surface.
    pub beta: f64,
    /// Large scale horizontal divergence (1/s), positive values cause subsidence.
    pub div: f64,

    /// Initial mixed layer potential temperature (K).
    pub theta: f64,
    /// Initial potential temperature jump at the top of the mixed layer (K).
    pub dtheta: f64,
    /// Surface kinematic heat flux (K m/s).
    pub wtheta: f64,
    /// Potential temperature lapse rate of the free troposphere (K/m).
    pub gammatheta: f64,

    /// Initial mixed layer specific humidity.
    pub q: f64,
    /// Initial specific humidity jump at the top of the mixed layer.
    pub dq: f64,
    /// Surface kinematic moisture flux (kg/kg m/s).
    pub wq: f64,
    /// Specific humidity lapse rate of the free troposphere (1/m).
    pub gammaq: f64,

    /// Plume potential temperature excess at the surface for a fire multiplier of one (K).
    pub dtheta_plume: f64,
    /// Plume specific humidity excess at the surface for a fire multiplier of one.
    pub dq_plume: f64,

    /// Start time of day (UTC), only used for labeling output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starttime: Option<NaiveTime>,
    /// Start date, only used for labeling output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startdate: Option<NaiveDate>,
}

impl Default for RunSettings {
    /// A sunny morning over land with a weak fire.
    fn default() -> Self {
        RunSettings {
            runtime: 3600.0,
            dt: 1.0,
            dt_output: 60.0,

            h: 200.0,
            beta: 0.2,
            div: 0.0,

            theta: 290.0,
            dtheta: 2.0,
            wtheta: 0.1,
            gammatheta: 0.006,

            q: 0.008,
            dq: -0.001,
            wq: 0.0001,
            gammaq: 0.0,

            dtheta_plume: 1.0,
            dq_plume: 0.0,

            starttime: None,
            startdate: None,
        }
    }
}

impl RunSettings {
    /// Parse the settings from a JSON object with one key per setting.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mixed_layer::RunSettings;
    ///
    /// let json = r#"{
    ///     "runtime": 7200, "dt": 1, "dt_output": 600,
    ///     "h": 300, "beta": 0.2, "div": 0,
    ///     "theta": 288, "dtheta": 1, "wtheta": 0.15, "gammatheta": 0.006,
    ///     "q": 0.006, "dq": -0.001, "wq": 0.0001, "gammaq": 0,
    ///     "dtheta_plume": 2, "dq_plume": 0.001,
    ///     "starttime": "09:00:00", "startdate": "2024-07-18"
    /// }"#;
    ///
    /// let settings = RunSettings::from_json(json).unwrap();
    /// assert_eq!(settings.output_rows(), 13);
    /// assert!(settings.start_datetime().is_some());
    ///
    /// assert!(RunSettings::from_json(r#"{"runtime": 7200}"#).is_err());
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: RunSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize to a JSON object.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Builder method for the start date and time used to label the output.
    pub fn with_start(self, startdate: NaiveDate, starttime: NaiveTime) -> Self {
        RunSettings {
            startdate: Some(startdate),
            starttime: Some(starttime),
            ..self
        }
    }

    /// The number of integration steps.
    ///
    /// Counts round halves to even, so 2.5 becomes 2.
    #[inline]
    pub fn total_steps(&self) -> usize {
        (self.runtime / self.dt).round_ties_even() as usize
    }

    /// The number of integration steps between output rows.
    #[inline]
    pub fn output_ratio(&self) -> usize {
        (self.dt_output / self.dt).round_ties_even() as usize
    }

    /// The number of rows in the output, including the initial state.
    #[inline]
    pub fn output_rows(&self) -> usize {
        (self.runtime / self.dt_output).round_ties_even() as usize + 1
    }

    /// The date and time of the start of the run, if both were configured.
    pub fn start_datetime(&self) -> Option<NaiveDateTime> {
        match (self.startdate, self.starttime) {
            (Some(date), Some(time)) => Some(date.and_time(time)),
            _ => None,
        }
    }

    /// Check the settings before integrating.
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("runtime", self.runtime),
            ("dt", self.dt),
            ("dt_output", self.dt_output),
            ("h", self.h),
            ("beta", self.beta),
            ("div", self.div),
            ("theta", self.theta),
            ("dtheta", self.dtheta),
            ("wtheta", self.wtheta),
            ("gammatheta", self.gammatheta),
            ("q", self.q),
            ("dq", self.dq),
            ("wq", self.wq),
            ("gammaq", self.gammaq),
            ("dtheta_plume", self.dtheta_plume),
            ("dq_plume", self.dq_plume),
        ];

        for &(key, val) in values.iter() {
            if !val.is_finite() {
                return Err(invalid(key, "must be a finite number"));
            }
        }

        if self.runtime <= 0.0 {
            return Err(invalid("runtime", "must be positive"));
        }
        if self.dt <= 0.0 {
            return Err(invalid("dt", "must be positive"));
        }
        if self.dt_output <= 0.0 {
            return Err(invalid("dt_output", "must be positive"));
        }
        if self.total_steps() == 0 {
            return Err(invalid("dt", "must not exceed the runtime"));
        }
        if self.output_ratio() == 0 {
            return Err(invalid("dt_output", "must be at least one time step"));
        }
        if self.h <= 0.0 {
            return Err(invalid("h", "must be positive"));
        }

        // The step loop writes a row every `output_ratio` steps, which must fill the output
        // exactly.
        if self.total_steps() / self.output_ratio() + 1 != self.output_rows() {
            return Err(invalid(
                "dt_output",
                "runtime is not a whole number of output intervals",
            ));
        }

        Ok(())
    }
}

fn invalid(key: &'static str, reason: &'static str) -> ModelError {
    ModelError::InvalidSetting { key, reason }
}

/// Settings of a run along with its name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSettings {
    /// The name of the run.
    pub name: String,
    /// The settings.
    #[serde(flatten)]
    pub settings: RunSettings,
}

/// A record of the settings of several runs.
///
/// This is the only thing that gets saved, the runs themselves are always recomputed from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsRecord {
    /// The runs in this record.
    pub settings: Vec<NamedSettings>,
}

impl SettingsRecord {
    /// Parse a record and validate every run in it.
    pub fn from_json(json: &str) -> Result<Self> {
        let record: SettingsRecord = serde_json::from_str(json)?;
        for named in &record.settings {
            named.settings.validate()?;
        }
        Ok(record)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Find the settings of a run by name.
    pub fn get(&self, name: &str) -> Option<&RunSettings> {
        self.settings
            .iter()
            .find(|named| named.name == name)
            .map(|named| &named.settings)
    }
}
