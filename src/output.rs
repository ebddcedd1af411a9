//! The time series produced by integrating the mixed layer model.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumIter, EnumString};

/// The columns of the output.
///
/// The string form of each variant is the column key used by anything that plots or tabulates the
/// output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, AsRefStr)]
pub enum Variable {
    /// Time since the start of the run in hours.
    #[strum(serialize = "time")]
    Time,
    /// Mixed layer depth (m).
    #[strum(serialize = "h")]
    H,
    /// Mixed layer potential temperature (K).
    #[strum(serialize = "theta")]
    Theta,
    /// Potential temperature jump at the top of the mixed layer (K).
    #[strum(serialize = "dtheta")]
    DTheta,
    /// Mixed layer specific humidity (kg/kg).
    #[strum(serialize = "q")]
    Q,
    /// Specific humidity jump at the top of the mixed layer (kg/kg).
    #[strum(serialize = "dq")]
    DQ,
    /// Mixed layer virtual potential temperature (K).
    #[strum(serialize = "thetav")]
    ThetaV,
    /// Virtual potential temperature jump at the top of the mixed layer (K).
    #[strum(serialize = "dthetav")]
    DThetaV,
}

/// One row of output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputRow {
    /// Time since the start of the run in hours.
    pub time: f64,
    /// Mixed layer depth (m).
    pub h: f64,
    /// Mixed layer potential temperature (K).
    pub theta: f64,
    /// Potential temperature jump (K).
    pub dtheta: f64,
    /// Mixed layer specific humidity (kg/kg).
    pub q: f64,
    /// Specific humidity jump (kg/kg).
    pub dq: f64,
    /// Mixed layer virtual potential temperature (K).
    pub thetav: f64,
    /// Virtual potential temperature jump (K).
    pub dthetav: f64,
}

impl OutputRow {
    /// Get the value of a column.
    #[inline]
    pub fn get(&self, var: Variable) -> f64 {
        use self::Variable::*;

        match var {
            Time => self.time,
            H => self.h,
            Theta => self.theta,
            DTheta => self.dtheta,
            Q => self.q,
            DQ => self.dq,
            ThetaV => self.thetav,
            DThetaV => self.dthetav,
        }
    }
}

/// The output of a run, one row per output interval starting with the initial state.
///
/// Rows are only ever appended while the model integrates. Once a run is finished the output is
/// never modified again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Output {
    rows: Vec<OutputRow>,
}

impl Output {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Output {
            rows: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, row: OutputRow) {
        self.rows.push(row);
    }

    /// All the rows.
    #[inline]
    pub fn rows(&self) -> &[OutputRow] {
        &self.rows
    }

    /// The number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Is there no output at all?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get a row by index.
    #[inline]
    pub fn row(&self, idx: usize) -> Option<&OutputRow> {
        self.rows.get(idx)
    }

    /// The last row, the state at the end of the run.
    #[inline]
    pub fn last(&self) -> Option<&OutputRow> {
        self.rows.last()
    }

    /// Get the row nearest to `elapsed` seconds after the start.
    ///
    /// Half way between two rows the even row is used. Returns `None` if the time is negative, not
    /// a number, or past the end of the run.
    pub fn row_at_elapsed(&self, elapsed: f64, dt_output: f64) -> Option<&OutputRow> {
        let idx = (elapsed / dt_output).round_ties_even();
        if idx.is_nan() || idx < 0.0 {
            return None;
        }

        self.row(idx as usize)
    }

    /// Get a whole column as a vector.
    pub fn column(&self, var: Variable) -> Vec<f64> {
        self.rows.iter().map(|row| row.get(var)).collect()
    }

    /// The date and time of every row, given the start of the run.
    pub fn times_utc(&self, start: NaiveDateTime) -> Vec<NaiveDateTime> {
        self.rows
            .iter()
            .map(|row| start + Duration::milliseconds((row.time * 3_600_000.0).round() as i64))
            .collect()
    }
}
