//! Result of one sweep: `(learning_rate, loss)` points in the order they were
//! produced, which is also increasing-rate order.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Loss observed at one learning rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub learning_rate: f64,
    pub loss: f64,
}

/// Ordered sweep points.
///
/// Points can only be appended, never reordered or removed, so the index of a
/// point is its position on the rate axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTrace {
    points: Vec<SweepPoint>,
}

impl ResultTrace {
    /// Create an empty trace.
    ///
    /// # Examples
    ///
    /// ```
    /// use lr_finder::ResultTrace;
    ///
    /// let trace = ResultTrace::new();
    /// assert!(trace.is_empty());
    /// assert!(trace.last().is_none());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, learning_rate: f64, loss: f64) {
        self.points.push(SweepPoint {
            learning_rate,
            loss,
        });
    }

    /// All points, lowest rate first.
    pub fn points(&self) -> &[SweepPoint] {
        &self.points
    }

    /// Number of iterations the sweep ran.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate over the points in sweep order.
    pub fn iter(&self) -> std::slice::Iter<'_, SweepPoint> {
        self.points.iter()
    }

    /// Point of the final iteration, the one that tripped the stopping rule
    /// or hit the iteration cap.
    pub fn last(&self) -> Option<&SweepPoint> {
        self.points.last()
    }

    /// Learning rates as a column, for plotting.
    pub fn rates(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.learning_rate).collect()
    }

    /// Losses as a column, aligned with [`ResultTrace::rates`].
    pub fn losses(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.loss).collect()
    }

    /// Write the trace as pretty JSON, creating parent directories.
    ///
    /// JSON has no NaN or infinity: such losses are written as `null` and the
    /// file will not load back with [`ResultTrace::from_json_file`]. Use
    /// [`ResultTrace::write_tsv`] when the sweep may have produced them.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        create_parent_dir(path)?;
        let writer = BufWriter::new(fs::File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Write one `learning_rate<TAB>loss` line per point, with a header line.
    ///
    /// Suited for plotting loss against rate on a log scale with external tools.
    pub fn write_tsv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        create_parent_dir(path)?;
        let mut writer = BufWriter::new(fs::File::create(path)?);
        writeln!(writer, "learning_rate\tloss")?;
        for point in &self.points {
            writeln!(writer, "{:e}\t{}", point.learning_rate, point.loss)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Load a trace written by [`ResultTrace::write_json`].
    ///
    /// # Arguments
    ///
    /// * `path` - JSON file holding a `points` array
    ///
    /// # Errors
    ///
    /// `FinderError::Io` when the file cannot be read and
    /// `FinderError::Serialization` when it is not a trace, including a trace
    /// whose non-finite losses were written as `null`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

impl<'a> IntoIterator for &'a ResultTrace {
    type Item = &'a SweepPoint;
    type IntoIter = std::slice::Iter<'a, SweepPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
