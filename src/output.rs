//! Csv output for plotting
use crate::error::Result;
use crate::grid::{CellOutcome, ResultTensor};
use crate::profile::ProfileSeries;
use crate::Real;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct TensorRow<'a> {
    speed: Real,
    depth: Real,
    direction: Real,
    outcome: &'a str,
    relaxation_step: Option<usize>,
}

/// Write one row per configuration:
/// `speed,depth,direction,outcome,relaxation_step`
///
/// `relaxation_step` is empty for cells without a value.
pub fn write_tensor_csv<P: AsRef<Path>>(filename: P, tensor: &ResultTensor) -> Result<()> {
    let mut writer = csv::Writer::from_path(filename)?;
    write_tensor(&mut writer, tensor)?;
    writer.flush()?;
    Ok(())
}

fn write_tensor<W>(writer: &mut csv::Writer<W>, tensor: &ResultTensor) -> Result<()>
where
    W: std::io::Write,
{
    for key in tensor.axes().keys() {
        let outcome: CellOutcome = tensor.outcomes()[key.index()];
        writer.serialize(TensorRow {
            speed: key.speed,
            depth: key.depth,
            direction: key.direction,
            outcome: outcome.label(),
            relaxation_step: outcome.value(),
        })?;
    }
    Ok(())
}

/// Write profiles as columns: depth coordinate followed by
/// one column per step (`t1`, `t2`, ...)
pub fn write_profile_csv<P: AsRef<Path>>(
    filename: P,
    series: &ProfileSeries,
    physical_depth: Real,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(filename)?;
    let mut header = vec!["depth".to_string()];
    header.extend((1..=series.step_count()).map(|t| format!("t{}", t)));
    writer.write_record(&header)?;
    let z = series.depth_coordinates(physical_depth);
    for (n, zn) in z.iter().enumerate() {
        let mut record = vec![zn.to_string()];
        record.extend(series.values().column(n).iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::source::{Component, MemorySource};
    use crate::grid::{Axes, GridRunner, NodeCount};
    use crate::ConvergenceDetector;
    use ndarray::array;

    #[test]
    fn test_tensor_csv() {
        let axes = Axes::new(vec![5.], vec![20.], vec![0., 90.]).unwrap();
        let mut source = MemorySource::new();
        let key = axes.key(0, 0, 1);
        source.insert(&key, Component::U, vec![0.; 6]);
        source.insert(&key, Component::V, vec![0.; 6]);
        let detector = ConvergenceDetector::new(0.01).unwrap();
        let runner = GridRunner::new(axes, detector, NodeCount::Uniform(2)).unwrap();
        let tensor = runner.run(&source);

        let mut buffer = Vec::new();
        {
            let mut writer = csv::Writer::from_writer(&mut buffer);
            write_tensor(&mut writer, &tensor).unwrap();
            writer.flush().unwrap();
        }
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "speed,depth,direction,outcome,relaxation_step");
        assert_eq!(lines[1], "5.0,20.0,0.0,missing,");
        assert_eq!(lines[2], "5.0,20.0,90.0,converged,1");
    }

    #[test]
    fn test_profile_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.csv");
        let series = ProfileSeries::new(array![[1., 2., 3.], [4., 5., 6.]]);
        write_profile_csv(&path, &series, 2.).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["depth,t1,t2", "0,1,4", "1,2,5", "2,3,6"]);
    }
}
