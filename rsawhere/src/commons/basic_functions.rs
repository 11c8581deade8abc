use std::path::Path;

use crate::collect::global_variables::MAX_LATTICE_CELLS;
use crate::error::{AwhereError, Result};

/// Evenly spaced values in `[start, stop)` with spacing `step`.
///
/// Same length and values as numpy's `arange`: `ceil((stop - start) / step)`
/// entries computed as `start + i * step`, so no error accumulates along the
/// sequence.
pub fn arange(start: f64, stop: f64, step: f64) -> Result<Vec<f64>> {
    let len = arange_len(start, stop, step)?;
    Ok((0..len).map(|i| start + i as f64 * step).collect())
}

/// Number of values [`arange`] yields, checked against
/// [`MAX_LATTICE_CELLS`] without allocating.
pub fn arange_len(start: f64, stop: f64, step: f64) -> Result<usize> {
    if !(step > 0.0) || !step.is_finite() {
        return Err(AwhereError::invalid(
            "step",
            format!("must be a positive finite number, got {step}"),
        ));
    }
    if !start.is_finite() || !stop.is_finite() {
        return Err(AwhereError::Geometry(format!(
            "non-finite extent [{start}, {stop})"
        )));
    }

    let len = ((stop - start) / step).ceil();
    if len <= 0.0 {
        return Ok(0);
    }
    if len > MAX_LATTICE_CELLS as f64 {
        return Err(AwhereError::invalid(
            "step",
            format!(
                "{step} splits [{start}, {stop}) into more than {MAX_LATTICE_CELLS} values"
            ),
        ));
    }
    Ok(len as usize)
}

/// Fail with `DirectoryNotFound` when `path` points into a directory that
/// does not exist. A bare file name refers to the working directory.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(AwhereError::DirectoryNotFound(parent.to_path_buf()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arange_excludes_stop() {
        let values = arange(0.0, 1.0, 0.25).unwrap();
        assert_eq!(values, vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn test_arange_partial_step() {
        // 0.9 is below the stop, 1.15 is not
        let values = arange(-0.1, 1.1, 0.25).unwrap();
        assert_eq!(values.len(), 5);
        assert!((values[4] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_arange_empty_range() {
        assert!(arange(1.0, 1.0, 0.5).unwrap().is_empty());
        assert!(arange(2.0, 1.0, 0.5).unwrap().is_empty());
    }

    #[test]
    fn test_arange_rejects_non_positive_step() {
        assert!(matches!(
            arange(0.0, 1.0, 0.0),
            Err(AwhereError::InvalidParameter { .. })
        ));
        assert!(arange(0.0, 1.0, -0.1).is_err());
        assert!(arange(0.0, 1.0, f64::NAN).is_err());
    }

    #[test]
    fn test_arange_rejects_oversized_progression() {
        let err = arange(0.0, 1.0, 1e-12).unwrap_err();
        assert!(matches!(err, AwhereError::InvalidParameter { name: "step", .. }));
        assert!(arange_len(0.0, 1.0, 1e-12).is_err());
        assert_eq!(arange_len(0.0, 1.0, 0.25).unwrap(), 4);
    }

    #[test]
    fn test_ensure_parent_dir() {
        assert!(ensure_parent_dir(Path::new("grid.csv")).is_ok());
        let dir = tempfile::tempdir().unwrap();
        assert!(ensure_parent_dir(&dir.path().join("grid.csv")).is_ok());
        let missing = dir.path().join("missing").join("grid.csv");
        assert!(matches!(
            ensure_parent_dir(&missing),
            Err(AwhereError::DirectoryNotFound(_))
        ));
    }
}
