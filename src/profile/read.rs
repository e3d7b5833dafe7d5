//! Read profile dumps from text
use super::ProfileSeries;
use crate::error::{Error, Result};
use crate::Real;
use std::path::Path;

impl ProfileSeries {
    /// Parse whitespace separated samples and reshape them
    pub fn parse(text: &str, node_count: usize) -> Result<Self> {
        let samples = parse_samples(text)?;
        Self::from_samples(&samples, node_count)
    }

    /// Read profile dump from file
    ///
    /// # Errors
    /// `MissingInput` if the file does not exist, `MalformedInput` if it
    /// is not text or holds a token that is not a finite number.
    pub fn read<P: AsRef<Path>>(filename: P, node_count: usize) -> Result<Self> {
        let samples = read_samples(filename)?;
        Self::from_samples(&samples, node_count)
    }
}

/// Read all samples of a file into a flat vector
pub fn read_samples<P: AsRef<Path>>(filename: P) -> Result<Vec<Real>> {
    let path = filename.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::MissingInput {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::InvalidData => {
            Error::MalformedInput(format!("{}: not utf-8 text", path.display()))
        }
        _ => Error::Io(e),
    })?;
    parse_samples(&text).map_err(|e| match e {
        Error::MalformedInput(msg) => {
            Error::MalformedInput(format!("{}: {}", path.display(), msg))
        }
        e => e,
    })
}

/// Parse whitespace/newline separated real numbers.
///
/// Fortran style exponents (`1.5D-03`) are accepted, `nan` and `inf`
/// are not.
pub fn parse_samples(text: &str) -> Result<Vec<Real>> {
    text.split_whitespace()
        .enumerate()
        .map(|(i, token)| {
            parse_token(token).ok_or_else(|| {
                Error::MalformedInput(format!(
                    "sample {} ({:?}) is not a finite number",
                    i, token
                ))
            })
        })
        .collect()
}

fn parse_token(token: &str) -> Option<Real> {
    token
        .parse::<Real>()
        .ok()
        .or_else(|| token.replace(&['D', 'd'][..], "E").parse::<Real>().ok())
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_samples() {
        let text = "0.0\n 1.5\t-2.25e-1\n3.0D+00\n\n";
        let samples = parse_samples(text).unwrap();
        assert_eq!(samples, vec![0.0, 1.5, -0.225, 3.0]);
    }

    #[test]
    fn test_parse_bad_token() {
        match parse_samples("1.0\nabc\n") {
            Err(Error::MalformedInput(msg)) => assert!(msg.contains("sample 1")),
            other => panic!("expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_non_finite() {
        for token in &["nan", "NaN", "inf", "-inf", "1e999"] {
            let text = format!("0\n1.0\n2.0\n0\n{}\n2.0\n", token);
            match ProfileSeries::parse(&text, 2) {
                Err(Error::MalformedInput(msg)) => assert!(msg.contains("sample 4")),
                other => panic!("expected MalformedInput for {}, got {:?}", token, other),
            }
        }
    }

    #[test]
    fn test_read_binary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.txt");
        std::fs::write(&path, [0xffu8, 0xfe, 0x00, 0x31]).unwrap();
        assert!(matches!(
            ProfileSeries::read(&path, 2),
            Err(Error::MalformedInput(_))
        ));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("100_105_110outU.txt");
        match ProfileSeries::read(&path, 41) {
            Err(Error::MissingInput { path: p }) => assert_eq!(p, path),
            other => panic!("expected MissingInput, got {:?}", other),
        }
    }

    #[test]
    fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        for v in &[0.0, 1.0, 2.0, 10.0, 3.0, 4.0] {
            writeln!(file, "{}", v).unwrap();
        }
        let series = ProfileSeries::read(&path, 2).unwrap();
        assert_eq!(series.step_count(), 2);
        assert_eq!(series.profile(1)[1], 4.0);
        assert_eq!(series.auxiliary()[1], 10.0);
    }
}
