//! `.env` support.
//!
//! `.env` is read from the working directory, or `.env.<name>` when
//! `SSM_DOCUMENT_ENV=<name>` is set. Variables already present in the process
//! environment are never overridden.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{io_err, LoadError};

/// Selects the `.env.<name>` variant.
pub const ENV_SELECTOR: &str = "SSM_DOCUMENT_ENV";

/// Name of the env file for the current `SSM_DOCUMENT_ENV`.
pub fn dot_env_path() -> PathBuf {
    match std::env::var(ENV_SELECTOR) {
        Ok(env) if !env.is_empty() => PathBuf::from(format!(".env.{env}")),
        _ => PathBuf::from(".env"),
    }
}

/// Load the selected env file if it exists. Returns the number of variables set.
pub fn load_dot_env() -> Result<usize, LoadError> {
    load_dot_env_from(&dot_env_path())
}

/// Load `path` into the process environment if it exists.
///
/// The file is parsed in full before anything is applied, so a malformed
/// line leaves the environment untouched.
pub fn load_dot_env_from(path: &Path) -> Result<usize, LoadError> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| dotenv_err(path, source))?,
        Err(dotenvy::Error::Io(err)) if err.kind() == ErrorKind::NotFound => return Ok(0),
        Err(dotenvy::Error::Io(err)) => return Err(io_err(path, err)),
        Err(source) => return Err(dotenv_err(path, source)),
    };

    let mut applied = 0;
    for (key, value) in entries {
        if std::env::var_os(&key).is_none() {
            std::env::set_var(&key, value);
            applied += 1;
        }
    }
    tracing::debug!("loaded {applied} variable(s) from {}", path.display());
    Ok(applied)
}

/// Parse env-file text without touching the process environment.
pub fn parse(raw: &str) -> Result<Vec<(String, String)>, dotenvy::Error> {
    dotenvy::from_read_iter(raw.as_bytes()).collect()
}

fn dotenv_err(path: &Path, source: dotenvy::Error) -> LoadError {
    LoadError::DotEnv {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &str) -> Vec<(String, String)> {
        parse(raw).expect("parse")
    }

    #[test]
    fn parses_comments_exports_and_quotes() {
        let parsed = pairs(
            "# comment\n\nAWS_REGION=eu-west-1\nexport SSM_ENDPOINT=\"http://localhost:4566\"\nNAME='demo doc'\n",
        );
        assert_eq!(
            parsed,
            vec![
                ("AWS_REGION".to_string(), "eu-west-1".to_string()),
                ("SSM_ENDPOINT".to_string(), "http://localhost:4566".to_string()),
                ("NAME".to_string(), "demo doc".to_string()),
            ]
        );
    }

    #[test]
    fn inline_comment_is_not_part_of_the_value() {
        let parsed = pairs("AWS_REGION=eu-west-1 # primary\n");
        assert_eq!(
            parsed,
            vec![("AWS_REGION".to_string(), "eu-west-1".to_string())]
        );
    }

    #[test]
    fn double_quoted_escapes_are_expanded() {
        let parsed = pairs("MSG=\"a\\nb\"\nRAW='a\\nb'\n");
        assert_eq!(parsed[0].1, "a\nb");
        assert_eq!(parsed[1].1, "a\\nb");
    }

    #[test]
    fn malformed_line_is_an_error() {
        assert!(parse("broken line\n").is_err());

        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join(".env");
        std::fs::write(&path, "DOCDEPLOY_DOTENV_TEST_BAD=ok\nbroken line\n").expect("write");

        let err = load_dot_env_from(&path).unwrap_err();
        assert!(matches!(err, LoadError::DotEnv { .. }));
        assert!(std::env::var_os("DOCDEPLOY_DOTENV_TEST_BAD").is_none());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let applied = load_dot_env_from(&dir.path().join(".env")).expect("load");
        assert_eq!(applied, 0);
    }

    #[test]
    fn existing_variables_are_kept() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "DOCDEPLOY_DOTENV_TEST_KEEP=from-file\nDOCDEPLOY_DOTENV_TEST_NEW=new # trailing\n",
        )
        .expect("write");
        std::env::set_var("DOCDEPLOY_DOTENV_TEST_KEEP", "from-process");

        let applied = load_dot_env_from(&path).expect("load");

        assert_eq!(applied, 1);
        assert_eq!(
            std::env::var("DOCDEPLOY_DOTENV_TEST_KEEP").unwrap(),
            "from-process"
        );
        assert_eq!(std::env::var("DOCDEPLOY_DOTENV_TEST_NEW").unwrap(), "new");
    }
}
