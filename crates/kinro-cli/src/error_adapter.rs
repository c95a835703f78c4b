//! Error adapter for converting KinroError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI. Every variant gets
//! a stable code; variants the user can act on also get help text.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use kinro::{KinroError, remote::RemoteError};

/// Adapter for a [`KinroError`].
pub struct ErrorAdapter<'a>(pub &'a KinroError);

impl ErrorAdapter<'_> {
    /// Returns the stable diagnostic code of the wrapped error.
    pub fn code_str(&self) -> &'static str {
        match self.0 {
            KinroError::Io(_) => "kinro::io",
            KinroError::Validation(_) => "kinro::validation",
            KinroError::DuplicateConnection { .. } => "kinro::duplicate",
            KinroError::NodeNotFound(_) => "kinro::not_found",
            KinroError::NoPendingConnection => "kinro::gesture",
            KinroError::Remote(_) => "kinro::remote",
            KinroError::Reload(_) => "kinro::reload",
            KinroError::Export(_) => "kinro::export",
            KinroError::Config(_) => "kinro::config",
            KinroError::Json(_) => "kinro::json",
        }
    }

    fn help_text(&self) -> Option<&'static str> {
        let help = match self.0 {
            KinroError::Validation(_) => {
                "attribute names use letters, digits and underscores (at most 50); \
                 length properties take a whole number"
            }
            KinroError::DuplicateConnection { .. } => {
                "remove the existing connection first to change its relationship type"
            }
            KinroError::NodeNotFound(_) => "run `kinro show` to list class ids",
            KinroError::Remote(RemoteError::Transport(_)) | KinroError::Reload(_) => {
                "check that the server is running, or set --api-url / KINRO_API_URL"
            }
            KinroError::Remote(RemoteError::Decode(_)) => {
                "the server answered with an unexpected body; check the API version"
            }
            KinroError::Config(_) => "check the configuration file passed with --config",
            _ => return None,
        };
        Some(help)
    }
}

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code_str()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help_text()
            .map(|help| Box::new(help) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// Wraps a [`KinroError`] for rendering by miette.
pub fn to_reportable(err: &KinroError) -> ErrorAdapter<'_> {
    ErrorAdapter(err)
}

#[cfg(test)]
mod tests {
    use kinro::{identifier::Id, validation::ValidationError};

    use super::*;

    #[test]
    fn test_codes_are_stable() {
        let cases = [
            (
                KinroError::Validation(ValidationError::EmptyClassName),
                "kinro::validation",
            ),
            (
                KinroError::DuplicateConnection {
                    from: Id::from(1u64),
                    to: Id::from(2u64),
                },
                "kinro::duplicate",
            ),
            (KinroError::NodeNotFound(Id::new("x")), "kinro::not_found"),
            (KinroError::NoPendingConnection, "kinro::gesture"),
            (
                KinroError::Reload(RemoteError::Transport("refused".to_string())),
                "kinro::reload",
            ),
        ];

        for (err, code) in &cases {
            let adapter = to_reportable(err);
            assert_eq!(adapter.code().unwrap().to_string(), *code);
        }
    }

    #[test]
    fn test_help_for_unreachable_server() {
        let err = KinroError::Remote(RemoteError::Transport("connection refused".to_string()));
        let adapter = to_reportable(&err);

        assert!(adapter.help().unwrap().to_string().contains("KINRO_API_URL"));
        assert_eq!(
            adapter.to_string(),
            "Remote error: transport failure: connection refused"
        );
    }

    #[test]
    fn test_status_errors_have_no_help() {
        let err = KinroError::Remote(RemoteError::Status {
            method: "POST".to_string(),
            path: "/classes/".to_string(),
            status: 400,
            detail: "Class already exists".to_string(),
        });
        assert!(to_reportable(&err).help().is_none());
    }

    #[test]
    fn test_source_is_forwarded() {
        let err = KinroError::Validation(ValidationError::EmptyAttributeName);
        let adapter = to_reportable(&err);
        let source = std::error::Error::source(&adapter).unwrap();
        assert_eq!(source.to_string(), "attribute name must not be empty");
    }
}
