//! Exporters for a laid-out [`DiagramView`].

pub mod svg;

use std::{fs, path::Path};

use log::{error, info};
use thiserror::Error;

use crate::view::DiagramView;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Render error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<Error> for crate::KinroError {
    fn from(error: Error) -> Self {
        match error {
            Error::Io(err) => Self::Io(err),
            Error::Render(message) => Self::Export(message),
        }
    }
}

/// Renders a view into a document.
pub trait Exporter {
    fn render(&self, view: &DiagramView) -> Result<String, Error>;

    /// Renders `view` and writes the document to `path`.
    fn export_to_file(&self, view: &DiagramView, path: &Path) -> Result<(), Error> {
        let document = self.render(view)?;
        if let Err(err) = fs::write(path, document) {
            error!(path:? = path, err:err; "Failed to write exported diagram");
            return Err(Error::Io(err));
        }
        info!(path:? = path; "Diagram exported");
        Ok(())
    }
}
