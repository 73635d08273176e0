//! Persistence gateway for extrema catalogs.
//!
//! A catalog is persisted together with the reference of the mesh it was
//! computed on. [`binary`] is the lossless format that can be read back;
//! [`text`] writes a human-readable mirror of the same content.

pub mod binary;
pub mod text;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::extrema::catalog::ExtremaCatalog;
use crate::extrema_error::ExtremaError;

/// What gets persisted: the catalog plus the mesh it refers to.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CatalogArtifact {
    pub mesh_ref: String,
    pub catalog: ExtremaCatalog,
}

impl CatalogArtifact {
    pub fn new(mesh_ref: impl Into<String>, catalog: ExtremaCatalog) -> Self {
        Self {
            mesh_ref: mesh_ref.into(),
            catalog,
        }
    }
}

/// Trait for catalog writers.
pub trait CatalogWriter {
    /// Serialize `artifact` into `writer`.
    fn write<W: Write>(&self, writer: W, artifact: &CatalogArtifact) -> Result<(), ExtremaError>;
}

/// Trait for catalog readers.
pub trait CatalogReader {
    /// Parse an artifact from `reader`.
    fn read<R: Read>(&self, reader: R) -> Result<CatalogArtifact, ExtremaError>;
}

/// Path of the text mirror written next to the binary artifact at `path`.
pub fn text_mirror_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".txt");
    PathBuf::from(s)
}

/// Write the binary artifact to `path` and, if asked, its text mirror to
/// `path` + `.txt`.
pub fn save_catalog(path: &Path, artifact: &CatalogArtifact, with_text: bool) -> Result<(), ExtremaError> {
    let mut out = BufWriter::new(File::create(path)?);
    binary::BinaryWriter.write(&mut out, artifact)?;
    out.flush()?;
    if with_text {
        let mirror = text_mirror_path(path);
        let mut out = BufWriter::new(File::create(&mirror)?);
        text::TextWriter.write(&mut out, artifact)?;
        out.flush()?;
    }
    log::info!(
        "wrote {} objects over {} time steps to {}",
        artifact.catalog.len(),
        artifact.catalog.time_steps().count(),
        path.display()
    );
    Ok(())
}

/// Read a binary artifact written by [`save_catalog`].
pub fn load_catalog(path: &Path) -> Result<CatalogArtifact, ExtremaError> {
    binary::BinaryReader.read(BufReader::new(File::open(path)?))
}
