//! Binary catalog format: an 8-byte magic, a little-endian `u32` format
//! version, then the bincode-encoded [`CatalogArtifact`].

use std::io::{Read, Write};

use crate::debug_invariants::DebugInvariants;
use crate::extrema_error::ExtremaError;
use crate::io::{CatalogArtifact, CatalogReader, CatalogWriter};

pub const MAGIC: &[u8; 8] = b"TRIEXTR\0";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Default, Clone)]
pub struct BinaryWriter;

#[derive(Debug, Default, Clone)]
pub struct BinaryReader;

impl CatalogWriter for BinaryWriter {
    fn write<W: Write>(&self, mut writer: W, artifact: &CatalogArtifact) -> Result<(), ExtremaError> {
        writer.write_all(MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        bincode::serialize_into(&mut writer, artifact)?;
        Ok(())
    }
}

impl CatalogReader for BinaryReader {
    fn read<R: Read>(&self, mut reader: R) -> Result<CatalogArtifact, ExtremaError> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(ExtremaError::Format("not an extrema catalog".into()));
        }
        let mut version = [0u8; 4];
        reader.read_exact(&mut version)?;
        let version = u32::from_le_bytes(version);
        if version != FORMAT_VERSION {
            return Err(ExtremaError::Format(format!(
                "unsupported catalog format version {version}"
            )));
        }
        let CatalogArtifact { mesh_ref, catalog } = bincode::deserialize_from(reader)?;
        Ok(CatalogArtifact::new(mesh_ref, catalog.into_validated()?))
    }
}

/// Encode `artifact` into `writer`.
pub fn write_catalog<W: Write>(writer: W, artifact: &CatalogArtifact) -> Result<(), ExtremaError> {
    BinaryWriter.write(writer, artifact)
}

/// Decode an artifact written by [`write_catalog`]. A catalog that breaks
/// its invariants is rejected with [`ExtremaError::Invariant`].
pub fn read_catalog<R: Read>(reader: R) -> Result<CatalogArtifact, ExtremaError> {
    BinaryReader.read(reader)
}
