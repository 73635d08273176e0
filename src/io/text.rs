//! Human-readable mirror of a catalog.
//!
//! ```text
//! # tri-extrema catalog
//! mesh_ref <ref>
//! meta <key> <value>
//! time_step <t> objects <n>
//! object <origin> position <x> <y> <z> intensity <v> delta <d> background <b|-> steering <dx> <dy> <dz>|- labels <l1,l2,...>
//! ```
//!
//! Floats are printed with `{:?}` so they read back to the same value.

use std::io::Write;

use itertools::Itertools;

use crate::extrema::catalog::ExtremumPoint;
use crate::extrema_error::ExtremaError;
use crate::io::{CatalogArtifact, CatalogWriter};

#[derive(Debug, Default, Clone)]
pub struct TextWriter;

fn write_point<W: Write>(writer: &mut W, p: &ExtremumPoint) -> Result<(), ExtremaError> {
    let [x, y, z] = p.position;
    write!(
        writer,
        "object {} position {x:?} {y:?} {z:?} intensity {:?} delta {:?}",
        p.origin, p.intensity, p.delta
    )?;
    match p.background {
        Some(b) => write!(writer, " background {b:?}")?,
        None => write!(writer, " background -")?,
    }
    match p.steering {
        Some([dx, dy, dz]) => write!(writer, " steering {dx:?} {dy:?} {dz:?}")?,
        None => write!(writer, " steering -")?,
    }
    writeln!(writer, " labels {}", p.labels.iter().join(","))?;
    Ok(())
}

impl CatalogWriter for TextWriter {
    fn write<W: Write>(&self, mut writer: W, artifact: &CatalogArtifact) -> Result<(), ExtremaError> {
        writeln!(writer, "# tri-extrema catalog")?;
        writeln!(writer, "mesh_ref {}", artifact.mesh_ref)?;
        for (k, v) in artifact.catalog.meta() {
            writeln!(writer, "meta {k} {v}")?;
        }
        for t in artifact.catalog.time_steps() {
            let points = artifact.catalog.objects_at(t);
            writeln!(writer, "time_step {t} objects {}", points.len())?;
            for p in points {
                write_point(&mut writer, p)?;
            }
        }
        Ok(())
    }
}

/// Write the text mirror of `artifact` into `writer`.
pub fn write_catalog<W: Write>(writer: W, artifact: &CatalogArtifact) -> Result<(), ExtremaError> {
    TextWriter.write(writer, artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extrema::catalog::{ExtremaCatalog, MetaData};
    use crate::topology::point::TriLabel;

    #[test]
    fn mirrors_every_object() {
        let mut meta = MetaData::new();
        meta.insert("method".into(), "minima".into());
        let mut catalog = ExtremaCatalog::new(meta);
        catalog.begin_time_step(0).unwrap();
        catalog
            .add(
                1,
                ExtremumPoint {
                    time_step: 1,
                    origin: TriLabel::new(3),
                    labels: [3u64, 4].into_iter().map(TriLabel::new).collect(),
                    position: [0.0, 0.5, 1.0],
                    intensity: -10.0,
                    delta: 0.0,
                    background: None,
                    steering: Some([0.0, 0.0, 0.25]),
                    steered_position: Some([0.0, 0.5, 1.25]),
                },
            )
            .unwrap();
        let mut out = Vec::new();
        write_catalog(&mut out, &CatalogArtifact::new("patch", catalog)).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "# tri-extrema catalog",
                "mesh_ref patch",
                "meta method minima",
                "time_step 0 objects 0",
                "time_step 1 objects 1",
                "object 3 position 0.0 0.5 1.0 intensity -10.0 delta 0.0 background - steering 0.0 0.0 0.25 labels 3,4",
            ]
        );
    }
}
