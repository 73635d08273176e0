mod support;

use support::{field_with, fields_with, patch, strip_mesh};
use tri_extrema::io::{self, binary, text};
use tri_extrema::prelude::*;

fn sample_catalog() -> ExtremaCatalog {
    let mesh = patch();
    let field = fields_with(
        &mesh,
        &[
            (0.0, &[(3, -10.0), (9, -7.5)]),
            (1.0, &[]),
            (0.0, &[(6, -2.25)]),
        ],
    );
    ExtremaLocator::new("minima(1,10)", "uniform(0,0.001,0)", DetectionOpts::default())
        .unwrap()
        .locate(&mesh, &field)
        .unwrap()
}

#[test]
fn binary_roundtrip_is_exact() {
    let artifact = CatalogArtifact::new("strip-6", sample_catalog());
    let mut buf = Vec::new();
    binary::write_catalog(&mut buf, &artifact).unwrap();
    let back = binary::read_catalog(&buf[..]).unwrap();
    assert_eq!(back, artifact);
    assert_eq!(back.catalog.objects_at(0).len(), 2);
    assert!(back.catalog.objects_at(1).is_empty());
    assert_eq!(back.catalog.meta(), artifact.catalog.meta());
}

#[test]
fn save_and_load_through_files() {
    let dir = std::env::temp_dir().join(format!("tri-extrema-io-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("catalog.bin");
    let artifact = CatalogArtifact::new("strip-6", sample_catalog());

    io::save_catalog(&path, &artifact, true).unwrap();
    assert_eq!(io::load_catalog(&path).unwrap(), artifact);

    let mirror = std::fs::read_to_string(io::text_mirror_path(&path)).unwrap();
    assert!(mirror.starts_with("# tri-extrema catalog\nmesh_ref strip-6\n"));
    assert!(mirror.contains("time_step 1 objects 0"));
    assert_eq!(mirror.lines().filter(|l| l.starts_with("object ")).count(), artifact.catalog.len());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn text_mirror_lists_labels_in_order() {
    let mesh = patch();
    let field = field_with(&mesh, 0.0, &[(3, -10.0), (1, -5.0), (2, -5.0), (4, -5.0), (5, -5.0)]);
    let catalog = ExtremaLocator::new("minima(5)", "", DetectionOpts::default())
        .unwrap()
        .locate(&mesh, &field)
        .unwrap();
    let mut out = Vec::new();
    text::write_catalog(&mut out, &CatalogArtifact::new("patch", catalog)).unwrap();
    let out = String::from_utf8(out).unwrap();
    let object = out.lines().find(|l| l.starts_with("object ")).unwrap();
    assert!(object.starts_with("object 3 position "));
    assert!(object.ends_with(" background - steering - labels 1,2,3,4,5"));
    assert!(out.contains("meta method minima\n"));
}

#[test]
fn repeated_runs_are_byte_identical() {
    let mesh = strip_mesh(8, true);
    let field = tri_extrema::data::field::FieldSection::from_fn(
        mesh.iter().map(|t| t.label).collect::<Vec<_>>(),
        2,
        |label, t| (((label.get() * 37 + t as u64 * 11) % 17) as f64) - 8.0,
    );
    let run = || {
        let catalog = ExtremaLocator::new("minima(3,40)", "", DetectionOpts::default())
            .unwrap()
            .locate(&mesh, &field)
            .unwrap();
        let mut buf = Vec::new();
        binary::write_catalog(&mut buf, &CatalogArtifact::new("strip-8", catalog)).unwrap();
        buf
    };
    assert_eq!(run(), run());
}
