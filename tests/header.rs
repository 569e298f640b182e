//! Header parsing against hand-written files: tolerated oddities,
//! warnings for the ignorable, hard errors for the malformed.

use nrrd::{load, load_with, Nrrd, NrrdIoState, NrrdType};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn write_and_load(content: &[u8]) -> nrrd::Result<Nrrd> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("file.nrrd");
    std::fs::write(&path, content).unwrap();
    load(&path)
}

#[test]
fn commented_header_with_key_values() {
    let nrrd = write_and_load(
        b"NRRD0002\n\
          # acquired on the old scanner\n\
          type: float\n\
          dimension: 2\n\
          # the next field is deliberately far from its friends\n\
          sizes: 2 2\n\
          encoding: ascii\n\
          spacings: 0.5 0.5\n\
          operator:=J. Doe\n\
          protocol:=T1 mapping\n\
          \n\
          0.0 1.5\n\
          -2.25 nan\n",
    )
    .unwrap();
    assert_eq!(nrrd.ty, NrrdType::Float);
    assert_eq!(nrrd.comments.len(), 2);
    assert_eq!(nrrd.kvp_get("operator"), Some("J. Doe"));
    assert_eq!(nrrd.kvp_get("protocol"), Some("T1 mapping"));
    let vals = nrrd.values::<f32>().unwrap();
    assert_eq!(&vals[..3], &[0.0, 1.5, -2.25]);
    assert!(vals[3].is_nan());
}

#[test]
fn hex_payload_with_scattered_whitespace() {
    let nrrd = write_and_load(
        b"NRRD0001\n\
          type: uchar\n\
          dimension: 1\n\
          sizes: 6\n\
          encoding: hex\n\
          \n\
          0001 02\n\
          03\n\
          \t04 05\n",
    )
    .unwrap();
    assert_eq!(nrrd.values::<u8>().unwrap(), vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn line_skip_over_junk() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("junky.txt"),
        "exported by legacy tool\ncolumns: 3\n7 8 9\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("vol.nhdr"),
        "NRRD0001\n\
         type: uchar\n\
         dimension: 1\n\
         sizes: 3\n\
         encoding: ascii\n\
         line skip: 2\n\
         data file: junky.txt\n",
    )
    .unwrap();
    let nrrd = load(dir.path().join("vol.nhdr")).unwrap();
    assert_eq!(nrrd.values::<u8>().unwrap(), vec![7, 8, 9]);
}

#[test]
fn unknown_field_warns_but_loads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("file.nrrd");
    std::fs::write(
        &path,
        "NRRD0001\n\
         type: uchar\n\
         dimension: 1\n\
         sizes: 2\n\
         flavour: salted\n\
         encoding: ascii\n\
         \n\
         1 2\n",
    )
    .unwrap();
    let mut io = NrrdIoState::new();
    let nrrd = load_with(&path, &mut io).unwrap();
    assert_eq!(nrrd.values::<u8>().unwrap(), vec![1, 2]);
    assert_eq!(io.warnings.len(), 1);
    assert!(io.warnings[0].contains("flavour"), "got: {}", io.warnings[0]);
}

#[test]
fn duplicate_field_last_wins() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("file.nrrd");
    std::fs::write(
        &path,
        "NRRD0001\n\
         type: uchar\n\
         dimension: 1\n\
         sizes: 3\n\
         sizes: 2\n\
         encoding: ascii\n\
         \n\
         5 6\n",
    )
    .unwrap();
    let mut io = NrrdIoState::new();
    let nrrd = load_with(&path, &mut io).unwrap();
    assert_eq!(nrrd.sizes(), vec![2]);
    assert!(io.warnings.iter().any(|w| w.contains("more than once")));
}

#[test]
fn legacy_magic() {
    let nrrd = write_and_load(
        b"NRRD00.01\n\
          type: uchar\n\
          dimension: 1\n\
          sizes: 1\n\
          encoding: ascii\n\
          \n\
          42\n",
    )
    .unwrap();
    assert_eq!(nrrd.values::<u8>().unwrap(), vec![42]);
}

#[test]
fn field_name_aliases() {
    let nrrd = write_and_load(
        b"NRRD0001\n\
          type: unsigned char\n\
          dimension: 2\n\
          sizes: 2 2\n\
          centerings: cell node\n\
          axismins: 0 10\n\
          axismaxs: 1 20\n\
          encoding: ascii\n\
          \n\
          1 2 3 4\n",
    )
    .unwrap();
    assert_eq!(nrrd.axes[0].center, nrrd::Centering::Cell);
    assert_eq!(nrrd.axes[1].center, nrrd::Centering::Node);
    assert_eq!(nrrd.axes[1].min, 10.0);
    assert_eq!(nrrd.axes[1].max, 20.0);
}

#[test]
fn hard_errors() {
    // bad magic
    assert!(write_and_load(b"NRRD9000\ntype: uchar\n").is_err());
    // sizes before dimension
    assert!(write_and_load(
        b"NRRD0001\ntype: uchar\nsizes: 2\ndimension: 1\nencoding: ascii\n\n1 2\n"
    )
    .is_err());
    // no encoding
    assert!(
        write_and_load(b"NRRD0001\ntype: uchar\ndimension: 1\nsizes: 1\n\n9\n").is_err()
    );
    // payload shorter than the sizes promise
    assert!(write_and_load(
        b"NRRD0001\ntype: uchar\ndimension: 1\nsizes: 5\nencoding: ascii\n\n1 2 3\n"
    )
    .is_err());
    // wrong token count for a per-axis field
    assert!(write_and_load(
        b"NRRD0001\ntype: uchar\ndimension: 2\nsizes: 2 2\nspacings: 1\nencoding: ascii\n\n1 2 3 4\n"
    )
    .is_err());
}

#[test]
fn error_leaves_a_biff_trail() {
    nrrd::biff::clear(nrrd::biff::NRRD);
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.nrrd");
    std::fs::write(&path, b"NRRD0001\ntype: uchar\n").unwrap();
    assert!(load(&path).is_err());
    let trail = nrrd::biff::get_done(nrrd::biff::NRRD);
    // innermost cause first, load context last
    assert!(trail.contains("didn't see required field"), "got: {}", trail);
    assert!(trail.contains("trouble reading"), "got: {}", trail);
}
