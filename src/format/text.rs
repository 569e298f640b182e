//! Plain-text tables: one row of whitespace-separated numbers per line.
//! Reads produce a 2-D array (columns fastest); values default to
//! `double` unless a `# type:` comment says otherwise. Metadata rides in
//! `#` comments the same way PNM does, unless `bare_text` suppresses it.

use super::field::{self, Field};
use super::Format;
use crate::encoding::{self, NrrdEncoding};
use crate::error::{NrrdError, Result};
use crate::io::NrrdIoState;
use crate::object::Nrrd;
use crate::typedef::NrrdType;
use crate::util::{self, DataInput};
use std::io::Write;

/// The plain-text container format.
#[derive(Debug)]
pub struct Text;

fn numeric_line(line: &str) -> bool {
    let mut any = false;
    for tok in line.split_whitespace() {
        if <f64 as crate::typedef::NrrdElement>::parse_token(tok).is_none() {
            return false;
        }
        any = true;
    }
    any
}

impl Format for Text {
    fn name(&self) -> &'static str {
        "text"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["txt", "text", "ascii"]
    }

    fn fits(&self, nrrd: &Nrrd, _io: &NrrdIoState) -> bool {
        nrrd.dim() <= 2 && nrrd.ty != NrrdType::Block && nrrd.ty != NrrdType::Unknown
    }

    fn sniff(&self, start: &[u8]) -> bool {
        let line = match start.split(|&b| b == b'\n').next() {
            Some(l) => l,
            None => return false,
        };
        match std::str::from_utf8(line) {
            Ok(s) => s.starts_with('#') || numeric_line(s),
            Err(_) => false,
        }
    }

    fn read(&self, src: &mut dyn DataInput, nrrd: &mut Nrrd, io: &mut NrrdIoState) -> Result<()> {
        let me = "text read";
        *nrrd = Nrrd::new();
        io.encoding = &encoding::Ascii;

        let mut comments: Vec<String> = Vec::new();
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut ty = NrrdType::Double;
        while let Some(line) = util::read_line(src)? {
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if let Some(c) = line.strip_prefix('#') {
                let c = c.trim();
                // the value type is the one field that must be known
                // before the numbers are parsed
                if let Some(rest) = c.strip_prefix("type: ") {
                    ty = NrrdType::from_name(rest).ok_or_else(|| {
                        NrrdError::parse(format!("{}: unknown type \"{}\"", me, rest))
                    })?;
                    if ty == NrrdType::Block || ty == NrrdType::Unknown {
                        return Err(NrrdError::parse(format!(
                            "{}: type \"{}\" can't live in a text file",
                            me, rest
                        )));
                    }
                } else {
                    comments.push(c.to_string());
                }
                continue;
            }
            let toks: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            if let Some(first) = rows.first() {
                if toks.len() != first.len() {
                    return Err(NrrdError::parse(format!(
                        "{}: line {} has {} values, earlier lines had {}",
                        me,
                        rows.len() + 1,
                        toks.len(),
                        first.len()
                    )));
                }
            }
            rows.push(toks);
        }
        if rows.is_empty() {
            return Err(NrrdError::parse(format!("{}: no values found", me)));
        }

        let cols = rows[0].len();
        let mut data = Vec::with_capacity(cols * rows.len() * ty.size_of());
        for row in &rows {
            for tok in row {
                ty.parse_value(tok, &mut data)?;
            }
        }
        nrrd.ty = ty;
        nrrd.axes = [cols, rows.len()]
            .iter()
            .map(|&s| crate::axis::Axis::sized(s))
            .collect();
        nrrd.data = data;

        for c in comments {
            if !field::parse_comment_metadata(nrrd, io, &c)? {
                nrrd.comment_add(&c);
            }
        }
        nrrd.check()
    }

    fn write(&self, dst: &mut dyn Write, nrrd: &Nrrd, io: &mut NrrdIoState) -> Result<()> {
        let me = "text write";
        if !self.fits(nrrd, io) {
            return Err(NrrdError::unsupported(format!(
                "{}: only 1-D or 2-D scalar arrays fit in plain text",
                me
            )));
        }
        if !io.bare_text {
            let mut header = String::new();
            if nrrd.ty != NrrdType::Double {
                header.push_str(&format!("# {}: {}\n", Field::Type.name(), nrrd.ty.name()));
            }
            for line in field::foreign_field_lines(nrrd, io) {
                header.push_str(&format!("# {}\n", line));
            }
            for c in &nrrd.comments {
                header.push_str(&format!("# {}\n", c));
            }
            util::write_all_chunked(dst, header.as_bytes(), me)?;
        }
        encoding::Ascii.write(dst, &nrrd.data, nrrd, io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Unseekable;
    use std::io::Cursor;

    fn read_str(text: &str) -> Result<Nrrd> {
        let mut io = NrrdIoState::new();
        let mut nrrd = Nrrd::new();
        let mut src = Unseekable(Cursor::new(text.as_bytes().to_vec()));
        Text.read(&mut src, &mut nrrd, &mut io)?;
        Ok(nrrd)
    }

    #[test]
    fn table_of_doubles() {
        let nrrd = read_str("1 2 3\n4 5 6\n").unwrap();
        assert_eq!(nrrd.ty, NrrdType::Double);
        assert_eq!(nrrd.sizes(), vec![3, 2]);
        assert_eq!(
            nrrd.values::<f64>().unwrap(),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn typed_by_comment() {
        let nrrd = read_str("# type: int\n# note to self\n10 20\n30 40\n").unwrap();
        assert_eq!(nrrd.ty, NrrdType::Int32);
        assert_eq!(nrrd.values::<i32>().unwrap(), vec![10, 20, 30, 40]);
        assert_eq!(nrrd.comments, vec!["note to self".to_string()]);
    }

    #[test]
    fn ragged_rows_rejected() {
        assert!(read_str("1 2 3\n4 5\n").is_err());
    }

    #[test]
    fn write_bare_and_round_trip() {
        let nrrd = Nrrd::from_vec(vec![1.5f64, 2.0, 3.0, 4.5], &[2, 2]).unwrap();
        let mut io = NrrdIoState::new();
        let mut bytes = Vec::new();
        Text.write(&mut bytes, &nrrd, &mut io).unwrap();
        assert_eq!(String::from_utf8(bytes.clone()).unwrap(), "1.5 2\n3 4.5\n");
        let back = read_str(std::str::from_utf8(&bytes).unwrap()).unwrap();
        assert_eq!(back.values::<f64>().unwrap(), vec![1.5, 2.0, 3.0, 4.5]);
    }

    #[test]
    fn write_with_metadata() {
        let mut nrrd = Nrrd::from_vec(vec![1u16, 2], &[2]).unwrap();
        nrrd.axes[0].min = 0.0;
        nrrd.axes[0].max = 10.0;
        let mut io = NrrdIoState::new();
        io.bare_text = false;
        let mut bytes = Vec::new();
        Text.write(&mut bytes, &nrrd, &mut io).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("# type: uint16"));
        assert!(text.contains("# axis mins: 0"));
        assert!(text.ends_with("1 2\n"));
    }

    #[test]
    fn sniffing() {
        assert!(Text.sniff(b"1 2 3\n4 5 6\n"));
        assert!(Text.sniff(b"# type: float\n1\n"));
        assert!(Text.sniff(b"-1.5e3 nan\n"));
        assert!(!Text.sniff(b"NRRD0001\n"));
        assert!(!Text.sniff(b"P5\n"));
        assert!(!Text.sniff(b"\n"));
    }
}
