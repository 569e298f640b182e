//! Private utility module: header-line and token scanning, string
//! escaping, chunked bulk I/O, and the seekable-input abstraction.

use crate::error::{NrrdError, Result};
use crate::typedef::NrrdElement;
use std::io::{self, BufRead, Read, Seek, SeekFrom, Write};

/// Upper bound on the bytes moved per read/write call. Bulk I/O is
/// always chunked at this size; a portability contract, not an
/// optimization.
pub const MAX_CHUNK: usize = 1 << 30;

/// A payload input source. Formats read headers and payload bytes
/// through this; `skip_from_end` is the one capability beyond `BufRead`,
/// needed for tail-relative byte skipping, and only file-backed sources
/// can offer it.
pub trait DataInput: BufRead {
    /// Position the stream `nbytes` before its end.
    fn skip_from_end(&mut self, nbytes: u64) -> Result<()>;
}

/// [`DataInput`] over anything seekable.
#[derive(Debug)]
pub struct Seekable<R>(pub R);

impl<R: BufRead + Seek> Read for Seekable<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R: BufRead + Seek> BufRead for Seekable<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.0.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.0.consume(amt)
    }
}

impl<R: BufRead + Seek> DataInput for Seekable<R> {
    fn skip_from_end(&mut self, nbytes: u64) -> Result<()> {
        let _ = self.0.seek(SeekFrom::End(-(nbytes as i64)))?;
        Ok(())
    }
}

/// [`DataInput`] over a plain stream; tail-relative skips are refused.
#[derive(Debug)]
pub struct Unseekable<R>(pub R);

impl<R: BufRead> Read for Unseekable<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R: BufRead> BufRead for Unseekable<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.0.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.0.consume(amt)
    }
}

impl<R: BufRead> DataInput for Unseekable<R> {
    fn skip_from_end(&mut self, _nbytes: u64) -> Result<()> {
        Err(NrrdError::unsupported(
            "skip_from_end: input is not seekable (byte skip -1 needs a file)".to_string(),
        ))
    }
}

/// Read one text line, without its `\n` (and `\r`, for DOS files).
/// `None` at end of input.
pub fn read_line(src: &mut dyn BufRead) -> Result<Option<String>> {
    let mut raw = Vec::new();
    let n = src.read_until(b'\n', &mut raw)?;
    if n == 0 {
        return Ok(None);
    }
    if raw.last() == Some(&b'\n') {
        raw.pop();
    }
    if raw.last() == Some(&b'\r') {
        raw.pop();
    }
    String::from_utf8(raw)
        .map(Some)
        .map_err(|_| NrrdError::parse("read_line: line is not valid UTF-8".to_string()))
}

/// Consume and discard `n` text lines.
pub fn skip_lines(src: &mut dyn BufRead, n: usize) -> Result<()> {
    for i in 0..n {
        if read_line(src)?.is_none() {
            return Err(NrrdError::parse(format!(
                "skip_lines: hit end of input skipping line {} of {}",
                i + 1,
                n
            )));
        }
    }
    Ok(())
}

/// Consume and discard `n` bytes.
pub fn skip_bytes(src: &mut dyn Read, n: u64) -> Result<()> {
    let copied = io::copy(&mut src.take(n), &mut io::sink())?;
    if copied != n {
        return Err(NrrdError::short_read(
            "skip_bytes",
            copied as usize,
            n as usize,
        ));
    }
    Ok(())
}

/// Next whitespace-delimited token, or `None` at end of input.
pub fn next_token(src: &mut dyn BufRead) -> Result<Option<String>> {
    let mut tok = Vec::new();
    loop {
        let (used, done) = {
            let buf = src.fill_buf()?;
            if buf.is_empty() {
                break;
            }
            let mut used = 0;
            let mut done = false;
            for &b in buf {
                if b.is_ascii_whitespace() {
                    if tok.is_empty() {
                        used += 1;
                        continue;
                    }
                    done = true;
                    break;
                }
                tok.push(b);
                used += 1;
            }
            (used, done)
        };
        src.consume(used);
        if done {
            break;
        }
    }
    if tok.is_empty() {
        Ok(None)
    } else {
        String::from_utf8(tok)
            .map(Some)
            .map_err(|_| NrrdError::parse("next_token: token is not valid UTF-8".to_string()))
    }
}

/// Fill `buf` exactly, reading at most [`MAX_CHUNK`] bytes per call.
/// The failure message counts elements of `elem_size` bytes.
pub fn read_exact_chunked(
    src: &mut dyn Read,
    buf: &mut [u8],
    elem_size: usize,
    me: &str,
) -> Result<()> {
    let total = buf.len();
    let mut got = 0;
    while got < total {
        let want = (total - got).min(MAX_CHUNK);
        match src.read(&mut buf[got..got + want]) {
            Ok(0) => {
                return Err(NrrdError::short_read(
                    me,
                    got / elem_size.max(1),
                    total / elem_size.max(1),
                ));
            }
            Ok(n) => got += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Write all of `buf`, offering at most [`MAX_CHUNK`] bytes per call.
/// The failure message counts bytes written vs expected.
pub fn write_all_chunked(dst: &mut dyn Write, buf: &[u8], me: &str) -> Result<()> {
    let total = buf.len();
    let mut written = 0;
    while written < total {
        let want = (total - written).min(MAX_CHUNK);
        match dst.write(&buf[written..written + want]) {
            Ok(0) => return Err(NrrdError::short_write(me, written, total)),
            Ok(n) => written += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Reverse the bytes of every `elem_size`-sized element in place.
pub fn swap_endian(buf: &mut [u8], elem_size: usize) {
    if elem_size > 1 {
        for chunk in buf.chunks_exact_mut(elem_size) {
            chunk.reverse();
        }
    }
}

/// Escape backslashes and newlines, for `key:=value` header lines.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Undo [`escape`]; an unknown escape keeps its backslash.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Print a double so it reads back bit-equal; non-finite values use the
/// header spellings `nan`, `inf`, `-inf`.
pub fn fmt_double(v: f64) -> String {
    <f64 as NrrdElement>::format_token(v)
}

/// Parse a double, accepting `nan`/`inf`/`-inf` in any case.
pub fn parse_double(tok: &str) -> Result<f64> {
    <f64 as NrrdElement>::parse_token(tok.trim())
        .ok_or_else(|| NrrdError::parse(format!("parse_double: couldn't parse \"{}\"", tok)))
}

/// Parse exactly `n` whitespace-separated doubles.
pub fn parse_doubles(value: &str, n: usize, what: &str) -> Result<Vec<f64>> {
    let toks: Vec<&str> = value.split_whitespace().collect();
    if toks.len() != n {
        return Err(NrrdError::parse(format!(
            "parse_doubles: got {} values for \"{}\", needed {}",
            toks.len(),
            what,
            n
        )));
    }
    toks.iter().map(|t| parse_double(t)).collect()
}

/// Parse exactly `n` whitespace-separated non-negative integers.
pub fn parse_sizes(value: &str, n: usize, what: &str) -> Result<Vec<usize>> {
    let toks: Vec<&str> = value.split_whitespace().collect();
    if toks.len() != n {
        return Err(NrrdError::parse(format!(
            "parse_sizes: got {} values for \"{}\", needed {}",
            toks.len(),
            what,
            n
        )));
    }
    toks.iter()
        .map(|t| {
            t.parse().map_err(|_| {
                NrrdError::parse(format!("parse_sizes: couldn't parse \"{}\" for {}", t, what))
            })
        })
        .collect()
}

/// Parse `n` double-quoted strings (`"..."`), separated by whitespace,
/// honoring `\"` and `\\` escapes.
pub fn parse_quoted_strings(value: &str, n: usize, what: &str) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(n);
    let mut chars = value.chars().peekable();
    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            let _ = chars.next();
        }
        match chars.next() {
            None => break,
            Some('"') => {}
            Some(c) => {
                return Err(NrrdError::parse(format!(
                    "parse_quoted_strings: expected '\"' for {}, found '{}'",
                    what, c
                )));
            }
        }
        let mut s = String::new();
        loop {
            match chars.next() {
                None => {
                    return Err(NrrdError::parse(format!(
                        "parse_quoted_strings: unterminated string for {}",
                        what
                    )));
                }
                Some('"') => break,
                Some('\\') => match chars.next() {
                    Some('"') => s.push('"'),
                    Some('\\') => s.push('\\'),
                    Some('n') => s.push('\n'),
                    Some(other) => {
                        s.push('\\');
                        s.push(other);
                    }
                    None => {
                        return Err(NrrdError::parse(format!(
                            "parse_quoted_strings: unterminated string for {}",
                            what
                        )));
                    }
                },
                Some(c) => s.push(c),
            }
        }
        out.push(s);
    }
    if out.len() != n {
        return Err(NrrdError::parse(format!(
            "parse_quoted_strings: got {} strings for \"{}\", needed {}",
            out.len(),
            what,
            n
        )));
    }
    Ok(out)
}

/// Quote a string for a header line, escaping `"`, `\` and newlines.
pub fn format_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Parse a parenthesized vector `(a,b,c)`; callers check the component
/// count against what the field requires.
pub fn parse_vector(tok: &str, what: &str) -> Result<Vec<f64>> {
    let tok = tok.trim();
    let inner = tok
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(|| {
            NrrdError::parse(format!(
                "parse_vector: \"{}\" for {} is not of the form (a,b,...)",
                tok, what
            ))
        })?;
    inner
        .split(',')
        .map(|c| parse_double(c))
        .collect::<Result<Vec<f64>>>()
}

/// Print a vector as `(a,b,c)` with round-trippable components.
pub fn format_vector(v: &[f64]) -> String {
    let comps: Vec<String> = v.iter().map(|&c| fmt_double(c)).collect();
    format!("({})", comps.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn lines_and_tokens() {
        let mut src = Cursor::new(b"one\r\ntwo\n\nlast".to_vec());
        assert_eq!(read_line(&mut src).unwrap().as_deref(), Some("one"));
        assert_eq!(read_line(&mut src).unwrap().as_deref(), Some("two"));
        assert_eq!(read_line(&mut src).unwrap().as_deref(), Some(""));
        assert_eq!(read_line(&mut src).unwrap().as_deref(), Some("last"));
        assert_eq!(read_line(&mut src).unwrap(), None);

        let mut src = Cursor::new(b"  1 22\n 333\t4 ".to_vec());
        let mut toks = Vec::new();
        while let Some(t) = next_token(&mut src).unwrap() {
            toks.push(t);
        }
        assert_eq!(toks, vec!["1", "22", "333", "4"]);
    }

    #[test]
    fn escaping() {
        assert_eq!(escape("a\nb\\c"), "a\\nb\\\\c");
        assert_eq!(unescape("a\\nb\\\\c"), "a\nb\\c");
        assert_eq!(unescape("odd\\q"), "odd\\q");
    }

    #[test]
    fn quoted_strings() {
        let v = parse_quoted_strings(r#""x" "say \"hi\"" "a\\b""#, 3, "labels").unwrap();
        assert_eq!(v, vec!["x", "say \"hi\"", "a\\b"]);
        assert!(parse_quoted_strings(r#""x""#, 2, "labels").is_err());
        assert_eq!(format_quoted("say \"hi\""), r#""say \"hi\"""#);
    }

    #[test]
    fn vectors() {
        let v = parse_vector("(1,2.5,nan)", "space origin").unwrap();
        assert_eq!(v[0], 1.0);
        assert_eq!(v[1], 2.5);
        assert!(v[2].is_nan());
        assert_eq!(format_vector(&[1.0, 2.5]), "(1,2.5)");
        assert!(parse_vector("1,2", "x").is_err());
    }

    #[test]
    fn endian_swap() {
        let mut buf = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        swap_endian(&mut buf, 4);
        assert_eq!(buf, vec![4, 3, 2, 1, 8, 7, 6, 5]);
        let mut one = vec![1u8, 2];
        swap_endian(&mut one, 1);
        assert_eq!(one, vec![1, 2]);
    }

    #[test]
    fn short_write_counts() {
        struct Half(Vec<u8>, usize);
        impl std::io::Write for Half {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                let n = buf.len().min(self.1.saturating_sub(self.0.len()));
                self.0.extend_from_slice(&buf[..n]);
                Ok(n)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let mut w = Half(Vec::new(), 3);
        let err = write_all_chunked(&mut w, &[0u8; 6], "test").unwrap_err();
        match err {
            NrrdError::ShortWrite(got, expected) => {
                assert_eq!((got, expected), (3, 6));
            }
            other => panic!("wrong error: {:?}", other),
        }
    }
}
