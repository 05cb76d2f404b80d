use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Lines read from a file plus the number of bytes that were actually read.
/// A missing final terminator is supplied but not counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResult {
    pub bytes: usize,
    pub lines: Vec<String>,
}

pub fn read_file(path: &Path) -> io::Result<ReadResult> {
    let file = File::open(path)?;
    let result = read_lines(BufReader::new(file))?;
    debug!(path = %path.display(), bytes = result.bytes, lines = result.lines.len(), "read file");
    Ok(result)
}

pub fn read_lines<R: BufRead>(mut reader: R) -> io::Result<ReadResult> {
    let mut lines = Vec::new();
    let mut bytes = 0;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            break;
        }
        bytes += n;
        let mut line = String::from_utf8_lossy(&buf).into_owned();
        if !line.ends_with('\n') {
            line.push('\n');
        }
        lines.push(line);
    }
    Ok(ReadResult { bytes, lines })
}

/// Writes `lines` to `path`, truncating it unless `append` is set. Returns
/// the byte count.
pub fn write_file<'a, I>(path: &Path, lines: I, append: bool) -> io::Result<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    let mut writer = BufWriter::new(file);
    let bytes = write_lines(&mut writer, lines)?;
    writer.flush()?;
    debug!(path = %path.display(), bytes, append, "wrote file");
    Ok(bytes)
}

pub fn write_lines<'a, W, I>(writer: &mut W, lines: I) -> io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a str>,
{
    let mut bytes = 0;
    for line in lines {
        writer.write_all(line.as_bytes())?;
        bytes += line.len();
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_lines_keeps_terminators() {
        let result = read_lines(Cursor::new("one\ntwo\n")).unwrap();
        assert_eq!(result.bytes, 8);
        assert_eq!(result.lines, vec!["one\n", "two\n"]);
    }

    #[test]
    fn test_missing_final_newline_is_supplied() {
        let result = read_lines(Cursor::new("one\ntwo")).unwrap();
        assert_eq!(result.bytes, 7);
        assert_eq!(result.lines, vec!["one\n", "two\n"]);
    }

    #[test]
    fn test_empty_input() {
        let result = read_lines(Cursor::new("")).unwrap();
        assert_eq!(result.bytes, 0);
        assert!(result.lines.is_empty());
    }

    #[test]
    fn test_write_then_read_file() {
        let file = NamedTempFile::new().unwrap();
        let bytes = write_file(file.path(), ["a\n", "bc\n"], false).unwrap();
        assert_eq!(bytes, 5);
        let result = read_file(file.path()).unwrap();
        assert_eq!(result.lines, vec!["a\n", "bc\n"]);
    }

    #[test]
    fn test_append_and_truncate() {
        let file = NamedTempFile::new().unwrap();
        write_file(file.path(), ["a\n"], false).unwrap();
        write_file(file.path(), ["b\n"], true).unwrap();
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "a\nb\n");

        write_file(file.path(), ["c\n"], false).unwrap();
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "c\n");
    }

    #[test]
    fn test_read_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_file(&dir.path().join("absent")).is_err());
    }
}
