use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

// Same buffer size as a grep-like scan; log files are read once, front
// to back.
const BUFSIZ: usize = 128 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum LogSourceError {
    #[error(
        "An error occurred while reading the log file: {}: {source}",
        .path.display()
    )]
    Open { path: PathBuf, source: io::Error },
    #[error(
        "An error occurred while reading the log file: {}:{lineno}: {source}",
        .path.display()
    )]
    Read {
        path: PathBuf,
        lineno: usize,
        source: io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum OutputSinkError {
    #[error(
        "An error occurred while writing to the output file: {}: {source}",
        .path.display()
    )]
    Open { path: PathBuf, source: io::Error },
    #[error(
        "An error occurred while writing to the output file: {}: {source}",
        .path.display()
    )]
    Write { path: PathBuf, source: io::Error },
}

/// One-shot line source over a log. Yields raw lines (without the line
/// terminator) so undecodable bytes end up as per-line parse failures
/// instead of aborting the read.
pub struct LogLines<R> {
    path: PathBuf,
    reader: R,
    lineno: usize,
    done: bool,
}

impl LogLines<Box<dyn BufRead>> {
    pub fn open(path: &Path) -> Result<Self, LogSourceError> {
        match File::open(path) {
            Ok(f) => {
                debug!(path = %path.display(), "opened log file");
                Ok(LogLines::new(
                    path,
                    Box::new(BufReader::with_capacity(BUFSIZ, f)),
                ))
            }
            Err(source) => Err(LogSourceError::Open {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl<R: BufRead> LogLines<R> {
    pub fn new(path: &Path, reader: R) -> Self {
        LogLines {
            path: path.to_path_buf(),
            reader,
            lineno: 0,
            done: false,
        }
    }

    pub fn lineno(&self) -> usize {
        self.lineno
    }
}

impl<R: BufRead> Iterator for LogLines<R> {
    type Item = Result<Vec<u8>, LogSourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                self.lineno += 1;
                // Works for files without a trailing newline too.
                if line.last() == Some(&b'\n') {
                    line.pop();
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                }
                Some(Ok(line))
            }
            Err(source) => {
                self.done = true;
                Some(Err(LogSourceError::Read {
                    path: self.path.clone(),
                    lineno: self.lineno + 1,
                    source,
                }))
            }
        }
    }
}

/// Open `path` for appending (creating it if needed), hand a buffered
/// writer to `f`, and flush before returning. The file handle is closed
/// when this returns, on success and on failure alike.
pub fn append_to<F>(path: &Path, f: F) -> Result<(), OutputSinkError>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| OutputSinkError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), "opened output file for appending");

    let mut writer = BufWriter::new(file);
    f(&mut writer)
        .and_then(|()| writer.flush())
        .map_err(|source| OutputSinkError::Write {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use tempfile::tempdir;

    fn collect(input: &[u8]) -> Vec<Vec<u8>> {
        LogLines::new(Path::new("(test)"), Cursor::new(input.to_vec()))
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn test_lines_strip_terminators() {
        assert_eq!(
            collect(b"a\nb\r\n\nc"),
            vec![b"a".to_vec(), b"b".to_vec(), b"".to_vec(), b"c".to_vec()]
        );
        assert!(collect(b"").is_empty());
    }

    #[test]
    fn test_lines_count() {
        let mut lines =
            LogLines::new(Path::new("(test)"), Cursor::new(b"x\ny\n".to_vec()));
        assert_eq!(lines.lineno(), 0);
        lines.next();
        lines.next();
        assert!(lines.next().is_none());
        assert_eq!(lines.lineno(), 2);
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_open_missing_file() {
        let path = Path::new("/nonexistent/iplogtally/access.log");
        match LogLines::open(path) {
            Err(LogSourceError::Open { path: p, .. }) => assert_eq!(p, path),
            Err(e) => panic!("unexpected error {e}"),
            Ok(_) => panic!("opening a missing file must fail"),
        }
    }

    #[test]
    fn test_append_to_unwritable_path() {
        let path = Path::new("/nonexistent/iplogtally/out.txt");
        let err = append_to(path, |w| w.write_all(b"x\n")).unwrap_err();
        assert!(matches!(err, OutputSinkError::Open { .. }));
        assert!(
            err.to_string().starts_with(
                "An error occurred while writing to the output file: "
            ),
            "{err}"
        );
    }

    #[test]
    fn test_append_to_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        append_to(&path, |w| w.write_all(b"one\n")).unwrap();
        append_to(&path, |w| w.write_all(b"two\n")).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_append_to_write_failure_keeps_partial_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "old\n").unwrap();

        let err = append_to(&path, |w| {
            w.write_all(b"10.0.0.1: 1\n")?;
            Err(io::Error::other("disk full"))
        })
        .unwrap_err();
        match &err {
            OutputSinkError::Write { path: p, source } => {
                assert_eq!(p, &path);
                assert_eq!(source.to_string(), "disk full");
            }
            e => panic!("unexpected error {e}"),
        }
        assert_eq!(
            err.to_string(),
            format!(
                "An error occurred while writing to the output file: {}: \
                 disk full",
                path.display()
            )
        );
        // The handle was dropped and the buffered bytes went out with it.
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "old\n10.0.0.1: 1\n"
        );
        append_to(&path, |w| w.write_all(b"next\n")).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "old\n10.0.0.1: 1\nnext\n"
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_read_error_mid_stream() {
        let dir = tempdir().unwrap();
        let mut lines = LogLines::open(dir.path()).unwrap();
        match lines.next() {
            Some(Err(LogSourceError::Read { path, lineno, source })) => {
                assert_eq!(path, dir.path());
                assert_eq!(lineno, 1);
                assert_eq!(source.raw_os_error(), Some(21));
            }
            _ => panic!("reading a directory must fail"),
        }
        assert!(lines.next().is_none());
        assert_eq!(lines.lineno(), 0);
    }
}
