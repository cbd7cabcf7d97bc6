// Diagnostic sinks receiving the interpreter's tagged log records

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Append-only destination for one-line diagnostic records such as `[SET] x = 5`.
pub trait DiagnosticSink {
    fn write(&mut self, line: &str) -> io::Result<()>;
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn write(&mut self, line: &str) -> io::Result<()> {
        (**self).write(line)
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Box<S> {
    fn write(&mut self, line: &str) -> io::Result<()> {
        (**self).write(line)
    }
}

/// Collects records in memory, without timestamps.
impl DiagnosticSink for Vec<String> {
    fn write(&mut self, line: &str) -> io::Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn write(&mut self, _line: &str) -> io::Result<()> {
        Ok(())
    }
}

/// Appends timestamped records to a log file.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: File,
}

impl FileSink {
    /// Open `path` for appending, creating it and its parent directories if needed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DiagnosticSink for FileSink {
    fn write(&mut self, line: &str) -> io::Result<()> {
        let ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(self.file, "{ts} {line}")?;
        self.file.flush()
    }
}

/// Default log location for a script: `<script dir>/logs/<script stem>.log`.
pub fn default_log_path(script: &Path) -> PathBuf {
    let dir = script.parent().unwrap_or_else(|| Path::new(""));
    let stem = script
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scriptlang".to_string());
    dir.join("logs").join(format!("{stem}.log"))
}
