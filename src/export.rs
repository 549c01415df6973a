//! Getting a generated image out of the session: clipboard and disk.

use crate::error::{Result, StudioError};
use base64::Engine;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Places text on the user's clipboard.
pub trait ClipboardWriter: Send + Sync {
    /// Replaces the clipboard contents with `text`.
    fn write_text(&self, text: &str) -> Result<()>;
}

/// Persists downloaded image bytes somewhere the user can reach them.
pub trait FileSaver: Send + Sync {
    /// Saves `bytes` as `file_name` and returns where they ended up.
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Copies through the terminal using the OSC 52 escape sequence.
///
/// Works over SSH and inside tmux (with `set-clipboard on`) without any
/// platform clipboard library. The terminal interprets the sequence wherever
/// it arrives, so stderr keeps it out of piped stdout.
pub struct Osc52Clipboard<W: Write + Send> {
    out: Mutex<W>,
}

impl Osc52Clipboard<std::io::Stderr> {
    /// Writes the sequence to stderr.
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send> Osc52Clipboard<W> {
    /// Writes the sequence to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn sequence(text: &str) -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(text);
        format!("\x1b]52;c;{}\x07", payload)
    }
}

impl<W: Write + Send> ClipboardWriter for Osc52Clipboard<W> {
    fn write_text(&self, text: &str) -> Result<()> {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        out.write_all(Self::sequence(text).as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| StudioError::Clipboard(e.to_string()))
    }
}

/// Writes files into a fixed directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    /// Saves into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSaver for DirectorySaver {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| StudioError::Storage(format!("invalid file name: {}", file_name)))?;

        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// Clipboard that remembers what was copied.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    /// Creates an empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last text written, if any.
    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl ClipboardWriter for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        *self.contents.lock().unwrap_or_else(|e| e.into_inner()) = Some(text.to_string());
        Ok(())
    }
}

/// Saver that keeps files in memory.
#[derive(Debug, Default)]
pub struct MemorySaver {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySaver {
    /// Creates a saver with no files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Saved files, in save order.
    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl FileSaver for MemorySaver {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((file_name.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osc52_sequence() {
        let clipboard = Osc52Clipboard::new(Vec::new());
        clipboard.write_text("https://x/img.png").unwrap();

        let written = String::from_utf8(clipboard.into_inner()).unwrap();
        assert_eq!(written, "\x1b]52;c;aHR0cHM6Ly94L2ltZy5wbmc=\x07");
    }

    #[test]
    fn test_directory_saver_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let saver = DirectorySaver::new(dir.path().join("downloads"));

        let path = saver.save("freeai-generated-1.png", b"png-bytes").unwrap();
        assert_eq!(path, dir.path().join("downloads").join("freeai-generated-1.png"));
        assert_eq!(std::fs::read(path).unwrap(), b"png-bytes");
    }

    #[test]
    fn test_directory_saver_strips_directories_from_name() {
        let dir = tempfile::tempdir().unwrap();
        let saver = DirectorySaver::new(dir.path());

        let path = saver.save("../../escape.png", b"x").unwrap();
        assert_eq!(path, dir.path().join("escape.png"));
    }

    #[test]
    fn test_memory_fakes_record() {
        let clipboard = MemoryClipboard::new();
        assert_eq!(clipboard.contents(), None);
        clipboard.write_text("a").unwrap();
        assert_eq!(clipboard.contents().as_deref(), Some("a"));

        let saver = MemorySaver::new();
        saver.save("f.png", &[1, 2]).unwrap();
        assert_eq!(saver.files(), vec![("f.png".to_string(), vec![1, 2])]);
    }
}
