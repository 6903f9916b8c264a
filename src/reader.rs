use anyhow::{Context, Result};
use memmap2::MmapOptions;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::screenplay::Scene;

/// Configuration for screenplay reading
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Buffer size for async reading (default: 8KB)
    pub buffer_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            buffer_size: 8192, // WHY: 8KB is optimal for most filesystems and network storage
        }
    }
}

/// Statistics for one read
#[derive(Debug, Clone)]
pub struct ReadStats {
    pub file_path: String,
    pub lines_read: u64,
    pub bytes_read: u64,
    pub duration_ms: u64,
}

/// Reads screenplay text, normalizing line endings to `\n`
pub struct ScriptReader {
    config: ReaderConfig,
}

impl ScriptReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Read a screenplay with async buffered I/O
    pub async fn read_script<P: AsRef<Path>>(&self, file_path: P) -> Result<(String, ReadStats)> {
        let path = file_path.as_ref();
        let start_time = std::time::Instant::now();

        debug!("Starting async read of screenplay: {}", path.display());

        let file = File::open(path)
            .await
            .with_context(|| format!("Failed to open screenplay {}", path.display()))?;

        // WHY: BufReader with custom buffer size reduces syscalls
        let reader = BufReader::with_capacity(self.config.buffer_size, file);
        let mut lines = reader.lines();
        let mut text = String::new();
        let mut line_count = 0u64;
        let mut byte_count = 0u64;

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    byte_count += line.len() as u64 + 1; // +1 for newline
                    line_count += 1;
                    if line_count > 1 {
                        text.push('\n');
                    }
                    // lines() keeps a trailing '\r' from CRLF endings
                    text.push_str(line.strip_suffix('\r').unwrap_or(&line));
                }
                Ok(None) => break,
                Err(e) => {
                    let error_msg = format!(
                        "UTF-8 decoding error in {} at line {}: {}",
                        path.display(),
                        line_count + 1,
                        e
                    );
                    warn!("{}", error_msg);
                    anyhow::bail!(error_msg);
                }
            }
        }

        let stats = ReadStats {
            file_path: path.display().to_string(),
            lines_read: line_count,
            bytes_read: byte_count,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        info!("Read {}: {} lines, {} bytes", stats.file_path, stats.lines_read, stats.bytes_read);
        Ok((text, stats))
    }

    /// Read a screenplay through a memory map
    pub fn read_script_mmap<P: AsRef<Path>>(&self, file_path: P) -> Result<(String, ReadStats)> {
        let path = file_path.as_ref();
        let start_time = std::time::Instant::now();

        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open screenplay {}", path.display()))?;

        // Zero-length files cannot be mapped on every platform
        let text = if file.metadata()?.len() == 0 {
            String::new()
        } else {
            // SAFETY: the map is read-only and copied out before the file handle is dropped
            let mmap = unsafe { MmapOptions::new().map(&file)? };
            let content = std::str::from_utf8(&mmap)
                .with_context(|| format!("Screenplay {} is not valid UTF-8", path.display()))?;
            content.replace("\r\n", "\n")
        };

        let stats = ReadStats {
            file_path: path.display().to_string(),
            lines_read: text.lines().count() as u64,
            bytes_read: text.len() as u64,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        info!("Mapped {}: {} lines, {} bytes", stats.file_path, stats.lines_read, stats.bytes_read);
        Ok((text, stats))
    }
}

/// Convenience function for reading a single screenplay with default configuration
pub async fn read_script_async<P: AsRef<Path>>(file_path: P) -> Result<String> {
    let reader = ScriptReader::new(ReaderConfig::default());
    let (text, _stats) = reader.read_script(file_path).await?;
    Ok(text)
}

/// Load a pre-segmented scene list (JSON array of scenes) from an external importer
pub async fn read_scenes_json<P: AsRef<Path>>(file_path: P) -> Result<Vec<Scene>> {
    let path = file_path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read scene list {}", path.display()))?;
    let scenes: Vec<Scene> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid scene list in {}", path.display()))?;
    debug!("Loaded {} pre-segmented scenes from {}", scenes.len(), path.display());
    Ok(scenes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::fs;

    async fn create_test_file(dir: &Path, name: &str, content: &[u8]) -> Result<std::path::PathBuf> {
        let file_path = dir.join(name);
        fs::write(&file_path, content).await?;
        Ok(file_path)
    }

    #[tokio::test]
    async fn test_read_script() {
        let temp_dir = TempDir::new().unwrap();
        let reader = ScriptReader::new(ReaderConfig::default());

        let content = "INT. FERRY - DAY\r\n\r\nGWEN\r\nHello.";
        let file_path = create_test_file(temp_dir.path(), "ferry.txt", content.as_bytes()).await.unwrap();

        let (text, stats) = reader.read_script(&file_path).await.unwrap();

        assert_eq!(text, "INT. FERRY - DAY\n\nGWEN\nHello.");
        assert_eq!(stats.lines_read, 4);
        assert!(stats.bytes_read > 0);
    }

    #[tokio::test]
    async fn test_read_empty_script() {
        let temp_dir = TempDir::new().unwrap();
        let reader = ScriptReader::new(ReaderConfig::default());
        let file_path = create_test_file(temp_dir.path(), "empty.txt", b"").await.unwrap();

        let (text, stats) = reader.read_script(&file_path).await.unwrap();
        assert!(text.is_empty());
        assert_eq!(stats.lines_read, 0);

        let (text, _) = reader.read_script_mmap(&file_path).unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_read_nonexistent_script() {
        let temp_dir = TempDir::new().unwrap();
        let reader = ScriptReader::new(ReaderConfig::default());
        let file_path = temp_dir.path().join("nonexistent.txt");

        assert!(reader.read_script(&file_path).await.is_err());
        assert!(reader.read_script_mmap(&file_path).is_err());
    }

    #[tokio::test]
    async fn test_invalid_utf8_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let reader = ScriptReader::new(ReaderConfig::default());
        let file_path = create_test_file(temp_dir.path(), "bad.txt", &[0x47, 0x57, 0xFF, 0x0A]).await.unwrap();

        assert!(reader.read_script(&file_path).await.is_err());
        assert!(reader.read_script_mmap(&file_path).is_err());
    }

    #[tokio::test]
    async fn test_mmap_matches_buffered_read() {
        let temp_dir = TempDir::new().unwrap();
        let reader = ScriptReader::new(ReaderConfig { buffer_size: 16 });
        let content = "INT. FERRY - DAY\n\nGWEN LAWSON (V.O.)\nWhere are you?\n\nEXT. PIER - NIGHT\nRain.";
        let file_path = create_test_file(temp_dir.path(), "ferry.txt", content.as_bytes()).await.unwrap();

        let (buffered, _) = reader.read_script(&file_path).await.unwrap();
        let (mapped, _) = reader.read_script_mmap(&file_path).unwrap();
        assert_eq!(buffered, mapped);
    }

    #[tokio::test]
    async fn test_read_scenes_json() {
        let temp_dir = TempDir::new().unwrap();
        let json = r#"[{"index": 1, "heading": "INT. FERRY - DAY", "content": "INT. FERRY - DAY\nGWEN\nHi.", "line_offset": 0}]"#;
        let file_path = create_test_file(temp_dir.path(), "scenes.json", json.as_bytes()).await.unwrap();

        let scenes = read_scenes_json(&file_path).await.unwrap();
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].heading, "INT. FERRY - DAY");

        let bad_path = create_test_file(temp_dir.path(), "bad.json", b"{not json").await.unwrap();
        assert!(read_scenes_json(&bad_path).await.is_err());
    }
}
