use chrono::Local;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

pub const RECORD_SEPARATOR: &str = "------------------------------";

/// One question/answer pair as it lands in the history file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub timestamp: String,
    pub prompt: String,
    pub answer: String,
    pub image_filename: Option<String>,
}

impl HistoryRecord {
    /// Stamps the record with the current local time.
    pub fn now(prompt: &str, answer: &str, image_filename: Option<String>) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            prompt: prompt.to_string(),
            answer: answer.to_string(),
            image_filename,
        }
    }
}

impl fmt::Display for HistoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Timestamp: {}", self.timestamp)?;
        writeln!(f, "Q: {}", self.prompt)?;
        writeln!(f, "A: {}", self.answer)?;
        if let Some(filename) = &self.image_filename {
            writeln!(f, "Image: {filename}")?;
        }
        writeln!(f, "{RECORD_SEPARATOR}")?;
        writeln!(f)
    }
}

/// Append-only caption history shared by all requests.
///
/// Appends are serialized through an async mutex and each record goes out in
/// a single write, so concurrent requests never interleave records.
#[derive(Debug)]
pub struct HistoryLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, record: &HistoryRecord) -> io::Result<()> {
        let text = record.to_string();

        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;

        info!("Saved Q/A to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn record(image: Option<&str>) -> HistoryRecord {
        HistoryRecord {
            timestamp: "2025-05-04 13:37:00".to_string(),
            prompt: "What is on the desk?".to_string(),
            answer: "A laptop and a mug.".to_string(),
            image_filename: image.map(str::to_string),
        }
    }

    #[test]
    fn record_format_with_image() {
        assert_eq!(
            record(Some("frame_20250504_133700_123.jpg")).to_string(),
            "Timestamp: 2025-05-04 13:37:00\n\
             Q: What is on the desk?\n\
             A: A laptop and a mug.\n\
             Image: frame_20250504_133700_123.jpg\n\
             ------------------------------\n\
             \n"
        );
    }

    #[test]
    fn record_format_without_image() {
        let text = record(None).to_string();

        assert!(!text.contains("Image:"));
        assert!(text.ends_with("A: A laptop and a mug.\n------------------------------\n\n"));
    }

    #[test]
    fn timestamp_format() {
        let rec = HistoryRecord::now("p", "a", None);
        assert_eq!(rec.timestamp.len(), "YYYY-MM-DD HH:MM:SS".len());
        assert_eq!(&rec.timestamp[4..5], "-");
        assert_eq!(&rec.timestamp[10..11], " ");
    }

    #[tokio::test]
    async fn append_only_grows_the_file() {
        let tmp = TempDir::new().unwrap();
        let log = HistoryLog::new(tmp.path().join("caption_history.txt"));

        log.append(&record(None)).await.unwrap();
        log.append(&record(Some("frame.jpg"))).await.unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(
            contents,
            format!("{}{}", record(None), record(Some("frame.jpg")))
        );
    }

    #[tokio::test]
    async fn append_fails_without_directory() {
        let tmp = TempDir::new().unwrap();
        let log = HistoryLog::new(tmp.path().join("missing").join("caption_history.txt"));

        assert!(log.append(&record(None)).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_keep_records_whole() {
        let tmp = TempDir::new().unwrap();
        let log = Arc::new(HistoryLog::new(tmp.path().join("caption_history.txt")));

        let mut handles = Vec::new();
        for i in 0..32 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                let rec = HistoryRecord {
                    timestamp: "2025-05-04 13:37:00".to_string(),
                    prompt: format!("prompt {i}"),
                    answer: format!("answer {i} ").repeat(200),
                    image_filename: Some(format!("frame_{i}.jpg")),
                };
                log.append(&rec).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let blocks: Vec<&str> = contents
            .split(&format!("{RECORD_SEPARATOR}\n\n"))
            .filter(|b| !b.is_empty())
            .collect();
        assert_eq!(blocks.len(), 32);

        for block in blocks {
            let lines: Vec<&str> = block.lines().collect();
            assert_eq!(lines.len(), 4, "record was split: {block:?}");
            let i = lines[1].strip_prefix("Q: prompt ").unwrap();
            assert_eq!(lines[2], format!("A: {}", format!("answer {i} ").repeat(200)));
            assert_eq!(lines[3], format!("Image: frame_{i}.jpg"));
        }
    }
}
