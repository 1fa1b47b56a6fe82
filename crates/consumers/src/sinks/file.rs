//! FileConsumer - appends verdict records to a JSONL file

use contracts::{attrs, ConsumerSink, VerifiedFrame, VerifierError};
use serde_json::json;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for FileConsumer
#[derive(Debug, Clone)]
pub struct FileConsumerConfig {
    /// Output file path
    pub path: PathBuf,
}

impl FileConsumerConfig {
    /// Create config from params map
    ///
    /// `path` names the output file directly; otherwise a timestamped file is
    /// created under `base_path` (default `./output`).
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let path = match params.get("path") {
            Some(path) => PathBuf::from(path),
            None => {
                let base = params
                    .get("base_path")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./output"));
                let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
                base.join(format!("verified_{stamp}.jsonl"))
            }
        };

        Self { path }
    }
}

/// Consumer that appends one JSON record per verified frame
pub struct FileConsumer {
    name: String,
    writer: BufWriter<File>,
    records_written: u64,
}

impl FileConsumer {
    /// Create a new FileConsumer
    pub fn new(name: impl Into<String>, config: FileConsumerConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(&config.path)?;

        Ok(Self {
            name: name.into(),
            writer: BufWriter::new(file),
            records_written: 0,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileConsumerConfig::from_params(params);
        Self::new(name, config)
    }

    fn append_record(&mut self, frame: &VerifiedFrame) -> std::io::Result<()> {
        let record = json!({
            "index": frame.index,
            "data_type": frame.data.data_type.as_str(),
            "passed": frame.passed,
            "theta": frame.theta(),
            "file_name": frame.data.attributes.text(attrs::FILE_NAME),
            "shape": frame.data.slice.shape(),
        });
        serde_json::to_writer(&mut self.writer, &record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(b"\n")?;
        self.records_written += 1;
        Ok(())
    }

    fn persist(&mut self, frame: &VerifiedFrame) -> Result<(), VerifierError> {
        let name = self.name.clone();
        self.append_record(frame).map_err(|e| {
            error!(consumer = %name, index = frame.index, error = %e, "Write failed");
            VerifierError::sink_write(name, e.to_string())
        })
    }
}

impl ConsumerSink for FileConsumer {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_consumer_write",
        skip(self, frame),
        fields(consumer = %self.name, index = frame.index)
    )]
    async fn write(&mut self, frame: &VerifiedFrame) -> Result<(), VerifierError> {
        self.persist(frame)?;
        Ok(())
    }

    #[instrument(name = "file_consumer_finish", skip(self))]
    async fn finish(&mut self) -> Result<(), VerifierError> {
        let record = json!({ "end": true, "frames_written": self.records_written });
        serde_json::to_writer(&mut self.writer, &record)
            .map_err(|e| VerifierError::sink_write(&self.name, e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| VerifierError::sink_write(&self.name, e.to_string()))?;
        self.writer
            .flush()
            .map_err(|e| VerifierError::sink_write(&self.name, e.to_string()))?;
        debug!(consumer = %self.name, records = self.records_written, "End record written");
        Ok(())
    }

    #[instrument(name = "file_consumer_close", skip(self))]
    async fn close(&mut self) -> Result<(), VerifierError> {
        self.writer
            .flush()
            .map_err(|e| VerifierError::sink_write(&self.name, e.to_string()))?;
        debug!(consumer = %self.name, "FileConsumer closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DataType, FrameData, Slice};
    use tempfile::tempdir;

    fn verified(index: u64, passed: bool) -> VerifiedFrame {
        VerifiedFrame {
            index,
            passed,
            data: FrameData::new(DataType::new("data"), Slice::filled(2, 2, 5.0))
                .with_attr(attrs::THETA, 0.5)
                .with_attr(attrs::FILE_NAME, format!("frame_{index:05}")),
        }
    }

    #[tokio::test]
    async fn test_file_consumer_writes_jsonl() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let config = FileConsumerConfig { path: path.clone() };

        let mut sink = FileConsumer::new("test_file", config).unwrap();
        sink.write(&verified(0, true)).await.unwrap();
        sink.write(&verified(1, false)).await.unwrap();
        sink.finish().await.unwrap();
        sink.close().await.unwrap();

        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["index"], 0);
        assert_eq!(first["passed"], true);
        assert_eq!(first["file_name"], "frame_00000");

        let last: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(last["end"], true);
        assert_eq!(last["frames_written"], 2);
    }

    #[tokio::test]
    async fn test_default_path_is_timestamped() {
        let dir = tempdir().unwrap();
        let mut params = HashMap::new();
        params.insert(
            "base_path".to_string(),
            dir.path().to_string_lossy().to_string(),
        );

        let config = FileConsumerConfig::from_params(&params);
        assert!(config.path.starts_with(dir.path()));
        assert!(config
            .path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("verified_"));
    }
}
