//! Per-item media transforms.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::types::{ProcessingError, ProcessingResult};
use crate::config::{PathSettings, ProcessingSettings};
use crate::models::MediaItem;

/// Capability that processes one media item.
///
/// Must be safe to call concurrently for distinct items. Returns the path
/// of the produced artifact, if the transform writes one.
#[async_trait]
pub trait MediaTransform: Send + Sync {
    async fn transform(&self, item: &MediaItem) -> ProcessingResult<Option<PathBuf>>;
}

/// Extracts the audio track of a video with ffmpeg.
///
/// Output goes to `<output_dir>/<item id>.<extension>`; ffmpeg picks the
/// codec from the extension. Item ids are unique, so concurrent runs for
/// distinct items never share an output file.
#[derive(Debug, Clone)]
pub struct FfmpegAudioExtractor {
    binary: PathBuf,
    output_dir: PathBuf,
    extension: String,
}

impl FfmpegAudioExtractor {
    pub fn new(binary: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            output_dir: output_dir.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    /// Create an extractor from settings.
    pub fn from_settings(paths: &PathSettings, processing: &ProcessingSettings) -> Self {
        Self::new(
            &processing.ffmpeg_path,
            &paths.output_folder,
            &processing.audio_extension,
        )
    }

    /// Output path for a media item.
    pub fn output_path_for(&self, item_id: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{}", item_id, self.extension))
    }

    fn tool_name(&self) -> String {
        self.binary
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "ffmpeg".to_string())
    }
}

#[async_trait]
impl MediaTransform for FfmpegAudioExtractor {
    async fn transform(&self, item: &MediaItem) -> ProcessingResult<Option<PathBuf>> {
        if !tokio::fs::try_exists(&item.path).await.unwrap_or(false) {
            return Err(ProcessingError::SourceNotFound(item.path.clone()));
        }

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ProcessingError::OutputDir {
                path: self.output_dir.clone(),
                source: e,
            })?;

        let output_path = self.output_path_for(&item.id);

        let mut cmd = Command::new(&self.binary);
        cmd.args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
            .arg(&item.path)
            .arg("-vn") // Drop video
            .arg(&output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true);

        tracing::debug!("Running ffmpeg: {:?}", cmd);

        let output = cmd
            .output()
            .await
            .map_err(|e| ProcessingError::ToolExecutionFailed {
                tool: self.tool_name(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            // Don't leave a truncated artifact behind.
            let _ = tokio::fs::remove_file(&output_path).await;
            return Err(ProcessingError::command_failed(
                self.tool_name(),
                output.status.code(),
                &output.stderr,
            ));
        }

        tracing::debug!("Extracted audio {} -> {}", item.id, output_path.display());
        Ok(Some(output_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_uses_item_id_and_extension() {
        let extractor = FfmpegAudioExtractor::new("ffmpeg", "/out", ".m4a");
        assert_eq!(
            extractor.output_path_for("GX010042.MP4"),
            PathBuf::from("/out/GX010042.MP4.m4a")
        );
        assert_ne!(extractor.output_path_for("clip.mp4"), extractor.output_path_for("clip.mov"));
    }

    #[test]
    fn from_settings_uses_configured_folder() {
        let paths = PathSettings::default();
        let processing = ProcessingSettings::default();
        let extractor = FfmpegAudioExtractor::from_settings(&paths, &processing);
        let out = extractor.output_path_for("a.mp4");
        assert!(out.starts_with(&paths.output_folder));
        assert_eq!(out.extension().unwrap(), processing.audio_extension.as_str());
    }

    #[tokio::test]
    async fn missing_source_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = FfmpegAudioExtractor::new("ffmpeg", dir.path(), "m4a");
        let item = MediaItem::new("gone.mp4", dir.path().join("gone.mp4"));

        let err = extractor.transform(&item).await.unwrap_err();
        assert!(matches!(err, ProcessingError::SourceNotFound(_)));
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        std::fs::write(&source, b"not a video").unwrap();

        let extractor = FfmpegAudioExtractor::new("/nonexistent/bin/ffmpeg", dir.path().join("out"), "m4a");
        let item = MediaItem::new("clip.mp4", &source);

        let err = extractor.transform(&item).await.unwrap_err();
        assert!(matches!(err, ProcessingError::ToolExecutionFailed { .. }));
    }

    /// Stand-in ffmpeg that writes the input path into the output file.
    #[cfg(unix)]
    fn fake_ffmpeg(dir: &std::path::Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("ffmpeg");
        std::fs::write(
            &script,
            "#!/bin/sh\nfor arg; do out=\"$arg\"; done\nprintf '%s' \"$6\" > \"$out\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn same_stem_items_get_distinct_outputs_in_one_batch() {
        use crate::processing::BatchProcessor;
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let cam1 = dir.path().join("cam1");
        let cam2 = dir.path().join("cam2");
        std::fs::create_dir_all(&cam1).unwrap();
        std::fs::create_dir_all(&cam2).unwrap();
        std::fs::write(cam1.join("clip.mp4"), b"v").unwrap();
        std::fs::write(cam2.join("clip.mov"), b"v").unwrap();

        let extractor = FfmpegAudioExtractor::new(fake_ffmpeg(dir.path()), dir.path().join("out"), "m4a");
        let processor = BatchProcessor::new(Arc::new(extractor), 2, std::time::Duration::from_secs(10));
        let report = processor
            .process_batch(vec![
                MediaItem::new("clip.mp4", cam1.join("clip.mp4")),
                MediaItem::new("clip.mov", cam2.join("clip.mov")),
            ])
            .await;

        assert_eq!(report.succeeded().count(), 2);
        let mp4 = report.get("clip.mp4").unwrap().output_path.clone().unwrap();
        let mov = report.get("clip.mov").unwrap().output_path.clone().unwrap();
        assert_ne!(mp4, mov);
        assert_eq!(std::fs::read_to_string(&mp4).unwrap(), cam1.join("clip.mp4").to_string_lossy());
        assert_eq!(std::fs::read_to_string(&mov).unwrap(), cam2.join("clip.mov").to_string_lossy());
    }
}
