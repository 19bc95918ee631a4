//! CLI command implementations

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use colored::Colorize;
use thiserror::Error;

use crate::application::recorder::{RecorderError, RecorderEvent};
use crate::cli::args::RecordArgs;
use crate::domain::config::RecorderConfig;
use crate::domain::mime::is_type_supported;
use crate::infrastructure;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Recorder(#[from] RecorderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Config(#[from] toml::de::Error),
}

/// Print support status for each MIME type.
pub fn run_check(mimes: &[String]) {
    for mime in mimes {
        let verdict = if is_type_supported(mime) {
            "supported".green()
        } else {
            "unsupported".red()
        };
        println!("{:<12} {}", verdict, mime);
    }
}

/// Record for the configured duration, writing every delivered buffer to the
/// output file as it arrives.
pub fn run_record(args: RecordArgs) -> Result<(), CliError> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(mime) = &args.mime {
        config.mime_type = mime.clone();
    }
    config.bitrate = args.bitrate.or(config.bitrate);
    config.auto_stop_ms = Some(args.duration.as_millis());

    let (recorder, events) = infrastructure::default_recorder(config)?;
    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "recording.{}",
            recorder.container_format().extension()
        ))
    });
    let mut file = File::create(&output)?;

    recorder.start(args.timeslice.map(|t| t.as_millis() as i64))?;
    println!(
        "{} {} for {} ({})",
        "Recording".green().bold(),
        output.display(),
        args.duration,
        recorder.mime_type()
    );

    let mut total_bytes = 0usize;
    let mut failed: Option<(String, String)> = None;
    loop {
        match events.recv() {
            Ok(RecorderEvent::DataAvailable(chunk)) => {
                for buffer in chunk.buffers() {
                    file.write_all(buffer)?;
                    total_bytes += buffer.len();
                }
            }
            Ok(RecorderEvent::Stop) => break,
            Ok(RecorderEvent::Error { name, detail }) => {
                failed = Some((name, detail));
            }
            Ok(RecorderEvent::Pause | RecorderEvent::Resume | RecorderEvent::Start) => {}
            Err(_) => break,
        }
    }
    file.flush()?;

    if let Some((name, detail)) = failed {
        eprintln!("{} {}: {}", "Failed".red().bold(), name, detail);
        return Err(RecorderError::Encoding { name, detail }.into());
    }
    if total_bytes == 0 {
        eprintln!("{} recording produced no data", "Failed".red().bold());
        return Err(RecorderError::EmptyRecording.into());
    }
    println!(
        "{} {} bytes written to {}",
        "Done".green().bold(),
        total_bytes,
        output.display()
    );
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<RecorderConfig, CliError> {
    match path {
        Some(path) => Ok(toml::from_str(&fs::read_to_string(path)?)?),
        None => Ok(RecorderConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_path_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.mime_type, "audio/ogg");
        assert!(config.bitrate.is_none());
    }

    #[test]
    fn config_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recorder.toml");
        fs::write(&path, "mime_type = \"audio/wav\"\nbitrate = 64000\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.mime_type, "audio/wav");
        assert_eq!(config.bitrate, Some(64_000));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recorder.toml");
        fs::write(&path, "bitrate = \"plenty\"\n").unwrap();

        assert!(matches!(
            load_config(Some(&path)),
            Err(CliError::Config(_))
        ));
    }
}
