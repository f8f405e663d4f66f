use std::fmt;
use std::path::Path;

use hound::{SampleFormat, WavReader};

#[derive(Debug)]
pub enum AudioSourceError {
    Open(hound::Error),
    UnsupportedFormat { bits: u16 },
    Empty,
}

impl fmt::Display for AudioSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioSourceError::Open(err) => write!(f, "failed to read wav: {err}"),
            AudioSourceError::UnsupportedFormat { bits } => {
                write!(f, "unsupported wav sample width: {bits} bits")
            }
            AudioSourceError::Empty => write!(f, "wav file contains no samples"),
        }
    }
}

impl std::error::Error for AudioSourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AudioSourceError::Open(err) => Some(err),
            _ => None,
        }
    }
}

impl From<hound::Error> for AudioSourceError {
    fn from(err: hound::Error) -> Self {
        AudioSourceError::Open(err)
    }
}

/// Mono PCM read from a WAV file, consumed one video frame at a time.
#[derive(Debug, Clone)]
pub struct WavSource {
    samples: Vec<f32>,
    fs: f32,
    cursor: usize,
}

impl WavSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AudioSourceError> {
        let mut reader = WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;
        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
            SampleFormat::Int => {
                if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                    return Err(AudioSourceError::UnsupportedFormat {
                        bits: spec.bits_per_sample,
                    });
                }
                let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / full_scale))
                    .collect::<Result<_, _>>()?
            }
        };
        Self::from_interleaved(&interleaved, channels, spec.sample_rate as f32)
    }

    /// Mixes interleaved frames down to mono.
    pub fn from_interleaved(
        interleaved: &[f32],
        channels: usize,
        fs: f32,
    ) -> Result<Self, AudioSourceError> {
        let channels = channels.max(1);
        let samples: Vec<f32> = interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        if samples.is_empty() {
            return Err(AudioSourceError::Empty);
        }
        Ok(Self {
            samples,
            fs,
            cursor: 0,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.fs
    }

    pub fn duration_sec(&self) -> f32 {
        self.samples.len() as f32 / self.fs
    }

    /// Advances by `hop` samples and returns up to `window` samples ending at
    /// the new cursor. `None` once the file is exhausted.
    pub fn advance(&mut self, hop: usize, window: usize) -> Option<&[f32]> {
        if self.cursor >= self.samples.len() {
            return None;
        }
        let end = (self.cursor + hop.max(1)).min(self.samples.len());
        let start = end.saturating_sub(window);
        self.cursor = end;
        Some(&self.samples[start..end])
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "auraform_wav_test_{}_{}",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn reads_stereo_int_wav_as_mono() {
        let path = temp_path("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(i16::MAX / 2).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let src = WavSource::open(&path).unwrap();
        assert_eq!(src.sample_rate(), 8_000.0);
        assert!((src.duration_sec() - 100.0 / 8_000.0).abs() < 1e-6);
        assert!((src.samples[0] - 0.25).abs() < 1e-3);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn advance_walks_to_the_end() {
        let mut src = WavSource::from_interleaved(&[0.5; 10], 1, 10.0).unwrap();
        assert_eq!(src.advance(4, 6).map(|b| b.len()), Some(4));
        assert_eq!(src.advance(4, 6).map(|b| b.len()), Some(6));
        assert_eq!(src.advance(4, 6).map(|b| b.len()), Some(6));
        assert!(src.advance(4, 6).is_none());
        src.rewind();
        assert!(src.advance(4, 6).is_some());
    }

    #[test]
    fn missing_file_and_empty_input_are_errors() {
        assert!(matches!(
            WavSource::open("/nonexistent/auraform.wav"),
            Err(AudioSourceError::Open(_))
        ));
        assert!(matches!(
            WavSource::from_interleaved(&[], 2, 48_000.0),
            Err(AudioSourceError::Empty)
        ));
    }
}
