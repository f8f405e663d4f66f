//! Audio-band producers feeding the particle core.

pub mod bands;
pub mod feeder;
pub mod wav_source;

pub use bands::{AudioConfig, BandAnalyzer};
pub use feeder::{next_bands, spawn_wav_feeder};
pub use wav_source::{AudioSourceError, WavSource};
