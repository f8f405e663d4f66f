use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, trace};

use crate::audio::bands::BandAnalyzer;
use crate::audio::wav_source::WavSource;
use crate::core::mailbox::{Signal, SignalSender};
use crate::core::signals::AudioBands;

/// Samples consumed per video frame at `frame_rate`.
pub fn frame_hop(fs: f32, frame_rate: f32) -> usize {
    if frame_rate <= 0.0 || !frame_rate.is_finite() {
        return 1;
    }
    ((fs / frame_rate).round() as usize).max(1)
}

/// Bands for the next video frame, or `None` when the source is exhausted.
pub fn next_bands(
    source: &mut WavSource,
    analyzer: &mut BandAnalyzer,
    frame_rate: f32,
) -> Option<AudioBands> {
    let hop = frame_hop(source.sample_rate(), frame_rate);
    let window = analyzer.fft_size();
    let block = source.advance(hop, window)?;
    Some(analyzer.analyze(block))
}

/// Plays `source` through `analyzer` in real time on a worker thread,
/// publishing one [`Signal::Audio`] per video frame and
/// [`Signal::AudioLost`] when the file ends or `stop` is raised.
pub fn spawn_wav_feeder(
    mut source: WavSource,
    mut analyzer: BandAnalyzer,
    tx: SignalSender,
    frame_rate: f32,
    stop: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("audio-bands".into())
        .spawn(move || {
            let period = Duration::from_secs_f32(1.0 / frame_rate.max(1.0));
            let mut next_deadline = Instant::now();
            info!(
                "audio feeder started ({:.1}s at {} Hz)",
                source.duration_sec(),
                source.sample_rate()
            );
            loop {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                next_deadline += period;

                let Some(bands) = next_bands(&mut source, &mut analyzer, frame_rate) else {
                    info!("audio source exhausted");
                    break;
                };
                tx.publish(Signal::Audio(bands));

                let now = Instant::now();
                if now < next_deadline {
                    thread::sleep(next_deadline - now);
                } else {
                    next_deadline = now;
                    trace!("audio feeder overrun");
                }
            }
            tx.publish(Signal::AudioLost);
        })
}
