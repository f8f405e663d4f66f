//! Latest-value mailbox between signal producers and the frame loop.
//!
//! Producers (audio analysis, hand tracking, UI/voice) push [`Signal`]s from
//! any thread. The frame loop drains the channel once per frame and keeps
//! only the newest value of each kind; a frame without updates reuses the
//! previous snapshot.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::core::signals::{AudioBands, HandPose, SelectionState, clamp_pointer};

#[derive(Debug, Clone)]
pub enum Signal {
    Audio(AudioBands),
    /// Audio capture stopped or was denied.
    AudioLost,
    Hand(HandPose),
    /// Hand tracking stopped.
    HandLost,
    /// Normalized pointer position, the fallback when no hand is tracked.
    Pointer(Option<[f32; 2]>),
    Selection(SelectionState),
}

/// Everything the core reads at the top of a frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSnapshot {
    pub selection: SelectionState,
    pub audio: Option<AudioBands>,
    pub hand: Option<HandPose>,
    pub pointer: Option<[f32; 2]>,
}

impl FrameSnapshot {
    pub fn new(selection: SelectionState) -> Self {
        Self {
            selection,
            ..Self::default()
        }
    }

    pub fn apply(&mut self, signal: Signal) {
        match signal {
            Signal::Audio(bands) => self.audio = Some(bands.clamped()),
            Signal::AudioLost => self.audio = None,
            Signal::Hand(pose) => self.hand = Some(pose.clamped()),
            Signal::HandLost => self.hand = None,
            Signal::Pointer(p) => self.pointer = p.map(clamp_pointer),
            Signal::Selection(s) => self.selection = s,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: Sender<Signal>,
}

impl SignalSender {
    /// Non-blocking; returns `false` when the update was dropped because the
    /// mailbox is full or closed.
    pub fn publish(&self, signal: Signal) -> bool {
        match self.tx.try_send(signal) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

#[derive(Debug)]
pub struct SignalMailbox {
    rx: Receiver<Signal>,
    snapshot: FrameSnapshot,
}

impl SignalMailbox {
    /// Drains pending signals and returns the merged snapshot.
    pub fn latest(&mut self) -> &FrameSnapshot {
        for signal in self.rx.try_iter() {
            self.snapshot.apply(signal);
        }
        &self.snapshot
    }

    /// Direct access for a producer that lives on the frame thread (the UI).
    pub fn snapshot_mut(&mut self) -> &mut FrameSnapshot {
        &mut self.snapshot
    }
}

pub fn channel(capacity: usize, initial: SelectionState) -> (SignalSender, SignalMailbox) {
    let (tx, rx) = bounded(capacity.max(1));
    (
        SignalSender { tx },
        SignalMailbox {
            rx,
            snapshot: FrameSnapshot::new(initial),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn newest_value_wins() {
        let (tx, mut mb) = channel(16, SelectionState::default());
        for i in 0..5 {
            tx.publish(Signal::Audio(AudioBands {
                bass: i as f32 * 0.1,
                ..AudioBands::SILENT
            }));
        }
        let snap = mb.latest();
        assert_eq!(snap.audio.map(|a| a.bass), Some(0.4));
    }

    #[test]
    fn missing_updates_reuse_previous_values() {
        let (tx, mut mb) = channel(4, SelectionState::default());
        tx.publish(Signal::Hand(HandPose::detected(0.1, 0.2, 0.3)));
        let first = mb.latest().clone();
        let second = mb.latest().clone();
        assert_eq!(first, second);
        tx.publish(Signal::HandLost);
        assert!(mb.latest().hand.is_none());
    }

    #[test]
    fn full_mailbox_drops_instead_of_blocking() {
        let (tx, mut mb) = channel(1, SelectionState::default());
        assert!(tx.publish(Signal::AudioLost));
        assert!(!tx.publish(Signal::AudioLost));
        mb.latest();
        assert!(tx.publish(Signal::AudioLost));
    }

    #[test]
    fn producers_on_other_threads() {
        let (tx, mut mb) = channel(64, SelectionState::default());
        let handle = thread::spawn(move || {
            tx.publish(Signal::Selection(SelectionState {
                particle_count: 123,
                ..SelectionState::default()
            }))
        });
        assert!(handle.join().unwrap());
        assert_eq!(mb.latest().selection.particle_count, 123);
    }

    #[test]
    fn incoming_hand_and_pointer_are_clamped() {
        let (tx, mut mb) = channel(4, SelectionState::default());
        tx.publish(Signal::Hand(HandPose::detected(f32::NAN, 4.0, 0.5)));
        tx.publish(Signal::Pointer(Some([f32::NAN, -7.0])));
        let snap = mb.latest();
        let hand = snap.hand.unwrap();
        assert_eq!((hand.x, hand.y, hand.hand_spread), (0.0, 1.0, 0.5));
        assert_eq!(snap.pointer, Some([0.0, -1.0]));
    }

    #[test]
    fn incoming_audio_is_clamped() {
        let (tx, mut mb) = channel(4, SelectionState::default());
        tx.publish(Signal::Audio(AudioBands {
            treble: 3.0,
            ..AudioBands::SILENT
        }));
        assert_eq!(mb.latest().audio.unwrap().treble, 1.0);
    }
}
