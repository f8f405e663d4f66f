use std::error::Error;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use egui::Sense;
use tracing::*;

use auraform::audio::{BandAnalyzer, WavSource, next_bands, spawn_wav_feeder};
use auraform::config::AppConfig;
use auraform::core::mailbox::channel;
use auraform::{Signal, SignalMailbox, SignalSender, Simulation};

use crate::cli::Args;
use crate::ui::{controls, viewport};

const FRAME_RATE: f32 = 60.0;
const MAILBOX_CAPACITY: usize = 64;
const STATS_EVERY: u64 = 60;

/// Opens `--wav` if given. A missing or unreadable file only disables audio.
fn open_audio(args: &Args, cfg: &AppConfig) -> Option<(WavSource, BandAnalyzer)> {
    let path = args.wav.as_deref()?;
    match WavSource::open(path) {
        Ok(source) => {
            let analyzer = BandAnalyzer::new(source.sample_rate(), cfg.audio.clone());
            info!(
                "audio: {path} ({:.1}s, fft {})",
                source.duration_sec(),
                analyzer.fft_size()
            );
            Some((source, analyzer))
        }
        Err(err) => {
            warn!("audio disabled, cannot use {path}: {err}");
            None
        }
    }
}

fn spawn_feeder(
    audio: Option<(WavSource, BandAnalyzer)>,
    tx: &SignalSender,
    stop: &Arc<AtomicBool>,
) -> Option<JoinHandle<()>> {
    let (source, analyzer) = audio?;
    match spawn_wav_feeder(source, analyzer, tx.clone(), FRAME_RATE, stop.clone()) {
        Ok(handle) => Some(handle),
        Err(err) => {
            warn!("failed to spawn audio feeder: {err}");
            None
        }
    }
}

/// Runs the simulation without a window for `--frames` frames.
///
/// Without `--realtime` the wav file is analyzed inline, one hop per frame,
/// so runs are deterministic for a fixed seed.
pub fn run_headless(
    args: &Args,
    cfg: &AppConfig,
    stop_flag: Arc<AtomicBool>,
) -> Result<(), Box<dyn Error>> {
    let mut sim = Simulation::new(cfg.simulation(), &cfg.selection);
    let (tx, mut mailbox) = channel(MAILBOX_CAPACITY, cfg.selection.clone());

    let mut inline_audio = None;
    let mut feeder = None;
    let audio = open_audio(args, cfg);
    if args.realtime {
        feeder = spawn_feeder(audio, &tx, &stop_flag);
    } else {
        inline_audio = audio;
    }

    info!(
        "headless: {} frames, {} particles, {}",
        args.frames,
        sim.cloud().len(),
        sim.selection().shape
    );

    let dt = 1.0 / FRAME_RATE;
    let period = Duration::from_secs_f32(dt);
    let mut next_deadline = Instant::now();
    let started = Instant::now();

    for frame in 0..args.frames {
        if stop_flag.load(Ordering::SeqCst) {
            info!("stop requested at frame {frame}");
            break;
        }
        next_deadline += period;

        if let Some((source, analyzer)) = inline_audio.as_mut() {
            match next_bands(source, analyzer, FRAME_RATE) {
                Some(bands) => {
                    tx.publish(Signal::Audio(bands));
                }
                None => {
                    info!("audio source exhausted");
                    tx.publish(Signal::AudioLost);
                    inline_audio = None;
                }
            }
        }

        let view = sim.step(mailbox.latest(), dt);
        if view.frame % STATS_EVERY == 0 {
            info!(
                frame = view.frame,
                speed = view.stats.mean_speed,
                heat = view.stats.mean_heat,
                distance = view.stats.mean_distance,
                scale = view.core.scale,
                "step"
            );
        }

        if args.realtime {
            let now = Instant::now();
            if now < next_deadline {
                thread::sleep(next_deadline - now);
            } else {
                next_deadline = now;
                trace!("frame overrun");
            }
        }
    }

    let elapsed = started.elapsed().as_secs_f32();
    info!(
        "headless done: {} frames in {:.2}s",
        sim.frame(),
        elapsed
    );

    if let Some(handle) = feeder {
        stop_flag.store(true, Ordering::SeqCst);
        let _ = handle.join();
    }
    Ok(())
}

pub struct App {
    sim: Simulation,
    mailbox: SignalMailbox,
    _tx: SignalSender,
    feeder: Option<JoinHandle<()>>,
    max_count: usize,
    world_radius: f32,
    exiting: Arc<AtomicBool>,
}

impl App {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        args: &Args,
        cfg: AppConfig,
        stop_flag: Arc<AtomicBool>,
    ) -> Self {
        let sim = Simulation::new(cfg.simulation(), &cfg.selection);
        let (tx, mailbox) = channel(MAILBOX_CAPACITY, sim.selection().clone());
        let feeder = spawn_feeder(open_audio(args, &cfg), &tx, &stop_flag);

        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        Self {
            sim,
            mailbox,
            _tx: tx,
            feeder,
            max_count: cfg.particles.max_count,
            world_radius: cfg.particles.radius,
            exiting: stop_flag,
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.exiting.load(Ordering::SeqCst) {
            info!("SIGINT received: closing window.");
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        let dt = ctx.input(|i| i.stable_dt);

        egui::TopBottomPanel::top("selection").show(ctx, |ui| {
            controls::selection_controls(
                ui,
                &mut self.mailbox.snapshot_mut().selection,
                self.max_count,
            );
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            let snap = self.mailbox.snapshot_mut();
            let audio = snap.audio;
            let hand = snap.hand.is_some_and(|h| h.is_detected);
            controls::status_line(ui, &self.sim.view(), audio.as_ref(), hand);
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
                self.mailbox.snapshot_mut().pointer =
                    viewport::normalized_pointer(response.hover_pos(), rect);

                let view = self.sim.step(self.mailbox.latest(), dt);
                viewport::paint_cloud(&ui.painter_at(rect), rect, &view, self.world_radius);
            });

        ctx.request_repaint();
    }
}

impl Drop for App {
    fn drop(&mut self) {
        info!("App drop. Finalizing..");
        self.exiting.store(true, Ordering::SeqCst);
        if let Some(handle) = self.feeder.take() {
            let _ = handle.join();
        }
    }
}
