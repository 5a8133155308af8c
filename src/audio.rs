use crate::analyser::{Analyser, FrequencySource};
use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat};
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer as _, Producer as _, Split as _};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio input disabled")]
    Disabled,
    #[error("no default input device found")]
    NoDefaultDevice,
    #[error("no input device matching: {0}")]
    NoMatchingDevice(String),
    #[error("enumerate input devices: {0}")]
    Enumerate(#[from] cpal::DevicesError),
    #[error("get default input config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("build input stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("start input stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
    #[error("spawn capture thread: {0}")]
    Spawn(#[source] io::Error),
    #[error("capture thread exited before reporting")]
    WorkerGone,
}

/// A live audio session the animation loop can sample and the visualizer can close.
pub trait AudioInput {
    fn source(&mut self) -> &mut dyn FrequencySource;
    fn close(&mut self);
    fn is_running(&self) -> bool;
    fn label(&self) -> &str;
}

pub fn list_input_devices() -> anyhow::Result<()> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .context("enumerate input devices")?;

    let mut out = io::stdout();
    writeln!(out, "Input devices:")?;
    for dev in devices {
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        writeln!(out, "  - {}", name)?;
    }
    Ok(())
}

struct CaptureLink {
    cons: ringbuf::HeapCons<f32>,
    stop: Arc<AtomicBool>,
    sample_rate_hz: u32,
    device_name: String,
}

/// Microphone acquisition in flight; resolves once the capture thread reports back.
pub struct PendingAcquisition {
    rx: Option<Receiver<Result<CaptureLink, AudioError>>>,
    worker: Option<thread::JoinHandle<()>>,
    failed: Option<AudioError>,
}

impl PendingAcquisition {
    /// `None` while the device is still being opened, and after the result was taken.
    pub fn poll(&mut self) -> Option<Result<AudioSession, AudioError>> {
        if let Some(err) = self.failed.take() {
            self.rx = None;
            return Some(Err(err));
        }
        let rx = self.rx.as_ref()?;
        let outcome = match rx.try_recv() {
            Ok(Ok(link)) => Ok(AudioSession::from_link(link, self.worker.take())),
            Ok(Err(err)) => Err(err),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(AudioError::WorkerGone),
        };
        self.rx = None;
        if outcome.is_err() {
            if let Some(h) = self.worker.take() {
                let _ = h.join();
            }
        }
        Some(outcome)
    }
}

impl Drop for PendingAcquisition {
    fn drop(&mut self) {
        // A link that was sent but never collected would leave the capture thread parked.
        if let Some(Ok(link)) = self.rx.take().and_then(|rx| rx.try_recv().ok()) {
            link.stop.store(true, Ordering::Relaxed);
            if let Some(h) = self.worker.take() {
                h.thread().unpark();
            }
        }
    }
}

/// Open the microphone on a background thread. The cpal stream stays on that thread until
/// the session is closed.
pub fn acquire(device_query: Option<String>) -> PendingAcquisition {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("mic-capture".to_string())
        .spawn(move || {
            let (stream, link) = match open_mic(device_query.as_deref()) {
                Ok(v) => v,
                Err(err) => {
                    let _ = tx.send(Err(err));
                    return;
                }
            };
            let stop = Arc::clone(&link.stop);
            if tx.send(Ok(link)).is_err() {
                return;
            }
            while !stop.load(Ordering::Relaxed) {
                thread::park_timeout(Duration::from_millis(50));
            }
            drop(stream);
        });

    match spawned {
        Ok(worker) => PendingAcquisition {
            rx: Some(rx),
            worker: Some(worker),
            failed: None,
        },
        Err(err) => PendingAcquisition {
            rx: None,
            worker: None,
            failed: Some(AudioError::Spawn(err)),
        },
    }
}

/// An acquisition that immediately reports `err`, for `--no-audio` and tests.
pub fn refused(err: AudioError) -> PendingAcquisition {
    PendingAcquisition {
        rx: None,
        worker: None,
        failed: Some(err),
    }
}

fn open_mic(device_query: Option<&str>) -> Result<(cpal::Stream, CaptureLink), AudioError> {
    let host = cpal::default_host();
    let device = select_mic_input_device(&host, device_query)?;
    let device_name = device.name().unwrap_or_else(|_| "<unknown>".to_string());
    let supported = device.default_input_config()?;
    let sample_rate_hz = supported.sample_rate().0;
    let channels = supported.channels() as usize;
    let config: cpal::StreamConfig = supported.clone().into();

    let rb_capacity = (sample_rate_hz as usize).max(4096);
    let rb = HeapRb::<f32>::new(rb_capacity);
    let (mut prod, cons) = rb.split();

    let err_fn = |err| log::error!("audio stream error: {err}");

    let stream = match supported.sample_format() {
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _| push_interleaved(data, channels, &mut prod),
            err_fn,
            None,
        )?,
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _| push_interleaved(data, channels, &mut prod),
            err_fn,
            None,
        )?,
        SampleFormat::U16 => device.build_input_stream(
            &config,
            move |data: &[u16], _| push_interleaved(data, channels, &mut prod),
            err_fn,
            None,
        )?,
        fmt => return Err(AudioError::UnsupportedFormat(format!("{fmt:?}"))),
    };

    stream.play()?;

    let link = CaptureLink {
        cons,
        stop: Arc::new(AtomicBool::new(false)),
        sample_rate_hz,
        device_name,
    };
    Ok((stream, link))
}

fn select_mic_input_device(
    host: &cpal::Host,
    device_query: Option<&str>,
) -> Result<cpal::Device, AudioError> {
    let devices = host.input_devices()?.collect::<Vec<_>>();

    let want = device_query.map(|s| s.to_lowercase());
    if let Some(want) = want.as_deref() {
        if let Some(dev) = devices.iter().find(|d| {
            d.name()
                .map(|n| n.to_lowercase().contains(want))
                .unwrap_or(false)
        }) {
            return Ok(dev.clone());
        }
        return Err(AudioError::NoMatchingDevice(want.to_string()));
    }

    host.default_input_device()
        .ok_or(AudioError::NoDefaultDevice)
}

fn push_interleaved<T: Sample<Float = f32> + Copy>(
    data: &[T],
    channels: usize,
    prod: &mut ringbuf::HeapProd<f32>,
) {
    for frame in data.chunks(channels.max(1)) {
        let mut acc = 0.0f32;
        for s in frame {
            acc += (*s).to_float_sample();
        }
        let mono = acc / frame.len().max(1) as f32;
        let _ = prod.try_push(mono);
    }
}

/// Microphone stream plus its analyser, owned by one visualizer.
pub struct AudioSession {
    cons: ringbuf::HeapCons<f32>,
    analyser: Analyser,
    stop: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
    label: String,
    pub sample_rate_hz: u32,
}

impl AudioSession {
    fn from_link(link: CaptureLink, worker: Option<thread::JoinHandle<()>>) -> Self {
        log::info!(
            "microphone open: {} @ {} Hz",
            link.device_name,
            link.sample_rate_hz
        );
        Self {
            cons: link.cons,
            analyser: Analyser::default(),
            stop: link.stop,
            worker,
            label: link.device_name,
            sample_rate_hz: link.sample_rate_hz,
        }
    }

    fn drain(&mut self) {
        let mut chunk = [0.0f32; 512];
        loop {
            let mut n = 0;
            while n < chunk.len() {
                match self.cons.try_pop() {
                    Some(s) => {
                        chunk[n] = s;
                        n += 1;
                    }
                    None => break,
                }
            }
            self.analyser.push_samples(&chunk[..n]);
            if n < chunk.len() {
                break;
            }
        }
    }
}

impl FrequencySource for AudioSession {
    fn frequency_bin_count(&self) -> usize {
        self.analyser.frequency_bin_count()
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.drain();
        self.analyser.byte_frequency_data(out);
    }
}

impl AudioInput for AudioSession {
    fn source(&mut self) -> &mut dyn FrequencySource {
        self
    }

    fn close(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.stop.store(true, Ordering::Relaxed);
        worker.thread().unpark();
        let _ = worker.join();
        log::info!("microphone closed: {}", self.label);
    }

    fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        self.close();
    }
}
