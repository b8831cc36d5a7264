//! Microphone capture using cpal.
//!
//! Opens the default input device as mono i16, preferring 44.1/48 kHz.
//! Gated behind `#[cfg(feature = "audio")]` — without the feature the
//! recorder only accepts injected [`CaptureDevice`] implementations.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SampleRate, StreamConfig};

use super::progress::format_size;
use super::recorder::{CaptureDevice, CaptureStream, RecorderError, RecorderSession};

/// How long to wait for the device thread to acquire the microphone.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(2);

/// The system default microphone.
pub struct SystemMicrophone;

impl CaptureDevice for SystemMicrophone {
    fn open(&self) -> Result<CaptureStream, RecorderError> {
        let (frame_tx, frame_rx) = mpsc::sync_channel::<Vec<i16>>(64);
        // Keeps the stream-owning thread alive; dropping the sender ends it.
        let (keep_tx, keep_rx) = mpsc::channel::<()>();
        // Startup handshake: the thread reports the negotiated sample rate,
        // or why acquisition failed.
        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, String>>();

        thread::spawn(move || {
            let host = cpal::default_host();
            let device = match host.default_input_device() {
                Some(d) => d,
                None => {
                    let _ = ready_tx.send(Err("no audio input device found".into()));
                    return;
                }
            };

            let dev_name = device.name().unwrap_or_else(|_| "unknown".into());

            let (config, sample_rate) = match pick_config(&device) {
                Some(c) => c,
                None => {
                    let _ = ready_tx.send(Err(format!(
                        "no suitable input config for {}",
                        dev_name
                    )));
                    return;
                }
            };

            let stream = match device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let _ = frame_tx.try_send(data.to_vec());
                },
                move |err| {
                    tracing::warn!("Audio input stream error: {}", err);
                },
                None,
            ) {
                Ok(s) => s,
                Err(e) => {
                    let _ = ready_tx.send(Err(format!("failed to build input stream: {}", e)));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(format!("failed to start input stream: {}", e)));
                return;
            }

            tracing::info!("Microphone open: {} at {} Hz", dev_name, sample_rate);
            let _ = ready_tx.send(Ok(sample_rate));

            // Park this thread; the stream stays alive until keep_rx closes.
            let _ = keep_rx.recv();
            drop(stream);
        });

        match ready_rx.recv_timeout(ACQUIRE_TIMEOUT) {
            Ok(Ok(sample_rate)) => Ok(CaptureStream::new(sample_rate, frame_rx, keep_tx)),
            Ok(Err(reason)) => Err(RecorderError::AccessDenied(reason)),
            Err(_) => Err(RecorderError::AccessDenied(
                "timed out acquiring microphone".into(),
            )),
        }
    }
}

/// Pick a mono i16 input config, preferring 48000 then 44100 Hz.
fn pick_config(device: &Device) -> Option<(StreamConfig, u32)> {
    let configs: Vec<cpal::SupportedStreamConfigRange> =
        device.supported_input_configs().ok()?.collect();

    for cfg in &configs {
        if cfg.sample_format() != SampleFormat::I16 {
            continue;
        }
        let rate = if cfg.min_sample_rate() <= SampleRate(48000)
            && cfg.max_sample_rate() >= SampleRate(48000)
        {
            48000
        } else if cfg.min_sample_rate() <= SampleRate(44100)
            && cfg.max_sample_rate() >= SampleRate(44100)
        {
            44100
        } else {
            cfg.max_sample_rate().0
        };
        let mut sc: StreamConfig = cfg.clone().with_sample_rate(SampleRate(rate)).into();
        sc.channels = 1;
        return Some((sc, rate));
    }

    // Fallback: force mono i16 on whatever the device offers.
    configs.first().map(|cfg| {
        let rate = cfg.max_sample_rate().0.clamp(8000, 48000);
        let sc = StreamConfig {
            channels: 1,
            sample_rate: SampleRate(rate),
            buffer_size: cpal::BufferSize::Default,
        };
        (sc, rate)
    })
}

/// Capture 3 seconds from the default microphone and write a WAV next to the
/// current directory, so users can verify their input device works.
pub fn mic_test() -> anyhow::Result<()> {
    use anyhow::bail;

    println!("=== Microphone Test ===");
    println!("Recording for 3 seconds — speak now!\n");

    let mut session = RecorderSession::new();
    if let Err(e) = session.start(&SystemMicrophone) {
        bail!("{}", e);
    }

    let start = std::time::Instant::now();
    while start.elapsed() < Duration::from_secs(3) {
        session.poll();
        thread::sleep(Duration::from_millis(20));
    }

    match session.stop() {
        Some(attachment) => {
            let path = std::path::Path::new(&attachment.file_name).to_path_buf();
            std::fs::write(&path, attachment.data.as_slice())?;
            println!(
                "Saved {} ({})",
                path.display(),
                format_size(attachment.size)
            );
            Ok(())
        }
        None => bail!("No audio captured — is the microphone muted?"),
    }
}
