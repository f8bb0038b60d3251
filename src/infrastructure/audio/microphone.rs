use std::sync::mpsc;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use cpal::traits::DeviceTrait;
use cpal::traits::StreamTrait;
use cpal::FromSample;
use cpal::Sample;
use cpal::SampleFormat;
use cpal::SizedSample;
use cpal::Stream;
use cpal::StreamConfig;
use tokio::sync::oneshot;

use super::device::get_or_default_input;
use super::wav::downmix;
use super::wav::encode_wav;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AudioPayload;
use crate::domain::models::Recorder;

type Samples = Arc<Mutex<Vec<f32>>>;

fn build_stream<T>(device: &cpal::Device, config: &StreamConfig, samples: Samples) -> Result<Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = usize::from(config.channels);
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let data = data
                .iter()
                .map(|sample| return f32::from_sample(*sample))
                .collect::<Vec<f32>>();
            if let Ok(mut buffer) = samples.lock() {
                buffer.extend(downmix(&data, channels));
            }
        },
        |err| tracing::error!(error = ?err, "Microphone stream failed"),
        None,
    )?;

    return Ok(stream);
}

fn open_stream(device_name: &str, samples: Samples) -> Result<(Stream, u32)> {
    let device = get_or_default_input(device_name)?;
    let supported = device.default_input_config()?;
    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.into();

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, samples)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, samples)?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, samples)?,
        format => bail!("Unsupported microphone sample format {format}"),
    };
    stream.play()?;

    tracing::debug!(
        device = device.name().unwrap_or_default(),
        sample_rate = config.sample_rate.0,
        channels = config.channels,
        "Microphone opened"
    );

    return Ok((stream, config.sample_rate.0));
}

struct Capture {
    stop_tx: mpsc::Sender<()>,
    thread: thread::JoinHandle<()>,
    samples: Samples,
    sample_rate: u32,
}

/// Records from a cpal input device. The stream is not `Send`, so it lives on
/// its own thread for as long as the recording runs.
pub struct Microphone {
    device_name: String,
    capture: Option<Capture>,
}

impl Default for Microphone {
    fn default() -> Microphone {
        return Microphone {
            device_name: Config::get(ConfigKey::InputDevice),
            capture: None,
        };
    }
}

#[async_trait]
impl Recorder for Microphone {
    #[allow(clippy::implicit_return)]
    async fn start(&mut self) -> Result<()> {
        if self.capture.is_some() {
            bail!("Already recording");
        }

        let samples: Samples = Arc::new(Mutex::new(vec![]));
        let (ready_tx, ready_rx) = oneshot::channel::<Result<u32>>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let device_name = self.device_name.to_string();
        let thread_samples = samples.clone();
        let thread = thread::spawn(move || {
            let stream = match open_stream(&device_name, thread_samples) {
                Ok((stream, sample_rate)) => {
                    if ready_tx.send(Ok(sample_rate)).is_err() {
                        return;
                    }
                    stream
                }
                Err(err) => {
                    if ready_tx.send(Err(err)).is_err() {
                        tracing::debug!("Microphone error dropped, recorder is gone");
                    }
                    return;
                }
            };

            // Runs until stop is requested or the recorder is dropped.
            let _ = stop_rx.recv();
            drop(stream);
        });

        let sample_rate = ready_rx
            .await
            .map_err(|_| return anyhow!("Microphone thread exited unexpectedly"))??;

        self.capture = Some(Capture {
            stop_tx,
            thread,
            samples,
            sample_rate,
        });

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn stop(&mut self) -> Result<Option<AudioPayload>> {
        let Some(capture) = self.capture.take() else {
            return Ok(None);
        };

        if capture.stop_tx.send(()).is_err() {
            tracing::debug!("Microphone thread already stopped");
        }
        let thread = capture.thread;
        tokio::task::spawn_blocking(move || return thread.join())
            .await?
            .map_err(|_| return anyhow!("Microphone thread panicked"))?;

        let samples = {
            let mut buffer = capture
                .samples
                .lock()
                .map_err(|_| return anyhow!("Microphone buffer poisoned"))?;
            std::mem::take(&mut *buffer)
        };
        tracing::debug!(frames = samples.len(), "Microphone closed");

        if samples.is_empty() {
            return Ok(None);
        }

        let bytes = encode_wav(&samples, capture.sample_rate)?;
        return Ok(Some(AudioPayload::wav(bytes)));
    }
}
