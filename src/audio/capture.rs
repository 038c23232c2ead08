use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapRb};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::error::CaptureError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Anything that can hand out fixed-size windows of signed 16-bit mono PCM.
pub trait SampleSource {
    /// Blocks until `window` is completely filled.
    fn read_window(&mut self, window: &mut [i16]) -> Result<(), CaptureError>;
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub sample_rate: u32,
    pub window_samples: usize,
    /// Substring of the input device name; the host default when `None`.
    pub device: Option<String>,
}

impl CaptureSettings {
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs_f64(self.window_samples as f64 / f64::from(self.sample_rate.max(1)))
    }
}

/// Default (or named) input device, first channel only.
///
/// `cpal::Stream` is not `Send` on every host, so the microphone must be
/// opened on the thread that reads from it.
pub struct Microphone {
    _stream: cpal::Stream,
    consumer: HeapCons<i16>,
    errors: mpsc::Receiver<String>,
    stall_after: Duration,
    pub sample_rate: u32,
}

fn device_error(err: impl std::fmt::Display) -> CaptureError {
    CaptureError::Device(err.to_string())
}

impl Microphone {
    pub fn open(settings: &CaptureSettings) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = match &settings.device {
            Some(wanted) => host
                .input_devices()
                .map_err(device_error)?
                .find(|d| d.name().map(|n| n.contains(wanted.as_str())).unwrap_or(false))
                .ok_or_else(|| CaptureError::DeviceNotFound(wanted.clone()))?,
            None => host.default_input_device().ok_or(CaptureError::NoDevice)?,
        };

        info!("Audio Input Device: {}", device.name().unwrap_or_default());

        // Prefer mono at the requested rate, then any channel count at that rate.
        let rate = settings.sample_rate;
        let mut selected: Option<cpal::SupportedStreamConfig> = None;
        for range in device.supported_input_configs().map_err(device_error)? {
            if range.min_sample_rate().0 > rate || range.max_sample_rate().0 < rate {
                continue;
            }
            let is_mono = range.channels() == 1;
            let candidate = range.with_sample_rate(cpal::SampleRate(rate));
            if is_mono {
                selected = Some(candidate);
                break;
            }
            if selected.is_none() {
                selected = Some(candidate);
            }
        }

        let config = selected.ok_or_else(|| {
            CaptureError::UnsupportedFormat(format!("{} Hz is not supported by the input device", rate))
        })?;
        let channels = usize::from(config.channels()).max(1);
        let sample_format = config.sample_format();
        let stream_config: cpal::StreamConfig = config.into();

        info!(
            "Audio Config Selected: Rate={}Hz, Channels={}, Format={:?}",
            rate, channels, sample_format
        );

        // Room for a few windows so a slow reader does not drop samples.
        let rb = HeapRb::<i16>::new(settings.window_samples.max(1) * 4);
        let (mut producer, consumer) = rb.split();

        let (err_tx, errors) = mpsc::channel();
        let err_fn = move |err: cpal::StreamError| {
            error!("an error occurred on stream: {}", err);
            let _ = err_tx.send(err.to_string());
        };

        let stream = match sample_format {
            cpal::SampleFormat::I16 => device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &_| write_input_data(data, channels, &mut producer),
                err_fn,
                None,
            ),
            cpal::SampleFormat::F32 => device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &_| write_input_data_f32(data, channels, &mut producer),
                err_fn,
                None,
            ),
            cpal::SampleFormat::U16 => device.build_input_stream(
                &stream_config,
                move |data: &[u16], _: &_| write_input_data_u16(data, channels, &mut producer),
                err_fn,
                None,
            ),
            other => return Err(CaptureError::UnsupportedFormat(format!("{:?}", other))),
        }
        .map_err(device_error)?;

        stream.play().map_err(device_error)?;

        Ok(Self {
            _stream: stream,
            consumer,
            errors,
            stall_after: settings.window_duration() * 4 + Duration::from_secs(1),
            sample_rate: rate,
        })
    }
}

impl SampleSource for Microphone {
    fn read_window(&mut self, window: &mut [i16]) -> Result<(), CaptureError> {
        let mut filled = 0;
        let mut last_progress = Instant::now();

        while filled < window.len() {
            if let Ok(message) = self.errors.try_recv() {
                return Err(CaptureError::Stream(message));
            }

            let read = self.consumer.pop_slice(&mut window[filled..]);
            if read == 0 {
                let waited = last_progress.elapsed();
                if waited > self.stall_after {
                    return Err(CaptureError::Stalled { waited });
                }
                std::thread::sleep(POLL_INTERVAL);
                continue;
            }

            filled += read;
            last_progress = Instant::now();
        }

        Ok(())
    }
}

// A full queue drops the incoming samples (lossy).
fn write_input_data<P>(input: &[i16], channels: usize, producer: &mut P)
where
    P: Producer<Item = i16>,
{
    for &sample in input.iter().step_by(channels) {
        let _ = producer.try_push(sample);
    }
}

fn write_input_data_f32<P>(input: &[f32], channels: usize, producer: &mut P)
where
    P: Producer<Item = i16>,
{
    for &sample in input.iter().step_by(channels) {
        let _ = producer.try_push((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16);
    }
}

fn write_input_data_u16<P>(input: &[u16], channels: usize, producer: &mut P)
where
    P: Producer<Item = i16>,
{
    for &sample in input.iter().step_by(channels) {
        let _ = producer.try_push((i32::from(sample) - 32_768) as i16);
    }
}
