//! Software mixing core shared by the cpal-driven backends.
//!
//! Voice slots live behind a mutex that the real-time callback only ever
//! `try_lock`s; on contention it outputs silence for that buffer rather
//! than blocking the audio thread. The cpal stream itself is owned by a
//! dedicated output thread, since streams cannot cross threads.

use crate::attenuation::{self, Attenuation};
use crate::backend::{Preload, VoiceKind, VoiceRef};
use crate::clip::{Clip, ClipFormat};
use crate::error::{AuraSonicError, Result};
use crate::math::Vec3;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Output is always rendered interleaved stereo and converted to the
/// device sample type at the end.
const OUTPUT_CHANNELS: usize = 2;

const STREAM_POLL_INTERVAL: Duration = Duration::from_millis(200);

thread_local! {
    // Accumulation buffer reused across callbacks to avoid allocating on
    // the audio thread.
    static MIX_BUFFER: RefCell<Vec<f32>> = const { RefCell::new(Vec::new()) };
}

pub(super) struct ListenerFrame {
    pub position: Vec3,
    pub look: Vec3,
    pub up: Vec3,
}

impl Default for ListenerFrame {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            look: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }
}

struct StreamLine {
    format: ClipFormat,
    queue: VecDeque<Vec<u8>>,
    /// Byte offset of the current frame within the head chunk.
    head_offset: usize,
    /// Fractional clip-frame accumulator for rate conversion.
    frac: f64,
    /// Chunks fully consumed and not yet replaced by `queue`.
    processed: usize,
}

enum VoiceContent {
    Empty,
    OneShot {
        clip: Arc<Clip>,
        /// Clip frame cursor, fractional during rate conversion.
        cursor: f64,
        looping: bool,
    },
    Stream(StreamLine),
}

pub(super) struct VoiceSlot {
    kind: VoiceKind,
    playing: bool,
    paused: bool,
    gain: f32,
    pan: f32,
    position: Vec3,
    rolloff: f32,
    content: VoiceContent,
}

impl VoiceSlot {
    fn new(kind: VoiceKind) -> Self {
        Self {
            kind,
            playing: false,
            paused: false,
            gain: 1.0,
            pan: 0.0,
            position: Vec3::ZERO,
            rolloff: 0.0,
            content: VoiceContent::Empty,
        }
    }

    fn rewind(&mut self) {
        if let VoiceContent::OneShot { cursor, .. } = &mut self.content {
            *cursor = 0.0;
        }
    }

    fn flush(&mut self) {
        if let VoiceContent::Stream(line) = &mut self.content {
            line.queue.clear();
            line.head_offset = 0;
            line.frac = 0.0;
            line.processed = 0;
        }
    }

    fn is_audible(&self) -> bool {
        if !self.playing || self.paused {
            return false;
        }
        match &self.content {
            VoiceContent::Empty => false,
            VoiceContent::OneShot { clip, cursor, looping } => {
                let frames = clip.len() / clip.format().bytes_per_frame();
                *looping || (*cursor as usize) < frames
            }
            VoiceContent::Stream(line) => !line.queue.is_empty(),
        }
    }
}

pub(super) struct MixerState {
    /// True for the spatializing backend: per-voice gain and pan are
    /// derived from positions and the listener pose inside the callback.
    spatialize: bool,
    voices: Mutex<Vec<VoiceSlot>>,
    listener: Mutex<ListenerFrame>,
    master_gain: AtomicU32,
    device_rate: AtomicU32,
}

impl MixerState {
    fn master(&self) -> f32 {
        f32::from_bits(self.master_gain.load(Ordering::Relaxed))
    }
}

/// Handle to the output thread that owns the cpal stream.
struct OutputController {
    should_drop: Arc<AtomicBool>,
}

pub(super) struct MixerCore {
    state: Arc<MixerState>,
    controller: Mutex<Option<OutputController>>,
}

impl MixerCore {
    pub fn new(spatialize: bool) -> Self {
        Self {
            state: Arc::new(MixerState {
                spatialize,
                voices: Mutex::new(Vec::new()),
                listener: Mutex::new(ListenerFrame::default()),
                master_gain: AtomicU32::new(1.0f32.to_bits()),
                device_rate: AtomicU32::new(0),
            }),
            controller: Mutex::new(None),
        }
    }

    pub fn device_available() -> bool {
        cpal::default_host().default_output_device().is_some()
    }

    /// Opens the default output device and starts the render stream on a
    /// dedicated thread.
    pub fn open(&self) -> Result<()> {
        let state = self.state.clone();
        let should_drop = Arc::new(AtomicBool::new(false));
        let thread_flag = should_drop.clone();
        let (result_tx, result_rx) = crossbeam_channel::bounded::<Result<u32>>(1);

        std::thread::Builder::new()
            .name("aurasonic-output".into())
            .spawn(move || match build_stream(state) {
                Ok((stream, rate)) => {
                    let _ = result_tx.send(Ok(rate));
                    while !thread_flag.load(Ordering::SeqCst) {
                        std::thread::sleep(STREAM_POLL_INTERVAL);
                    }
                    drop(stream);
                }
                Err(e) => {
                    let _ = result_tx.send(Err(e));
                }
            })
            .map_err(|e| AuraSonicError::Backend(format!("failed to spawn output thread: {e}")))?;

        let rate = result_rx
            .recv()
            .map_err(|_| AuraSonicError::Backend("output thread died during open".into()))??;
        self.state.device_rate.store(rate, Ordering::SeqCst);
        *self.controller.lock().unwrap() = Some(OutputController { should_drop });
        log::info!("output device opened at {rate} Hz");
        Ok(())
    }

    pub fn shutdown(&self) {
        if let Some(controller) = self.controller.lock().unwrap().take() {
            controller.should_drop.store(true, Ordering::SeqCst);
        }
        if let Ok(mut voices) = self.state.voices.lock() {
            for slot in voices.iter_mut() {
                slot.playing = false;
                slot.flush();
                slot.content = VoiceContent::Empty;
            }
        }
    }

    fn with_voice<R>(&self, voice: VoiceRef, f: impl FnOnce(&mut VoiceSlot) -> R) -> Option<R> {
        let mut voices = self.state.voices.lock().unwrap();
        voices.get_mut(voice).map(f)
    }

    pub fn create_voice(&self, kind: VoiceKind) -> Option<VoiceRef> {
        let mut voices = self.state.voices.lock().unwrap();
        voices.push(VoiceSlot::new(kind));
        Some(voices.len() - 1)
    }

    pub fn attach_oneshot(&self, voice: VoiceRef, clip: &Arc<Clip>, looping: bool) -> Result<()> {
        clip.format().validate()?;
        self.with_voice(voice, |slot| {
            if slot.kind != VoiceKind::Normal {
                return Err(AuraSonicError::Backend(
                    "clips may only be attached to normal voices".into(),
                ));
            }
            slot.playing = false;
            slot.paused = false;
            slot.content = VoiceContent::OneShot {
                clip: clip.clone(),
                cursor: 0.0,
                looping,
            };
            Ok(())
        })
        .unwrap_or(Err(AuraSonicError::Backend("no such voice".into())))
    }

    pub fn reset_stream(&self, voice: VoiceRef, format: ClipFormat) -> Result<()> {
        format.validate()?;
        self.with_voice(voice, |slot| {
            if slot.kind != VoiceKind::Streaming {
                return Err(AuraSonicError::Backend(
                    "buffers may only be queued on streaming voices".into(),
                ));
            }
            slot.playing = false;
            slot.paused = false;
            slot.content = VoiceContent::Stream(StreamLine {
                format,
                queue: VecDeque::new(),
                head_offset: 0,
                frac: 0.0,
                processed: 0,
            });
            Ok(())
        })
        .unwrap_or(Err(AuraSonicError::Backend("no such voice".into())))
    }

    /// Appends the initial chunks of a (re)started stream. A fresh start
    /// clears old data via `reset_stream`; appending here keeps the tail
    /// of a looping stream audible across the wrap.
    pub fn preload(&self, voice: VoiceRef, chunks: Vec<Vec<u8>>) -> Result<Preload> {
        self.with_voice(voice, |slot| match &mut slot.content {
            VoiceContent::Stream(line) => {
                if chunks.is_empty() {
                    return Ok(Preload::EndOfStream);
                }
                for chunk in chunks {
                    line.queue.push_back(chunk);
                }
                Ok(Preload::Queued)
            }
            _ => Err(AuraSonicError::Backend(
                "preload on a voice without a stream".into(),
            )),
        })
        .unwrap_or(Err(AuraSonicError::Backend("no such voice".into())))
    }

    pub fn queue(&self, voice: VoiceRef, chunk: &[u8]) -> Result<()> {
        if chunk.is_empty() {
            return Err(AuraSonicError::InvalidArgument(
                "empty stream chunk".into(),
            ));
        }
        self.with_voice(voice, |slot| match &mut slot.content {
            VoiceContent::Stream(line) => {
                line.queue.push_back(chunk.to_vec());
                line.processed = line.processed.saturating_sub(1);
                Ok(())
            }
            _ => Err(AuraSonicError::Backend(
                "queue on a voice without a stream".into(),
            )),
        })
        .unwrap_or(Err(AuraSonicError::Backend("no such voice".into())))
    }

    pub fn buffers_processed(&self, voice: VoiceRef) -> usize {
        self.with_voice(voice, |slot| match &slot.content {
            VoiceContent::Stream(line) => line.processed,
            _ => 0,
        })
        .unwrap_or(0)
    }

    pub fn play(&self, voice: VoiceRef) {
        self.with_voice(voice, |slot| {
            slot.playing = true;
            slot.paused = false;
        });
    }

    pub fn pause(&self, voice: VoiceRef) {
        self.with_voice(voice, |slot| slot.paused = true);
    }

    pub fn stop(&self, voice: VoiceRef) {
        self.with_voice(voice, |slot| {
            slot.playing = false;
            slot.paused = false;
            slot.rewind();
        });
    }

    pub fn rewind(&self, voice: VoiceRef) {
        self.with_voice(voice, VoiceSlot::rewind);
    }

    pub fn flush(&self, voice: VoiceRef) {
        self.with_voice(voice, VoiceSlot::flush);
    }

    pub fn close(&self, voice: VoiceRef) {
        self.with_voice(voice, |slot| {
            slot.playing = false;
            slot.paused = false;
            slot.flush();
            slot.content = VoiceContent::Empty;
        });
    }

    pub fn is_playing(&self, voice: VoiceRef) -> bool {
        self.with_voice(voice, |slot| slot.is_audible())
            .unwrap_or(false)
    }

    pub fn set_gain(&self, voice: VoiceRef, gain: f32) {
        self.with_voice(voice, |slot| slot.gain = gain.clamp(0.0, 1.0));
    }

    /// Sets a pre-shaped linear amplitude, bypassing the unit clamp.
    /// Used by the software backend's decibel curve.
    pub fn set_amplitude(&self, voice: VoiceRef, amplitude: f32) {
        self.with_voice(voice, |slot| slot.gain = amplitude.max(0.0));
    }

    pub fn set_pan(&self, voice: VoiceRef, pan: f32) {
        self.with_voice(voice, |slot| slot.pan = pan.clamp(-1.0, 1.0));
    }

    pub fn set_3d(&self, voice: VoiceRef, position: Vec3, rolloff: f32, looping: bool) {
        self.with_voice(voice, |slot| {
            slot.position = position;
            slot.rolloff = rolloff;
            if let VoiceContent::OneShot { looping: l, .. } = &mut slot.content {
                *l = looping;
            }
        });
    }

    pub fn set_listener(&self, position: Vec3, look: Vec3, up: Vec3) {
        let mut listener = self.state.listener.lock().unwrap();
        listener.position = position;
        listener.look = look;
        listener.up = up;
    }

    pub fn set_master_gain(&self, gain: f32) {
        self.state
            .master_gain
            .store(gain.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }
}

fn build_stream(state: Arc<MixerState>) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AuraSonicError::Backend("no default output device".into()))?;
    let device_config = device
        .default_output_config()
        .map_err(|e| AuraSonicError::Backend(format!("failed to get device config: {e}")))?;

    let rate = device_config.sample_rate().0;
    let config = cpal::StreamConfig {
        channels: OUTPUT_CHANNELS as u16,
        sample_rate: cpal::SampleRate(rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let stream = match device_config.sample_format() {
        cpal::SampleFormat::F32 => build_typed_stream::<f32>(&device, &config, state)?,
        cpal::SampleFormat::I16 => build_typed_stream::<i16>(&device, &config, state)?,
        cpal::SampleFormat::U16 => build_typed_stream::<u16>(&device, &config, state)?,
        other => {
            return Err(AuraSonicError::Backend(format!(
                "unsupported device sample format {other:?}"
            )))
        }
    };

    stream
        .play()
        .map_err(|e| AuraSonicError::Backend(format!("failed to start stream: {e}")))?;
    Ok((stream, rate))
}

fn build_typed_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    state: Arc<MixerState>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                render_callback(data, &state);
            },
            move |err| {
                log::error!("audio stream error: {err}");
            },
            None,
        )
        .map_err(|e| AuraSonicError::Backend(format!("failed to build stream: {e}")))
}

fn render_callback<T>(data: &mut [T], state: &MixerState)
where
    T: SizedSample + FromSample<f32>,
{
    MIX_BUFFER.with(|buffer| {
        let mut mix = buffer.borrow_mut();
        mix.resize(data.len(), 0.0);
        mix.fill(0.0);
        render(state, &mut mix);
        for (out, sample) in data.iter_mut().zip(mix.iter()) {
            *out = T::from_sample(*sample);
        }
    });
}

/// Mixes all audible voices into an interleaved stereo f32 buffer.
fn render(state: &MixerState, output: &mut [f32]) {
    let Ok(mut voices) = state.voices.try_lock() else {
        return;
    };
    let master = state.master();
    let device_rate = state.device_rate.load(Ordering::Relaxed).max(1);

    let listener = if state.spatialize {
        match state.listener.try_lock() {
            Ok(frame) => Some(ListenerFrame {
                position: frame.position,
                look: frame.look,
                up: frame.up,
            }),
            Err(_) => None,
        }
    } else {
        None
    };

    for slot in voices.iter_mut() {
        if !slot.playing || slot.paused {
            continue;
        }
        let (gain, pan) = voice_gain_pan(state, slot, master, listener.as_ref());
        // Simple linear panning: the opposite channel fades out.
        let gain_left = gain * (1.0 - pan).min(1.0);
        let gain_right = gain * (1.0 + pan).min(1.0);

        match &mut slot.content {
            VoiceContent::Empty => {}
            VoiceContent::OneShot { clip, cursor, looping } => {
                let still_playing = mix_oneshot(
                    clip,
                    cursor,
                    *looping,
                    output,
                    device_rate,
                    gain_left,
                    gain_right,
                );
                if !still_playing {
                    slot.playing = false;
                }
            }
            VoiceContent::Stream(line) => {
                mix_stream(line, output, device_rate, gain_left, gain_right);
            }
        }
    }
}

fn voice_gain_pan(
    state: &MixerState,
    slot: &VoiceSlot,
    master: f32,
    listener: Option<&ListenerFrame>,
) -> (f32, f32) {
    if !state.spatialize {
        return (slot.gain * master, slot.pan);
    }
    let Some(frame) = listener else {
        return (slot.gain * master, 0.0);
    };
    let distance = slot.position.distance(frame.position);
    let falloff = attenuation::base_gain(Attenuation::InverseRolloff, distance, slot.rolloff);
    let mut pose = crate::listener::Listener::new();
    let _ = pose.set_position(frame.position);
    let _ = pose.set_orientation(frame.look, frame.up);
    let pan = attenuation::pan(slot.position, &pose);
    (slot.gain * falloff * master, pan)
}

/// Returns false once a non-looping clip has been fully played.
fn mix_oneshot(
    clip: &Arc<Clip>,
    cursor: &mut f64,
    looping: bool,
    output: &mut [f32],
    device_rate: u32,
    gain_left: f32,
    gain_right: f32,
) -> bool {
    let format = clip.format();
    let bytes_per_frame = format.bytes_per_frame();
    let total_frames = clip.len() / bytes_per_frame;
    if total_frames == 0 {
        return false;
    }
    let step = format.sample_rate as f64 / device_rate as f64;

    for frame in output.chunks_mut(OUTPUT_CHANNELS) {
        let mut index = *cursor as usize;
        if index >= total_frames {
            if !looping {
                return false;
            }
            *cursor -= total_frames as f64;
            index = *cursor as usize;
        }
        let (left, right) = read_frame(clip.bytes(), format, index * bytes_per_frame);
        frame[0] += left * gain_left;
        if let Some(sample) = frame.get_mut(1) {
            *sample += right * gain_right;
        }
        *cursor += step;
    }
    true
}

fn mix_stream(
    line: &mut StreamLine,
    output: &mut [f32],
    device_rate: u32,
    gain_left: f32,
    gain_right: f32,
) {
    let format = line.format;
    let bytes_per_frame = format.bytes_per_frame();
    let step = format.sample_rate as f64 / device_rate as f64;

    for frame in output.chunks_mut(OUTPUT_CHANNELS) {
        // Drop exhausted head chunks before reading.
        while let Some(head) = line.queue.front() {
            if line.head_offset + bytes_per_frame <= head.len() {
                break;
            }
            line.queue.pop_front();
            line.processed += 1;
            line.head_offset = 0;
        }
        let Some(head) = line.queue.front() else {
            // Underrun: leave the rest of the buffer silent.
            break;
        };

        let (left, right) = read_frame(head, format, line.head_offset);
        frame[0] += left * gain_left;
        if let Some(sample) = frame.get_mut(1) {
            *sample += right * gain_right;
        }

        line.frac += step;
        while line.frac >= 1.0 {
            line.frac -= 1.0;
            line.head_offset += bytes_per_frame;
        }
    }
}

/// Decodes one interleaved frame at `offset` into a stereo sample pair.
fn read_frame(bytes: &[u8], format: ClipFormat, offset: usize) -> (f32, f32) {
    let sample_at = |index: usize| -> f32 {
        match format.bits_per_sample {
            8 => bytes.get(index).map(|&b| b as i8).unwrap_or(0) as f32 / 128.0,
            _ => {
                let lo = bytes.get(index).copied().unwrap_or(0);
                let hi = bytes.get(index + 1).copied().unwrap_or(0);
                i16::from_le_bytes([lo, hi]) as f32 / 32768.0
            }
        }
    };
    let sample_bytes = format.bits_per_sample as usize / 8;
    let left = sample_at(offset);
    let right = if format.channels == 2 {
        sample_at(offset + sample_bytes)
    } else {
        left
    };
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_format() -> ClipFormat {
        ClipFormat::new(48000, 2, 16).unwrap()
    }

    fn mono_clip(frames: usize) -> Arc<Clip> {
        let format = ClipFormat::new(48000, 1, 16).unwrap();
        let mut bytes = Vec::new();
        for _ in 0..frames {
            bytes.extend_from_slice(&8192i16.to_le_bytes());
        }
        Arc::new(Clip::new(bytes, format).unwrap())
    }

    fn core_at_rate(spatialize: bool, rate: u32) -> MixerCore {
        let core = MixerCore::new(spatialize);
        core.state.device_rate.store(rate, Ordering::SeqCst);
        core
    }

    #[test]
    fn oneshot_mixes_and_completes() {
        let core = core_at_rate(false, 48000);
        let voice = core.create_voice(VoiceKind::Normal).unwrap();
        core.attach_oneshot(voice, &mono_clip(10), false).unwrap();
        core.play(voice);
        assert!(core.is_playing(voice));

        let mut output = vec![0.0f32; 64 * OUTPUT_CHANNELS];
        render(&core.state, &mut output);
        // First ten frames carry the clip on both channels, rest silent.
        assert!(output[0] > 0.2);
        assert!(output[1] > 0.2);
        assert_eq!(output[10 * OUTPUT_CHANNELS], 0.0);
        assert!(!core.is_playing(voice));
    }

    #[test]
    fn looping_oneshot_fills_whole_buffer() {
        let core = core_at_rate(false, 48000);
        let voice = core.create_voice(VoiceKind::Normal).unwrap();
        core.attach_oneshot(voice, &mono_clip(4), true).unwrap();
        core.play(voice);

        let mut output = vec![0.0f32; 32 * OUTPUT_CHANNELS];
        render(&core.state, &mut output);
        assert!(output.iter().all(|&s| s > 0.2));
        assert!(core.is_playing(voice));
    }

    #[test]
    fn stream_consumes_chunks_and_counts_processed() {
        let core = core_at_rate(false, 48000);
        let voice = core.create_voice(VoiceKind::Streaming).unwrap();
        core.reset_stream(voice, stereo_format()).unwrap();
        // Two chunks of 8 stereo frames each.
        let chunk = vec![0x55u8; 8 * 4];
        core.preload(voice, vec![chunk.clone(), chunk.clone()])
            .unwrap();
        core.play(voice);
        assert!(core.is_playing(voice));
        assert_eq!(core.buffers_processed(voice), 0);

        let mut output = vec![0.0f32; 20 * OUTPUT_CHANNELS];
        render(&core.state, &mut output);
        // 16 frames played, both chunks consumed on the next read.
        let mut output2 = vec![0.0f32; 4 * OUTPUT_CHANNELS];
        render(&core.state, &mut output2);
        assert!(core.buffers_processed(voice) >= 1);

        // Queueing replaces a processed chunk.
        let before = core.buffers_processed(voice);
        core.queue(voice, &chunk).unwrap();
        assert_eq!(core.buffers_processed(voice), before - 1);
    }

    #[test]
    fn preload_of_nothing_reports_end_of_stream() {
        let core = core_at_rate(false, 48000);
        let voice = core.create_voice(VoiceKind::Streaming).unwrap();
        core.reset_stream(voice, stereo_format()).unwrap();
        assert_eq!(core.preload(voice, Vec::new()).unwrap(), Preload::EndOfStream);
    }

    #[test]
    fn attach_rejects_streaming_voice() {
        let core = core_at_rate(false, 48000);
        let voice = core.create_voice(VoiceKind::Streaming).unwrap();
        assert!(core.attach_oneshot(voice, &mono_clip(4), false).is_err());
        let normal = core.create_voice(VoiceKind::Normal).unwrap();
        assert!(core.reset_stream(normal, stereo_format()).is_err());
    }

    #[test]
    fn stop_rewinds_clip() {
        let core = core_at_rate(false, 48000);
        let voice = core.create_voice(VoiceKind::Normal).unwrap();
        core.attach_oneshot(voice, &mono_clip(100), false).unwrap();
        core.play(voice);
        let mut output = vec![0.0f32; 16 * OUTPUT_CHANNELS];
        render(&core.state, &mut output);
        core.stop(voice);
        assert!(!core.is_playing(voice));
        core.play(voice);
        // Rewound: produces samples again from the start.
        let mut output = vec![0.0f32; 4 * OUTPUT_CHANNELS];
        render(&core.state, &mut output);
        assert!(output[0] > 0.2);
    }

    #[test]
    fn spatial_gain_falls_with_distance() {
        let core = core_at_rate(true, 48000);
        let near = core.create_voice(VoiceKind::Normal).unwrap();
        let far = core.create_voice(VoiceKind::Normal).unwrap();
        core.set_3d(near, Vec3::new(0.0, 0.0, -1.0), 1.0, false);
        core.set_3d(far, Vec3::new(0.0, 0.0, -400.0), 1.0, false);
        let voices = core.state.voices.lock().unwrap();
        let listener = ListenerFrame::default();
        let (near_gain, _) = voice_gain_pan(&core.state, &voices[near], 1.0, Some(&listener));
        let (far_gain, _) = voice_gain_pan(&core.state, &voices[far], 1.0, Some(&listener));
        assert!(near_gain > far_gain);
    }

    #[test]
    fn master_gain_scales_flat_mix() {
        let core = core_at_rate(false, 48000);
        let voice = core.create_voice(VoiceKind::Normal).unwrap();
        core.set_gain(voice, 0.8);
        core.set_master_gain(0.5);
        let voices = core.state.voices.lock().unwrap();
        let (gain, _) = voice_gain_pan(&core.state, &voices[voice], core.state.master(), None);
        assert!((gain - 0.4).abs() < 1.0e-6);
    }
}
