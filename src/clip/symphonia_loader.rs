use crate::clip::{Clip, ClipFormat, ClipLoader};
use crate::error::{AuraSonicError, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

/// Default decoder built on Symphonia.
///
/// Decodes whole files (WAV and OGG/Vorbis with the crate's default
/// feature set) into interleaved signed 16-bit little-endian PCM. Sources
/// with more than two channels are downmixed to stereo.
///
/// `file_chunk_bytes` sizes the media stream's read buffer, so the
/// decoder pulls the file in chunks of at most that many bytes.
pub struct SymphoniaLoader {
    file_chunk_bytes: usize,
}

impl SymphoniaLoader {
    pub fn new(file_chunk_bytes: usize) -> Self {
        Self { file_chunk_bytes }
    }
}

/// The media stream buffer must be a power of two; round the configured
/// granularity down so it is never exceeded, within sane bounds.
fn stream_buffer_len(file_chunk_bytes: usize) -> usize {
    let bounded = file_chunk_bytes.clamp(4096, 1 << 26);
    if bounded.is_power_of_two() {
        bounded
    } else {
        bounded.next_power_of_two() >> 1
    }
}

impl Default for SymphoniaLoader {
    fn default() -> Self {
        Self::new(1048576)
    }
}

impl ClipLoader for SymphoniaLoader {
    fn load(&self, path: &str) -> Result<Clip> {
        let decode_error =
            |what: String| AuraSonicError::DecodeFailed(path.to_string(), what);

        let file = File::open(path)?;
        let mss = MediaSourceStream::new(
            Box::new(file),
            MediaSourceStreamOptions {
                buffer_len: stream_buffer_len(self.file_chunk_bytes),
            },
        );

        let mut hint = Hint::new();
        if let Some(ext) = Path::new(path).extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| decode_error(format!("failed to probe container: {e:?}")))?;

        let mut reader = probed.format;
        let track = reader
            .default_track()
            .ok_or_else(|| decode_error("no default audio track".into()))?;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| decode_error("sample rate not reported".into()))?;
        let source_channels = track
            .codec_params
            .channels
            .ok_or_else(|| decode_error("channel count not reported".into()))?
            .count();
        if source_channels == 0 {
            return Err(decode_error("zero channels reported".into()));
        }
        let out_channels: u16 = if source_channels >= 2 { 2 } else { 1 };

        let mut decoder = get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| decode_error(format!("failed to create decoder: {e:?}")))?;

        let mut bytes: Vec<u8> = Vec::new();

        loop {
            let packet = match reader.next_packet() {
                Ok(packet) => packet,
                Err(Error::IoError(_)) => break, // end of file
                Err(e) => return Err(decode_error(format!("error reading packet: {e:?}"))),
            };

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(Error::IoError(_)) => break,
                Err(Error::DecodeError(_)) => continue, // recoverable corruption
                Err(e) => return Err(decode_error(format!("error decoding packet: {e:?}"))),
            };

            let spec = *decoded.spec();
            let capacity = decoded.capacity();
            let mut buffer = SampleBuffer::<i16>::new(capacity as u64, spec);
            buffer.copy_interleaved_ref(decoded);

            for frame in buffer.samples().chunks(source_channels) {
                match out_channels {
                    1 => push_sample(&mut bytes, frame[0]),
                    _ => {
                        // Downmix anything beyond stereo by keeping the
                        // first two channels.
                        push_sample(&mut bytes, frame[0]);
                        push_sample(&mut bytes, frame[1.min(frame.len() - 1)]);
                    }
                }
            }
        }

        let format = ClipFormat::new(sample_rate, out_channels, 16)?;
        Clip::new(bytes, format)
    }
}

fn push_sample(bytes: &mut Vec<u8>, sample: i16) {
    bytes.extend_from_slice(&sample.to_le_bytes());
}
