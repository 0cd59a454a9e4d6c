//! Flite text-to-speech adapter.
//!
//! `flite` is invoked once per utterance and writes a WAV file, which is
//! decoded, cut into 100 ms frames and handed to the caller through a bounded
//! queue. Synthesis failures never reach the caller: they are logged and one
//! second of silence is emitted instead.

use crate::error::VoiceError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use voxgate_types::FliteVoice;

/// Output sample rate advertised by the adapter.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

/// Maximum text input size (64 KiB).
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Timeout for a single flite invocation.
const TTS_TIMEOUT: Duration = Duration::from_secs(60);

/// Frames buffered between the synthesis task and the consumer.
const FRAME_QUEUE_CAPACITY: usize = 32;

/// A chunk of mono 16-bit PCM audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    pub data: Vec<i16>,
    pub sample_rate: u32,
    pub num_channels: u32,
    pub samples_per_channel: u32,
}

impl AudioFrame {
    pub fn mono(data: Vec<i16>, sample_rate: u32) -> Self {
        let samples_per_channel = data.len() as u32;
        Self {
            data,
            sample_rate,
            num_channels: 1,
            samples_per_channel,
        }
    }

    /// Playback length of the frame.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(f64::from(self.samples_per_channel) / f64::from(self.sample_rate))
    }

    /// Raw s16le bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|s| s.to_le_bytes()).collect()
    }
}

/// One frame of synthesized speech.
///
/// Every frame of an utterance carries the same `request_id`, and only the
/// last one has `is_final` set. Consumers expecting a fresh id and a final
/// flag on each frame must group by `request_id` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    /// Shared by every frame produced for the same `synthesize` call.
    pub request_id: String,
    pub frame: AudioFrame,
    /// Set on the last frame of the utterance.
    pub is_final: bool,
}

/// Decoded mono PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmAudio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl PcmAudio {
    /// One second of silence at `sample_rate`.
    pub fn silence(sample_rate: u32) -> Self {
        Self {
            samples: vec![0; sample_rate as usize],
            sample_rate,
        }
    }

    /// Splits the audio into 100 ms mono frames. The last frame may be short.
    pub fn into_frames(self) -> Vec<AudioFrame> {
        let chunk_size = (self.sample_rate / 10).max(1) as usize;
        self.samples
            .chunks(chunk_size)
            .map(|chunk| AudioFrame::mono(chunk.to_vec(), self.sample_rate))
            .collect()
    }
}

/// Text-to-speech through the `flite` command line tool.
#[derive(Debug, Clone)]
pub struct FliteTts {
    binary: PathBuf,
    voice: FliteVoice,
    sample_rate: u32,
    timeout: Duration,
}

impl Default for FliteTts {
    fn default() -> Self {
        Self::new(FliteVoice::default())
    }
}

impl FliteTts {
    pub fn new(voice: FliteVoice) -> Self {
        Self {
            binary: PathBuf::from("flite"),
            voice,
            sample_rate: DEFAULT_SAMPLE_RATE,
            timeout: TTS_TIMEOUT,
        }
    }

    /// The stock adapter: `awb`, the expressive Scottish male voice.
    pub fn create() -> Self {
        Self::new(FliteVoice::Awb)
    }

    pub fn with_binary(mut self, binary: impl AsRef<Path>) -> Self {
        self.binary = binary.as_ref().to_path_buf();
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn voice(&self) -> FliteVoice {
        self.voice
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Starts a synthesis stream for `text`. Nothing runs until the first
    /// call to [`FliteSynthesizeStream::next`].
    pub fn synthesize(&self, text: &str) -> FliteSynthesizeStream {
        let preview: String = text.chars().take(100).collect();
        debug!(voice = %self.voice, text = %preview, "synthesize requested");
        FliteSynthesizeStream {
            tts: self.clone(),
            text: Some(text.to_string()),
            rx: None,
            task: None,
            closed: false,
        }
    }

    /// Runs flite and decodes its output, substituting one second of silence
    /// at the configured sample rate on any failure.
    pub async fn render(&self, text: &str) -> PcmAudio {
        match self.run_flite(text).await {
            Ok(audio) => audio,
            Err(e) => {
                error!(voice = %self.voice, error = %e, "flite synthesis failed, emitting silence");
                PcmAudio::silence(self.sample_rate)
            }
        }
    }

    async fn run_flite(&self, text: &str) -> Result<PcmAudio, VoiceError> {
        if text.trim().is_empty() {
            return Err(VoiceError::Tts("text is empty".to_string()));
        }
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::Tts(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }

        // Removed when dropped, whichever way this function returns.
        let wav_path = tempfile::Builder::new()
            .prefix("voxgate-tts-")
            .suffix(".wav")
            .tempfile()?
            .into_temp_path();

        let mut command = Command::new(&self.binary);
        command
            .arg("-voice")
            .arg(self.voice.as_str())
            .arg("-t")
            .arg(text)
            .arg("-o")
            .arg(&*wav_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command
            .spawn()
            .map_err(|e| VoiceError::Tts(format!("Failed to spawn flite: {}", e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::Tts(format!(
                    "flite timed out after {} ms",
                    self.timeout.as_millis()
                ))
            })?
            .map_err(|e| VoiceError::Tts(format!("Failed to wait for flite: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Tts(format!(
                "flite exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let audio = tokio::task::spawn_blocking(move || {
            let audio = decode_wav(&wav_path);
            if let Err(e) = wav_path.close() {
                warn!(error = %e, "failed to remove flite output file");
            }
            audio
        })
        .await
        .map_err(|e| VoiceError::Tts(format!("decode task failed: {}", e)))??;

        if audio.sample_rate != self.sample_rate {
            debug!(
                file_rate = audio.sample_rate,
                configured_rate = self.sample_rate,
                "flite output rate differs from configured rate"
            );
        }

        Ok(audio)
    }
}

/// Reads a 16-bit integer PCM WAV file, averaging channels down to mono.
fn decode_wav(path: &Path) -> Result<PcmAudio, VoiceError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(VoiceError::Tts(format!(
            "unsupported WAV format: {:?} {}-bit",
            spec.sample_format, spec.bits_per_sample
        )));
    }

    let interleaved = reader
        .samples::<i16>()
        .collect::<Result<Vec<i16>, hound::Error>>()?;

    let channels = usize::from(spec.channels.max(1));
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
                (sum / frame.len() as i32) as i16
            })
            .collect()
    };

    Ok(PcmAudio {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Consumer side of a synthesis request.
///
/// Frames arrive in order; `next` returns `None` once the producer has
/// finished (or after [`close`](Self::close)).
#[derive(Debug)]
pub struct FliteSynthesizeStream {
    tts: FliteTts,
    text: Option<String>,
    rx: Option<mpsc::Receiver<SynthesizedAudio>>,
    task: Option<JoinHandle<()>>,
    closed: bool,
}

impl FliteSynthesizeStream {
    /// Waits for the next frame, starting synthesis on first use.
    pub async fn next(&mut self) -> Option<SynthesizedAudio> {
        if self.closed {
            return None;
        }
        if self.rx.is_none() {
            self.start();
        }
        self.rx.as_mut()?.recv().await
    }

    fn start(&mut self) {
        let (tx, rx) = mpsc::channel(FRAME_QUEUE_CAPACITY);
        let tts = self.tts.clone();
        let text = self.text.take().unwrap_or_default();
        self.task = Some(tokio::spawn(produce_frames(tts, text, tx)));
        self.rx = Some(rx);
    }

    /// Stops synthesis. Frames not yet received are discarded.
    pub fn close(&mut self) {
        self.closed = true;
        if let Some(rx) = self.rx.as_mut() {
            rx.close();
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Drains the stream into a single PCM buffer.
    pub async fn collect_pcm(mut self) -> Vec<i16> {
        let mut pcm = Vec::new();
        while let Some(audio) = self.next().await {
            pcm.extend_from_slice(&audio.frame.data);
        }
        pcm
    }
}

impl Drop for FliteSynthesizeStream {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Producer task. Dropping `tx` on return closes the queue.
async fn produce_frames(tts: FliteTts, text: String, tx: mpsc::Sender<SynthesizedAudio>) {
    let request_id = Uuid::new_v4().to_string();
    let audio = tts.render(&text).await;
    let total_samples = audio.samples.len();
    let frames = audio.into_frames();
    let frame_count = frames.len();

    for (index, frame) in frames.into_iter().enumerate() {
        let item = SynthesizedAudio {
            request_id: request_id.clone(),
            frame,
            is_final: index + 1 == frame_count,
        };
        if tx.send(item).await.is_err() {
            debug!(request_id = %request_id, "synthesis consumer went away");
            return;
        }
    }

    info!(
        request_id = %request_id,
        voice = %tts.voice(),
        samples = total_samples,
        frames = frame_count,
        "synthesis complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_is_one_second_of_zeros() {
        let silence = PcmAudio::silence(22_050);
        assert_eq!(silence.samples.len(), 22_050);
        assert!(silence.samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn frames_are_100ms_with_short_tail() {
        let audio = PcmAudio {
            samples: (0..4_000).map(|i| i as i16).collect(),
            sample_rate: 16_000,
        };
        let frames = audio.into_frames();
        let sizes: Vec<u32> = frames.iter().map(|f| f.samples_per_channel).collect();
        assert_eq!(sizes, vec![1_600, 1_600, 800]);
        assert_eq!(frames[1].data[0], 1_600);
        assert_eq!(frames[0].duration(), Duration::from_millis(100));
    }

    #[test]
    fn empty_audio_has_no_frames() {
        let audio = PcmAudio {
            samples: Vec::new(),
            sample_rate: 22_050,
        };
        assert!(audio.into_frames().is_empty());
    }

    #[test]
    fn frame_bytes_are_little_endian() {
        let frame = AudioFrame::mono(vec![1, -2], 8_000);
        assert_eq!(frame.to_le_bytes(), vec![0x01, 0x00, 0xFE, 0xFF]);
    }

    #[test]
    fn decode_downmixes_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for (l, r) in [(100i16, 300i16), (-50, -150)] {
            writer.write_sample(l).unwrap();
            writer.write_sample(r).unwrap();
        }
        writer.finalize().unwrap();

        let audio = decode_wav(&path).unwrap();
        assert_eq!(audio.sample_rate, 8_000);
        assert_eq!(audio.samples, vec![200, -100]);
    }

    #[test]
    fn decode_rejects_float_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0.5f32).unwrap();
        writer.finalize().unwrap();

        assert!(matches!(decode_wav(&path), Err(VoiceError::Tts(_))));
    }
}
