#[cfg(feature = "chime")]
use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;
const TONE_SECS: f32 = 0.18;
const GAP_SECS: f32 = 0.06;

/// Two short descending tones, played when attention drops into the distracted range.
pub struct Chime {
    tones: [f32; 2],
    volume: f32,
    num_sample: usize,
    total_samples: usize,
}

impl Chime {
    pub fn new(volume: f32) -> Self {
        let per_tone = ((TONE_SECS + GAP_SECS) * SAMPLE_RATE as f32) as usize;
        Self {
            tones: [880.0, 659.25],
            volume: volume.clamp(0.0, 1.0),
            num_sample: 0,
            total_samples: per_tone * 2,
        }
    }

    pub fn len_samples(&self) -> usize {
        self.total_samples
    }
}

impl Iterator for Chime {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }

        let per_tone = self.total_samples / 2;
        let tone = self.num_sample / per_tone;
        let offset = self.num_sample % per_tone;
        self.num_sample += 1;

        let t = offset as f32 / SAMPLE_RATE as f32;
        if t >= TONE_SECS {
            return Some(0.0);
        }

        // Linear attack and release so the tone doesn't click.
        let ramp = 0.01;
        let envelope = (t / ramp).min(1.0) * ((TONE_SECS - t) / ramp).min(1.0);
        let freq = self.tones[tone.min(1)];
        Some((2.0 * PI * freq * t).sin() * envelope * self.volume * 0.4)
    }
}

#[cfg(feature = "chime")]
impl Source for Chime {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total_samples - self.num_sample.min(self.total_samples))
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(
            self.total_samples as f32 / SAMPLE_RATE as f32,
        ))
    }
}

impl Chime {
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f32(self.total_samples as f32 / SAMPLE_RATE as f32)
    }
}
