//! Peak extraction for the recorder's waveform display.

/// Bucketed, normalized peaks (0..=1) over a captured sample run. Rebuilt
/// whenever the backing audio changes; dropped with its clip.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Waveform {
    peaks: Vec<f32>,
}

impl Waveform {
    pub fn from_samples(samples: &[f32], buckets: usize) -> Self {
        if samples.is_empty() || buckets == 0 {
            return Self::default();
        }

        let bucket_len = samples.len().div_ceil(buckets);
        let mut peaks: Vec<f32> = samples
            .chunks(bucket_len)
            .map(|chunk| chunk.iter().fold(0.0f32, |acc, s| acc.max(s.abs())))
            .collect();

        let max = peaks.iter().fold(0.0f32, |acc, p| acc.max(*p));
        if max > 0.0 {
            for peak in &mut peaks {
                *peak /= max;
            }
        }

        Self { peaks }
    }

    pub fn peaks(&self) -> &[f32] {
        &self.peaks
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }
}
