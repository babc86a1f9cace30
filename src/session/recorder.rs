use crate::models::Sample;

/// Append-only log of the samples taken during one session.
#[derive(Debug, Default, Clone)]
pub struct SessionRecorder {
    samples: Vec<Sample>,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    pub fn all(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
