use std::collections::VecDeque;

use crate::instrument::{Instrument, InstrumentError, InstrumentSample};

/// Scripted instrument: replays queued responses, then falls back to `repeat`.
#[derive(Clone, Debug, Default)]
pub struct MockInstrument {
    pub responses: VecDeque<Result<InstrumentSample, InstrumentError>>,
    pub repeat: Option<InstrumentSample>,
    pub calls: usize,
}

impl MockInstrument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answers with the same sample.
    pub fn fixed(sample: InstrumentSample) -> Self {
        Self {
            repeat: Some(sample),
            ..Self::default()
        }
    }

    /// One plausible sample per survey frequency, high to low.
    pub fn with_sample_data() -> Self {
        let mut mock = Self::new();
        for voltage in [0.0512, 0.0431, 0.0377, 0.0298, 0.0264, 0.0221, 0.0187] {
            mock.push_sample(InstrumentSample {
                current: 1.02,
                voltage,
            });
        }
        mock
    }

    pub fn push_sample(&mut self, sample: InstrumentSample) {
        self.responses.push_back(Ok(sample));
    }

    pub fn push_failure(&mut self, error: InstrumentError) {
        self.responses.push_back(Err(error));
    }
}

impl Instrument for MockInstrument {
    fn acquire(&mut self) -> Result<InstrumentSample, InstrumentError> {
        self.calls += 1;
        match self.responses.pop_front() {
            Some(response) => response,
            None => self.repeat.ok_or(InstrumentError::NotConnected),
        }
    }

    fn describe(&self) -> String {
        "mock EM instrument".to_string()
    }
}
