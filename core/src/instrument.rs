use thiserror::Error;

use crate::accumulator::Reading;

/// Raw response of the EM instrument to one acquisition request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstrumentSample {
    /// Transmitter current (A).
    pub current: f64,
    /// Receiver voltage (V).
    pub voltage: f64,
}

impl InstrumentSample {
    /// Convert to a station reading: voltage in mV, both values rounded to hundredths.
    pub fn to_reading(self) -> Reading {
        Reading {
            tx_current: round_hundredths(self.current),
            rx_voltage_mv: round_hundredths(self.voltage * 1000.0),
        }
    }
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InstrumentError {
    #[error("instrument not connected")]
    NotConnected,
    #[error("instrument timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("acquisition cancelled")]
    Cancelled,
}

/// Blocking request/response access to the EM instrument.
pub trait Instrument {
    /// Trigger one reading and wait for the result.
    fn acquire(&mut self) -> Result<InstrumentSample, InstrumentError>;

    fn describe(&self) -> String {
        "EM instrument".to_string()
    }
}
