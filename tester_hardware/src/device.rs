//! Response models for the simulated device under test.
use tester_config::{DeviceCurve, DeviceKind, SimulationCfg};

use crate::error::{HwError, Result};

// Deterministic tiny PRNG (xorshift32)
#[derive(Debug, Clone)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform integer in `-amplitude..=amplitude`.
    pub fn next_symmetric(&mut self, amplitude: i32) -> i32 {
        if amplitude <= 0 {
            return 0;
        }
        let span = u64::from(amplitude.unsigned_abs()) * 2 + 1;
        let offset = u64::from(self.next_u32()) % span;
        // offset < span <= 2^32, so the difference fits in i64 and the result in i32
        (offset as i64 - i64::from(amplitude)) as i32
    }
}

/// Noise-free device transfer function.
#[derive(Debug, Clone)]
pub enum Response {
    /// `min(level * gain, clamp)`; `clamp = None` is an open device
    Clamp { gain: f32, clamp: Option<i32> },
    Curve(DeviceCurve),
}

impl Response {
    pub fn reading_at(&self, level: u32) -> i32 {
        match self {
            Response::Clamp { gain, clamp } => {
                let raw = (level as f32 * gain).round();
                let raw = if raw >= i32::MAX as f32 {
                    i32::MAX
                } else {
                    raw as i32
                };
                clamp.map_or(raw, |c| raw.min(c))
            }
            Response::Curve(curve) => curve.reading_at(level),
        }
    }
}

/// Device under test: response plus measurement noise.
#[derive(Debug, Clone)]
pub struct DeviceModel {
    response: Response,
    noise: i32,
    rng: XorShift32,
}

impl DeviceModel {
    pub fn new(response: Response, noise: i32, seed: u32) -> Self {
        Self {
            response,
            noise: noise.max(0),
            rng: XorShift32::new(seed),
        }
    }

    /// Healthy device clamping at `clamp` counts.
    pub fn good(gain: f32, clamp: i32) -> Self {
        Self::new(Response::Clamp { gain, clamp: Some(clamp) }, 0, 1)
    }

    /// Defective device following the stimulus without a clamp.
    pub fn open(gain: f32) -> Self {
        Self::new(Response::Clamp { gain, clamp: None }, 0, 1)
    }

    pub fn with_noise(mut self, noise: i32, seed: u32) -> Self {
        self.noise = noise.max(0);
        self.rng = XorShift32::new(seed);
        self
    }

    /// Build from `[simulation]`. A `curve` device needs its parsed curve.
    pub fn from_config(cfg: &SimulationCfg, curve: Option<DeviceCurve>) -> Result<Self> {
        let response = match cfg.device {
            DeviceKind::Good => Response::Clamp {
                gain: cfg.gain,
                clamp: Some(cfg.clamp),
            },
            DeviceKind::Open => Response::Clamp {
                gain: cfg.gain,
                clamp: None,
            },
            DeviceKind::Curve => Response::Curve(curve.ok_or_else(|| {
                HwError::Model("curve device selected without a curve".into())
            })?),
        };
        Ok(Self::new(response, cfg.noise, cfg.seed))
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    /// One noisy reading at `level`.
    pub fn sample(&mut self, level: u32) -> i32 {
        let n = self.rng.next_symmetric(self.noise);
        self.response.reading_at(level).saturating_add(n)
    }
}
