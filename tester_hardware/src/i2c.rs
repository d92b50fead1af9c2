//! I2C converter drivers: MCP4725 output and ADS1115 input.
use std::time::Duration;

use rppal::i2c::I2c;
use tester_traits::{BoxError, Event, EventSink, SampleInput, StimulusOutput};

use crate::error::{HwError, Result};
use crate::util::{emit, level_to_code, wait_until_ready_with_timeout};

fn open_bus(bus: u8, address: u16) -> Result<I2c> {
    let mut i2c = I2c::with_bus(bus).map_err(|e| HwError::I2c(e.to_string()))?;
    i2c.set_slave_address(address)
        .map_err(|e| HwError::I2c(e.to_string()))?;
    Ok(i2c)
}

/// MCP4725 12-bit DAC.
pub struct Mcp4725Dac {
    i2c: I2c,
    sink: EventSink,
    reference_max: u32,
}

impl Mcp4725Dac {
    // Output settles within 6 us; one write round trip already exceeds that.
    const BITS: u8 = 12;

    pub fn new(bus: u8, address: u16, reference_max: u32, sink: EventSink) -> Result<Self> {
        let i2c = open_bus(bus, address)?;
        tracing::info!(bus, address, "mcp4725 opened");
        Ok(Self {
            i2c,
            sink,
            reference_max,
        })
    }

    fn write_code(&mut self, code: u16) -> Result<()> {
        // Fast-write command: PD bits 00, then the 12-bit code.
        let frame = [((code >> 8) & 0x0F) as u8, (code & 0xFF) as u8];
        self.i2c
            .write(&frame)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        Ok(())
    }
}

impl StimulusOutput for Mcp4725Dac {
    fn set_level(&mut self, level: u32) -> std::result::Result<(), BoxError> {
        let code = level_to_code(level, self.reference_max, Self::BITS);
        self.write_code(code)?;
        tracing::trace!(level, code, "dac write");
        emit(&self.sink, Event::StimulusSettled)?;
        Ok(())
    }
}

/// ADS1115 16-bit ADC in single-shot mode on AIN0.
pub struct Ads1115Adc {
    i2c: I2c,
    sink: EventSink,
    timeout: Duration,
}

impl Ads1115Adc {
    const REG_CONVERSION: u8 = 0x00;
    const REG_CONFIG: u8 = 0x01;
    // OS=start, MUX=AIN0/GND, PGA=+-4.096V, single-shot, 128 SPS, comparator off
    const CONFIG_START: u16 = 0xC383;
    const OS_READY: u16 = 0x8000;

    pub fn new(bus: u8, address: u16, sink: EventSink) -> Result<Self> {
        let i2c = open_bus(bus, address)?;
        tracing::info!(bus, address, "ads1115 opened");
        Ok(Self {
            i2c,
            sink,
            timeout: Duration::from_millis(50),
        })
    }

    fn read_reg(&mut self, reg: u8) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(&[reg], &mut buf)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        Ok(u16::from_be_bytes(buf))
    }

    fn convert(&mut self) -> Result<i32> {
        let [hi, lo] = Self::CONFIG_START.to_be_bytes();
        self.i2c
            .write(&[Self::REG_CONFIG, hi, lo])
            .map_err(|e| HwError::I2c(e.to_string()))?;
        let timeout = self.timeout;
        wait_until_ready_with_timeout(
            || Ok(self.read_reg(Self::REG_CONFIG)? & Self::OS_READY != 0),
            timeout,
            Duration::from_millis(1),
        )?;
        let raw = self.read_reg(Self::REG_CONVERSION)? as i16;
        Ok(i32::from(raw))
    }
}

impl SampleInput for Ads1115Adc {
    fn request_sample(&mut self) -> std::result::Result<(), BoxError> {
        let raw = self.convert()?;
        tracing::trace!(raw, "adc conversion");
        emit(&self.sink, Event::SampleReady(raw))?;
        Ok(())
    }
}
