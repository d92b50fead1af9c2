pub mod device;
pub mod error;
pub mod sim;
pub mod util;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod i2c;

pub use device::{DeviceModel, Response, XorShift32};
pub use sim::{AnalogNode, DisplayHandle, SimAdc, SimButton, SimDac, SimDisplay};
pub use util::level_to_code;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use gpio::GpioButton;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use i2c::{Ads1115Adc, Mcp4725Dac};
