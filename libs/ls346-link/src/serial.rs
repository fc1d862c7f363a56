//! Serial Channel Implementation
//!
//! Opens the instrument's RS-232 port with tokio-serial and wraps it in a
//! [`LineChannel`]. The LakeShore 346 ships configured for 9600 baud, 7 data
//! bits, odd parity and one stop bit; those are the defaults here.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, error, info};

use crate::error::{LinkError, Result};
use crate::line::LineChannel;

/// Serial channel over a native async serial port
pub type SerialChannel = LineChannel<SerialStream>;

/// Serial port configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial port path (e.g., "/dev/ttyUSB0", "COM1")
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits (5, 6, 7, 8)
    pub data_bits: u8,
    /// Stop bits (1, 2)
    pub stop_bits: u8,
    /// Parity ("None", "Even", "Odd")
    pub parity: String,
    /// Flow control ("None", "Software", "Hardware")
    pub flow_control: String,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            data_bits: 7,
            stop_bits: 1,
            parity: "Odd".to_string(),
            flow_control: "None".to_string(),
        }
    }
}

impl SerialConfig {
    /// Validate serial parameters
    pub fn validate(&self) -> Result<()> {
        if self.port.is_empty() {
            return Err(LinkError::config("Port path cannot be empty"));
        }

        if self.baud_rate == 0 {
            return Err(LinkError::config("Baud rate must be greater than zero"));
        }

        if ![5, 6, 7, 8].contains(&self.data_bits) {
            return Err(LinkError::config("Data bits must be 5, 6, 7, or 8"));
        }

        if ![1, 2].contains(&self.stop_bits) {
            return Err(LinkError::config("Stop bits must be 1 or 2"));
        }

        if !["None", "Even", "Odd"].contains(&self.parity.as_str()) {
            return Err(LinkError::config("Parity must be None, Even, or Odd"));
        }

        if !["None", "Software", "Hardware"].contains(&self.flow_control.as_str()) {
            return Err(LinkError::config(
                "Flow control must be None, Software, or Hardware",
            ));
        }

        Ok(())
    }

    fn parity(&self) -> tokio_serial::Parity {
        match self.parity.as_str() {
            "Even" => tokio_serial::Parity::Even,
            "Odd" => tokio_serial::Parity::Odd,
            _ => tokio_serial::Parity::None,
        }
    }

    fn flow_control(&self) -> tokio_serial::FlowControl {
        match self.flow_control.as_str() {
            "Software" => tokio_serial::FlowControl::Software,
            "Hardware" => tokio_serial::FlowControl::Hardware,
            _ => tokio_serial::FlowControl::None,
        }
    }

    fn data_bits(&self) -> tokio_serial::DataBits {
        match self.data_bits {
            5 => tokio_serial::DataBits::Five,
            6 => tokio_serial::DataBits::Six,
            7 => tokio_serial::DataBits::Seven,
            _ => tokio_serial::DataBits::Eight,
        }
    }

    fn stop_bits(&self) -> tokio_serial::StopBits {
        match self.stop_bits {
            2 => tokio_serial::StopBits::Two,
            _ => tokio_serial::StopBits::One,
        }
    }

    /// Open the port and wrap it in a line channel
    pub fn open(&self, response_timeout: Duration) -> Result<SerialChannel> {
        self.validate()?;

        debug!("Opening serial port: {}", self.port);

        let port = tokio_serial::new(&self.port, self.baud_rate)
            .data_bits(self.data_bits())
            .parity(self.parity())
            .stop_bits(self.stop_bits())
            .flow_control(self.flow_control())
            .timeout(response_timeout)
            .open_native_async();

        match port {
            #[allow(unused_mut)]
            Ok(mut port) => {
                #[cfg(unix)]
                port.set_exclusive(false).map_err(|e| {
                    LinkError::io(format!("Failed to set exclusive mode: {e}"))
                })?;

                info!("Successfully opened serial port: {}", self.port);
                Ok(LineChannel::new(format!("serial:{}", self.port), port)
                    .with_response_timeout(response_timeout))
            },
            Err(e) => {
                let error_msg = format!("Failed to open serial port {}: {e}", self.port);
                error!("{error_msg}");
                Err(LinkError::Connection(error_msg))
            },
        }
    }
}
