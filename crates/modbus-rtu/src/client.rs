//! Modbus RTU Client for RS-485 Adapters
//!
//! Provides async register reads over a serial port.

use crate::error::ModbusError;
use crate::frame::{self, RESPONSE_HEADER_LEN};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{
    ClearBuffer, DataBits, Parity, SerialPort, SerialPortBuilderExt, SerialStream, StopBits,
};
use tracing::{debug, info, trace, warn};

/// Default timeout for a single register read
const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Source of station register values.
///
/// Implemented by the serial client and by [`crate::MockRegisterReader`].
#[async_trait]
pub trait RegisterReader: Send {
    /// Read one input register from a station
    async fn read_input_register(&mut self, station: u8, address: u16) -> Result<u16, ModbusError>;

    /// Release the underlying transport
    async fn disconnect(&mut self) {}
}

/// Serial bus parameters. The bus is always 8 data bits, no parity,
/// one stop bit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialSettings {
    /// Serial port device path (e.g., "/dev/ttyUSB0" or "COM3")
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Read timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Modbus RTU master on a serial port
pub struct RtuClient {
    /// Port path, kept for logging
    device: String,
    /// Open serial stream; `None` after disconnect
    stream: Option<SerialStream>,
    /// Per-read timeout
    timeout: Duration,
}

impl RtuClient {
    /// Open the serial port and create a client
    ///
    /// # Arguments
    /// * `settings` - Port path, baud rate and read timeout
    pub fn open(settings: &SerialSettings) -> Result<Self, ModbusError> {
        info!(
            "Opening Modbus RTU bus on {} at {} baud (8N1)",
            settings.port, settings.baud_rate
        );

        let timeout = Duration::from_millis(settings.timeout_ms);
        let stream = tokio_serial::new(&settings.port, settings.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(timeout)
            .open_native_async()?;

        Ok(Self::with_stream(&settings.port, stream, timeout))
    }

    fn with_stream(device: &str, stream: SerialStream, timeout: Duration) -> Self {
        Self {
            device: device.to_string(),
            stream: Some(stream),
            timeout,
        }
    }

    /// Discard unread input so a stale or partial frame cannot be taken
    /// as the reply to the next request
    fn discard_input(&self, stream: &SerialStream) {
        if let Err(e) = stream.clear(ClearBuffer::Input) {
            warn!("Failed to clear input buffer on {}: {}", self.device, e);
        }
    }

    async fn transact(stream: &mut SerialStream, station: u8, address: u16) -> Result<u16, ModbusError> {
        let request = frame::encode_read_request(station, address, 1);
        trace!("TX {:02X?}", request);
        stream.write_all(&request).await?;
        stream.flush().await?;

        let mut header = [0u8; RESPONSE_HEADER_LEN];
        stream.read_exact(&mut header).await?;

        let mut response = header.to_vec();
        response.resize(frame::expected_response_len(&header), 0);
        stream.read_exact(&mut response[RESPONSE_HEADER_LEN..]).await?;
        trace!("RX {:02X?}", response);

        let registers = frame::decode_read_response(station, &response)?;
        registers.first().copied().ok_or_else(|| {
            ModbusError::InvalidResponse("response carried no registers".to_string())
        })
    }
}

#[async_trait]
impl RegisterReader for RtuClient {
    async fn read_input_register(&mut self, station: u8, address: u16) -> Result<u16, ModbusError> {
        let timeout = self.timeout;
        let mut stream = self.stream.take().ok_or(ModbusError::NotConnected)?;

        debug!("Reading input register {} from station {}", address, station);

        // A reply that arrived after an earlier timeout is still queued
        if let Err(e) = stream.clear(ClearBuffer::Input) {
            self.stream = Some(stream);
            return Err(e.into());
        }

        let result = match tokio::time::timeout(timeout, Self::transact(&mut stream, station, address)).await {
            Ok(result) => result,
            Err(_) => Err(ModbusError::Timeout {
                station,
                timeout_ms: timeout.as_millis() as u64,
            }),
        };

        if result.is_err() {
            self.discard_input(&stream);
        }
        self.stream = Some(stream);
        result
    }

    async fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            info!("Closing Modbus RTU bus on {}", self.device);
        }
    }
}
