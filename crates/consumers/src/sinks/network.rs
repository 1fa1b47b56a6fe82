//! NetworkConsumer - UDP fire-and-forget frame streaming
//!
//! Each datagram carries a u32-LE header length, a JSON header describing the
//! frame, then the raw little-endian f64 samples. The end of stream is a
//! header-only datagram with key "end".

use contracts::{ConsumerSink, FrameHeader, VerifiedFrame, VerifierError};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, error, instrument, warn};

/// Configuration for NetworkConsumer
#[derive(Debug, Clone)]
pub struct NetworkConsumerConfig {
    /// Target address
    pub addr: SocketAddr,
    /// Max datagram size (UDP typically 65507 for IPv4)
    pub max_packet_size: usize,
}

impl NetworkConsumerConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let addr_str = params
            .get("addr")
            .ok_or_else(|| "missing 'addr' parameter".to_string())?;

        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|e| format!("invalid address '{}': {}", addr_str, e))?;

        let max_packet_size = params
            .get("max_packet_size")
            .and_then(|s| s.parse().ok())
            .unwrap_or(65000);

        Ok(Self {
            addr,
            max_packet_size,
        })
    }
}

/// Consumer that streams verified frames over UDP
pub struct NetworkConsumer {
    name: String,
    config: NetworkConsumerConfig,
    socket: Option<UdpSocket>,
}

impl NetworkConsumer {
    /// Create a new NetworkConsumer
    #[instrument(name = "network_consumer_new", skip(name, config))]
    pub async fn new(
        name: impl Into<String>,
        config: NetworkConsumerConfig,
    ) -> std::io::Result<Self> {
        let name = name.into();
        // Bind to any available port
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(&config.addr).await?;

        debug!(
            consumer = %name,
            target = %config.addr,
            "NetworkConsumer connected"
        );

        Ok(Self {
            name,
            config,
            socket: Some(socket),
        })
    }

    /// Create from params (for factory)
    #[instrument(name = "network_consumer_from_params", skip(name, params))]
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, VerifierError> {
        let config = NetworkConsumerConfig::from_params(params)
            .map_err(|e| VerifierError::sink_write("network", e))?;

        Self::new(name, config)
            .await
            .map_err(|e| VerifierError::SinkConnection {
                sink_name: "network".to_string(),
                message: e.to_string(),
            })
    }

    fn socket(&self) -> Result<&UdpSocket, VerifierError> {
        self.socket
            .as_ref()
            .ok_or_else(|| VerifierError::sink_write(&self.name, "socket not connected"))
    }

    /// Frame a datagram: u32-LE header length, JSON header, raw payload
    fn encode_message(&self, header: &FrameHeader, payload: &[u8]) -> Result<Vec<u8>, VerifierError> {
        let header_bytes = serde_json::to_vec(header)
            .map_err(|e| VerifierError::sink_write(&self.name, e.to_string()))?;

        let mut data = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        data.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
        data.extend_from_slice(&header_bytes);
        data.extend_from_slice(payload);

        if data.len() > self.config.max_packet_size {
            warn!(
                consumer = %self.name,
                size = data.len(),
                max = self.config.max_packet_size,
                "Datagram exceeds max packet size"
            );
        }

        Ok(data)
    }

    async fn transmit(&self, socket: &UdpSocket, data: &[u8], index: u64) {
        match socket.send(data).await {
            Ok(sent) => {
                debug!(consumer = %self.name, index, bytes = sent, "Sent");
            }
            Err(e) => {
                // Log but don't fail - UDP is best-effort
                error!(consumer = %self.name, error = %e, "UDP send failed");
            }
        }
    }
}

impl ConsumerSink for NetworkConsumer {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "network_consumer_write",
        skip(self, frame),
        fields(consumer = %self.name, index = frame.index)
    )]
    async fn write(&mut self, frame: &VerifiedFrame) -> Result<(), VerifierError> {
        let socket = self.socket()?;
        let header = FrameHeader::image(frame);
        let payload = frame.data.slice.to_bytes();
        let data = self.encode_message(&header, &payload)?;
        self.transmit(socket, &data, frame.index).await;
        Ok(())
    }

    #[instrument(name = "network_consumer_finish", skip(self))]
    async fn finish(&mut self) -> Result<(), VerifierError> {
        let socket = self.socket()?;
        let data = self.encode_message(&FrameHeader::end(), &[])?;
        self.transmit(socket, &data, 0).await;
        debug!(consumer = %self.name, "End header sent");
        Ok(())
    }

    #[instrument(name = "network_consumer_close", skip(self))]
    async fn close(&mut self) -> Result<(), VerifierError> {
        self.socket = None;
        debug!(consumer = %self.name, "NetworkConsumer closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DataType, FrameData, Slice};

    fn verified(index: u64) -> VerifiedFrame {
        VerifiedFrame {
            index,
            passed: true,
            data: FrameData::new(DataType::new("data"), Slice::filled(2, 2, 1.0)),
        }
    }

    #[tokio::test]
    async fn test_network_consumer_config_parsing() {
        let mut params = HashMap::new();
        params.insert("addr".to_string(), "127.0.0.1:9999".to_string());

        let config = NetworkConsumerConfig::from_params(&params).unwrap();
        assert_eq!(config.addr.port(), 9999);
        assert_eq!(config.max_packet_size, 65000);
    }

    #[tokio::test]
    async fn test_network_consumer_missing_addr() {
        let params = HashMap::new();
        assert!(NetworkConsumerConfig::from_params(&params).is_err());
    }

    #[tokio::test]
    async fn test_network_consumer_write() {
        let config = NetworkConsumerConfig {
            addr: "127.0.0.1:19998".parse().unwrap(),
            max_packet_size: 65000,
        };

        let mut sink = NetworkConsumer::new("test_net", config).await.unwrap();

        // Should not fail even with no receiver (UDP doesn't care)
        let result = sink.write(&verified(1)).await;
        assert!(result.is_ok());

        let result = sink.finish().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_datagram_framing() {
        let config = NetworkConsumerConfig {
            addr: "127.0.0.1:19997".parse().unwrap(),
            max_packet_size: 65000,
        };
        let sink = NetworkConsumer::new("framing", config).await.unwrap();

        let frame = verified(3);
        let header = FrameHeader::image(&frame);
        let payload = frame.data.slice.to_bytes();
        let data = sink.encode_message(&header, &payload).unwrap();

        let header_len = u32::from_le_bytes(data[0..4].try_into().unwrap()) as usize;
        let parsed: FrameHeader = serde_json::from_slice(&data[4..4 + header_len]).unwrap();
        assert_eq!(parsed.key, "image");
        assert_eq!(parsed.image_number, Some(3));
        // 4 samples, 8 bytes each
        assert_eq!(data.len() - 4 - header_len, 32);
    }
}
