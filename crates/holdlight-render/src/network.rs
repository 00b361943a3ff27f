//! Network DMX renderer (Art-Net / sACN)
//!
//! Sends are asynchronous UDP writes on a current-thread tokio runtime owned
//! by the renderer. `render` drives every send of the frame to completion
//! before it returns, so frames are never dropped or reordered behind the
//! caller's back.

use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::runtime::{Builder, Runtime};

use holdlight_core::Panel;

use crate::{
    buffer::UniverseBuffers,
    dmx::{DmxProtocol, PacketCodec},
    error::{RenderError, Result},
    Renderer,
};

const TRANSPORT: &str = "network-dmx";

pub struct NetworkDmxRenderer {
    runtime: Runtime,
    socket: UdpSocket,
    codec: PacketCodec,
    buffers: UniverseBuffers,
}

impl NetworkDmxRenderer {
    /// Bind a UDP socket on `bind` and prepare buffers for `universes`.
    pub fn new(codec: PacketCodec, universes: u16, bind: SocketAddr) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_io()
            .build()
            .map_err(|e| RenderError::transport(TRANSPORT, e))?;
        let socket = runtime
            .block_on(UdpSocket::bind(bind))
            .map_err(|e| RenderError::transport(TRANSPORT, e))?;

        let configured = match codec.protocol() {
            DmxProtocol::ArtNet => socket.set_broadcast(true),
            DmxProtocol::Sacn => socket.set_multicast_loop_v4(false),
        };
        configured.map_err(|e| RenderError::transport(TRANSPORT, e))?;

        tracing::info!(
            "{:?} renderer bound to {:?} for {} universe(s)",
            codec.protocol(),
            socket.local_addr().ok(),
            universes
        );

        Ok(Self {
            runtime,
            socket,
            codec,
            buffers: UniverseBuffers::new(universes),
        })
    }

    pub fn buffers(&self) -> &UniverseBuffers {
        &self.buffers
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|e| RenderError::transport(TRANSPORT, e))
    }
}

impl Renderer for NetworkDmxRenderer {
    fn render(&mut self, panel: &Panel) -> Result<()> {
        let Self {
            runtime,
            socket,
            codec,
            buffers,
        } = self;

        buffers.fill(panel);
        let packets = buffers
            .iter()
            .map(|(universe, data)| codec.encode(universe, data).map(|p| (universe, p)))
            .collect::<Result<Vec<_>>>()?;

        runtime.block_on(async {
            for (universe, (packet, destination)) in packets {
                socket
                    .send_to(&packet, destination)
                    .await
                    .map_err(|e| RenderError::transport(TRANSPORT, e))?;
                tracing::trace!("Sent DMX packet for universe {} to {}", universe, destination);
            }
            Ok::<(), RenderError>(())
        })
    }

    fn name(&self) -> &'static str {
        TRANSPORT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdlight_core::{Address, Color, Location, Pixel};
    use std::net::UdpSocket as StdUdpSocket;
    use std::time::Duration;

    fn receiver() -> StdUdpSocket {
        let socket = StdUdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        socket
    }

    fn recv(socket: &StdUdpSocket) -> Vec<u8> {
        let mut buf = [0u8; 1024];
        let (len, _) = socket.recv_from(&mut buf).unwrap();
        buf[..len].to_vec()
    }

    #[test]
    fn test_artnet_frame_is_sent_before_render_returns() {
        let rx = receiver();
        let codec = PacketCodec::artnet(rx.local_addr().unwrap());
        let mut renderer =
            NetworkDmxRenderer::new(codec, 1, "127.0.0.1:0".parse().unwrap()).unwrap();

        let mut panel = Panel::new();
        panel.set(
            Location::new(0, 0),
            Pixel::new(Color::rgb(10, 20, 30), Address::new(0, 10), true, 0).unwrap(),
        );
        renderer.render(&panel).unwrap();

        let packet = recv(&rx);
        assert_eq!(packet.len(), 18 + 512);
        assert_eq!(&packet[18 + 10..18 + 13], &[10, 20, 30]);
        assert_eq!(&renderer.buffers().get(0).unwrap()[10..13], &[10, 20, 30]);
    }

    #[test]
    fn test_every_universe_is_sent_each_frame() {
        let rx = receiver();
        let codec = PacketCodec::artnet(rx.local_addr().unwrap());
        let mut renderer =
            NetworkDmxRenderer::new(codec, 2, "127.0.0.1:0".parse().unwrap()).unwrap();

        renderer.render(&Panel::new()).unwrap();
        let first = recv(&rx);
        let second = recv(&rx);
        assert_eq!(u16::from_le_bytes([first[14], first[15]]), 0);
        assert_eq!(u16::from_le_bytes([second[14], second[15]]), 1);
    }
}
