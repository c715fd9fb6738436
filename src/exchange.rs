//! The single request/response primitive every other operation goes through.

use embedded_io::{Read, ReadReady, Write};
use fugit::MillisDurationU32;
use tracing::trace;

use crate::{
    error::{Error, Result},
    fault,
    telegram::{self, Frame, RequestKind, Response},
};

/// How long the device needs after a telegram before its answer is buffered.
pub const SETTLE_DELAY: MillisDurationU32 = MillisDurationU32::millis(25);

/// Blocking wait between transmitting a telegram and draining the answer.
pub trait SettleDelay {
    fn settle(&mut self, duration: MillisDurationU32);
}

/// [`SettleDelay`] which parks the calling thread.
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

#[cfg(feature = "std")]
impl SettleDelay for StdDelay {
    fn settle(&mut self, duration: MillisDurationU32) {
        std::thread::sleep(std::time::Duration::from_millis(duration.to_millis() as u64));
    }
}

/// Receives every raw telegram for diagnostics. Has no influence on the protocol.
pub trait TelegramObserver {
    fn on_transmit(&mut self, _telegram: &[u8]) {}
    fn on_receive(&mut self, _telegram: &[u8]) {}
}

impl TelegramObserver for () {}

/// Formats a telegram as hex bytes in log fields.
struct HexBytes<'a>(&'a [u8]);

impl core::fmt::Debug for HexBytes<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:02X?}", self.0)
    }
}

/// Owns the transport and performs write, settle, drain, validate cycles on it.
pub struct Exchange<S, D, O = ()>
where
    S: Read + Write + ReadReady,
    D: SettleDelay,
    O: TelegramObserver,
{
    interface: S,
    delay: D,
    observer: O,
    /// Device node used by the typed accessors.
    node: u8,
    rx: Frame,
}

impl<S, D, O> Exchange<S, D, O>
where
    S: Read + Write + ReadReady,
    D: SettleDelay,
    O: TelegramObserver,
{
    pub fn new(interface: S, delay: D, observer: O) -> Self {
        Self {
            interface,
            delay,
            observer,
            node: 0,
            rx: Frame::new(),
        }
    }

    /// Address a different device node. Multi-output units use node 1 for their second output.
    pub fn with_node(mut self, node: u8) -> Self {
        self.node = node;
        self
    }

    pub fn node(&self) -> u8 {
        self.node
    }

    /// Send one telegram, then receive and check one response.
    ///
    /// The returned [`Response`] has passed both the checksum and the device error check.
    pub fn exchange(
        &mut self,
        kind: RequestKind,
        node: u8,
        object_id: u8,
        payload: &[u8],
    ) -> Result<Response<'_>, S::Error> {
        let telegram = telegram::encode(kind, node, object_id, payload)?;
        trace!(telegram = ?HexBytes(&telegram), "tx");
        self.observer.on_transmit(&telegram);

        self.interface
            .write_all(&telegram)
            .map_err(Error::Serial)?;
        self.interface.flush().map_err(Error::Serial)?;

        self.delay.settle(SETTLE_DELAY);

        self.drain()?;
        trace!(answer = ?HexBytes(&self.rx), "rx");
        self.observer.on_receive(&self.rx);

        let response = telegram::decode_and_validate(&self.rx)?;
        fault::decode(response.frame())?;
        Ok(response)
    }

    /// Read whatever the transport has buffered without waiting for more.
    fn drain(&mut self) -> Result<(), S::Error> {
        self.rx.clear();
        let mut temp_buf = [0u8; 8];
        while self.interface.read_ready().map_err(Error::Serial)? {
            let bytes_read = self.interface.read(&mut temp_buf).map_err(Error::Serial)?;
            if bytes_read == 0 {
                break;
            }
            self.rx
                .extend_from_slice(&temp_buf[..bytes_read])
                .map_err(|_| Error::BufferOverflow)?;
        }
        Ok(())
    }

    /// Access to the underlying transport.
    pub fn interface(&mut self) -> &mut S {
        &mut self.interface
    }
}
