//! Co-processor UART receive task
//!
//! Receives frames from the co-processor and publishes link state and
//! events for the controller.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;
use portable_atomic::Ordering;

use airfleet_core::traits::{CloudEvent, RadioEvent};
use airfleet_protocol::bridge::CoprocessorEvent;
use airfleet_protocol::FrameParser;

use crate::channels::{
    CLOUD_CONNECTED, CLOUD_EVENTS, RADIO_CHANNELS, RADIO_CONNECTED, RADIO_EVENTS, RADIO_PAIRING,
};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Bridge RX task - receives and parses frames from the co-processor
#[embassy_executor::task]
pub async fn bridge_rx_task(mut rx: BufferedUartRx) {
    info!("Bridge RX task started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(frame)) => match CoprocessorEvent::from_frame(&frame) {
                            Ok(event) => handle_event(event),
                            Err(e) => {
                                warn!("Failed to parse co-processor event: {:?}", e);
                            }
                        },
                        Ok(None) => {
                            // Need more bytes
                        }
                        Err(e) => {
                            warn!("Frame parse error: {:?}", e);
                        }
                    }
                }
            }
            Ok(_) => {
                // No bytes read, continue
            }
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}

fn handle_event(event: CoprocessorEvent) {
    let radio = match event {
        CoprocessorEvent::Advertisement { address, service } => {
            Some(RadioEvent::Advertisement { address, service })
        }
        CoprocessorEvent::ScanStopped => Some(RadioEvent::ScanStopped),
        CoprocessorEvent::Connected { channels } => {
            debug!("Display peer connected, channels {:?}", channels);
            RADIO_CHANNELS.store(channels.0, Ordering::Release);
            RADIO_CONNECTED.store(true, Ordering::Release);
            Some(RadioEvent::Connected)
        }
        CoprocessorEvent::ConnectFailed => Some(RadioEvent::ConnectFailed),
        CoprocessorEvent::Disconnected => {
            RADIO_CONNECTED.store(false, Ordering::Release);
            RADIO_PAIRING.store(false, Ordering::Release);
            RADIO_CHANNELS.store(0, Ordering::Release);
            Some(RadioEvent::Disconnected)
        }
        CoprocessorEvent::PairingStatus { pairing, paired } => {
            debug!("Pairing status: pairing={} paired={}", pairing, paired);
            RADIO_PAIRING.store(pairing, Ordering::Release);
            None
        }
        CoprocessorEvent::CloudStatus { connected } => {
            info!("Cloud connected: {}", connected);
            CLOUD_CONNECTED.store(connected, Ordering::Release);
            None
        }
        CoprocessorEvent::CloudEvent { name, data } => {
            if CLOUD_EVENTS.try_send(CloudEvent { name, data }).is_err() {
                warn!("Cloud event channel full, dropping event");
            }
            None
        }
    };

    if let Some(event) = radio {
        if RADIO_EVENTS.try_send(event).is_err() {
            warn!("Radio event channel full, dropping event");
        }
    }
}
