//! Co-processor UART transmit task
//!
//! Drains the command queue onto the wire, one frame per command.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use crate::channels::COMMANDS;

/// Bridge TX task - sends queued commands to the co-processor
#[embassy_executor::task]
pub async fn bridge_tx_task(mut tx: BufferedUartTx) {
    info!("Bridge TX task started");

    loop {
        let command = COMMANDS.receive().await;

        let frame = match command.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to encode command {:?}: {:?}", command, e);
                continue;
            }
        };

        let bytes = frame.encode();
        if let Err(e) = tx.write_all(&bytes).await {
            warn!("UART write error: {:?}", e);
        }
    }
}
