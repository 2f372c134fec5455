//! PMTK commands for MediaTek receivers (L86)

use core::fmt::{self, Write};

use airfleet_protocol::checksum::{hex_digits, nmea_checksum};
use heapless::String;

/// Longest command built here, with `$`, checksum and CRLF
pub const MAX_COMMAND_LEN: usize = 64;

pub type Command = String<MAX_COMMAND_LEN>;

/// Wrap a command body as `$BODY*HH\r\n`
pub fn command(body: fmt::Arguments<'_>) -> Result<Command, fmt::Error> {
    let mut out = Command::new();
    out.write_char('$')?;
    out.write_fmt(body)?;
    let [hi, lo] = hex_digits(nmea_checksum(&out.as_bytes()[1..]));
    out.write_char('*')?;
    out.write_char(hi as char)?;
    out.write_char(lo as char)?;
    out.write_str("\r\n")?;
    Ok(out)
}

/// `PMTK220`: position fix interval
pub fn set_fix_interval(interval_ms: u32) -> Result<Command, fmt::Error> {
    command(format_args!("PMTK220,{}", interval_ms))
}

/// `PMTK314`: emit RMC once per fix and nothing else
pub fn rmc_only() -> Result<Command, fmt::Error> {
    command(format_args!(
        "PMTK314,0,1,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0"
    ))
}

/// `PMTK161,0`: standby until the next byte on RX
pub fn standby() -> Result<Command, fmt::Error> {
    command(format_args!("PMTK161,0"))
}
