//! The `qRcmd` monitor command sub-language.

use core::fmt::Write;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use log::error;
use log::warn;

use crate::conn::Connection;
use crate::protocol::hex::decode_hex_buf;
use crate::stub::error::GdbServerError;
use crate::stub::GdbServer;
use crate::target::ResetType;
use crate::target::ResumeResult;
use crate::target::Target;

pub(crate) const GENERIC_HELP: &[&str] = &[
    "The following generic monitor commands are supported:\n",
    "  help\n",
    "    Produce this message\n",
    "  reset [cold | warm]\n",
    "    Reset the simulator (default warm)\n",
    "  exit\n",
    "    Exit the GDB server\n",
    "  timeout <interval>\n",
    "    Maximum time in seconds taken by continue packet\n",
    "  timestamp\n",
    "    Report the current wall clock time\n",
    "  cyclecount\n",
    "    Report cycles executed since reset\n",
    "  instrcount\n",
    "    Report instructions executed since reset\n",
    "  echo <message>\n",
    "    Echo <message> on stdout of the gdbserver\n",
    "  set debug <flag> <on|off>\n",
    "    Enable or disable the named trace flag\n",
    "  show debug [<flag>]\n",
    "    Show the state of the trace flags\n",
];

/// `monitor timeout <n>`, with `<n>` in decimal seconds.
fn parse_timeout(cmd: &str) -> Option<u64> {
    let mut tokens = cmd.split_whitespace();
    if tokens.next() != Some("timeout") {
        return None;
    }
    let secs = tokens.next()?.parse().ok()?;
    match tokens.next() {
        Some(_) => None,
        None => Some(secs),
    }
}

fn parse_bool(token: &str) -> Option<bool> {
    const TRUE: &[&str] = &["1", "on", "true"];
    const FALSE: &[&str] = &["0", "off", "false"];

    if TRUE.iter().any(|t| token.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSE.iter().any(|t| token.eq_ignore_ascii_case(t)) {
        Some(false)
    } else {
        None
    }
}

/// Format `now` as `"YYYY-MM-DD HH:MM:SS\n"` (UTC, Gregorian).
fn format_timestamp(now: SystemTime) -> String {
    let secs = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let clock = secs % 86_400;
    let (hour, min, sec) = (clock / 3_600, clock % 3_600 / 60, clock % 60);

    // Civil date from the day count (Gregorian, era-based).
    let z = (secs / 86_400) as i64 + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}\n",
        year, month, day, hour, min, sec
    )
}

impl<T: Target, C: Connection> GdbServer<'_, T, C> {
    /// `qRcmd,<hex>`: decode and run a monitor command.
    ///
    /// Commands not recognized here fall through to the target.
    pub(crate) fn handle_rcmd(&mut self) -> Result<(), GdbServerError<C::Error>> {
        let mut hex = self.pkt.data()["qRcmd,".len()..].to_vec();
        let cmd = match decode_hex_buf(&mut hex)
            .ok()
            .and_then(|d| core::str::from_utf8(d).ok())
        {
            Some(cmd) => cmd.to_owned(),
            None => {
                warn!("malformed qRcmd payload: ignored");
                self.send_str("E01");
                return Ok(());
            }
        };

        if self.trace_flags.flag("rsp") {
            println!("RSP trace: qRcmd,{}", cmd);
        }

        if cmd == "help" {
            self.rcmd_help();
        } else if cmd == "reset" || cmd == "reset warm" {
            return self.rcmd_reset(ResetType::Warm);
        } else if cmd == "reset cold" {
            return self.rcmd_reset(ResetType::Cold);
        } else if cmd == "exit" {
            // Deliberately silent: the client connection is going away.
            self.exit_server = true;
        } else if let Some(secs) = parse_timeout(&cmd) {
            self.timeout = Duration::from_secs(secs);
            self.send_str("OK");
        } else if cmd == "timestamp" {
            let stamp = format_timestamp(SystemTime::now());
            self.pkt.pack_hexstr(stamp.as_bytes());
            self.send();
            self.send_str("OK");
        } else if cmd == "cyclecount" {
            let text = format!("{}\n", self.cpu.cycle_count());
            self.pkt.pack_hexstr(text.as_bytes());
            self.send();
            self.send_str("OK");
        } else if cmd == "instrcount" {
            let text = format!("{}\n", self.cpu.instr_count());
            self.pkt.pack_hexstr(text.as_bytes());
            self.send();
            self.send_str("OK");
        } else if let Some(rest) = cmd.strip_prefix("echo") {
            println!("{}", rest.trim_start());
            self.send_str("OK");
        } else if let Some(rest) = cmd.strip_prefix("set ") {
            self.rcmd_set(rest.trim_start());
        } else if let Some(rest) = cmd.strip_prefix("show ") {
            self.rcmd_show(rest.trim_start());
        } else {
            self.rcmd_target_fallback(&cmd);
        }

        Ok(())
    }

    /// Generic help, then whatever help the target offers.
    fn rcmd_help(&mut self) {
        for line in GENERIC_HELP {
            self.pkt.pack_rcmd_str(line, true);
            self.send();
        }

        let mut out = String::new();
        if self.cpu.command("help", &mut out) {
            self.pkt.pack_rcmd_str(
                "The following target specific monitor commands are supported:\n",
                true,
            );
            self.send();

            for line in out.lines() {
                let line = format!("{}\n", line);
                self.pkt.pack_rcmd_str(&line, true);
                self.send();
            }
        } else {
            self.pkt
                .pack_rcmd_str("There are no target specific monitor commands", true);
            self.send();
        }

        self.send_str("OK");
    }

    /// A failed reset leaves the target in an unknown state, which is not
    /// worth surviving.
    fn rcmd_reset(&mut self, kind: ResetType) -> Result<(), GdbServerError<C::Error>> {
        if self.cpu.reset(kind) != ResumeResult::Success {
            error!("failed to {:?} reset: terminating", kind);
            return Err(GdbServerError::ResetFailed(kind));
        }

        self.send_str("OK");
        Ok(())
    }

    /// `set debug <flag> <bool>`; anything else goes to the target with the
    /// `set ` prefix re-attached.
    fn rcmd_set(&mut self, args: &str) {
        let tokens: Vec<&str> = args.split_whitespace().collect();

        if let ["debug", flag, value] = tokens.as_slice() {
            if !self.trace_flags.is_flag(flag) {
                self.send_str("E01");
                return;
            }

            match parse_bool(value) {
                Some(value) => {
                    self.trace_flags.set_flag(flag, value);
                    self.send_str("OK");
                }
                None => self.send_str("E02"),
            }
            return;
        }

        self.rcmd_target_fallback(&format!("set {}", args));
    }

    /// `show debug [<flag>]`; anything else goes to the target with the
    /// `show ` prefix re-attached.
    fn rcmd_show(&mut self, args: &str) {
        let tokens: Vec<&str> = args.split_whitespace().collect();

        match tokens.as_slice() {
            ["debug"] => {
                let mut out = String::new();
                for name in self.trace_flags.iter() {
                    let state = if self.trace_flags.flag(name) { "ON" } else { "OFF" };
                    let _ = writeln!(out, "{}: {}", name, state);
                }
                self.pkt.pack_rcmd_str(&out, true);
                self.send();
                self.send_str("OK");
            }
            ["debug", flag] => {
                if !self.trace_flags.is_flag(flag) {
                    self.send_str("E01");
                    return;
                }

                let state = if self.trace_flags.flag(flag) { "ON" } else { "OFF" };
                let line = format!("{}: {}\n", flag, state);
                self.pkt.pack_rcmd_str(&line, true);
                self.send();
                self.send_str("OK");
            }
            _ => self.rcmd_target_fallback(&format!("show {}", args)),
        }
    }

    /// Hand an unrecognized monitor command to the target.
    fn rcmd_target_fallback(&mut self, cmd: &str) {
        let mut out = String::new();
        if self.cpu.command(cmd, &mut out) {
            self.pkt.pack_rcmd_str(&out, true);
            self.send();
            self.send_str("OK");
        } else {
            self.send_str("E04");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_argument() {
        assert_eq!(parse_timeout("timeout 3"), Some(3));
        assert_eq!(parse_timeout("timeout   0"), Some(0));
        assert_eq!(parse_timeout("timeout"), None);
        assert_eq!(parse_timeout("timeout x"), None);
        assert_eq!(parse_timeout("timeout 3 4"), None);
        assert_eq!(parse_timeout("timeou 3"), None);
    }

    #[test]
    fn bool_tokens() {
        for t in ["1", "on", "ON", "true", "True"] {
            assert_eq!(parse_bool(t), Some(true));
        }
        for t in ["0", "off", "OFF", "false", "False"] {
            assert_eq!(parse_bool(t), Some(false));
        }
        assert_eq!(parse_bool("2"), None);
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn timestamp_epoch() {
        assert_eq!(
            format_timestamp(UNIX_EPOCH),
            "1970-01-01 00:00:00\n"
        );
    }

    #[test]
    fn timestamp_leap_year_day() {
        // 2000-03-01 00:00:00 UTC, the day after a century leap day.
        let t = UNIX_EPOCH + Duration::from_secs(951_868_800);
        assert_eq!(format_timestamp(t), "2000-03-01 00:00:00\n");
    }

    #[test]
    fn timestamp_with_clock() {
        // 2024-02-29 12:34:56 UTC.
        let t = UNIX_EPOCH + Duration::from_secs(1_709_210_096);
        assert_eq!(format_timestamp(t), "2024-02-29 12:34:56\n");
    }
}
