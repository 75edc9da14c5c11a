//! The interactive debugger session.
//!
//! The dispatcher calls [`Interpreter::debugger_hook`] before every
//! instruction and [`Interpreter::debugger_finished`] once after halt; both
//! are no-ops unless the debugger was engaged at construction.

use super::{Console, Interpreter};
use crate::backtrace::resolve_label;

use std::io;

const HELP: &str = "\
Debugger commands:
    help - Show this message
    step <amount> - step one instruction or <amount> instructions
    s <amount> - alias of step <amount>
    breakpoint <addr> - toggle a breakpoint at addr (decimal, 0x hex, #label)
    b <addr> - alias of breakpoint <addr>
    continue - run until the program exits or a breakpoint hits
    c - alias of continue
    stdout - all text output so far from OUT and its variations
    status - status of the program
    addr - current address
    exit - quit the program
";

impl<C: Console> Interpreter<C> {
    pub(crate) fn debugger_welcome(&mut self) -> io::Result<()> {
        self.console.write_out(
            b"\nWelcome to the MASM debugger. Run help for a list of all commands\n",
        )
    }

    pub(crate) fn debugger_hook(&mut self) -> io::Result<()> {
        if !self.debugger.enabled() {
            return Ok(());
        }
        self.debugger_session(false)
    }

    pub(crate) fn debugger_finished(&mut self) -> io::Result<()> {
        self.debugger_session(true)
    }

    fn debugger_session(&mut self, end: bool) -> io::Result<()> {
        if end {
            self.console.write_out(b"\nProgram finished\n")?;
        } else if self.debugger.has_breakpoint(self.ip) {
            let message = format!("Breakpoint hit at {}\n", self.print_ip(self.ip));
            self.console.write_out(message.as_bytes())?;
            self.debugger.continuing = false;
            self.debugger.steps = 0;
        } else {
            if self.debugger.steps > 0 {
                self.debugger.steps -= 1;
                return Ok(());
            }
            if self.debugger.continuing {
                return Ok(());
            }
        }

        loop {
            let prompt = self.debugger.prompt.clone();
            self.console.write_out(prompt.as_bytes())?;
            let line = self.console.read_line()?.trim().to_string();

            // an empty line repeats the previous command
            let line = if line.is_empty() {
                self.debugger.prev_command.clone()
            } else {
                self.debugger.prev_command = line.clone();
                line
            };
            if line.is_empty() {
                // no input left at all; behave like continue
                return Ok(());
            }

            let mut tokens = line.split_whitespace();
            let command = tokens.next().unwrap_or("");
            match command {
                "step" | "s" => {
                    let count: u32 = tokens.next().and_then(|t| t.parse().ok()).unwrap_or(1);
                    self.debugger.steps = count.saturating_sub(1);
                    return Ok(());
                }
                "continue" | "c" => {
                    self.debugger.continuing = true;
                    return Ok(());
                }
                "breakpoint" | "b" => {
                    let Some(token) = tokens.next() else {
                        self.console.write_out(b"Missing addr\n")?;
                        continue;
                    };
                    if token.starts_with('#') && self.labels.is_empty() {
                        self.console.write_out(
                            b"Cannot use a label as an address without debug labels in the image\n",
                        )?;
                        continue;
                    }
                    match self.parse_code_addr(token) {
                        Some(addr) => {
                            let added = self.debugger.toggle_breakpoint(addr);
                            let verb = if added { "Put" } else { "Removed" };
                            let message =
                                format!("{verb} breakpoint at {}\n", self.print_ip(addr));
                            self.console.write_out(message.as_bytes())?;
                        }
                        None => {
                            let message = format!("Invalid addr: {token}\n");
                            self.console.write_out(message.as_bytes())?;
                        }
                    }
                }
                "status" => {
                    let labels = if self.labels.is_empty() { "N" } else { "Y" };
                    let message = format!("Debug Labels: {labels}\n");
                    self.console.write_out(message.as_bytes())?;
                }
                "stdout" => {
                    let captured = self.debugger.captured().to_vec();
                    self.console.write_out(&captured)?;
                }
                "addr" => {
                    let message = format!("Current IP: {}\n", self.print_ip(self.ip));
                    self.console.write_out(message.as_bytes())?;
                }
                "exit" => {
                    self.console.write_out(b"Goodbye!\n")?;
                    std::process::exit(0);
                }
                "help" => {
                    self.console.write_out(HELP.as_bytes())?;
                }
                _ => {
                    let message = format!("Unknown command: {command}\n");
                    self.console.write_out(message.as_bytes())?;
                }
            }
        }
    }

    fn print_ip(&self, ip: u32) -> String {
        match resolve_label(&self.labels, ip) {
            Some(location) => format!("{ip:#x} ({location})"),
            None => format!("{ip:#x}"),
        }
    }

    /// Breakpoint addresses: decimal, `0x` hex, or `#label`.
    fn parse_code_addr(&self, token: &str) -> Option<u32> {
        if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            u32::from_str_radix(hex, 16).ok()
        } else if let Some(label) = token.strip_prefix('#') {
            self.labels
                .iter()
                .find(|(_, name)| name.as_str() == label)
                .map(|(addr, _)| *addr)
        } else {
            token.parse().ok()
        }
    }
}
