//! Scripted modem and clock for host tests
//!
//! The modem records every line written to it and answers lines that match a
//! rule with canned bytes. Replies can be split into chunks that become
//! readable at different times. A stalled link is simply a reply that ends
//! early.

use std::cell::Cell;
use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

use windy_hal::{Clock, SerialRx, SerialTx, UartError};

/// Clock that only moves when someone waits on it
pub struct SimClock {
    now: Cell<u64>,
}

impl SimClock {
    pub fn new() -> Self {
        Self { now: Cell::new(0) }
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for &SimClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(ms as u64);
    }
}

enum Pending {
    Byte(u8),
    Error(UartError),
}

struct Rule {
    key: String,
    skip: usize,
    chunks: Vec<(u32, Vec<u8>)>,
    errors: Vec<(u32, UartError)>,
}

impl Rule {
    /// Exact match, or prefix match for keys ending in `=` or a space
    fn matches(&self, line: &str) -> bool {
        line == self.key
            || ((self.key.ends_with('=') || self.key.ends_with(' '))
                && line.starts_with(self.key.as_str()))
    }
}

pub struct SimModem<'c> {
    clock: &'c SimClock,
    rules: Vec<Rule>,
    rx: VecDeque<(u64, Pending)>,
    partial: Vec<u8>,
    log: Vec<(u64, String)>,
}

impl<'c> SimModem<'c> {
    pub fn new(clock: &'c SimClock) -> Self {
        Self {
            clock,
            rules: Vec::new(),
            rx: VecDeque::new(),
            partial: Vec::new(),
            log: Vec::new(),
        }
    }

    /// Answer `key` immediately with `reply`
    pub fn on(self, key: &str, reply: &[u8]) -> Self {
        self.on_chunks(key, vec![(0, reply.to_vec())])
    }

    /// Ignore the first `skip` matches of `key`, then answer with `reply`
    pub fn on_after(mut self, key: &str, skip: usize, reply: &[u8]) -> Self {
        self.rules.push(Rule {
            key: key.into(),
            skip,
            chunks: vec![(0, reply.to_vec())],
            errors: Vec::new(),
        });
        self
    }

    /// Answer `key` with chunks, each readable `delay` ms after the line
    pub fn on_chunks(mut self, key: &str, chunks: Vec<(u32, Vec<u8>)>) -> Self {
        self.rules.push(Rule {
            key: key.into(),
            skip: 0,
            chunks,
            errors: Vec::new(),
        });
        self
    }

    /// Make the last added rule also raise a receive error `delay` ms after
    /// its line, ahead of the reply bytes
    pub fn with_rx_error(mut self, delay: u32, error: UartError) -> Self {
        if let Some(rule) = self.rules.last_mut() {
            rule.errors.push((delay, error));
        }
        self
    }

    /// Make bytes readable right away
    pub fn inject(&mut self, bytes: &[u8]) {
        let now = self.clock.now();
        self.rx
            .extend(bytes.iter().map(|&b| (now, Pending::Byte(b))));
    }

    /// Queue a receive error
    pub fn inject_error(&mut self, error: UartError) {
        self.rx.push_back((self.clock.now(), Pending::Error(error)));
    }

    /// Every complete line written, in order, without CR LF
    pub fn lines(&self) -> Vec<&str> {
        self.log.iter().map(|(_, line)| line.as_str()).collect()
    }

    /// Only the AT commands and escape sequences
    pub fn commands(&self) -> Vec<&str> {
        self.lines()
            .into_iter()
            .filter(|line| line.starts_with("AT") || *line == "+++")
            .collect()
    }

    /// Time at which the first line starting with `prefix` was written
    pub fn sent_at(&self, prefix: &str) -> Option<u64> {
        self.log
            .iter()
            .find(|(_, line)| line.starts_with(prefix))
            .map(|(at, _)| *at)
    }

    fn record(&mut self, line: String) {
        let now = self.clock.now();
        let mut reply = None;
        let mut errors = Vec::new();
        for rule in self.rules.iter_mut() {
            if rule.matches(&line) {
                if rule.skip > 0 {
                    rule.skip -= 1;
                } else {
                    reply = Some(rule.chunks.clone());
                    errors = rule.errors.clone();
                }
                break;
            }
        }
        self.log.push((now, line));

        for (delay, error) in errors {
            self.rx.push_back((now + delay as u64, Pending::Error(error)));
        }

        for (delay, bytes) in reply.into_iter().flatten() {
            let at = now + delay as u64;
            self.rx.extend(bytes.into_iter().map(|b| (at, Pending::Byte(b))));
        }
    }
}

impl SerialTx for SimModem<'_> {
    fn write_blocking(&mut self, bytes: &[u8]) -> Result<(), UartError> {
        self.partial.extend_from_slice(bytes);
        if self.partial == b"+++" {
            self.partial.clear();
            self.record("+++".into());
            return Ok(());
        }
        while let Some(pos) = self.partial.windows(2).position(|w| w == b"\r\n") {
            let line: Vec<u8> = self.partial.drain(..pos + 2).take(pos).collect();
            self.record(String::from_utf8_lossy(&line).into_owned());
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), UartError> {
        Ok(())
    }
}

impl SerialRx for SimModem<'_> {
    fn try_read_byte(&mut self) -> Result<Option<u8>, UartError> {
        match self.rx.front() {
            Some((at, _)) if *at <= self.clock.now() => {}
            _ => return Ok(None),
        }
        match self.rx.pop_front() {
            Some((_, Pending::Byte(b))) => Ok(Some(b)),
            Some((_, Pending::Error(e))) => Err(e),
            None => Ok(None),
        }
    }
}
