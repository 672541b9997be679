// AT-command modem emulator.
//
// Speaks the 9602's command protocol over a byte-oriented channel so flight
// software can run against the relay without hardware. The emulator is a
// single task owning all session state: serial bytes, gateway-pushed MT
// messages and the ring-alert timer are multiplexed through one select loop,
// so no handler ever races another.

use crate::connection::SerialConnection;
use crate::datatypes::{MoHeader, SessionStatus};
use crate::gateway::GatewayClient;
use crate::message::IridiumMessage;
use crate::modem::checksum;
use crate::modem::config::{LinkQuality, ModemConfig};
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::VecDeque;
use std::io;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// AT protocol state.
///
/// The hardware documentation also describes a `Session` state, but no
/// transition ever reaches it (sessions run to completion inside the command
/// handler), so it is not modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtState {
    /// Between commands; the only state in which ring alerts may sound.
    Idle,
    /// A command line is being processed.
    Command,
    /// Raw MO bytes are being collected after `AT+SBDWB`.
    WritingMo,
}

/// Emulated Iridium modem.
///
/// Dependencies are injected at construction: the configuration replaces the
/// original firmware's global toggles, and the gateway client is the seam
/// through which MO bursts leave for the uplink. Replies accumulate in an
/// output queue that [`ModemEmulator::run`] drains to the serial channel
/// after every event (tests read it directly).
pub struct ModemEmulator<G> {
    config: ModemConfig,
    gateway: G,
    state: AtState,
    command_buffer: Vec<u8>,
    mo_buffer: Vec<u8>,
    mo_declared_len: usize,
    mt_buffer: Bytes,
    mt_queue: VecDeque<Bytes>,
    ring_pending: bool,
    ring_suppressed: bool,
    momsn: u16,
    mtmsn: u16,
    auto_id: u32,
    out: VecDeque<Bytes>,
}

impl<G: GatewayClient> ModemEmulator<G> {
    pub fn new(config: ModemConfig, gateway: G) -> Self {
        Self {
            config,
            gateway,
            state: AtState::Idle,
            command_buffer: Vec::new(),
            mo_buffer: Vec::new(),
            mo_declared_len: 0,
            mt_buffer: Bytes::new(),
            mt_queue: VecDeque::new(),
            ring_pending: false,
            ring_suppressed: false,
            momsn: 0,
            mtmsn: 0,
            auto_id: 0,
            out: VecDeque::new(),
        }
    }

    pub fn state(&self) -> AtState {
        self.state
    }

    pub fn ring_alert_pending(&self) -> bool {
        self.ring_pending
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Drain everything queued for the serial line.
    pub fn take_output(&mut self) -> Vec<Bytes> {
        self.out.drain(..).collect()
    }

    /// Drive the emulator from its three event sources until the serial peer
    /// disconnects.
    pub async fn run<T>(
        mut self,
        mut serial: SerialConnection<T>,
        mut mt_rx: mpsc::UnboundedReceiver<Bytes>,
    ) -> crate::Result<()>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let mut ring = time::interval(self.config.ring_interval);
        ring.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut mt_open = true;

        loop {
            tokio::select! {
                read = serial.read_data() => match read? {
                    Some(chunk) => self.handle_serial(&chunk).await,
                    None => {
                        info!("serial peer closed the line, emulator stopping");
                        self.ring_off();
                        return Ok(());
                    }
                },
                message = mt_rx.recv(), if mt_open => match message {
                    Some(raw) => self.on_gateway_message(&raw),
                    None => mt_open = false,
                },
                _ = ring.tick(), if self.ring_pending => self.ring_tick(),
            }

            self.flush_output(&mut serial).await?;
        }
    }

    async fn flush_output<T>(&mut self, serial: &mut SerialConnection<T>) -> io::Result<()>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        while let Some(chunk) = self.out.pop_front() {
            serial.write_data(&chunk).await?;
        }
        Ok(())
    }

    /// Consume a chunk of bytes from the flight-software side.
    pub async fn handle_serial(&mut self, data: &[u8]) {
        for &byte in data {
            if self.state == AtState::WritingMo {
                self.mo_buffer.push(byte);
                if self.mo_buffer.len() == self.mo_declared_len + 2 {
                    self.finish_mo_write();
                }
            } else if byte == b'\r' {
                let line = String::from_utf8_lossy(&self.command_buffer).into_owned();
                self.command_buffer.clear();
                self.dispatch(&line).await;
            } else {
                self.command_buffer.push(byte);
            }
        }
    }

    /// Accept a message pushed from the gateway side and queue its MT
    /// payloads for pickup at the next session.
    ///
    /// A message that fails to decode is logged and dropped; the link stays
    /// up.
    pub fn on_gateway_message(&mut self, raw: &[u8]) {
        let message = match IridiumMessage::decode(raw) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "discarding undecodable MT message");
                return;
            }
        };

        let before = self.mt_queue.len();
        for payload in message.mt_payloads() {
            self.mt_queue.push_back(payload.clone());
        }

        if self.mt_queue.len() == before {
            debug!("MT message carried no payload element");
            return;
        }

        self.ring_on();
    }

    async fn dispatch(&mut self, line: &str) {
        self.set_state(AtState::Command);
        debug!(command = line, "dispatching");

        match line {
            "AT" | "AT&K0" | "ATE0" => self.send_ok(),
            "AT+CSQ" => self.at_csq().await,
            "AT+SBDD0" => self.at_sbdd0(),
            "AT+SBDIX" => self.at_sbdix(false).await,
            "AT+SBDIXA" => self.at_sbdix(true).await,
            "AT+SBDRB" => self.at_sbdrb(),
            _ => {
                if let Some(arg) = line.strip_prefix("AT+SBDWB=") {
                    self.at_sbdwb(arg);
                } else {
                    debug!(command = line, "unrecognized command");
                    self.set_state(AtState::Idle);
                }
            }
        }
    }

    /// Signal-quality query. The degraded profile holds the answer back for
    /// the configured delay and only reports full bars with the configured
    /// probability; the delay suspends this task alone, never the runtime.
    async fn at_csq(&mut self) {
        match self.config.link {
            LinkQuality::Ideal => self.send_line("+CSQ:5"),
            LinkQuality::Degraded {
                csq_delay,
                good_signal_ratio,
                ..
            } => {
                time::sleep(csq_delay).await;
                if rand::random::<f64>() < good_signal_ratio {
                    self.send_line("+CSQ:5");
                } else {
                    self.send_line("+CSQ:0");
                }
            }
        }
        self.send_ok();
    }

    /// Clear the MO buffer.
    fn at_sbdd0(&mut self) {
        self.mo_buffer.clear();
        self.send_line("0");
        self.send_ok();
    }

    /// Run an SBD session: hand off the MO buffer (if any) as an assembled
    /// burst, then pop the next queued MT payload. MO-before-MT ordering is
    /// fixed. `AT+SBDIXA` additionally acknowledges the ring alert first.
    async fn at_sbdix(&mut self, clear_ring: bool) {
        if clear_ring {
            self.ring_off();
        }

        if !self.mo_buffer.is_empty() {
            self.momsn = self.momsn.wrapping_add(1);
            self.auto_id = self.auto_id.wrapping_add(1);

            let header = MoHeader {
                auto_id: self.auto_id,
                imei: self.config.imei,
                session_status: SessionStatus::Successful,
                momsn: self.momsn,
                mtmsn: self.mtmsn,
                time_of_session: unix_time(),
            };
            let burst = IridiumMessage::mo(header, self.mo_buffer.clone());

            match burst.to_bytes() {
                Ok(raw) => {
                    if let Err(e) = self.gateway.send(&raw).await {
                        // The status line still reports the session the way
                        // the modeled hardware does; the loss shows up here.
                        warn!(error = %e, momsn = self.momsn, "MO burst hand-off failed");
                    }
                }
                Err(e) => warn!(error = %e, "MO burst would not serialize"),
            }
        }

        let mt_status = match self.mt_queue.pop_front() {
            Some(payload) => {
                self.mt_buffer = payload;
                self.mtmsn = self.mtmsn.wrapping_add(1);
                1
            }
            None => {
                self.mt_buffer = Bytes::new();
                0
            }
        };

        if let LinkQuality::Degraded { session_delay, .. } = self.config.link {
            time::sleep(session_delay).await;
        }

        let mt_msn = if mt_status == 1 { self.mtmsn } else { 0 };
        let status = format!(
            "+SBDIX:0,{},{},{},{},{}",
            self.momsn,
            mt_status,
            mt_msn,
            self.mt_buffer.len(),
            self.mt_queue.len()
        );
        self.send_line(&status);
        self.send_ok();
    }

    /// Start collecting a raw MO write of `arg` bytes plus checksum.
    fn at_sbdwb(&mut self, arg: &str) {
        match arg.parse::<usize>() {
            Ok(declared) => {
                self.mo_declared_len = declared;
                self.mo_buffer.clear();
                self.send_line("READY");
                self.set_state(AtState::WritingMo);
            }
            Err(_) => {
                warn!(arg, "unparseable SBDWB length");
                self.send_line("3");
                self.set_state(AtState::Idle);
            }
        }
    }

    /// Close out a raw MO write once the declared byte count plus the two
    /// checksum bytes have arrived.
    fn finish_mo_write(&mut self) {
        if checksum::verify_trailing(&self.mo_buffer) {
            self.mo_buffer.truncate(self.mo_declared_len);
            self.send_line("0");
        } else {
            warn!(
                declared = self.mo_declared_len,
                "MO write checksum mismatch, discarding buffer"
            );
            self.mo_buffer.clear();
            self.send_line("2");
        }
        self.send_ok();
    }

    /// Transfer the MT buffer as a binary frame: length, payload, additive
    /// checksum. The buffer is not consumed; the next session replaces it.
    fn at_sbdrb(&mut self) {
        let mut frame = BytesMut::with_capacity(self.mt_buffer.len() + 6);
        frame.put_u16(self.mt_buffer.len() as u16);
        frame.extend_from_slice(&self.mt_buffer);
        frame.put_u16(checksum::additive(&self.mt_buffer));
        frame.extend_from_slice(b"\r\n");

        self.out.push_back(frame.freeze());
        self.send_ok();
    }

    fn ring_on(&mut self) {
        self.ring_pending = true;
        self.emit_ring();
    }

    fn ring_off(&mut self) {
        self.ring_pending = false;
        self.ring_suppressed = false;
    }

    /// Timer callback: repeat the alert while it stays unacknowledged.
    pub fn ring_tick(&mut self) {
        if self.ring_pending {
            self.emit_ring();
        }
    }

    fn emit_ring(&mut self) {
        self.ring_suppressed = true;
        if self.state != AtState::Idle {
            return;
        }
        self.send_line("SBDRING");
        self.ring_suppressed = false;
    }

    fn send_line(&mut self, line: &str) {
        let mut data = BytesMut::with_capacity(line.len() + 2);
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(b"\r\n");
        self.out.push_back(data.freeze());
    }

    fn send_ok(&mut self) {
        self.send_line("OK");
        self.set_state(AtState::Idle);
    }

    fn set_state(&mut self, state: AtState) {
        self.state = state;
        // An alert that fired while the line was busy sounds as soon as the
        // line goes idle again.
        if state == AtState::Idle && self.ring_suppressed {
            self.emit_ring();
        }
    }
}

fn unix_time() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as u32)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::InformationElement;
    use crate::gateway::GatewayError;

    #[derive(Default)]
    struct MockGateway {
        sent: Vec<Vec<u8>>,
        fail: bool,
    }

    impl GatewayClient for MockGateway {
        async fn send(&mut self, message: &[u8]) -> Result<(), GatewayError> {
            if self.fail {
                return Err(GatewayError::Transport("gateway unreachable".into()));
            }
            self.sent.push(message.to_vec());
            Ok(())
        }
    }

    fn emulator() -> ModemEmulator<MockGateway> {
        let config = ModemConfig::new("300234060392630".parse().unwrap());
        ModemEmulator::new(config, MockGateway::default())
    }

    fn output_string(emulator: &mut ModemEmulator<MockGateway>) -> String {
        let chunks = emulator.take_output();
        let mut all = Vec::new();
        for chunk in chunks {
            all.extend_from_slice(&chunk);
        }
        String::from_utf8_lossy(&all).into_owned()
    }

    fn checksummed(payload: &[u8]) -> Vec<u8> {
        let mut frame = payload.to_vec();
        frame.extend_from_slice(&checksum::additive(payload).to_be_bytes());
        frame
    }

    #[tokio::test]
    async fn basic_commands_reply_ok() {
        let mut emulator = emulator();

        for command in ["AT\r", "AT&K0\r", "ATE0\r"] {
            emulator.handle_serial(command.as_bytes()).await;
            assert_eq!(output_string(&mut emulator), "OK\r\n");
            assert_eq!(emulator.state(), AtState::Idle);
        }
    }

    #[tokio::test]
    async fn csq_reports_full_bars_on_ideal_link() {
        let mut emulator = emulator();

        emulator.handle_serial(b"AT+CSQ\r").await;
        assert_eq!(output_string(&mut emulator), "+CSQ:5\r\nOK\r\n");
    }

    #[tokio::test]
    async fn unrecognized_command_gets_no_reply() {
        let mut emulator = emulator();

        emulator.handle_serial(b"AT+NOPE\r").await;
        assert_eq!(output_string(&mut emulator), "");
        assert_eq!(emulator.state(), AtState::Idle);
    }

    #[tokio::test]
    async fn sbdwb_accepts_payload_with_good_checksum() {
        let mut emulator = emulator();

        emulator.handle_serial(b"AT+SBDWB=4\r").await;
        assert_eq!(output_string(&mut emulator), "READY\r\n");
        assert_eq!(emulator.state(), AtState::WritingMo);

        emulator.handle_serial(&checksummed(b"\x10\x20\x30\x40")).await;
        assert_eq!(output_string(&mut emulator), "0\r\nOK\r\n");
        assert_eq!(emulator.state(), AtState::Idle);

        // The accepted buffer goes out as an assembled burst.
        emulator.handle_serial(b"AT+SBDIX\r").await;
        let reply = output_string(&mut emulator);
        assert_eq!(reply, "+SBDIX:0,1,0,0,0,0\r\nOK\r\n");

        let sent = &emulator.gateway().sent;
        assert_eq!(sent.len(), 1);
        let burst = IridiumMessage::decode(&sent[0]).unwrap();
        match &burst.elements[0] {
            InformationElement::MoHeader(header) => {
                assert_eq!(header.momsn, 1);
                assert_eq!(header.session_status, SessionStatus::Successful);
                assert_eq!(header.imei.to_string(), "300234060392630");
            }
            other => panic!("expected MO header, got {other:?}"),
        }
        match &burst.elements[1] {
            InformationElement::MoPayload(payload) => {
                assert_eq!(payload.payload.as_ref(), b"\x10\x20\x30\x40");
            }
            other => panic!("expected MO payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn sbdwb_rejects_corrupt_checksum() {
        let mut emulator = emulator();

        emulator.handle_serial(b"AT+SBDWB=4\r").await;
        emulator.take_output();

        let mut frame = checksummed(b"\x10\x20\x30\x40");
        frame[1] ^= 0x01; // single bit flip
        emulator.handle_serial(&frame).await;
        assert_eq!(output_string(&mut emulator), "2\r\nOK\r\n");
        assert_eq!(emulator.state(), AtState::Idle);

        // Nothing survives to be sent at the next session.
        emulator.handle_serial(b"AT+SBDIX\r").await;
        emulator.take_output();
        assert!(emulator.gateway().sent.is_empty());
    }

    #[tokio::test]
    async fn sbdwb_rejects_unparseable_length() {
        let mut emulator = emulator();

        emulator.handle_serial(b"AT+SBDWB=bogus\r").await;
        assert_eq!(output_string(&mut emulator), "3\r\n");
        assert_eq!(emulator.state(), AtState::Idle);
    }

    #[tokio::test]
    async fn sbdd0_clears_the_mo_buffer() {
        let mut emulator = emulator();

        emulator.handle_serial(b"AT+SBDWB=2\r").await;
        emulator.handle_serial(&checksummed(b"\x01\x02")).await;
        emulator.take_output();

        emulator.handle_serial(b"AT+SBDD0\r").await;
        assert_eq!(output_string(&mut emulator), "0\r\nOK\r\n");

        emulator.handle_serial(b"AT+SBDIX\r").await;
        emulator.take_output();
        assert!(emulator.gateway().sent.is_empty());
    }

    #[tokio::test]
    async fn session_pops_mt_payload_in_arrival_order() {
        let mut emulator = emulator();

        let first = IridiumMessage::mt(1, "300234060392630".parse().unwrap(), &b"first"[..]);
        let second = IridiumMessage::mt(2, "300234060392630".parse().unwrap(), &b"second!"[..]);
        emulator.on_gateway_message(&first.to_bytes().unwrap());
        emulator.on_gateway_message(&second.to_bytes().unwrap());
        emulator.take_output();

        emulator.handle_serial(b"AT+SBDIXA\r").await;
        assert_eq!(output_string(&mut emulator), "+SBDIX:0,0,1,1,5,1\r\nOK\r\n");
        assert!(!emulator.ring_alert_pending());

        // SBDRB frames the popped payload with its additive checksum.
        emulator.handle_serial(b"AT+SBDRB\r").await;
        let chunks = emulator.take_output();
        let mut frame = Vec::new();
        for chunk in &chunks {
            frame.extend_from_slice(chunk);
        }
        let mut expected = vec![0x00, 0x05];
        expected.extend_from_slice(b"first");
        expected.extend_from_slice(&checksum::additive(b"first").to_be_bytes());
        expected.extend_from_slice(b"\r\nOK\r\n");
        assert_eq!(frame, expected);

        emulator.handle_serial(b"AT+SBDIX\r").await;
        assert_eq!(output_string(&mut emulator), "+SBDIX:0,0,1,2,7,0\r\nOK\r\n");
    }

    #[tokio::test]
    async fn mt_arrival_rings_while_idle() {
        let mut emulator = emulator();

        let message = IridiumMessage::mt(7, "300234060392630".parse().unwrap(), &b"wake"[..]);
        emulator.on_gateway_message(&message.to_bytes().unwrap());

        assert!(emulator.ring_alert_pending());
        assert_eq!(output_string(&mut emulator), "SBDRING\r\n");

        // The timer keeps repeating the alert until it is acknowledged.
        emulator.ring_tick();
        assert_eq!(output_string(&mut emulator), "SBDRING\r\n");
    }

    #[tokio::test]
    async fn ring_is_suppressed_until_the_line_goes_idle() {
        let mut emulator = emulator();

        emulator.handle_serial(b"AT+SBDWB=4\r").await;
        emulator.take_output();
        assert_eq!(emulator.state(), AtState::WritingMo);

        let message = IridiumMessage::mt(7, "300234060392630".parse().unwrap(), &b"wake"[..]);
        emulator.on_gateway_message(&message.to_bytes().unwrap());
        assert_eq!(output_string(&mut emulator), "");

        emulator.handle_serial(&checksummed(b"\x01\x02\x03\x04")).await;
        let reply = output_string(&mut emulator);
        assert_eq!(reply, "0\r\nOK\r\nSBDRING\r\n");
    }

    #[tokio::test]
    async fn undecodable_mt_message_is_dropped() {
        let mut emulator = emulator();

        emulator.on_gateway_message(&[0x02, 0xFF, 0xFF]);
        assert!(!emulator.ring_alert_pending());
        assert_eq!(output_string(&mut emulator), "");

        emulator.handle_serial(b"AT+SBDIX\r").await;
        assert_eq!(output_string(&mut emulator), "+SBDIX:0,0,0,0,0,0\r\nOK\r\n");
    }

    #[tokio::test]
    async fn momsn_increments_per_mo_session() {
        let mut emulator = emulator();

        for expected in 1..=3u16 {
            emulator.handle_serial(b"AT+SBDWB=2\r").await;
            emulator.handle_serial(&checksummed(b"\xAA\xBB")).await;
            emulator.handle_serial(b"AT+SBDIX\r").await;
            let reply = output_string(&mut emulator);
            assert!(reply.contains(&format!("+SBDIX:0,{expected},0,0,0,0")));
        }
        assert_eq!(emulator.gateway().sent.len(), 3);
    }

    #[tokio::test]
    async fn gateway_failure_stays_off_the_status_line() {
        let mut emulator = emulator();
        emulator.gateway.fail = true;

        emulator.handle_serial(b"AT+SBDWB=2\r").await;
        emulator.handle_serial(&checksummed(b"\xAA\xBB")).await;
        emulator.take_output();

        emulator.handle_serial(b"AT+SBDIX\r").await;
        assert_eq!(output_string(&mut emulator), "+SBDIX:0,1,0,0,0,0\r\nOK\r\n");
    }

    #[tokio::test(start_paused = true)]
    async fn degraded_link_delays_but_still_answers() {
        use std::time::Duration;

        let config = ModemConfig::new("300234060392630".parse().unwrap()).with_link(
            LinkQuality::Degraded {
                csq_delay: Duration::from_secs(4),
                session_delay: Duration::from_secs(20),
                good_signal_ratio: 1.0,
            },
        );
        let mut emulator = ModemEmulator::new(config, MockGateway::default());

        emulator.handle_serial(b"AT+CSQ\r").await;
        assert_eq!(output_string(&mut emulator), "+CSQ:5\r\nOK\r\n");

        emulator.handle_serial(b"AT+SBDIX\r").await;
        assert_eq!(output_string(&mut emulator), "+SBDIX:0,0,0,0,0,0\r\nOK\r\n");
    }

    #[tokio::test]
    async fn run_drives_a_full_exchange_over_the_wire() {
        let (mut flight_side, modem_side) = tokio::io::duplex(1024);
        let connection = SerialConnection::new(modem_side);
        let (_mt_tx, mt_rx) = mpsc::unbounded_channel();

        let emulator = emulator();
        let driver = tokio::spawn(async move { emulator.run(connection, mt_rx).await });

        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        flight_side.write_all(b"AT\r").await.unwrap();
        let mut reply = [0u8; 4];
        flight_side.read_exact(&mut reply).await.unwrap();
        assert_eq!(&reply, b"OK\r\n");

        drop(flight_side);
        driver.await.unwrap().unwrap();
    }
}
