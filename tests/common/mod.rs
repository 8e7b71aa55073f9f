//! Register-level MFRC522 model with ISO/IEC 14443-A PICCs in its field.
//!
//! The simulator speaks the chip's SPI framing byte by byte, so the driver is
//! exercised exactly as on hardware: address bytes, burst reads, Set1 IRQ
//! registers, FIFO and the command state machine.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use rc522_iso14443a::registers::*;
use rc522_iso14443a::{Clock, Instant, RfidRc522};

const FIFO_SIZE: usize = 64;
const CMD_MEM: u8 = 0x1;
const CMD_GENERATE_RANDOM_ID: u8 = 0x2;
const CMD_CALC_CRC: u8 = 0x3;
const CMD_TRANSCEIVE: u8 = 0xC;
const CMD_SOFT_RESET: u8 = 0xF;

/// Reference CRC_A, bit by bit: reflected polynomial 0x8408, preset 0x6363.
pub fn crc_a(data: &[u8]) -> [u8; 2] {
    let mut crc: u16 = 0x6363;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0x8408
            } else {
                crc >> 1
            };
        }
    }
    crc.to_le_bytes()
}

/// An answer forced onto the next Transceive instead of the PICC model.
#[derive(Clone, Debug)]
pub enum Reply {
    /// No PICC answers, the chip timer fires
    Silent,
    /// Nothing happens at all, neither data nor timer
    Hang,
    Frame {
        bytes: Vec<u8>,
        /// Valid bits in the last byte, 0 = all eight
        last_bits: u8,
        error: u8,
        coll: u8,
    },
}

impl Reply {
    pub fn bytes(bytes: &[u8]) -> Self {
        Reply::Frame {
            bytes: bytes.to_vec(),
            last_bits: 0,
            error: 0,
            coll: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PiccState {
    Idle,
    Ready { level: usize },
    Active,
    Halt,
}

#[derive(Clone, Debug)]
pub struct Picc {
    pub uid: Vec<u8>,
    /// SAK of the last cascade level
    pub sak: u8,
    pub atqa: [u8; 2],
    pub state: PiccState,
    pub blocks: Vec<[u8; 16]>,
}

impl Picc {
    pub fn new(uid: &[u8], sak: u8) -> Self {
        assert!(matches!(uid.len(), 4 | 7 | 10));
        let atqa = match uid.len() {
            4 => [0x04, 0x00],
            7 => [0x44, 0x00],
            _ => [0x84, 0x00],
        };
        Picc {
            uid: uid.to_vec(),
            sak,
            atqa,
            state: PiccState::Idle,
            blocks: (0..64u8).map(|block| [block; 16]).collect(),
        }
    }

    fn levels(&self) -> usize {
        match self.uid.len() {
            4 => 1,
            7 => 2,
            _ => 3,
        }
    }

    /// The 40 bits (4 bytes + BCC) this PICC sends at cascade level `level`.
    fn level_data(&self, level: usize) -> [u8; 5] {
        let last = level == self.levels();
        let mut data = [0u8; 5];
        if last {
            let start = 3 * (level - 1);
            data[..4].copy_from_slice(&self.uid[start..start + 4]);
        } else {
            let start = 3 * (level - 1);
            data[0] = 0x88;
            data[1..4].copy_from_slice(&self.uid[start..start + 3]);
        }
        data[4] = data[0] ^ data[1] ^ data[2] ^ data[3];
        data
    }

    fn level_sak(&self, level: usize) -> u8 {
        if level == self.levels() {
            self.sak
        } else {
            0x04
        }
    }
}

fn bit(bytes: &[u8], index: usize) -> bool {
    bytes[index / 8] & (1 << (index % 8)) != 0
}

fn set_bit(bytes: &mut [u8], index: usize, value: bool) {
    if value {
        bytes[index / 8] |= 1 << (index % 8);
    } else {
        bytes[index / 8] &= !(1 << (index % 8));
    }
}

pub struct Chip {
    pub regs: [u8; 64],
    pub version: u8,
    pub fifo: VecDeque<u8>,
    pub internal_buffer: [u8; 25],
    pub random: [u8; 25],
    pub self_test_digest: [u8; 64],
    /// PowerDown never clears after a soft reset
    pub stuck_in_power_down: bool,
    /// Self-test mode never produces its digest
    pub self_test_stalls: bool,
    /// CalcCRC never raises CRCIRq
    pub crc_stalls: bool,
    /// Mem and GenerateRandomID never hand back to Idle
    pub buffer_commands_stall: bool,
    pub piccs: Vec<Picc>,
    pub scripted: VecDeque<Reply>,
    /// Frames sent to the field with their TxLastBits
    pub sent: Vec<(Vec<u8>, u8)>,
    pub fifo_reads: usize,
    /// MOSI bytes of every chip-select bracket
    pub transactions: Vec<Vec<u8>>,
    cs_low: bool,
    pending: Option<u8>,
}

impl Chip {
    fn new(version: u8) -> Self {
        let mut chip = Chip {
            regs: [0; 64],
            version,
            fifo: VecDeque::new(),
            internal_buffer: [0; 25],
            random: core::array::from_fn(|i| 0xA0 ^ (i as u8 * 7)),
            self_test_digest: [0; 64],
            stuck_in_power_down: false,
            self_test_stalls: false,
            crc_stalls: false,
            buffer_commands_stall: false,
            piccs: Vec::new(),
            scripted: VecDeque::new(),
            sent: Vec::new(),
            fifo_reads: 0,
            transactions: Vec::new(),
            cs_low: false,
            pending: None,
        };
        chip.power_on();
        chip
    }

    fn power_on(&mut self) {
        self.regs = [0; 64];
        self.regs[COMMAND_REG as usize] = 0x20;
        self.regs[COMM_IRQ_REG as usize] = 0x14;
        self.regs[COLL_REG as usize] = 0x80;
        self.regs[MODE_REG as usize] = 0x3F;
        self.regs[TX_CONTROL_REG as usize] = 0x80;
        self.regs[MOD_WIDTH_REG as usize] = 0x26;
        self.regs[RF_CFG_REG as usize] = 0x48;
        self.fifo.clear();
    }

    fn chip_select(&mut self, low: bool) {
        if low {
            assert!(!self.cs_low, "chip-select asserted twice");
            self.transactions.push(Vec::new());
        }
        self.cs_low = low;
        self.pending = None;
    }

    fn exchange(&mut self, mosi: u8) -> u8 {
        assert!(self.cs_low, "SPI byte 0x{mosi:02X} outside chip-select");
        if let Some(transaction) = self.transactions.last_mut() {
            transaction.push(mosi);
        }
        match self.pending {
            None => {
                self.pending = Some(mosi);
                0
            }
            Some(address) if address & 0x80 != 0 => {
                let value = self.read((address >> 1) & 0x3F);
                self.pending = Some(mosi);
                value
            }
            Some(address) => {
                self.write((address >> 1) & 0x3F, mosi);
                0
            }
        }
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.regs[reg as usize]
    }

    pub fn read(&mut self, reg: u8) -> u8 {
        match reg {
            FIFO_DATA_REG => {
                self.fifo_reads += 1;
                self.fifo.pop_front().unwrap_or(0)
            }
            FIFO_LEVEL_REG => self.fifo.len() as u8,
            VERSION_REG => self.version,
            COMMAND_REG if self.stuck_in_power_down => self.regs[reg as usize] | POWER_DOWN,
            _ => self.regs[reg as usize],
        }
    }

    pub fn write(&mut self, reg: u8, value: u8) {
        match reg {
            COMMAND_REG => {
                self.regs[reg as usize] = value;
                self.execute(value & COMMAND_MASK);
            }
            COMM_IRQ_REG | DIV_IRQ_REG => {
                // Set1 selects whether the marked bits are set or cleared
                let bits = value & 0x7F;
                if value & 0x80 != 0 {
                    self.regs[reg as usize] |= bits;
                } else {
                    self.regs[reg as usize] &= !bits;
                }
            }
            FIFO_LEVEL_REG => {
                if value & FLUSH_BUFFER != 0 {
                    self.fifo.clear();
                }
            }
            FIFO_DATA_REG => {
                if self.fifo.len() < FIFO_SIZE {
                    self.fifo.push_back(value);
                }
            }
            BIT_FRAMING_REG => {
                self.regs[reg as usize] = value & !START_SEND;
                let command = self.regs[COMMAND_REG as usize] & COMMAND_MASK;
                if value & START_SEND != 0 && command == CMD_TRANSCEIVE {
                    self.transceive(value);
                }
            }
            VERSION_REG | ERROR_REG => {}
            _ => self.regs[reg as usize] = value,
        }
    }

    fn finish_command(&mut self) {
        self.regs[COMMAND_REG as usize] &= !COMMAND_MASK;
        self.regs[COMM_IRQ_REG as usize] |= IDLE_IRQ;
    }

    fn execute(&mut self, command: u8) {
        match command {
            CMD_MEM => {
                if self.fifo.is_empty() {
                    self.fifo.extend(self.internal_buffer);
                } else {
                    for slot in self.internal_buffer.iter_mut() {
                        *slot = self.fifo.pop_front().unwrap_or(0);
                    }
                }
                if !self.buffer_commands_stall {
                    self.finish_command();
                }
            }
            CMD_GENERATE_RANDOM_ID => {
                if !self.buffer_commands_stall {
                    self.internal_buffer[..10].copy_from_slice(&self.random[..10]);
                    self.finish_command();
                }
            }
            CMD_CALC_CRC => {
                if self.regs[AUTO_TEST_REG as usize] & 0x0F == SELF_TEST_ENABLE {
                    self.fifo.clear();
                    if !self.self_test_stalls {
                        self.fifo.extend(self.self_test_digest);
                    }
                } else if !self.crc_stalls {
                    let data: Vec<u8> = self.fifo.drain(..).collect();
                    let [low, high] = crc_a(&data);
                    self.regs[CRC_RESULT_REG_L as usize] = low;
                    self.regs[CRC_RESULT_REG_H as usize] = high;
                    self.regs[DIV_IRQ_REG as usize] |= CRC_IRQ;
                }
            }
            CMD_SOFT_RESET => {
                self.power_on();
                if self.stuck_in_power_down {
                    self.regs[COMMAND_REG as usize] |= POWER_DOWN;
                }
            }
            _ => {}
        }
    }

    fn transceive(&mut self, bit_framing: u8) {
        let frame: Vec<u8> = self.fifo.drain(..).collect();
        let tx_last_bits = bit_framing & 0x07;
        let rx_align = (bit_framing >> 4) & 0x07;
        self.sent.push((frame.clone(), tx_last_bits));
        self.regs[ERROR_REG as usize] = 0;

        let reply = match self.scripted.pop_front() {
            Some(reply) => reply,
            None => self.field_reply(&frame, tx_last_bits, rx_align),
        };

        match reply {
            Reply::Silent => {
                self.regs[COMM_IRQ_REG as usize] |= TIMER_IRQ;
            }
            Reply::Hang => {}
            Reply::Frame {
                bytes,
                last_bits,
                error,
                coll,
            } => {
                self.fifo.extend(bytes);
                self.regs[CONTROL_REG as usize] = last_bits & RX_LAST_BITS_MASK;
                self.regs[ERROR_REG as usize] = error;
                if error & COLL_ERR != 0 {
                    self.regs[COLL_REG as usize] = coll;
                }
                self.regs[COMM_IRQ_REG as usize] |= RX_IRQ;
                if error != 0 {
                    self.regs[COMM_IRQ_REG as usize] |= ERR_IRQ;
                }
            }
        }
    }

    fn field_reply(&mut self, frame: &[u8], tx_last_bits: u8, rx_align: u8) -> Reply {
        match frame {
            [command @ (0x26 | 0x52)] if tx_last_bits == 7 => self.answer_request(*command),
            [0x50, 0x00, _, _] => {
                for picc in self.piccs.iter_mut() {
                    if picc.state == PiccState::Active {
                        picc.state = PiccState::Halt;
                    }
                }
                Reply::Silent
            }
            [command @ (0x93 | 0x95 | 0x97), nvb, ..] => {
                let level = usize::from((command - 0x93) / 2 + 1);
                if *nvb == 0x70 {
                    self.answer_select(level, frame)
                } else {
                    self.answer_anticollision(level, frame, *nvb, rx_align)
                }
            }
            [0x30, block, ..] => {
                let block = usize::from(*block);
                match self.piccs.iter().find(|picc| picc.state == PiccState::Active) {
                    Some(picc) => {
                        let mut data = picc.blocks[block % picc.blocks.len()].to_vec();
                        let crc = crc_a(&data);
                        data.extend_from_slice(&crc);
                        Reply::bytes(&data)
                    }
                    None => Reply::Silent,
                }
            }
            _ => Reply::Silent,
        }
    }

    fn answer_request(&mut self, command: u8) -> Reply {
        let mut atqas = Vec::new();
        for picc in self.piccs.iter_mut() {
            let wakes = match picc.state {
                PiccState::Idle => true,
                PiccState::Halt => command == 0x52,
                _ => false,
            };
            if wakes {
                picc.state = PiccState::Ready { level: 1 };
                atqas.push(picc.atqa);
            }
        }
        let Some(first) = atqas.first().copied() else {
            return Reply::Silent;
        };
        let mut combined = first;
        let mut collision = None;
        for atqa in &atqas[1..] {
            for index in 0..16 {
                if bit(&combined, index) != bit(atqa, index) && collision.is_none() {
                    collision = Some(index);
                }
            }
            combined[0] |= atqa[0];
            combined[1] |= atqa[1];
        }
        match collision {
            None => Reply::bytes(&combined),
            Some(index) => Reply::Frame {
                bytes: combined.to_vec(),
                last_bits: 0,
                error: COLL_ERR,
                coll: (index as u8 + 1) & COLL_POS_MASK,
            },
        }
    }

    fn answer_anticollision(&mut self, level: usize, frame: &[u8], nvb: u8, rx_align: u8) -> Reply {
        let whole_bytes = usize::from(nvb >> 4).saturating_sub(2);
        let known_bits = whole_bytes * 8 + usize::from(nvb & 0x0F);
        let sent = &frame[2..];

        let answering: Vec<[u8; 5]> = self
            .piccs
            .iter()
            .filter(|picc| picc.state == PiccState::Ready { level })
            .map(|picc| picc.level_data(level))
            .filter(|data| (0..known_bits).all(|index| bit(data, index) == bit(sent, index)))
            .collect();
        let Some(first) = answering.first() else {
            return Reply::Silent;
        };

        // What the reader sees: the known prefix, then the wired-OR of all
        // answers with every bit from the first collision on cleared
        let mut seen = [0u8; 5];
        let mut collision = None;
        for index in 0..40 {
            let value = if index < known_bits {
                bit(sent, index)
            } else if collision.is_some() {
                false
            } else if answering.iter().all(|data| bit(data, index) == bit(first, index)) {
                bit(first, index)
            } else {
                collision = Some(index);
                false
            };
            set_bit(&mut seen, index, value);
        }

        let mut bytes = seen[whole_bytes..].to_vec();
        // Bits below RxAlign are not written by the chip
        bytes[0] &= 0xFF << rx_align;
        match collision {
            None => Reply::bytes(&bytes),
            Some(index) => Reply::Frame {
                bytes,
                last_bits: 0,
                error: COLL_ERR,
                coll: (index as u8 + 1) & COLL_POS_MASK,
            },
        }
    }

    fn answer_select(&mut self, level: usize, frame: &[u8]) -> Reply {
        if frame.len() != 9 || crc_a(&frame[..7]) != frame[7..9] {
            return Reply::Silent;
        }
        let mut answer = None;
        for picc in self.piccs.iter_mut() {
            if picc.state != (PiccState::Ready { level }) {
                continue;
            }
            if picc.level_data(level) == frame[2..7] {
                let sak = picc.level_sak(level);
                picc.state = if level == picc.levels() {
                    PiccState::Active
                } else {
                    PiccState::Ready { level: level + 1 }
                };
                answer = Some(sak);
            } else {
                picc.state = PiccState::Idle;
            }
        }
        match answer {
            Some(sak) => {
                let crc = crc_a(&[sak]);
                Reply::bytes(&[sak, crc[0], crc[1]])
            }
            None => Reply::Silent,
        }
    }
}

pub type SharedChip = Rc<RefCell<Chip>>;

pub struct SimSpi(SharedChip);
pub struct SimCs(SharedChip);

impl embedded_hal::spi::ErrorType for SimSpi {
    type Error = Infallible;
}

impl embedded_hal::spi::SpiBus<u8> for SimSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
        let mut chip = self.0.borrow_mut();
        for word in words.iter_mut() {
            *word = chip.exchange(0x00);
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Infallible> {
        let mut chip = self.0.borrow_mut();
        for &word in words {
            chip.exchange(word);
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Infallible> {
        let mut chip = self.0.borrow_mut();
        for index in 0..read.len().max(write.len()) {
            let miso = chip.exchange(write.get(index).copied().unwrap_or(0x00));
            if let Some(slot) = read.get_mut(index) {
                *slot = miso;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
        let mut chip = self.0.borrow_mut();
        for word in words.iter_mut() {
            *word = chip.exchange(*word);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

impl embedded_hal::digital::ErrorType for SimCs {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for SimCs {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().chip_select(true);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().chip_select(false);
        Ok(())
    }
}

/// Microseconds the simulated clock moves forward on every reading.
pub const CLOCK_STEP_US: u64 = 100;

pub struct Rig {
    pub chip: SharedChip,
    pub micros: Rc<Cell<u64>>,
}

impl Rig {
    pub fn new(version: u8) -> Self {
        Rig {
            chip: Rc::new(RefCell::new(Chip::new(version))),
            micros: Rc::new(Cell::new(0)),
        }
    }

    pub fn with_piccs(piccs: Vec<Picc>) -> Self {
        let rig = Rig::new(0x92);
        rig.chip.borrow_mut().piccs = piccs;
        rig
    }

    pub fn driver(&self) -> RfidRc522<SimSpi, SimCs, impl Clock> {
        let micros = Rc::clone(&self.micros);
        let clock = move || {
            let now = micros.get();
            micros.set(now + CLOCK_STEP_US);
            Instant::from_ticks(now)
        };
        RfidRc522::new(
            SimSpi(Rc::clone(&self.chip)),
            SimCs(Rc::clone(&self.chip)),
            clock,
        )
    }

    pub fn script(&self, reply: Reply) {
        self.chip.borrow_mut().scripted.push_back(reply);
    }
}

/// Diagnostic sink collecting everything the driver reports.
#[derive(Default)]
pub struct Log(pub String);

impl ufmt::uWrite for Log {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        self.0.push_str(s);
        Ok(())
    }
}
