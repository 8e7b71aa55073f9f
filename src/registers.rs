//! MFRC522 register map (datasheet section 9). Addresses are the 6-bit register
//! index; the SPI address byte is derived by `read_address`/`write_address`.

// Command and status registers
pub const COMMAND_REG: u8 = 0x01;        // Starts and stops command execution
pub const COM_IEN_REG: u8 = 0x02;        // Communication Interrupt Enable Register
pub const DIV_IEN_REG: u8 = 0x03;        // DivIrq interrupt Enable Register
pub const COMM_IRQ_REG: u8 = 0x04;       // Interrupt request bits
pub const DIV_IRQ_REG: u8 = 0x05;        // Set bits to signal internal events
pub const ERROR_REG: u8 = 0x06;          // Error bits showing the error status of the last command
pub const STATUS1_REG: u8 = 0x07;        // Communication status bits
pub const STATUS2_REG: u8 = 0x08;        // Receiver and transmitter status bits
pub const FIFO_DATA_REG: u8 = 0x09;      // FIFO data input/output
pub const FIFO_LEVEL_REG: u8 = 0x0A;     // Number of bytes in the FIFO buffer
pub const WATER_LEVEL_REG: u8 = 0x0B;    // Level for FIFO underflow and overflow warning
pub const CONTROL_REG: u8 = 0x0C;        // Miscellaneous control bits
pub const BIT_FRAMING_REG: u8 = 0x0D;    // Adjustments for bit-oriented frames
pub const COLL_REG: u8 = 0x0E;           // Collision detection

// Command registers
pub const MODE_REG: u8 = 0x11;           // Defines general modes for transmitting and receiving
pub const TX_MODE_REG: u8 = 0x12;        // Defines transmission data rate and framing
pub const RX_MODE_REG: u8 = 0x13;        // Defines reception data rate and framing
pub const TX_CONTROL_REG: u8 = 0x14;     // Controls the antenna driver pins TX1 and TX2
pub const TX_ASK_REG: u8 = 0x15;         // Controls the setting of the transmission modulation
pub const TX_SEL_REG: u8 = 0x16;         // Selects the internal sources for the antenna driver
pub const RX_SEL_REG: u8 = 0x17;         // Selects internal receiver settings
pub const RX_THRESHOLD_REG: u8 = 0x18;   // Selects thresholds for the bit decoder
pub const DEMOD_REG: u8 = 0x19;          // Defines demodulator settings
pub const MF_TX_REG: u8 = 0x1C;          // MIFARE transmit parameters
pub const MF_RX_REG: u8 = 0x1D;          // MIFARE receive parameters
pub const SERIAL_SPEED_REG: u8 = 0x1F;   // Speed of the serial UART interface

// Configuration registers
pub const CRC_RESULT_REG_H: u8 = 0x21;   // CRC calculation result, MSB
pub const CRC_RESULT_REG_L: u8 = 0x22;   // CRC calculation result, LSB
pub const MOD_WIDTH_REG: u8 = 0x24;      // Modulation width setting
pub const RF_CFG_REG: u8 = 0x26;         // Configures the receiver gain
pub const GS_N_REG: u8 = 0x27;           // Conductance of the antenna driver pins
pub const CW_GS_P_REG: u8 = 0x28;        // Conductance of the p-driver during no modulation
pub const MOD_GS_P_REG: u8 = 0x29;       // Conductance of the p-driver during modulation
pub const T_MODE_REG: u8 = 0x2A;         // Timer settings
pub const T_PRESCALER_REG: u8 = 0x2B;    // Timer prescaler value
pub const T_RELOAD_REG_H: u8 = 0x2C;     // 16-bit timer reload value (high byte)
pub const T_RELOAD_REG_L: u8 = 0x2D;     // 16-bit timer reload value (low byte)
pub const T_COUNTER_VAL_REG_H: u8 = 0x2E;
pub const T_COUNTER_VAL_REG_L: u8 = 0x2F;

// Test registers
pub const TEST_SEL1_REG: u8 = 0x31;      // General test signal configuration
pub const TEST_SEL2_REG: u8 = 0x32;      // General test signal configuration and PRBS control
pub const TEST_PIN_EN_REG: u8 = 0x33;    // Enables certain pins to output test signals
pub const TEST_BUS_REG: u8 = 0x34;       // Controls the pins output driver (for testing)
pub const AUTO_TEST_REG: u8 = 0x36;      // Controls the self-test
pub const VERSION_REG: u8 = 0x37;        // Shows the software version
pub const TEST_ADC_REG: u8 = 0x39;       // Shows the value of ADC I and Q channels

// CommandReg
pub const POWER_DOWN: u8 = 1 << 4;
pub const COMMAND_MASK: u8 = 0x0F;

// ComIrqReg
pub const TIMER_IRQ: u8 = 1 << 0;
pub const ERR_IRQ: u8 = 1 << 1;
pub const IDLE_IRQ: u8 = 1 << 4;
pub const RX_IRQ: u8 = 1 << 5;
pub const ALL_COM_IRQS: u8 = 0x7F;

// DivIrqReg
pub const CRC_IRQ: u8 = 1 << 2;

// ErrorReg
pub const PROTOCOL_ERR: u8 = 1 << 0;
pub const PARITY_ERR: u8 = 1 << 1;
pub const CRC_ERR: u8 = 1 << 2;
pub const COLL_ERR: u8 = 1 << 3;
pub const BUFFER_OVFL: u8 = 1 << 4;

// FIFOLevelReg
pub const FLUSH_BUFFER: u8 = 1 << 7;
pub const FIFO_LEVEL_MASK: u8 = 0x7F;

// ControlReg
pub const RX_LAST_BITS_MASK: u8 = 0x07;

// BitFramingReg
pub const START_SEND: u8 = 1 << 7;

// CollReg
pub const VALUES_AFTER_COLL: u8 = 1 << 7;
pub const COLL_POS_NOT_VALID: u8 = 1 << 5;
pub const COLL_POS_MASK: u8 = 0x1F;

// TxControlReg, Tx1RFEn | Tx2RFEn
pub const ANTENNA_DRIVERS: u8 = 0x03;

// RFCfgReg
pub const RX_GAIN_MASK: u8 = 0x70;

// AutoTestReg
pub const SELF_TEST_ENABLE: u8 = 0x09;

/// Address byte for reading `reg`.
#[inline]
pub const fn read_address(reg: u8) -> u8 {
    (reg << 1) | 0x80
}

/// Address byte for writing `reg`.
#[inline]
pub const fn write_address(reg: u8) -> u8 {
    (reg << 1) & 0x7E
}
