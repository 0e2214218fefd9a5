//! Bit-banged 110-baud serial channel on the CPU's SID/SOD lines.
//!
//! One bit lasts 27,575 CPU state-times. The channel advances in
//! 1,000-cycle blocks and takes 27 samples per bit, so framing tolerates
//! the jitter of instruction-granular stepping. The transmit side samples
//! SOD, which the hardware drives inverted: the line rests at 0, a start
//! bit is 1, and a data bit is 1 when the line stays low for the majority
//! of its samples. The receive side drives SID with conventional polarity
//! (start low, stop/idle high).

const SAMPLES_PER_BIT: u32 = 27;
const CYCLES_PER_SAMPLE: u64 = 1000;
const DATA_BITS: u32 = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LineState {
    Idle,
    StartBit,
    DataBit,
    StopBit,
}

/// Result of one sample block: an SID level to drive (if the receive side
/// is active) and a completed transmit byte (if a frame just ended).
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialTick {
    pub sid: Option<bool>,
    pub tx_byte: Option<u8>,
}

pub struct SerialChannel {
    catchup_cycles: u64,

    output_state: LineState,
    output_data_bit: u32,
    output_sample_no: u32,
    output_samples: u32,
    output_byte: u8,

    input_state: LineState,
    input_data_bit: u32,
    input_sample_no: u32,
    input_byte: u8,
}

impl Default for SerialChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialChannel {
    pub fn new() -> Self {
        Self {
            catchup_cycles: 0,
            output_state: LineState::Idle,
            output_data_bit: 0,
            output_sample_no: 0,
            output_samples: 0,
            output_byte: 0,
            input_state: LineState::Idle,
            input_data_bit: 0,
            input_sample_no: 0,
            input_byte: 0,
        }
    }

    /// Hand one host character to the receive side. LF becomes CR, which
    /// the monitor expects to terminate commands. Ignored unless the
    /// receiver is idle.
    pub fn feed(&mut self, byte: u8) {
        let byte = if byte == b'\n' { b'\r' } else { byte };
        if self.input_state == LineState::Idle {
            self.input_byte = byte;
            self.input_sample_no = 0;
            self.input_state = LineState::StartBit;
        }
    }

    pub fn rx_idle(&self) -> bool {
        self.input_state == LineState::Idle
    }

    /// Advance by at most one sample block toward the CPU cycle counter.
    pub fn tick(&mut self, cpu_cycles: u64, sod: bool) -> SerialTick {
        let mut result = SerialTick::default();

        // Sync: one block per call, and only once the CPU caught up.
        if cpu_cycles < self.catchup_cycles {
            return result;
        }
        self.catchup_cycles += CYCLES_PER_SAMPLE;

        // Output: sample SOD.
        match self.output_state {
            LineState::Idle => {
                if sod {
                    self.output_sample_no = 0;
                    self.output_state = LineState::StartBit;
                }
            }
            LineState::StartBit => {
                self.output_sample_no += 1;
                if self.output_sample_no >= SAMPLES_PER_BIT {
                    self.output_sample_no = 0;
                    self.output_samples = 0;
                    self.output_data_bit = 0;
                    self.output_byte = 0;
                    self.output_state = LineState::DataBit;
                }
            }
            LineState::DataBit => {
                self.output_samples += sod as u32;
                self.output_sample_no += 1;
                if self.output_sample_no >= SAMPLES_PER_BIT {
                    // Line low for the majority of the bit means a 1.
                    if self.output_samples < SAMPLES_PER_BIT / 2 {
                        self.output_byte |= 1 << self.output_data_bit;
                    }
                    self.output_sample_no = 0;
                    self.output_samples = 0;
                    self.output_data_bit += 1;
                    if self.output_data_bit >= DATA_BITS {
                        self.output_state = LineState::StopBit;
                    }
                }
            }
            LineState::StopBit => {
                self.output_sample_no += 1;
                if self.output_sample_no >= SAMPLES_PER_BIT {
                    result.tx_byte = Some(self.output_byte);
                    self.output_state = LineState::Idle;
                }
            }
        }

        // Input: drive SID.
        match self.input_state {
            LineState::Idle => {}
            LineState::StartBit => {
                result.sid = Some(false);
                self.input_sample_no += 1;
                if self.input_sample_no >= SAMPLES_PER_BIT {
                    self.input_sample_no = 0;
                    self.input_data_bit = 0;
                    self.input_state = LineState::DataBit;
                }
            }
            LineState::DataBit => {
                result.sid = Some(self.input_byte >> self.input_data_bit & 1 != 0);
                self.input_sample_no += 1;
                if self.input_sample_no >= SAMPLES_PER_BIT {
                    self.input_sample_no = 0;
                    self.input_data_bit += 1;
                    if self.input_data_bit >= DATA_BITS {
                        self.input_state = LineState::StopBit;
                    }
                }
            }
            LineState::StopBit => {
                result.sid = Some(true);
                self.input_sample_no += 1;
                if self.input_sample_no >= SAMPLES_PER_BIT {
                    self.input_state = LineState::Idle;
                }
            }
        }

        result
    }
}
