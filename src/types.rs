use serde::{Deserialize, Serialize};

/// CAN frame framing overhead in bit-times: arbitration, control, CRC,
/// ACK and EOF fields surrounding the data field of a standard frame.
pub const FRAME_OVERHEAD_BITS: u32 = 47;

/// One record of the captured CAN trace.
///
/// Records arrive in chronological order of transmission start; ties keep
/// capture-file order. A numerically smaller identifier wins arbitration,
/// so smaller `id` means higher bus priority.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Bus arbitration identifier
    pub id: u32,
    /// Data field length in bytes
    pub dlc: u8,
    /// Transmission start time in seconds (fractional)
    pub tx_time: f64,
}

impl TraceRecord {
    pub fn new(id: u32, dlc: u8, tx_time: f64) -> Self {
        Self { id, dlc, tx_time }
    }

    /// Total on-wire length of this frame in bits, data field plus framing.
    pub fn frame_bits(&self) -> u32 {
        self.dlc as u32 * 8 + FRAME_OVERHEAD_BITS
    }

    /// Wire time of this frame in seconds at the given bus rate.
    pub fn tx_duration(&self, bus_speed_kbps: f64) -> f64 {
        self.frame_bits() as f64 / (bus_speed_kbps * 1000.0)
    }
}

/// One preceding higher-priority message inside an attack window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowEntry {
    /// Identifier of the preceding message
    pub id: u32,
    /// Instance slot of the emitting candidate at observation time;
    /// `None` when the emitter is not a monitored candidate.
    pub source_instance: Option<u32>,
}

impl WindowEntry {
    pub fn new(id: u32, source_instance: Option<u32>) -> Self {
        Self {
            id,
            source_instance,
        }
    }
}

/// Schedule state of one instance slot in a candidate's circular pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotState {
    /// Instance is transmitted as scheduled
    Active,
    /// Instance is skipped by the obfuscation policy
    Suppressed,
}

/// One periodic occurrence of a candidate within its hyperperiod.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// 0-based slot index, stable identity across analysis passes
    pub index: usize,

    /// Bits of higher-priority traffic immediately preceding this
    /// occurrence; reduced to the cross-pass-invariant portion after
    /// the first pass
    pub window_len: u32,

    /// The preceding messages themselves, with their source instances
    pub window: Vec<WindowEntry>,

    /// True when `window_len` meets the configured exploitability threshold
    pub attackable: bool,
}

impl Instance {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            window_len: 0,
            window: Vec::new(),
            attackable: false,
        }
    }
}
