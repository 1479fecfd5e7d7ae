//! SP main memory.
//!
//! A single 64K x 32-bit SRAM shared by instruction fetch and data access.
//! Reads and writes are issued during a cycle and take effect on the clock
//! edge ([`Sram::clock`]): a read issued in cycle `t` is visible through
//! [`Sram::data_out`] from cycle `t + 1` on.

use serde::{Serialize, Deserialize};

/// Number of 32-bit words in the SRAM.
pub const MEMORY_SIZE: usize = 64 * 1024;

/// Word-addressable SRAM with one-cycle read latency.
#[derive(Clone, Serialize, Deserialize)]
pub struct Sram {
    cells: Vec<u32>,
    /// Read issued this cycle.
    read: Option<u16>,
    /// Write issued this cycle.
    write: Option<(u16, u32)>,
    /// Output latch of the last completed read.
    data_out: u32,
}

impl Sram {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
            read: None,
            write: None,
            data_out: 0,
        }
    }

    /// Issue a read of `addr`; the result shows on `data_out` after the edge.
    pub fn issue_read(&mut self, addr: u16) {
        self.read = Some(addr);
    }

    /// Issue a write of `value` to `addr`; lands on the edge.
    pub fn issue_write(&mut self, addr: u16, value: u32) {
        self.write = Some((addr, value));
    }

    /// Word produced by the most recently completed read.
    #[inline]
    pub fn data_out(&self) -> u32 {
        self.data_out
    }

    /// Clock edge: complete pending reads, then pending writes.
    pub fn clock(&mut self) {
        if let Some(addr) = self.read.take() {
            self.data_out = self.cells[usize::from(addr)];
        }
        if let Some((addr, value)) = self.write.take() {
            self.cells[usize::from(addr)] = value;
        }
    }

    /// Drop pending requests and the output latch. Contents are kept.
    pub fn reset_port(&mut self) {
        self.read = None;
        self.write = None;
        self.data_out = 0;
    }

    /// Untimed read, for inspection.
    #[inline]
    pub fn peek(&self, addr: u16) -> u32 {
        self.cells[usize::from(addr)]
    }

    /// Untimed write, used for image loading.
    #[inline]
    pub fn inject(&mut self, addr: u16, value: u32) {
        self.cells[usize::from(addr)] = value;
    }

    /// Copy `image` into memory starting at address 0.
    ///
    /// Words beyond the memory size are dropped. Returns how many were loaded.
    pub fn load_image(&mut self, image: &[u32]) -> usize {
        let count = image.len().min(MEMORY_SIZE);
        self.cells[..count].copy_from_slice(&image[..count]);
        count
    }

    /// Full memory contents in address order.
    pub fn contents(&self) -> &[u32] {
        &self.cells
    }

    /// Snapshot of `count` words starting at `start`, clipped to memory.
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, u32)> {
        let end = (start + count).min(MEMORY_SIZE);
        (start..end)
            .map(|i| (i, self.cells[i]))
            .collect()
    }
}

impl Default for Sram {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Sram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&w| w != 0).count();

        f.debug_struct("Sram")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .field("data_out", &format_args!("{:08x}", self.data_out))
            .finish()
    }
}
