/// Logical clocks advanced by the command processor.
///
/// Both counters wrap; ages are computed with wrapping subtraction so a
/// wrap-around never makes an entry look younger than it is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameClock {
    /// Advances on every time-sensitive RDP operation.
    pub rdp_time: u32,
    /// Advances once per processed display list.
    pub dlist_count: u32,
    /// Set while the emulated frame buffer has been written by the CPU since the last checksum.
    pub frame_buffer_in_use: bool,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) {
        self.rdp_time = self.rdp_time.wrapping_add(1);
    }

    pub fn advance_display_list(&mut self) {
        self.dlist_count = self.dlist_count.wrapping_add(1);
    }

    /// Display lists processed since `frame`.
    pub fn frames_since(&self, frame: u32) -> u32 {
        self.dlist_count.wrapping_sub(frame)
    }
}
