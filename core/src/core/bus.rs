/// Generic bus interface for a CPU with separate memory and I/O port spaces.
///
/// Machines implement this by routing addresses to their ROM, RAM and
/// memory-mapped devices. Reads may have side effects (the 8279 keyboard
/// FIFO clears its status word when read), hence `&mut self` everywhere.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);

    /// Read from the I/O port address space (IN instruction).
    /// Unbound ports float high; override to attach port-mapped devices.
    fn io_read(&mut self, port: u8) -> u8 {
        let _ = port;
        0xFF
    }

    /// Write to the I/O port address space (OUT instruction).
    /// Unbound ports drop the write.
    fn io_write(&mut self, port: u8, data: u8) {
        let _ = (port, data);
    }
}
