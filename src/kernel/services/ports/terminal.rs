use super::sandbox::TerminalSize;

/// Terminal emulator surface. Keystrokes and resizes arrive on the session
/// bus as `TerminalInput` / `TerminalResized`.
pub trait TerminalView {
    fn write(&self, data: &[u8]);

    fn size(&self) -> TerminalSize;

    /// Fit the emulator to its container after attach.
    fn fit(&self) {}

    fn write_line(&self, line: &str) {
        self.write(format!("\r\n{line}\r\n").as_bytes());
    }
}
