/// Where upgrade liveness reports go.
///
/// The orchestrator calls `start` once before the first gate, `report`
/// before each gate and each finalization step, and `finish` exactly once
/// when the run ends — success or failure. Reports are coarse by design:
/// one line per gate, never per statement.
pub trait ProgressSink {
    fn start(&mut self) {}
    fn report(&mut self, message: &str);
    fn finish(&mut self) {}
}

/// Default sink: forwards report lines to the log.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&mut self, message: &str) {
        log::info!("{message}");
    }
}
