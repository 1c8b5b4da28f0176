//! Core station abstraction shared by the reassembly stages.

use crate::pipeline::error::StationError;

/// A processing stage of the stream pipeline.
///
/// Stations are driven sequentially by [`StreamPipeline`](crate::pipeline::StreamPipeline):
/// every input is fully processed, and its output forwarded, before the next
/// input is accepted. Any state a station carries between inputs (pending
/// bytes, carry-over) is owned by the station itself.
pub trait Station: Send + 'static {
    /// The input type this station receives.
    type Input: Send + 'static;
    /// The output type this station produces.
    type Output: Send + 'static;

    /// Processes a single input item.
    ///
    /// Returns:
    /// - `Ok(Some(output))` - Successfully processed and produced output
    /// - `Ok(None)` - Successfully processed but no output (buffered or filtered)
    /// - `Err(StationError)` - Processing failed
    fn process(&mut self, input: Self::Input) -> Result<Option<Self::Output>, StationError>;

    /// Returns the name of this station for logging and error reporting.
    fn name(&self) -> &'static str;

    /// Called once at end of stream to release anything still buffered.
    fn flush(&mut self) -> Option<Self::Output> {
        None
    }

    /// Discards buffered state without emitting it.
    fn reset(&mut self) {}
}
