//! Drive a pipeline from an HTTP response body.
//!
//! Building and authenticating the request is the caller's business; this
//! only consumes the streamed body of a response that is already open.

use crate::error::Result;
use crate::pipeline::orchestrator::StreamPipeline;
use crate::pipeline::sink::FrameSink;
use crate::pipeline::types::StreamStats;

/// Streams `response` through `pipeline` into `sink`.
///
/// A non-success status is treated as a transport failure before any body
/// bytes are read.
pub async fn run_response(
    pipeline: &mut StreamPipeline,
    response: reqwest::Response,
    sink: &mut dyn FrameSink,
) -> Result<StreamStats> {
    let status = response.status();
    if !status.is_success() {
        return Err(pipeline.handle_failure(format!("HTTP status {status}"), sink));
    }

    pipeline.run_stream(response.bytes_stream(), sink).await
}
