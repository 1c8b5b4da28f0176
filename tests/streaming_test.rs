//! Pipelines driven from threads and async byte streams.

use base64::{Engine as _, engine::general_purpose};
use futures_util::stream;
use std::io::Read;
use std::sync::Arc;
use std::thread;
use ttstream::StreamError;
use ttstream::pipeline::{
    ChannelSink, CollectingReporter, CollectorSink, FrameReader, PipelineConfig, StreamPipeline,
};

fn audio_record(bytes: &[u8]) -> String {
    format!(
        "data: {{\"event\":\"tts_message\",\"audio\":\"{}\"}}\n\n",
        general_purpose::STANDARD.encode(bytes)
    )
}

fn quiet() -> StreamPipeline {
    StreamPipeline::new(PipelineConfig::default())
        .with_error_reporter(Arc::new(CollectingReporter::new()))
}

fn body(frames: usize) -> (Vec<u8>, Vec<u8>) {
    let mut text = String::from("data: {\"event\":\"message\",\"answer\":\"hi\"}\n\n");
    let mut audio = Vec::new();
    for i in 0..frames {
        let frame = [0xFF, 0xFB, 0x90, i as u8, 0x00, 0x01];
        text += &audio_record(&frame);
        audio.extend_from_slice(&frame);
    }
    text += "data: {\"event\":\"tts_message_end\",\"audio\":\"\"}\n\n";
    (text.into_bytes(), audio)
}

#[test]
fn spawned_pipeline_feeds_frame_reader() {
    let (bytes, audio) = body(32);
    let (sink, rx) = ChannelSink::bounded(4);
    let (feeder, handle) = quiet().spawn(sink);

    let producer = thread::spawn(move || {
        for chunk in bytes.chunks(7) {
            feeder.push(chunk).unwrap();
        }
        feeder.end().unwrap();
    });

    let mut reader = FrameReader::new(rx);
    let mut decoded = Vec::new();
    reader.read_to_end(&mut decoded).unwrap();

    producer.join().unwrap();
    let (stats, _) = handle.join().unwrap();

    assert_eq!(decoded, audio);
    assert_eq!(stats.frames, 32);
    assert_eq!(stats.audio_events, 32);
}

#[test]
fn spawned_failure_reaches_reader() {
    let (bytes, _) = body(4);
    let (sink, rx) = ChannelSink::bounded(16);
    let (feeder, handle) = quiet().spawn(sink);

    feeder.push(bytes).unwrap();
    feeder.fail("connection reset").unwrap();

    let mut reader = FrameReader::new(rx);
    let mut frames = 0;
    let err = loop {
        match reader.next_frame() {
            Ok(Some(_)) => frames += 1,
            Ok(None) => panic!("stream should not end cleanly"),
            Err(e) => break e,
        }
    };

    // Three frames were proven complete; the fourth was still carried over.
    assert_eq!(frames, 3);
    assert!(err.to_string().contains("connection reset"));
    assert!(matches!(
        handle.join(),
        Err(StreamError::Transport { message }) if message == "connection reset"
    ));
}

#[test]
fn pipelines_on_separate_threads_are_independent() {
    let workers: Vec<_> = (1..=4)
        .map(|n| {
            thread::spawn(move || {
                let (bytes, audio) = body(n * 3);
                let mut pipeline = quiet();
                let mut sink = CollectorSink::new();
                for chunk in bytes.chunks(n + 2) {
                    pipeline.handle_chunk(chunk, &mut sink).unwrap();
                }
                pipeline.handle_end(&mut sink).unwrap();
                (sink.bytes(), audio)
            })
        })
        .collect();

    for worker in workers {
        let (got, expected) = worker.join().unwrap();
        assert_eq!(got, expected);
    }
}

#[tokio::test]
async fn async_stream_reassembles_frames() {
    let (bytes, audio) = body(5);
    let chunks: Vec<Result<Vec<u8>, std::io::Error>> =
        bytes.chunks(11).map(|c| Ok(c.to_vec())).collect();

    let mut pipeline = quiet();
    let mut sink = CollectorSink::new();
    let stats = pipeline
        .run_stream(stream::iter(chunks), &mut sink)
        .await
        .unwrap();

    assert_eq!(sink.bytes(), audio);
    assert_eq!(stats.frames, 5);
    assert!(sink.is_ended());
}

#[tokio::test]
async fn async_stream_error_discards_buffers() {
    let (bytes, _) = body(2);
    let items: Vec<Result<Vec<u8>, String>> = vec![Ok(bytes), Err("body truncated".to_string())];

    let mut pipeline = quiet();
    let mut sink = CollectorSink::new();
    let err = pipeline
        .run_stream(stream::iter(items), &mut sink)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Transport failed: body truncated");
    assert_eq!(sink.frames().len(), 1);
    assert!(pipeline.carry_over().is_empty());
    assert!(pipeline.is_finished());
}
