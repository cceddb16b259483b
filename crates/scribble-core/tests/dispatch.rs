//! Integration tests for dispatching runs to an interpreter worker.
//!
//! The worker side is played by hand over an in-memory pipe, so these
//! tests see exactly what goes over the wire.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use scribble_core::ipc::{Event, Request, WorkerTransport, read_message, write_message};
use scribble_core::{
    Dispatcher, ExecutionRequest, OutputBuffer, PlaygroundConfig, Result, Session, WorkerLauncher,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};

const WAIT: Duration = Duration::from_secs(5);

/// The worker end of the pipe.
struct WorkerEnd {
    requests: Lines<BufReader<ReadHalf<DuplexStream>>>,
    events: WriteHalf<DuplexStream>,
}

impl WorkerEnd {
    async fn send(&mut self, event: &Event) {
        write_message(&mut self.events, event).await.unwrap();
    }

    async fn events_raw(&mut self, bytes: &[u8]) {
        self.events.write_all(bytes).await.unwrap();
        self.events.flush().await.unwrap();
    }

    async fn next_request(&mut self) -> Option<Request> {
        tokio::time::timeout(WAIT, read_message(&mut self.requests))
            .await
            .expect("timed out waiting for a request")
            .unwrap()
    }
}

/// Hands the host end of a pipe to the session and keeps the worker end.
#[derive(Default)]
struct ManualLauncher {
    worker_end: Arc<Mutex<Option<WorkerEnd>>>,
}

impl WorkerLauncher for ManualLauncher {
    fn launch(&self) -> Result<WorkerTransport> {
        let (host, worker) = tokio::io::duplex(16 * 1024);
        let (host_rx, host_tx) = tokio::io::split(host);
        let (worker_rx, worker_tx) = tokio::io::split(worker);
        *self.worker_end.lock().unwrap() = Some(WorkerEnd {
            requests: BufReader::new(worker_rx).lines(),
            events: worker_tx,
        });
        Ok(WorkerTransport {
            reader: Box::new(host_rx),
            writer: Box::new(host_tx),
            process: None,
        })
    }

    fn describe(&self) -> String {
        "manual".to_string()
    }
}

fn mount() -> (Dispatcher, OutputBuffer, WorkerEnd) {
    let launcher = ManualLauncher::default();
    let slot = launcher.worker_end.clone();
    let output = OutputBuffer::new();
    let dispatcher = Dispatcher::mount(
        Arc::new(Session::new(launcher)),
        Arc::new(output.clone()),
        &PlaygroundConfig::default(),
    );
    let worker_end = slot.lock().unwrap().take().expect("worker was launched at mount");
    (dispatcher, output, worker_end)
}

#[tokio::test]
async fn test_python_run_goes_over_the_wire() {
    let (dispatcher, output, mut worker) = mount();

    worker.send(&Event::Ready).await;
    let handle = dispatcher.session().acquire().unwrap();
    handle.wait_ready(WAIT).await.unwrap();

    let outcome = dispatcher.run(ExecutionRequest::new("python", "print('hi')"));
    assert_eq!(
        worker.next_request().await,
        Some(Request::Run {
            id: 1,
            code: "print('hi')".to_string()
        })
    );

    worker
        .send(&Event::Output {
            id: 1,
            result: "hi".to_string(),
        })
        .await;
    outcome.finished().await;
    assert_eq!(output.contents(), "hi\n");
}

#[tokio::test]
async fn test_not_ready_sends_nothing() {
    let (dispatcher, output, mut worker) = mount();

    dispatcher.run(ExecutionRequest::new("python", "print('hi')"));
    assert_eq!(output.contents(), "Error:\nworker not ready");

    // The first thing the worker ever hears is the shutdown.
    dispatcher.session().shutdown().await.unwrap();
    assert_eq!(worker.next_request().await, Some(Request::Shutdown));
}

#[tokio::test]
async fn test_worker_error_and_unknown_events() {
    let (dispatcher, output, mut worker) = mount();
    worker.send(&Event::Ready).await;
    dispatcher.session().acquire().unwrap().wait_ready(WAIT).await.unwrap();

    let outcome = dispatcher.run(ExecutionRequest::new("python", "1/0"));
    worker.next_request().await;

    worker.events_raw(b"{\"type\":\"progress\",\"pct\":50}\n").await;
    worker.events_raw(b"not json\n").await;
    worker
        .send(&Event::Error {
            id: 1,
            error: "ZeroDivisionError: division by zero".to_string(),
        })
        .await;

    outcome.finished().await;
    assert_eq!(
        output.contents(),
        "Error:\nZeroDivisionError: division by zero\n"
    );
}

#[tokio::test]
async fn test_worker_exit_fails_the_pending_run() {
    let (dispatcher, output, mut worker) = mount();
    worker.send(&Event::Ready).await;
    dispatcher.session().acquire().unwrap().wait_ready(WAIT).await.unwrap();

    let outcome = dispatcher.run(ExecutionRequest::new("python", "while True: pass"));
    worker.next_request().await;
    drop(worker);

    outcome.finished().await;
    let contents = output.contents();
    assert!(contents.starts_with("Error:\n"), "{}", contents);

    dispatcher.run(ExecutionRequest::new("python", "print('again')"));
    assert!(output.contents().contains("exited"), "{}", output.contents());
}
