use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fieldwatch_frame::FrameConfig;
use fieldwatch_link::{LinkError, LinkOpener, LinkStream};
use fieldwatch_notify::{Alert, AlertSink};
use fieldwatch_supervisor::{Dispatcher, LinkConfig, LinkManager, Supervisor, TagTable};

#[derive(Default)]
struct Recording {
    raised: Mutex<Vec<String>>,
}

impl Recording {
    fn subjects(&self) -> Vec<String> {
        self.raised.lock().unwrap().clone()
    }
}

impl AlertSink for Recording {
    fn raise(&self, alert: Alert) {
        self.raised.lock().unwrap().push(alert.subject().to_string());
    }
}

#[derive(Debug, Clone)]
enum Step {
    Bytes(&'static [u8]),
    Pause(Duration),
    Fail(ErrorKind),
}

struct ScriptedLink {
    steps: VecDeque<Step>,
}

impl Read for ScriptedLink {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            match self.steps.pop_front() {
                None => return Ok(0),
                Some(Step::Pause(pause)) => std::thread::sleep(pause),
                Some(Step::Fail(kind)) => return Err(std::io::Error::from(kind)),
                Some(Step::Bytes(bytes)) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    if n < bytes.len() {
                        self.steps.push_front(Step::Bytes(&bytes[n..]));
                    }
                    return Ok(n);
                }
            }
        }
    }
}

impl LinkStream for ScriptedLink {
    fn discard_input(&mut self) -> fieldwatch_link::Result<()> {
        Ok(())
    }
}

/// Hands out one scripted link per acquisition; once the scripts run out it
/// clears the run flag and refuses to open.
struct ScriptedOpener {
    sessions: VecDeque<Vec<Step>>,
    running: Arc<AtomicBool>,
}

impl LinkOpener for ScriptedOpener {
    type Stream = ScriptedLink;

    fn open(&mut self) -> fieldwatch_link::Result<ScriptedLink> {
        match self.sessions.pop_front() {
            Some(steps) => Ok(ScriptedLink {
                steps: steps.into(),
            }),
            None => {
                self.running.store(false, Ordering::SeqCst);
                Err(LinkError::Io(std::io::Error::from(ErrorKind::NotFound)))
            }
        }
    }

    fn target(&self) -> String {
        "scripted".to_string()
    }
}

struct Harness {
    supervisor: Supervisor<ScriptedOpener>,
    sink: Arc<Recording>,
    running: Arc<AtomicBool>,
}

fn harness(sessions: Vec<Vec<Step>>, heartbeat: Duration, frame: FrameConfig) -> Harness {
    let running = Arc::new(AtomicBool::new(true));
    let sink = Arc::new(Recording::default());
    let opener = ScriptedOpener {
        sessions: sessions.into(),
        running: Arc::clone(&running),
    };
    let config = LinkConfig {
        reconnect_backoff: Duration::from_millis(5),
        heartbeat_timeout: heartbeat,
        frame,
    };
    let links = LinkManager::new(opener, config, sink.clone());
    let dispatcher = Dispatcher::new(TagTable::default(), sink.clone());
    Harness {
        supervisor: Supervisor::new(links, dispatcher),
        sink,
        running,
    }
}

impl Harness {
    fn run(&mut self) {
        self.supervisor.run_until(&self.running);
    }

    fn sessions(&self) -> u64 {
        self.supervisor.links().sessions_opened()
    }
}

const LONG: Duration = Duration::from_secs(60);

#[test]
fn heartbeat_frame_resets_without_alert() {
    let mut h = harness(
        vec![vec![Step::Bytes(b"Hxx\r\n")]],
        LONG,
        FrameConfig::default(),
    );
    h.run();

    assert_eq!(h.sessions(), 1);
    assert!(h.sink.subjects().is_empty());
}

#[test]
fn alarm_frame_raises_one_alert() {
    let mut h = harness(
        vec![vec![Step::Bytes(b"Axyz\r\n")]],
        LONG,
        FrameConfig::default(),
    );
    h.run();

    assert_eq!(h.sink.subjects(), vec!["alarm raised Axyz\r\n"]);
}

#[test]
fn commands_are_dispatched_in_wire_order() {
    let mut h = harness(
        vec![vec![
            Step::Bytes(b"Axyz\r\nHxx\r\nYo"),
            Step::Bytes(b"k\r\nZzz\r\n"),
            Step::Bytes(b"C1\r\nS2\r\n"),
        ]],
        LONG,
        FrameConfig::default(),
    );
    h.run();

    assert_eq!(
        h.sink.subjects(),
        vec![
            "alarm raised Axyz\r\n",
            "alarm resolved Yok\r\n",
            "wire cut C1\r\n",
            "short circuit S2\r\n",
        ]
    );
}

#[test]
fn read_error_mid_frame_reacquires_with_fresh_watchdog() {
    let heartbeat = Duration::from_millis(100);
    let mut h = harness(
        vec![
            vec![Step::Bytes(b"Ax"), Step::Fail(ErrorKind::BrokenPipe)],
            vec![Step::Pause(Duration::from_millis(300))],
        ],
        heartbeat,
        FrameConfig::default(),
    );
    h.run();
    std::thread::sleep(Duration::from_millis(250));

    assert_eq!(h.sessions(), 2);
    // The partial "Ax" is never dispatched, and only the second session's
    // watchdog was alive long enough to fire.
    assert_eq!(h.sink.subjects(), vec!["no heartbeat for 100ms"]);
}

#[test]
fn oversized_line_is_dropped_and_session_continues() {
    let frame = FrameConfig {
        max_frame_len: 16,
        ..FrameConfig::default()
    };
    let mut h = harness(
        vec![vec![
            Step::Bytes(b"Aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\r\n"),
            Step::Bytes(b"C1\r\n"),
        ]],
        LONG,
        frame,
    );
    h.run();

    assert_eq!(h.sessions(), 1);
    assert_eq!(h.sink.subjects(), vec!["wire cut C1\r\n"]);
}

#[test]
fn heartbeat_after_expiry_replaces_session() {
    let heartbeat = Duration::from_millis(50);
    let mut h = harness(
        vec![
            vec![
                Step::Pause(Duration::from_millis(200)),
                Step::Bytes(b"Hxx\r\nAxyz\r\n"),
                Step::Bytes(b"C1\r\n"),
            ],
            vec![Step::Bytes(b"Hxx\r\n")],
        ],
        heartbeat,
        FrameConfig::default(),
    );
    h.run();

    assert_eq!(h.sessions(), 2);
    // The alarm that arrived with the late heartbeat is still reported; the
    // failed link is not read any further.
    assert_eq!(
        h.sink.subjects(),
        vec!["no heartbeat for 50ms", "alarm raised Axyz\r\n"]
    );
}

#[test]
fn legacy_fixed_windows() {
    let frame = FrameConfig {
        mode: fieldwatch_frame::FramingMode::FixedLegacy,
        ..FrameConfig::default()
    };
    let mut h = harness(
        vec![vec![Step::Bytes(b"Hxx\r\nA12\r\n")]],
        LONG,
        frame,
    );
    h.run();

    assert_eq!(h.sink.subjects(), vec!["alarm raised A12"]);
}
