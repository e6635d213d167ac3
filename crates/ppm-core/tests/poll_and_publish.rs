//! Poller and publisher running against one shared state.

use std::collections::VecDeque;

use embassy_futures::block_on;
use embassy_time::Instant;
use ppm_core::{
    AddressSource, HostAddress, MonitorConfig, Reading, ReadingPublisher, Sensor, SensorError,
    SensorPoller, SharedState, Shutdown, Status,
};

/// Replays a fixed list of readings, then asks everything to stop.
struct ScriptedSensor {
    script: VecDeque<Result<u32, SensorError>>,
    shutdown: &'static Shutdown,
}

impl Sensor for ScriptedSensor {
    async fn read(&mut self) -> Result<Reading, SensorError> {
        match self.script.pop_front() {
            Some(next) => next.map(|ppm| Reading::new(ppm, Instant::now())),
            None => {
                self.shutdown.request();
                Err(SensorError::Timeout {
                    sensor: "scripted",
                    operation: "read",
                })
            }
        }
    }
}

struct Loopback;

impl AddressSource for Loopback {
    fn primary_address(&mut self) -> Option<HostAddress> {
        "127.0.0.1".try_into().ok()
    }
}

fn config() -> MonitorConfig {
    MonitorConfig {
        poll_interval_ms: 1,
        retry_delay_ms: 1,
        ..MonitorConfig::default()
    }
}

#[test]
fn test_publisher_serves_last_good_reading() {
    static STATE: SharedState = SharedState::new(Instant::from_ticks(0));
    static SHUTDOWN: Shutdown = Shutdown::new();

    let publisher = ReadingPublisher::new(&STATE);
    assert_eq!(
        publisher.handle(b"GET / HTTP/1.1\r\n\r\n").status,
        Status::ServiceUnavailable
    );

    let sensor = ScriptedSensor {
        script: VecDeque::from([
            Ok(420),
            Ok(980),
            Err(SensorError::MalformedResponse {
                sensor: "scripted",
                details: "checksum mismatch",
            }),
            Ok(1_150),
        ]),
        shutdown: &SHUTDOWN,
    };
    let mut poller = SensorPoller::new(sensor, Loopback, &STATE, &config());
    block_on(poller.run(&SHUTDOWN));

    let response = publisher.handle(b"GET / HTTP/1.1\r\nHost: ppm.local\r\n\r\n");
    assert_eq!(response.status, Status::Ok);
    let json: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(json, serde_json::json!({ "co2": 1150 }));

    let snapshot = STATE.snapshot();
    assert_eq!(snapshot.trend.last_concentration(), 1_150);
    assert_eq!(snapshot.trend.previous_concentration(), 980);
    assert_eq!(snapshot.address.as_deref(), Some("127.0.0.1"));
}
