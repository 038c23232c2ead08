use std::time::Duration;

use nightwatch::dashboard::broadcaster::Broadcaster;
use nightwatch::dashboard::poller::Poller;
use nightwatch::dashboard::DashboardFrame;
use nightwatch::kernel::audio::monitor::{EngineSettings, NoiseMonitor};
use nightwatch::kernel::history::History;
use nightwatch::kernel::time;
use nightwatch::server::client::QueryClient;
use nightwatch::server::protocol::{QueryRequest, QueryResponse};
use nightwatch::server::QueryServer;

fn frame() -> DashboardFrame {
    DashboardFrame::stamped(QueryResponse {
        audio_plot: vec![0.0; 4],
        crying_blocks: Vec::new(),
        time_crying: String::new(),
        time_quiet: "Baby quiet for 0:00:01".to_string(),
    })
}

fn request() -> QueryRequest {
    QueryRequest {
        upper_limit: 25_000.0,
        noise_threshold: 0.25,
        min_quiet_time: 30.0,
        min_noise_time: 5.0,
    }
}

#[tokio::test]
async fn test_publish_reaches_every_subscriber() {
    let broadcaster = Broadcaster::new(4);
    let (_a, mut rx_a) = broadcaster.add();
    let (_b, mut rx_b) = broadcaster.add();

    assert_eq!(broadcaster.publish(frame()), 2);
    let got_a = rx_a.recv().await.unwrap();
    let got_b = rx_b.recv().await.unwrap();
    assert_eq!(got_a.response.time_quiet, "Baby quiet for 0:00:01");
    assert_eq!(*got_a, *got_b);
}

#[tokio::test]
async fn test_remove_and_closed_subscribers() {
    let broadcaster = Broadcaster::new(4);
    let (kept, _rx_kept) = broadcaster.add();
    let (gone, rx_gone) = broadcaster.add();
    let (removed, _rx_removed) = broadcaster.add();
    assert_eq!(broadcaster.len(), 3);

    assert!(broadcaster.remove(&removed));
    assert!(!broadcaster.remove(&removed));

    drop(rx_gone);
    assert_eq!(broadcaster.publish(frame()), 1);
    assert_eq!(broadcaster.len(), 1);
    assert!(!broadcaster.remove(&gone));
    assert!(broadcaster.remove(&kept));
    assert!(broadcaster.is_empty());
}

#[tokio::test]
async fn test_lagging_subscriber_skips_frames() {
    let broadcaster = Broadcaster::new(1);
    let (_id, mut rx) = broadcaster.add();

    assert_eq!(broadcaster.publish(frame()), 1);
    assert_eq!(broadcaster.publish(frame()), 0);
    assert_eq!(broadcaster.len(), 1);

    assert!(rx.recv().await.is_some());
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_frame_flattens_response_fields() {
    let value = serde_json::to_value(frame()).unwrap();
    for key in ["audio_plot", "crying_blocks", "time_crying", "time_quiet", "date_current", "time_current"] {
        assert!(value.get(key).is_some(), "missing {}", key);
    }
    assert!(!value["time_current"].as_str().unwrap().starts_with('0'));
}

#[tokio::test]
async fn test_poller_publishes_server_results() {
    let history = History::with_capacity(100).unwrap();
    let now = time::now();
    for i in 0..60 {
        history.append(now - 60.0 + i as f64, 100);
    }
    let server = QueryServer::bind(
        "127.0.0.1:0",
        history,
        NoiseMonitor::new(EngineSettings::new(1.0)),
        Duration::from_secs(2),
    )
    .await
    .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    let broadcaster = Broadcaster::default();
    let (_id, mut rx) = broadcaster.add();
    let client = QueryClient::new(addr.to_string(), Duration::from_secs(5));
    let poller = Poller::new(client, request(), broadcaster.clone(), Duration::from_millis(50));

    assert_eq!(poller.poll_once().await.unwrap(), 1);
    let frame = rx.recv().await.unwrap();
    assert!(frame.response.time_quiet.starts_with("Baby quiet for "));
    assert!(!frame.date_current.is_empty());
}

#[tokio::test]
async fn test_poller_reports_unreachable_server() {
    // Reserve a port, then free it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let broadcaster = Broadcaster::default();
    let client = QueryClient::new(addr.to_string(), Duration::from_millis(500));
    let poller = Poller::new(client, request(), broadcaster, Duration::from_millis(50));
    assert!(poller.poll_once().await.is_err());
}
