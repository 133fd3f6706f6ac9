use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

const ELECTION: &str = "election-forecasts-2024";

#[derive(Debug, Deserialize)]
struct TooltipResponse {
    date: String,
    x: f64,
    breakpoint: String,
    fields: BTreeMap<String, String>,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn static_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static")
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_forecast_charts"))
        .env("PORT", port.to_string())
        .env("APP_STATIC_DIR", static_dir())
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

fn manifest() -> serde_json::Value {
    let raw = std::fs::read_to_string(static_dir().join("manifest.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[tokio::test]
async fn http_chart_pages_render_manifest_fields() {
    let server = shared_server().await;
    let client = Client::new();
    let manifest = manifest();
    let entries = manifest["data"].as_object().unwrap();
    assert!(!entries.is_empty());

    for (id, entry) in entries {
        for route in ["web", "embed"] {
            let response = client
                .get(format!("{}/{route}/{id}", server.base_url))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "/{route}/{id}");
            let body = response.text().await.unwrap();

            for (field, value) in entry.as_object().unwrap() {
                let value = value.as_str().unwrap();
                assert!(body.contains(value), "/{route}/{id} is missing {field}: {value}");
            }
        }
    }
}

#[tokio::test]
async fn http_unknown_chart_is_not_found() {
    let server = shared_server().await;
    let client = Client::new();

    for path in [
        "/web/no-such-chart",
        "/embed/no-such-chart",
        "/api/charts/no-such-chart/svg",
        "/api/charts/no-such-chart/tooltip?x=10",
    ] {
        let response = client
            .get(format!("{}{path}", server.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn http_index_links_every_chart() {
    let server = shared_server().await;
    let body = Client::new()
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    for id in manifest()["data"].as_object().unwrap().keys() {
        assert!(body.contains(&format!(r#"href="/web/{id}""#)), "index is missing {id}");
    }
}

#[tokio::test]
async fn http_svg_follows_breakpoint_and_selection() {
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/api/charts/{ELECTION}/svg?width=320", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "image/svg+xml"
    );
    let svg = response.text().await.unwrap();
    assert!(svg.contains(r#"viewBox="0 0 500 500""#));
    assert!(svg.contains("series-neutral"));

    let svg = client
        .get(format!(
            "{}/api/charts/{ELECTION}/svg?width=1200&highlight=polymarket",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(svg.contains(r#"viewBox="0 0 1100 700""#));
    assert!(svg.contains(r#"id="chart-data-polymarket" class="chart-data chart-line series-highlighted""#));
    assert!(svg.contains(r#"id="chart-data-manifold" class="chart-data chart-line series-background""#));

    let response = client
        .get(format!("{}/api/charts/{ELECTION}/svg?highlight=nope", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_tooltip_matches_csv_row() {
    let server = shared_server().await;

    // Large canvas: 1100 wide, plot from x=40 to x=1090 over Aug 1 - Nov 5 (96 days).
    let day = 31.0;
    let x = 40.0 + day / 96.0 * 1050.0 + 1.0;
    let tooltip: TooltipResponse = Client::new()
        .get(format!(
            "{}/api/charts/{ELECTION}/tooltip?width=1200&x={x}",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(tooltip.date, "September 1, 2024");
    assert_eq!(tooltip.breakpoint, "large");
    assert!((tooltip.x - (x - 1.0)).abs() < 1e-6);

    let csv = std::fs::read_to_string(static_dir().join("data/election-forecasts-2024.csv")).unwrap();
    let mut lines = csv.lines();
    let header: Vec<&str> = lines.next().unwrap().split(',').collect();
    let row: Vec<&str> = lines
        .find(|line| line.starts_with("9/1/2024,"))
        .unwrap()
        .split(',')
        .collect();

    for (column, raw) in header.iter().zip(&row).skip(1) {
        let id = format!("tooltip-text-val-{}", column.to_lowercase());
        let expected = if raw.is_empty() { "-".to_string() } else { format!("{raw}%") };
        assert_eq!(tooltip.fields.get(&id), Some(&expected), "{id}");
    }
}

#[tokio::test]
async fn http_static_files_are_served() {
    let server = shared_server().await;
    let response = Client::new()
        .get(format!("{}/static/data/election-forecasts-2024.csv", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().starts_with("Date,"));
}
