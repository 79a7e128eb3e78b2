use points_processor::{
    model::structures::{
        rank_record::RankRecord,
        tier::{Division, Tier}
    },
    utils::test_utils::{generate_match, MockApi}
};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, Once
    },
    time::Duration
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle
};

static INIT: Once = Once::new();

pub const PLAYER: &str = "me";
pub const PLAYER_NAME: &str = "Me#EUW";

/// Initialize test environment with RUST_LOG=WARN
pub fn init_test_env() {
    INIT.call_once(|| {
        std::env::set_var("RUST_LOG", "warn");
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

pub fn gold_one() -> RankRecord {
    RankRecord::new(Tier::Gold, Some(Division::I), 0)
}

/// Five opponents, the first `ranked` of which hold a live Gold I rank.
pub fn enemies(api: &mut MockApi, tag: &str, ranked: usize) -> Vec<String> {
    (0..5)
        .map(|k| {
            let puuid = format!("{}-enemy{}", tag, k);
            if k < ranked {
                api.add_ranked(&puuid, gold_one());
            }
            puuid
        })
        .collect()
}

/// Four teammates never seen anywhere else.
pub fn strangers(tag: &str) -> Vec<String> {
    (0..4).map(|k| format!("{}-ally{}", tag, k)).collect()
}

/// Adds a ranked solo/duo match of `PLAYER` valued 8 (Gold I opponents),
/// or discarded when fewer than three opponents are ranked.
pub fn add_solo_match(api: &mut MockApi, id: &str, created_at: i64, win: bool, ranked: usize) {
    let enemies = enemies(api, id, ranked);
    let dto = generate_match(id, created_at, 420, PLAYER, &strangers(id), &enemies, win);
    api.add_match(PLAYER, dto);
}

/// Adds a flex match where `PLAYER` queued with `duo`.
pub fn add_duo_match(api: &mut MockApi, id: &str, created_at: i64, win: bool, duo: &str) {
    let enemies = enemies(api, id, 5);
    let mut allies = strangers(id);
    allies[0] = duo.to_string();
    let dto = generate_match(id, created_at, 440, PLAYER, &allies, &enemies, win);
    api.add_match(PLAYER, dto);
}

/// 45 ranked matches inside the discovery window: 25 valued solo, 5 solo
/// without enough ranked opponents and 15 flex games with the same duo.
pub fn standard_history(api: &mut MockApi) {
    api.add_account(PLAYER, PLAYER_NAME);

    for i in 0..25 {
        add_solo_match(api, &format!("EUW1_s{}", i), 500_000 - i * 100, i % 2 == 0, 5);
    }
    for i in 0..5 {
        add_solo_match(api, &format!("EUW1_x{}", i), 400_000 - i * 100, true, 2);
    }
    for i in 0..15 {
        add_duo_match(api, &format!("EUW1_p{}", i), 300_000 - i * 100, i % 3 != 0, "duo");
    }
}

/// One scripted answer of `ScriptedServer`.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, &'static str),
    /// Read the request, then close without answering
    Drop
}

/// Local HTTP server answering one request per connection from a script.
/// Once the script runs out every request gets a 500.
pub struct ScriptedServer {
    pub root: String,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>
}

impl ScriptedServer {
    pub async fn start(script: Vec<Reply>) -> ScriptedServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let root = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let (counter, log) = (hits.clone(), requests.clone());
        let handle = tokio::spawn(async move {
            let mut script = script.into_iter();
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);

                let mut raw = Vec::new();
                let mut buf = [0u8; 4096];
                loop {
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    raw.extend_from_slice(&buf[..n]);
                    if raw.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                log.lock().unwrap().push(String::from_utf8_lossy(&raw).to_string());

                match script.next().unwrap_or(Reply::Status(500, "")) {
                    Reply::Drop => drop(socket),
                    Reply::Status(code, body) => {
                        let response = format!(
                            "HTTP/1.1 {} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            code,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    }
                }
            }
        });

        ScriptedServer {
            root,
            hits,
            requests,
            handle
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.root, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Raw request heads, in arrival order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for ScriptedServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Gives spawned server tasks a chance to record late requests.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
