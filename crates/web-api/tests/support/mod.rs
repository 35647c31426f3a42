#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use application::{ManualClock, PresenceSettings, PresenceSweeper};
use chrono::Utc;
use config::{AppConfig, StorageBackend};
use infrastructure::Infrastructure;
use reqwest::{Client, RequestBuilder};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use web_api::ChatApp;

/// 运行在临时端口上的服务，使用内存存储与手动时钟
pub struct TestServer {
    pub base: String,
    pub client: Client,
    pub clock: Arc<ManualClock>,
    pub sweeper: Arc<PresenceSweeper>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<anyhow::Result<()>>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let mut config = AppConfig::default();
        config.database.backend = StorageBackend::Memory;

        let clock = Arc::new(ManualClock::new(Utc::now()));
        // 后台周期足够长，测试里手动触发清理
        let settings = PresenceSettings {
            sweep_interval: Duration::from_secs(3600),
            stale_after: Duration::from_secs(10),
        };
        let app = ChatApp::from_parts(&config, Infrastructure::in_memory(), clock.clone(), settings);
        let sweeper = app.sweeper();

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(app.serve(listener, async move {
            let _ = shutdown_rx.await;
        }));

        Self {
            base: format!("http://{}", addr),
            client: Client::new(),
            clock,
            sweeper,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn get_as(&self, path: &str, user: &str) -> RequestBuilder {
        self.client.get(self.url(path)).header("User", user)
    }

    pub fn post_as(&self, path: &str, user: &str) -> RequestBuilder {
        self.client.post(self.url(path)).header("User", user)
    }

    pub async fn register(&self, name: &str) -> reqwest::StatusCode {
        self.client
            .post(self.url("/participants"))
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .expect("register")
            .status()
    }

    pub async fn messages_for(&self, user: &str, limit: u32) -> Vec<serde_json::Value> {
        self.get_as(&format!("/messages?limit={}", limit), user)
            .send()
            .await
            .expect("list messages")
            .json()
            .await
            .expect("messages json")
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await.expect("join").expect("serve");
        }
    }
}
