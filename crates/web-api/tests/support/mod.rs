#![allow(dead_code)]

use std::{net::SocketAddr, time::Duration};

use config::AppConfig;
use futures_util::StreamExt;
use infrastructure::Infrastructure;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::oneshot, time::sleep};
use tokio_tungstenite::{
    connect_async, tungstenite::Message as TungsteniteMessage, MaybeTlsStream, WebSocketStream,
};
use uuid::Uuid;
use web_api::{router, AppState};

pub type WsClient = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// 基于进程内存储启动的真实服务器
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    pub client: Client,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let mut config = AppConfig::default();
        config.server.bcrypt_cost = Some(4);
        config.realtime.connection_buffer = 16;

        let infra = Infrastructure::in_memory(config.server.bcrypt_cost);
        let state = AppState::new(&infra, &config);
        state
            .room_service
            .ensure_room(&config.default_room)
            .await
            .expect("seed default room");

        let app = router(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Self {
            addr,
            state,
            client: Client::new(),
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(&self, username: &str, password: &str) -> Response {
        self.client
            .post(self.url("/auth/register"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("register request")
    }

    pub async fn login(&self, username: &str, password: &str) -> Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("login request")
    }

    /// 注册并登录，返回 token
    pub async fn token_for(&self, username: &str) -> String {
        let registered = self.register(username, "secret").await;
        assert_eq!(registered.status(), 201);

        let login: Value = self
            .login(username, "secret")
            .await
            .json()
            .await
            .expect("login json");
        login["token"].as_str().expect("token").to_owned()
    }

    pub async fn create_room(&self, name: &str) -> Value {
        let response = self
            .client
            .post(self.url("/rooms"))
            .json(&json!({ "name": name }))
            .send()
            .await
            .expect("create room");
        assert_eq!(response.status(), 201);
        response.json().await.expect("room json")
    }

    pub async fn post_message(&self, token: Option<&str>, body: Value) -> Response {
        let mut request = self.client.post(self.url("/messages")).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("post message")
    }

    pub async fn connect_ws(&self) -> WsClient {
        let (ws, _) = connect_async(format!("ws://{}/ws", self.addr))
            .await
            .expect("ws connect");
        ws
    }

    pub fn members_of(&self, room_id: &str) -> usize {
        let room_id = Uuid::parse_str(room_id).expect("room id");
        self.state.registry().members_of(room_id.into()).len()
    }

    /// 轮询直到条件成立，入房是异步生效的
    pub async fn wait_until(&self, mut condition: impl FnMut(&AppState) -> bool) {
        for _ in 0..100 {
            if condition(&self.state) {
                return;
            }
            sleep(Duration::from_millis(20)).await;
        }
        panic!("condition not reached in time");
    }

    pub async fn wait_for_members(&self, room_id: &str, expected: usize) {
        let room_id: Uuid = Uuid::parse_str(room_id).expect("room id");
        self.wait_until(|state| state.registry().members_of(room_id.into()).len() == expected)
            .await;
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

pub fn join_frame(room_id: &str) -> TungsteniteMessage {
    TungsteniteMessage::Text(
        json!({ "event": "room:join", "data": room_id })
            .to_string()
            .into(),
    )
}

/// 读取下一条 JSON 事件，跳过控制帧；超时返回 `None`
pub async fn next_event(ws: &mut WsClient, wait: Duration) -> Option<Value> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let remaining = deadline.checked_duration_since(tokio::time::Instant::now())?;
        match tokio::time::timeout(remaining, ws.next()).await {
            Ok(Some(Ok(TungsteniteMessage::Text(payload)))) => {
                return Some(serde_json::from_str(payload.as_str()).expect("event json"));
            }
            Ok(Some(Ok(_))) => continue,
            Ok(Some(Err(_))) | Ok(None) | Err(_) => return None,
        }
    }
}
