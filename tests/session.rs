//! Full game against an in-process host speaking the wire protocol over TCP.

use serde_json::{Value, json};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use wolfcall::config::{Config, ConnectionMode};
use wolfcall::engine::phrases;
use wolfcall::generation::{GatewaySettings, GenerationGateway};
use wolfcall::llm::Provider;

/// Answers extraction prompts from a script and chats blandly otherwise.
struct Scripted;

impl Provider for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn chat_with_system<'a>(
        &'a self,
        _system_prompt: Option<&'a str>,
        message: &'a str,
        _model: &'a str,
        _temperature: f64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        let answer = if message.contains("vote targets") {
            "none"
        } else if message.contains("seer claims") {
            "Agent[02], Agent[01], black"
        } else {
            "I am just a humble villager."
        };
        Box::pin(async move { Ok(answer.to_string()) })
    }
}

fn game_info(day: u32) -> Value {
    json!({
        "agent": 1,
        "day": day,
        "roleMap": {"1": "WEREWOLF"},
        "statusMap": {"1": "ALIVE", "2": "ALIVE", "3": "ALIVE", "4": "ALIVE", "5": "ALIVE"},
        "divineResult": null
    })
}

fn packet(request: &str, info: Option<Value>, talks: Option<Value>) -> String {
    json!({
        "request": request,
        "gameInfo": info,
        "gameSetting": {"playerNum": 5, "maxTalk": 10, "maxTalkTurn": 20},
        "talkHistory": talks,
    })
    .to_string()
}

struct Host {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl Host {
    async fn send(&mut self, frames: &[String]) {
        let data = frames.join("\n") + "\n";
        self.writer.write_all(data.as_bytes()).await.unwrap();
    }

    async fn expect_line(&mut self) -> String {
        let mut line = String::new();
        tokio::time::timeout(Duration::from_secs(10), self.reader.read_line(&mut line))
            .await
            .expect("reply within deadline")
            .unwrap();
        line.trim_end().to_string()
    }
}

#[tokio::test]
async fn werewolf_plays_a_short_game() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut config = Config::default();
    config.connection.mode = ConnectionMode::Connect;
    config.connection.host = "127.0.0.1".into();
    config.connection.port = port;
    config.agent.name = "wolf-test".into();

    let gateway = Arc::new(
        GenerationGateway::new(Arc::new(Scripted), GatewaySettings::from(&config.llm)).unwrap(),
    );
    let agent_task = tokio::spawn(async move { wolfcall::session::run(&config, gateway).await });

    let (stream, _) = listener.accept().await.unwrap();
    let (read, writer) = stream.into_split();
    let mut host = Host {
        reader: BufReader::new(read),
        writer,
    };

    host.send(&[packet("NAME", None, None)]).await;
    assert_eq!(host.expect_line().await, "wolf-test");

    host.send(&[packet("ROLE", Some(game_info(0)), None)]).await;
    assert_eq!(host.expect_line().await, "WEREWOLF");

    // Two packets in one write, neither expects an answer.
    host.send(&[
        packet("INITIALIZE", Some(game_info(0)), None),
        packet("DAILY_INITIALIZE", Some(game_info(0)), None),
    ])
    .await;

    host.send(&[packet("TALK", None, Some(json!([])))]).await;
    assert_eq!(host.expect_line().await, phrases::greeting(1));
    host.send(&[packet("TALK", None, Some(json!([])))]).await;
    assert_eq!(host.expect_line().await, "Over");

    host.send(&[
        packet("DAILY_FINISH", None, None),
        packet("DAILY_INITIALIZE", Some(game_info(1)), None),
    ])
    .await;

    let accusation = json!([
        {"agent": 2, "day": 1, "idx": 0, "text": "I am the seer. Agent[01] is a werewolf.", "turn": 0}
    ]);
    host.send(&[packet("TALK", None, Some(accusation))]).await;
    assert_eq!(host.expect_line().await, phrases::counter_claim(1, 2));

    host.send(&[packet("DAILY_FINISH", None, None), packet("VOTE", None, None)])
        .await;
    let vote: Value = serde_json::from_str(&host.expect_line().await).unwrap();
    let target = vote["agentIdx"].as_u64().unwrap();
    assert!((2..=5).contains(&target));

    host.send(&[packet("ATTACK", None, None)]).await;
    assert_eq!(host.expect_line().await, r#"{"agentIdx":2}"#);

    host.send(&[packet("FINISH", Some(game_info(1)), None)]).await;

    let result = tokio::time::timeout(Duration::from_secs(10), agent_task)
        .await
        .expect("agent exits after FINISH")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn refused_connection_is_reported() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut config = Config::default();
    config.connection.host = "127.0.0.1".into();
    config.connection.port = port;

    let gateway = Arc::new(
        GenerationGateway::new(Arc::new(Scripted), GatewaySettings::from(&config.llm)).unwrap(),
    );
    assert!(wolfcall::session::run(&config, gateway).await.is_err());
}
