//! Game loop over a framed connection, and the repeat/reconnect policy.

use super::connection::FramedConnection;
use super::transport;
use crate::config::Config;
use crate::engine::{Agent, Dispatcher};
use crate::generation::GenerationGateway;
use crate::protocol::Packet;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

/// How a single game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEnd {
    /// The server sent FINISH.
    Finished,
    /// The server closed the connection between messages.
    Disconnected,
}

pub fn build_agent(config: &Config, gateway: &Arc<GenerationGateway>) -> Agent {
    let dispatcher = Dispatcher::new(
        Arc::clone(gateway),
        Duration::from_millis(config.dispatch.task_deadline_ms),
    );
    Agent::new(
        config.agent.name.clone(),
        config.heuristics.clone(),
        dispatcher,
    )
}

/// Drive one agent until FINISH or until the server hangs up.
pub async fn play_game<S>(conn: &mut FramedConnection<S>, agent: &mut Agent) -> anyhow::Result<GameEnd>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let Some(frame) = conn.next_frame().await? else {
            return Ok(GameEnd::Disconnected);
        };

        let packet = match Packet::parse(&frame) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::warn!(bytes = frame.len(), "Skipping undecodable frame: {e}");
                continue;
            }
        };

        let command = packet.request;
        tracing::debug!(%command, "Received");
        let reply = agent.handle(packet).await;
        if let Some(line) = reply.to_wire() {
            tracing::debug!(%command, line = line.as_str(), "Replying");
            conn.send(&line).await?;
        }

        if agent.is_finished() {
            return Ok(GameEnd::Finished);
        }
    }
}

/// Play up to `game.num` games on one connection. Frames that arrive
/// after a FINISH stay buffered for the next game.
pub async fn serve<S>(
    conn: &mut FramedConnection<S>,
    config: &Config,
    gateway: &Arc<GenerationGateway>,
) -> anyhow::Result<u32>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut played = 0;
    for game in 1..=config.game.num {
        let mut agent = build_agent(config, gateway);
        match play_game(conn, &mut agent).await? {
            GameEnd::Finished => {
                played += 1;
                tracing::info!(game, of = config.game.num, "Game complete");
            }
            GameEnd::Disconnected => {
                tracing::warn!(game, "Game server closed the connection");
                break;
            }
        }
    }
    Ok(played)
}

/// Connect, play the configured batch, and reconnect while
/// `keep_connection` is set.
pub async fn run(config: &Config, gateway: Arc<GenerationGateway>) -> anyhow::Result<()> {
    let conn_cfg = &config.connection;
    loop {
        let stream = transport::open(conn_cfg).await?;
        let mut conn = FramedConnection::new(
            stream,
            conn_cfg.max_frame_bytes,
            Duration::from_secs(conn_cfg.read_timeout_secs),
        );
        let played = serve(&mut conn, config, &gateway).await?;
        tracing::info!(played, "Connection finished");

        if !conn_cfg.keep_connection {
            return Ok(());
        }
        tracing::info!("Reconnecting to the game server");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GatewaySettings;
    use crate::llm::Provider;
    use std::future::Future;
    use std::pin::Pin;
    use tokio_test::io::Builder;

    struct Quiet;

    impl Provider for Quiet {
        fn name(&self) -> &str {
            "quiet"
        }

        fn chat_with_system<'a>(
            &'a self,
            _system_prompt: Option<&'a str>,
            _message: &'a str,
            _model: &'a str,
            _temperature: f64,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
            Box::pin(async { Ok("none".to_string()) })
        }
    }

    fn gateway() -> Arc<GenerationGateway> {
        let settings = GatewaySettings::from(&crate::config::LlmConfig::default());
        Arc::new(GenerationGateway::new(Arc::new(Quiet), settings).unwrap())
    }

    fn conn(mock: tokio_test::io::Mock) -> FramedConnection<tokio_test::io::Mock> {
        FramedConnection::new(mock, 4096, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn answers_name_and_finishes() {
        let mock = Builder::new()
            .read(br#"{"request":"NAME","gameInfo":null,"gameSetting":null,"talkHistory":null}"#)
            .write(b"wolfcall\n")
            .read(b"{\"request\":\"FINISH\"}")
            .build();
        let mut c = conn(mock);
        let mut agent = build_agent(&Config::default(), &gateway());
        assert_eq!(play_game(&mut c, &mut agent).await.unwrap(), GameEnd::Finished);
    }

    #[tokio::test]
    async fn undecodable_frames_are_skipped() {
        let mock = Builder::new()
            .read(b"{not json}\n{\"request\":\"FINISH\"}")
            .build();
        let mut c = conn(mock);
        let mut agent = build_agent(&Config::default(), &gateway());
        assert_eq!(play_game(&mut c, &mut agent).await.unwrap(), GameEnd::Finished);
    }

    #[tokio::test]
    async fn frames_after_finish_carry_into_the_next_game() {
        let mock = Builder::new()
            .read(b"{\"request\":\"FINISH\"}\n{\"request\":\"NAME\"}\n{\"request\":\"FINISH\"}")
            .write(b"wolfcall\n")
            .build();
        let mut c = conn(mock);
        let config = Config {
            game: crate::config::GameConfig { num: 2 },
            ..Config::default()
        };
        assert_eq!(serve(&mut c, &config, &gateway()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn early_disconnect_stops_the_batch() {
        let mock = Builder::new().read(b"{\"request\":\"FINISH\"}").build();
        let mut c = conn(mock);
        let config = Config {
            game: crate::config::GameConfig { num: 3 },
            ..Config::default()
        };
        assert_eq!(serve(&mut c, &config, &gateway()).await.unwrap(), 1);
    }
}
