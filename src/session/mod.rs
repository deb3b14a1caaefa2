//! Session layer: the stream to the game server and the game loop on top.

pub mod connection;
pub mod runner;
pub mod transport;

pub use connection::FramedConnection;
pub use runner::{GameEnd, build_agent, play_game, run, serve};
pub use transport::{BoxedStream, GameStream};
