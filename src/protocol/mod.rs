pub mod frame;
pub mod packet;
pub mod reply;

pub use frame::{FrameDecoder, is_complete, normalize_fragment, split_frames};
pub use packet::{
    AgentIdx, Command, GameInfo, GameSetting, Judge, OVER, Packet, Role, SKIP, Species, Status,
    Talk, agent_label,
};
pub use reply::Reply;
