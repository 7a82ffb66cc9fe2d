//! Tools that act on or read from the Discord guild the agent was invoked in

pub mod identifiers;

mod get_channel_info;
mod get_server_info;
mod get_user_info;
mod react_to_message;
mod send_message;

pub use get_channel_info::GetChannelInfoTool;
pub use get_server_info::GetServerInfoTool;
pub use get_user_info::GetUserInfoTool;
pub use react_to_message::ReactToMessageTool;
pub use send_message::SendMessageTool;
