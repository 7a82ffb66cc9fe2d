mod agent;
mod channel;
mod guild;
mod message;
mod user;

pub use agent::{Agent, InstructionOutcome};
pub use channel::Channel;
pub use guild::Guild;
pub use message::{NewMessage, StoredMessage};
pub use user::User;
