pub mod message;
pub mod traits;

pub use message::{ContentBlock, ImageBlock, UserTurn};
pub use traits::WorkspaceResolver;
