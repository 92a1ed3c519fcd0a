pub mod controller;
pub mod events;
pub mod runtime;
pub mod state;
pub mod ticker;

pub use controller::{FinishOutcome, SessionController};
pub use events::{SessionEvent, SessionView};
pub use runtime::{spawn_session, SessionHandle};
pub use state::{SessionContext, SessionStatus};
pub use ticker::Ticker;
