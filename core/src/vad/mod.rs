pub mod session;
pub mod state;

pub use session::VadSession;
pub use state::RecurrentState;
