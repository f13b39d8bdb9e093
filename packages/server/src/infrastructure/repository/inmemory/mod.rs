pub mod room;
pub mod session;

pub use room::InMemoryRoomRepository;
pub use session::InMemorySessionStore;
