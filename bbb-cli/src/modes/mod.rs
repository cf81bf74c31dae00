pub mod completion;
pub mod recording;
pub mod room;
pub mod settings;
