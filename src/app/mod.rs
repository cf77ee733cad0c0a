mod dispatch;
mod effects;
mod input;
mod items;
mod state;

pub use dispatch::{dispatch, Event};
pub use effects::{run, Collaborators};
pub use input::{Key, TextInput};
pub use items::ListItem;
pub use state::{highlight_matches, Modal, NoteField, Picker, Screen, Session, SessionInit};
