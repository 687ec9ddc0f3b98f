//! Application module: exposes the view model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the cursor, the input
//! mode and the notices shown to the user. Playlist state itself belongs to
//! the `PlaylistController`.

mod model;

pub use model::*;
