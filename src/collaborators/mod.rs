//! Narrow capabilities for everything around the core: getting source images,
//! setting the desktop background, and announcing the result.
//!
//! None of these are used by the palette extraction or composition themselves.

mod notify;
mod source;
mod wallpaper;

pub use notify::{LogNotifier, Notifier};
pub use source::{DayCode, DirectorySource, ImageSource, InvalidDayCode};
pub use wallpaper::{CommandSetter, Desktop, SetWallpaperError, WallpaperSetter};
