use log::info;
use std::convert::Infallible;

/// Something that can post messages to a channel, e.g., a chat bot.
pub trait Notifier {
    /// The error type returned when sending fails.
    type Error;

    /// Sends a plain text message.
    ///
    /// # Errors
    /// Implementation specific.
    fn send_text(&self, text: &str) -> Result<(), Self::Error>;

    /// Sends an encoded image with a caption.
    ///
    /// # Errors
    /// Implementation specific.
    fn send_image(&self, image: &[u8], caption: &str) -> Result<(), Self::Error>;
}

/// A [`Notifier`] that writes every message to the [`log`] facade at the info level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    type Error = Infallible;

    fn send_text(&self, text: &str) -> Result<(), Self::Error> {
        info!("{text}");
        Ok(())
    }

    fn send_image(&self, image: &[u8], caption: &str) -> Result<(), Self::Error> {
        info!("{caption} ({} byte image)", image.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Keeps every message it is sent.
    #[derive(Default)]
    struct Recorder(RefCell<Vec<String>>);

    impl Notifier for Recorder {
        type Error = Infallible;

        fn send_text(&self, text: &str) -> Result<(), Self::Error> {
            self.0.borrow_mut().push(text.to_owned());
            Ok(())
        }

        fn send_image(&self, image: &[u8], caption: &str) -> Result<(), Self::Error> {
            self.0.borrow_mut().push(format!("{caption}: {}", image.len()));
            Ok(())
        }
    }

    fn announce<N: Notifier>(notifier: &N, palette: &[&str]) -> Result<(), N::Error> {
        notifier.send_text(&palette.join(" "))?;
        notifier.send_image(&[0; 16], "wallpaper")
    }

    #[test]
    fn notifiers_receive_messages() {
        assert_eq!(announce(&LogNotifier, &["#0a0a0a", "#c8c8c8"]), Ok(()));

        let recorder = Recorder::default();
        assert_eq!(announce(&recorder, &["#0a0a0a", "#c8c8c8"]), Ok(()));
        assert_eq!(recorder.0.into_inner(), ["#0a0a0a #c8c8c8", "wallpaper: 16"]);
    }
}
