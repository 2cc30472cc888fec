//! User-facing notification sink.
//!
//! The core never talks to a desktop notification API directly. It reports
//! through [`Notifier`], which the embedding shell implements; the default
//! [`LogNotifier`] just writes to the log.

use crate::util::truncate_with_ellipsis;

/// Longest error body shown to the user before it is cut.
pub const MAX_BODY_CHARS: usize = 100;

pub trait Notifier: Send + Sync {
    fn info(&self, title: &str, body: &str);
    fn error(&self, title: &str, body: &str);
}

/// Forwards every notification to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn info(&self, title: &str, body: &str) {
        log::info!("{}: {}", title, body);
    }

    fn error(&self, title: &str, body: &str) {
        log::error!("{}: {}", title, body);
    }
}

/// Send an error notification, shortening long bodies.
pub fn notify_error(notifier: &dyn Notifier, title: &str, error: &str) {
    notifier.error(title, &truncate_with_ellipsis(error, MAX_BODY_CHARS));
}

/// Tell the user dictated text was added to a note.
pub fn notify_transcription_complete(notifier: &dyn Notifier, words: usize) {
    let body = match words {
        1 => "1 word added to the transcript.".to_string(),
        n => format!("{} words added to the transcript.", n),
    };
    notifier.info("Transcription complete", &body);
}

#[cfg(test)]
pub mod test_utils {
    use parking_lot::Mutex;

    use super::Notifier;

    /// Collects notifications for assertions.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub infos: Mutex<Vec<(String, String)>>,
        pub errors: Mutex<Vec<(String, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn info(&self, title: &str, body: &str) {
            self.infos.lock().push((title.to_string(), body.to_string()));
        }

        fn error(&self, title: &str, body: &str) {
            self.errors.lock().push((title.to_string(), body.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::RecordingNotifier;
    use super::*;

    #[test]
    fn test_long_error_body_is_truncated() {
        let notifier = RecordingNotifier::default();
        let long = "x".repeat(150);
        notify_error(&notifier, "Save failed", &long);

        let errors = notifier.errors.lock();
        assert_eq!(errors[0].0, "Save failed");
        assert_eq!(errors[0].1, format!("{}...", "x".repeat(100)));
    }

    #[test]
    fn test_short_error_body_kept() {
        let notifier = RecordingNotifier::default();
        notify_error(&notifier, "Oops", "disk full");
        assert_eq!(notifier.errors.lock()[0].1, "disk full");
    }

    #[test]
    fn test_transcription_complete_wording() {
        let notifier = RecordingNotifier::default();
        notify_transcription_complete(&notifier, 1);
        notify_transcription_complete(&notifier, 12);
        let infos = notifier.infos.lock();
        assert_eq!(infos[0].1, "1 word added to the transcript.");
        assert_eq!(infos[1].1, "12 words added to the transcript.");
    }
}
