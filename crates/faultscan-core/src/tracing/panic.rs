//! Panic reporting through the log sink.
//!
//! The default hook writes straight to stderr and would interleave with
//! records from the sink. Units that panic are still caught and reported
//! by the orchestrator; this hook only replaces the raw message.

use std::any::Any;
use std::panic::{self, Location};

/// Replace the process panic hook with one that logs at error level.
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let message = payload_message(info.payload());
        let location = info.location().map(describe_location);
        let thread = std::thread::current();
        tracing::error!(
            target: "faultscan::panic",
            thread = thread.name().unwrap_or("<unnamed>"),
            location = location.as_deref().unwrap_or("<unknown>"),
            "panicked: {message}"
        );
    }));
}

/// Text of a panic payload, for the two payload types `panic!` produces.
pub fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn describe_location(location: &Location<'_>) -> String {
    format!("{}:{}:{}", location.file(), location.line(), location.column())
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::tracing::LogSink;

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn panics_are_logged_through_the_sink() {
        let captured = Shared::default();
        let sink = LogSink::start_with(Box::new(captured.clone()), None);
        let subscriber = tracing_subscriber::fmt()
            .with_writer(sink.make_writer())
            .with_ansi(false)
            .finish();

        install_panic_hook();
        let outcome = tracing::subscriber::with_default(subscriber, || {
            panic::catch_unwind(|| panic!("unit exploded"))
        });
        let _ = panic::take_hook();
        assert!(outcome.is_err());

        sink.flush();
        let text = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("panicked: unit exploded"), "{text}");
        assert!(text.contains("faultscan::panic"), "{text}");
        assert!(text.contains("panic.rs"), "{text}");
    }

    #[test]
    fn payload_messages() {
        let p: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(payload_message(p.as_ref()), "boom");
        let p: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(payload_message(p.as_ref()), "bang");
        let p: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(payload_message(p.as_ref()), "non-string panic payload");
    }

    #[test]
    fn location_is_file_line_column() {
        let here = Location::caller();
        let text = describe_location(here);
        assert!(text.starts_with(here.file()));
        assert!(text.ends_with(&format!(":{}:{}", here.line(), here.column())));
    }
}
