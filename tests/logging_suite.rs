use resonant_worlds::logging::install_panic_hook;
use resonant_worlds::orchestrator::{panic_is_guarded, FaultGuard};
use std::io::Write;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[test]
fn guard_flag_tracks_the_guarded_section() {
    let mut guard = FaultGuard::new();
    assert!(!panic_is_guarded());
    assert_eq!(guard.run("clean", panic_is_guarded), Some(true));
    assert!(!panic_is_guarded());

    let _: Option<()> = guard.run("nested", || {
        let mut inner = FaultGuard::new();
        let _: Option<()> = inner.run("inner", || panic!("inner fault"));
        assert!(panic_is_guarded(), "outer section survives an inner fault");
        panic!("outer fault");
    });
    assert!(!panic_is_guarded());
    assert_eq!(guard.faults(), 1);
}

#[test]
fn repeated_style_faults_are_throttled_in_the_log() {
    install_panic_hook();
    let captured = Captured::default();
    let sink = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || sink.clone())
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut guard = FaultGuard::new();
        for _ in 0..10 {
            let _: Option<()> = guard.run("flaky", || panic!("style exploded"));
        }
        assert_eq!(guard.faults(), 10);

        let _ = std::panic::catch_unwind(|| panic!("loose panic"));
    });

    let log = captured.text();
    assert_eq!(log.matches("style fault").count(), 1, "{log}");
    assert!(!log.contains("panic: style exploded"), "{log}");
    assert!(log.contains("panic: loose panic"), "{log}");
}
