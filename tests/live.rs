#![cfg(feature = "live-capture")]

use ja3::{CaptureError, LiveSource};
use nix::unistd::Uid;
use rusty_fork::rusty_fork_test;

rusty_fork_test! {
    #[test]
    fn test_live_source_opens_loopback() {
        if !Uid::effective().is_root() {
            return;
        }
        assert!(LiveSource::open("lo").is_ok());
    }

    #[test]
    fn test_live_source_unknown_interface() {
        match LiveSource::open("ja3-no-such-if0") {
            Err(CaptureError::Live(msg)) => assert!(msg.starts_with("ja3-no-such-if0")),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("opened a nonexistent interface"),
        }
    }
}
