//! Properties of the line reader over arbitrary device chatter.

use proptest::prelude::*;
use serial_hil_tester::{Channel, MockSerialPort};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_millis(100);

fn noise_line() -> impl Strategy<Value = String> {
    "[a-z :=0-9]{0,20}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn returns_first_line_containing_marker(
        before in prop::collection::vec(noise_line(), 0..8),
        value in 0i64..1000,
        after in prop::collection::vec(noise_line(), 0..4),
    ) {
        let target = format!("Received: {value} !");
        let mut lines = before.clone();
        lines.push(format!("  {target}  "));
        lines.extend(after.iter().cloned());
        lines.push(format!("Received: {} !", value + 1));

        let port = MockSerialPort::with_lines("COM6", lines.iter());
        let mut channel = Channel::new("DUT", Box::new(port.clone()));

        // Noise is lowercase and has no '!', so it can never match.
        let line = channel.read_until_expected("Received:", TIMEOUT).unwrap();
        prop_assert_eq!(line, target);

        // Everything after the match is left for the next read.
        let rest: Vec<String> =
            std::iter::from_fn(|| channel.read_line(Duration::from_millis(5)).ok().flatten())
                .collect();
        prop_assert_eq!(rest.len(), after.len() + 1);
    }

    #[test]
    fn never_matches_without_marker(lines in prop::collection::vec(noise_line(), 0..6)) {
        let port = MockSerialPort::with_lines("COM6", lines.iter());
        let mut channel = Channel::new("DUT", Box::new(port));

        let err = channel
            .read_until_expected("STATUS:", Duration::from_millis(20))
            .unwrap_err();
        prop_assert!(err.to_string().starts_with("TIMEOUT"));
    }
}
