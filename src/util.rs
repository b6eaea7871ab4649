//! Utility helpers shared by the service and the collectors.
//!
//! This module contains:
//! - Synchronous base-field probes
//! - Device id generation
//! - Panic payload formatting
//!
//! IMPORTANT:
//! - No collector-specific logic should live here.
//!

use std::any::Any;
use std::hint::black_box;

use rand::random_range;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Returns byte 3 of a runtime-computed `f32` NaN in native byte order.
///
/// The NaN comes from `inf - inf`, whose sign and payload depend on the
/// FPU, so the byte differs between architectures and byte orders.
/// `black_box` keeps the subtraction out of constant folding.
pub fn endianness_byte() -> i64 {
    let inf = black_box(f32::INFINITY);
    let nan = inf - inf;
    nan.to_ne_bytes()[3] as i64
}

/// Generates a random lowercase hex string with exactly `length` characters.
pub fn generate_device_id(length: usize) -> String {
    (0..length)
        .map(|_| HEX_DIGITS[random_range(0..HEX_DIGITS.len())] as char)
        .collect()
}

/// Extracts a readable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_has_requested_length_and_alphabet() {
        for len in [0, 1, 7, 32] {
            let id = generate_device_id(len);
            assert_eq!(id.len(), len);
            assert!(id.bytes().all(|b| HEX_DIGITS.contains(&b)));
        }
    }

    #[test]
    fn endianness_byte_is_stable_within_a_process() {
        assert_eq!(endianness_byte(), endianness_byte());
        assert!((0..=255).contains(&endianness_byte()));
    }

    #[test]
    fn panic_message_handles_both_string_kinds() {
        let static_payload: Box<dyn Any + Send> = Box::new("boom");
        let owned_payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let other_payload: Box<dyn Any + Send> = Box::new(7_u8);

        assert_eq!(panic_message(static_payload.as_ref()), "boom");
        assert_eq!(panic_message(owned_payload.as_ref()), "bang");
        assert_eq!(panic_message(other_payload.as_ref()), "unknown panic");
    }
}
