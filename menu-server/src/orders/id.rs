//! Order id generation
//!
//! `PED` + last 6 digits of the ms timestamp + 3-digit random suffix.
//! Two checkouts in the same millisecond window can collide; the create
//! precondition in the submit batch turns that into an error instead of an
//! overwrite.

use rand::Rng;

use crate::utils::time::Clock;

pub const ORDER_ID_PREFIX: &str = "PED";

pub fn generate_order_id(millis: i64, random: u32) -> String {
    format!(
        "{}{:06}{:03}",
        ORDER_ID_PREFIX,
        millis.rem_euclid(1_000_000),
        random % 1000
    )
}

pub fn next_order_id(clock: &dyn Clock) -> String {
    let random = rand::thread_rng().gen_range(0..1000);
    generate_order_id(clock.now_millis(), random)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(generate_order_id(1_717_232_742_123, 7), "PED742123007");
        assert_eq!(generate_order_id(1_700_000_000_042, 999), "PED000042999");
    }

    #[test]
    fn test_next_order_id_shape() {
        let clock = crate::utils::time::SystemClock;
        let id = next_order_id(&clock);
        assert!(id.starts_with(ORDER_ID_PREFIX));
        assert_eq!(id.len(), 12);
        assert!(id[3..].chars().all(|c| c.is_ascii_digit()));
    }
}
