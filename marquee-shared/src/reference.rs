use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

/// Generate a booking reference shared by all seats in one purchase.
///
/// Format: `BK-<unix timestamp>-<random token>-<user id prefix>`. The random
/// token plus the timestamp makes collisions between concurrent checkouts
/// practically impossible; the user prefix aids support lookups.
pub fn booking_reference(user_id: Uuid) -> String {
    let ts = Utc::now().timestamp();
    let token: u32 = rand::thread_rng().gen();
    let user = user_id.simple().to_string();
    format!("BK-{}-{:08X}-{}", ts, token, &user[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_format() {
        let user = Uuid::new_v4();
        let reference = booking_reference(user);

        let parts: Vec<&str> = reference.split('-').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "BK");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 8);
        assert_eq!(parts[3], &user.simple().to_string()[..8]);
    }

    #[test]
    fn test_references_are_unique() {
        let user = Uuid::new_v4();
        let a = booking_reference(user);
        let b = booking_reference(user);
        assert_ne!(a, b);
    }
}
