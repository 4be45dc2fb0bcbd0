// Random document id generation

use rand::distr::{Alphanumeric, SampleString};

/// Length of generated Firestore document ids
const ID_LEN: usize = 20;

/// Generate a random alphanumeric document id
pub fn random_id() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), ID_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_id_shape() {
        let id = random_id();
        assert_eq!(id.len(), 20);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(random_id(), random_id());
    }
}
