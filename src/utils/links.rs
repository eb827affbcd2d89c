//! Random capability link generation

use rand::{distributions::Uniform, Rng};

/// Length of edit and public links
pub const LINK_LENGTH: usize = 8;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random lowercase-alphanumeric link of the given length
pub fn random_link(length: usize) -> String {
    let mut rng = rand::thread_rng();
    let pick = Uniform::from(0..ALPHABET.len());
    (0..length)
        .map(|_| ALPHABET[rng.sample(pick)] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_shape() {
        for _ in 0..100 {
            let link = random_link(LINK_LENGTH);
            assert_eq!(link.len(), LINK_LENGTH);
            assert!(link
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_links_differ() {
        assert_ne!(random_link(LINK_LENGTH), random_link(LINK_LENGTH));
    }
}
