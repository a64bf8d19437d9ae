use markwise_core::models::assignment::{CODE_ALPHABET, CODE_LEN};
use rand::Rng;

/// Where candidate assignment codes come from. The registry checks each
/// candidate for collisions, so a source only has to produce well-formed
/// strings.
pub trait CodeSource: Send + Sync {
    fn next_code(&self) -> String;
}

/// Uniform draws from the code alphabet.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodes;

impl CodeSource for RandomCodes {
    fn next_code(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..CODE_LEN)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    }
}
