//! Random mailbox credentials.

use rand::Rng;
use serde::Serialize;
use std::fmt;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SEGMENT_LEN: usize = 8;

/// Address and password used to register and log in to a mailbox.
///
/// Serializes to the `{address, password}` body both `/accounts` and `/token` expect.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    /// Full address, `local@domain`.
    pub address: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Generate a random 8 character base-36 local part under `domain` and a
    /// password of the form `<random8>@<random8>`.
    ///
    /// Uniqueness is not checked; the provider rejects an address that already exists.
    pub fn generate(domain: &str) -> Self {
        let mut rng = rand::thread_rng();
        let local = random_segment(&mut rng);
        let password = format!(
            "{}@{}",
            random_segment(&mut rng),
            random_segment(&mut rng)
        );

        Self {
            address: format!("{local}@{domain}"),
            password,
        }
    }

    /// Use caller-chosen credentials.
    pub fn new(address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("address", &self.address)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn random_segment(rng: &mut impl Rng) -> String {
    (0..SEGMENT_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
