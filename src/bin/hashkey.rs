use sha2::{Digest, Sha256};

fn main() {
    let passkey = std::env::args().nth(1).expect("Usage: hashkey <passkey>");
    let mut hasher = Sha256::new();
    hasher.update(passkey.trim().as_bytes());
    println!("{}", hex::encode(hasher.finalize()));
}
