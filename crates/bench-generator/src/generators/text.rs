//! Random string generators for names, emails, and addresses.

use rand::distributions::Alphanumeric;
use rand::Rng;

const EMAIL_DOMAINS: [&str; 3] = ["example.com", "test.org", "fake.net"];

/// Generate a random ASCII alphanumeric string of `length` characters.
pub fn generate_random_string<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

/// `<8 chars>@<domain>`
pub fn generate_email<R: Rng + ?Sized>(rng: &mut R) -> String {
    let local = generate_random_string(rng, 8);
    let domain = super::pick(rng, &EMAIL_DOMAINS);
    format!("{local}@{domain}")
}

/// `<number> <street> St, <city>, <STATE> <zip>`
pub fn generate_address<R: Rng + ?Sized>(rng: &mut R) -> String {
    let number: u32 = rng.gen_range(1..=9999);
    let street = generate_random_string(rng, 10);
    let city = generate_random_string(rng, 8);
    let state = generate_random_string(rng, 2).to_uppercase();
    let zip: u32 = rng.gen_range(10000..=99999);
    format!("{number} {street} St, {city}, {state} {zip}")
}
