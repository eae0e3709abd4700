//! Print the Argon2id PHC hash of a password, for seeding the user file.
//!
//! ```text
//! hash-password <password>
//! ```

use std::process::ExitCode;

use marketplace_api::auth::password::hash_password;

fn main() -> ExitCode {
    let Some(password) = std::env::args().nth(1) else {
        eprintln!("usage: hash-password <password>");
        return ExitCode::from(2);
    };

    match hash_password(&password) {
        Ok(hash) => {
            println!("{hash}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("hashing failed: {e}");
            ExitCode::FAILURE
        }
    }
}
