//! Command-line helper for client-managed wallet keys.
//!
//! Decrypts (or re-encrypts) wallet private keys in the hex format the
//! platform issues them in. The password comes from `OPEN_KEY_PASSWORD`,
//! falling back to a prompt on stderr.

use std::io::{BufRead, Write};

fn main() {
    dotenvy::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let command = args.next();
    let value = args.next();

    match (command.as_deref(), value) {
        (Some("decrypt"), Some(encrypted)) => {
            let password = read_password();
            match open_gateway::keycrypt::decrypt_key(encrypted.trim(), &password) {
                Ok(key) => println!("{key}"),
                Err(_) => {
                    eprintln!("Invalid Password!");
                    std::process::exit(1);
                }
            }
        }
        (Some("encrypt"), Some(plaintext)) => {
            let password = read_password();
            println!(
                "{}",
                open_gateway::keycrypt::encrypt_key(&plaintext, &password)
            );
        }
        _ => {
            eprintln!(
                "usage: open-keytool <decrypt|encrypt> <value>\n\
                 \n\
                 decrypt   hex-encoded wallet key -> plaintext key\n\
                 encrypt   plaintext key -> hex, for fixture and test data\n\
                 \n\
                 The password is read from OPEN_KEY_PASSWORD, or prompted."
            );
            std::process::exit(2);
        }
    }
}

fn read_password() -> String {
    if let Some(password) = std::env::var("OPEN_KEY_PASSWORD")
        .ok()
        .filter(|s| !s.is_empty())
    {
        return password;
    }

    eprint!("Password: ");
    let _ = std::io::stderr().flush();
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line).is_err() || line.is_empty() {
        eprintln!("failed to read password");
        std::process::exit(1);
    }
    line.trim_end_matches(['\r', '\n']).to_string()
}
