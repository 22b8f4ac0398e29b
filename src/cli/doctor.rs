//! Configuration diagnostics
//!
//! Checks the environment without sending any traffic upstream.

use kasirise_llm::util::mask_api_key;
use std::path::Path;

/// Run all checks and report. Exits non-zero when a required check fails.
pub fn run() -> anyhow::Result<()> {
    println!("KasiRise Doctor\n");

    let mut all_ok = true;

    all_ok &= check_env_file();
    all_ok &= check_api_key();
    check_model();

    println!();
    if all_ok {
        println!("All checks passed. Ready to chat.");
    } else {
        println!("Some checks failed. Fix the issues above and re-run.");
        std::process::exit(1);
    }

    Ok(())
}

fn check_env_file() -> bool {
    print!("Checking .env file... ");
    if Path::new(".env").exists() {
        println!("found");
    } else {
        println!("not found (environment variables still apply)");
    }
    true
}

fn check_api_key() -> bool {
    print!("Checking Gemini API key... ");
    let key = std::env::var("GEMINI_API_KEY")
        .or_else(|_| std::env::var("GOOGLE_API_KEY"))
        .unwrap_or_default();

    if key.is_empty() {
        println!("missing. Set GEMINI_API_KEY (or GOOGLE_API_KEY).");
        false
    } else if key.contains("your") {
        println!("looks like a placeholder: {}", mask_api_key(&key));
        false
    } else {
        println!("configured ({})", mask_api_key(&key));
        true
    }
}

fn check_model() {
    print!("Checking model... ");
    match std::env::var("GEMINI_MODEL") {
        Ok(model) if !model.is_empty() => println!("{model} (from GEMINI_MODEL)"),
        _ => println!("{} (default)", kasirise_llm::DEFAULT_MODEL),
    }
}
