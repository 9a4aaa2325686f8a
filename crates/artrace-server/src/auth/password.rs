use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Hash a password with Argon2id.
///
/// `m_cost` is the memory cost in KB (64MB by default).
pub fn hash_password(password: &str, m_cost: u32) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let params =
        Params::new(m_cost, 3, 1, Some(32)).map_err(|e| anyhow!("argon2 params: {}", e))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("hash_password: {}", e))?;
    Ok(hash.to_string())
}

/// Verify a password against an Argon2id hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

const SYMBOLS: &str = "@$!%*?&";

/// Validate password strength: minimum 8 characters with at least one
/// uppercase letter, one lowercase letter, one digit and one symbol
/// from `@$!%*?&`.
pub fn validate_password_strength(password: &str) -> Result<()> {
    if password.trim().is_empty() {
        return Err(anyhow!("password cannot be empty or whitespace-only"));
    }
    if password.len() < 8 {
        return Err(anyhow!("password must be at least 8 characters"));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(anyhow!("password must contain an uppercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(anyhow!("password must contain a lowercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(anyhow!("password must contain a digit"));
    }
    if !password.chars().any(|c| SYMBOLS.contains(c)) {
        return Err(anyhow!(
            "password must contain one of the symbols {}",
            SYMBOLS
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_password_strength;

    #[test]
    fn rejects_whitespace_only_password() {
        assert!(validate_password_strength("            ").is_err());
    }

    #[test]
    fn rejects_short_password() {
        assert!(validate_password_strength("Ab1!").is_err());
    }

    #[test]
    fn rejects_missing_symbol() {
        assert!(validate_password_strength("Abcdef12").is_err());
    }

    #[test]
    fn rejects_missing_uppercase() {
        assert!(validate_password_strength("abcdef1!").is_err());
    }

    #[test]
    fn accepts_valid_password() {
        assert!(validate_password_strength("Str0ng!pass").is_ok());
    }
}
