// src/common/codes.rs

use rand::Rng;

// Sem 0/O, 1/I/L: os códigos são digitados a partir de um SMS.
const UNAMBIGUOUS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

pub const INVITE_CODE_LEN: usize = 8;
pub const TEMP_PASSWORD_LEN: usize = 8;
pub const MAGIC_CODE_LEN: usize = 12;

pub fn random_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| UNAMBIGUOUS[rng.gen_range(0..UNAMBIGUOUS.len())] as char)
        .collect()
}

/// Normaliza o que o usuário digitou antes de procurar o código.
pub fn normalize_code(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_use_only_unambiguous_characters() {
        let code = random_code(64);
        assert_eq!(code.len(), 64);
        assert!(code.bytes().all(|b| UNAMBIGUOUS.contains(&b)));
    }

    #[test]
    fn typed_codes_are_normalized() {
        assert_eq!(normalize_code(" abcd-efgh "), "ABCDEFGH");
    }
}
