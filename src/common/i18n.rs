// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "nb";
const FALLBACK_LANG: &str = "en";

// (chave, norsk bokmål, english)
const MESSAGES: &[(&str, &str, &str)] = &[
    ("validation_failed", "Ett eller flere felt er ugyldige.", "One or more fields are invalid."),
    ("invalid_input", "Ugyldig forespørsel", "Invalid request"),
    ("required", "Feltet er påkrevd.", "This field is required."),
    ("invalid_email", "E-postadressen er ugyldig.", "The e-mail address is invalid."),
    ("invalid_phone", "Telefonnummeret er ugyldig.", "The phone number is invalid."),
    ("password_too_short", "Passordet må ha minst 6 tegn.", "The password must be at least 6 characters."),
    ("email_exists", "E-postadressen er allerede i bruk.", "This e-mail address is already in use."),
    ("phone_exists", "Telefonnummeret er allerede i bruk.", "This phone number is already in use."),
    ("invalid_credentials", "Feil brukernavn eller passord.", "Invalid username or password."),
    ("invalid_token", "Innloggingen er ugyldig eller utløpt.", "Authentication token is invalid or missing."),
    ("forbidden", "Du har ikke tilgang til denne ressursen.", "You do not have access to this resource."),
    ("user_not_found", "Brukeren ble ikke funnet.", "User not found."),
    ("company_not_found", "Selskapet ble ikke funnet.", "Company not found."),
    ("customer_not_found", "Kunden ble ikke funnet.", "Customer not found."),
    ("invalid_parent_customer", "Ugyldig overordnet kunde.", "Invalid parent customer."),
    ("course_not_found", "Kurset ble ikke funnet.", "Course not found."),
    ("module_not_found", "Modulen ble ikke funnet.", "Module not found."),
    ("invalid_question", "Ugyldig spørsmål", "Invalid question"),
    ("course_not_completed", "Kurset er ikke fullført.", "The course has not been completed."),
    ("template_not_found", "Diplommalen ble ikke funnet.", "Diploma template not found."),
    ("invalid_invite_code", "Invitasjonskoden er ugyldig eller utløpt.", "The invite code is invalid or expired."),
    ("invalid_magic_code", "Innloggingskoden er ugyldig eller utløpt.", "The login code is invalid or expired."),
    ("already_exists", "Finnes allerede", "Already exists"),
    ("sms_failed", "Kunne ikke sende SMS.", "Could not send SMS."),
    ("upstream_unavailable", "En ekstern tjeneste er ikke tilgjengelig akkurat nå.", "An external service is unavailable right now."),
    ("internal_error", "Noe gikk galt. Prøv igjen senere.", "Something went wrong. Please try again later."),
];

/// Catálogo de mensagens por idioma. Montado uma vez e partilhado no AppState.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        let mut nb = HashMap::new();
        let mut en = HashMap::new();
        for (key, nb_msg, en_msg) in MESSAGES {
            nb.insert(*key, *nb_msg);
            en.insert(*key, *en_msg);
        }

        let mut messages = HashMap::new();
        messages.insert(DEFAULT_LANG, nb);
        messages.insert(FALLBACK_LANG, en);
        Self { messages }
    }
}

impl I18nStore {
    /// Resolve a chave no idioma pedido, depois no padrão (norueguês).
    /// Chaves desconhecidas são devolvidas como estão.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        let lang = normalize_lang(lang);
        self.messages
            .get(lang)
            .and_then(|table| table.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|t| t.get(key)))
            .map(|msg| msg.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

/// Só há catálogo inglês e bokmål; "no", "nn" e o resto caem no bokmål.
pub fn normalize_lang(lang: &str) -> &'static str {
    match lang {
        "en" => FALLBACK_LANG,
        _ => DEFAULT_LANG,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norwegian_variants_share_catalogue() {
        let store = I18nStore::default();
        assert_eq!(store.translate("nn", "forbidden"), store.translate("nb", "forbidden"));
        assert_eq!(store.translate("no", "forbidden"), store.translate("nb", "forbidden"));
    }

    #[test]
    fn unknown_language_falls_back_to_norwegian() {
        let store = I18nStore::default();
        assert_eq!(store.translate("de", "user_not_found"), "Brukeren ble ikke funnet.");
    }

    #[test]
    fn unknown_key_is_echoed() {
        let store = I18nStore::default();
        assert_eq!(store.translate("en", "does_not_exist"), "does_not_exist");
    }
}
