// src/common/locale_map.rs

//! Mapas por idioma (`{"no": "...", "en": "..."}`) usados em todo o conteúdo
//! de cursos: títulos, textos, listas de mídia, perguntas e alternativas.

use std::collections::BTreeMap;

pub type LocaleText = BTreeMap<String, String>;
pub type LocaleList = BTreeMap<String, Vec<String>>;

pub const DEFAULT_COURSE_LANGUAGE: &str = "no";

/// Garante que cada idioma ativo exista no mapa (vazios viram `""`).
/// Idiomas já preenchidos, inclusive os inativos, ficam intocados.
pub fn normalize_text(languages: &[String], map: &LocaleText) -> LocaleText {
    let mut normalized = map.clone();
    for lang in languages {
        normalized.entry(lang.clone()).or_default();
    }
    normalized
}

/// Mesma regra de `normalize_text`, para listas (vazios viram `[]`).
pub fn normalize_list(languages: &[String], map: &LocaleList) -> LocaleList {
    let mut normalized = map.clone();
    for lang in languages {
        normalized.entry(lang.clone()).or_default();
    }
    normalized
}

/// Texto para exibição: idioma pedido, depois o de fallback, depois o primeiro não vazio.
pub fn resolve<'a>(map: &'a LocaleText, lang: &str, fallback: &str) -> &'a str {
    let non_empty = |key: &str| map.get(key).map(String::as_str).filter(|s| !s.trim().is_empty());

    non_empty(lang)
        .or_else(|| non_empty(fallback))
        .or_else(|| map.values().map(String::as_str).find(|s| !s.trim().is_empty()))
        .unwrap_or("")
}

/// Limpa a lista de idiomas de um curso: trim, minúsculas, sem duplicados,
/// ordem preservada. Lista vazia vira `["no"]`.
pub fn sanitize_languages(languages: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(languages.len());
    for lang in languages {
        let code = lang.trim().to_lowercase();
        if !code.is_empty() && !cleaned.contains(&code) {
            cleaned.push(code);
        }
    }

    if cleaned.is_empty() {
        cleaned.push(DEFAULT_COURSE_LANGUAGE.to_string());
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn missing_languages_are_backfilled_with_empty_text() {
        let mut map = LocaleText::new();
        map.insert("no".into(), "Brannvern".into());

        let normalized = normalize_text(&langs(&["no", "en", "pl"]), &map);

        assert_eq!(normalized["no"], "Brannvern");
        assert_eq!(normalized["en"], "");
        assert_eq!(normalized["pl"], "");
    }

    #[test]
    fn inactive_languages_are_kept() {
        let mut map = LocaleText::new();
        map.insert("de".into(), "Brandschutz".into());

        let normalized = normalize_text(&langs(&["no"]), &map);

        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized["de"], "Brandschutz");
    }

    #[test]
    fn normalization_is_idempotent() {
        let mut map = LocaleList::new();
        map.insert("en".into(), vec!["https://cdn/a.mp4".into()]);
        let languages = langs(&["no", "en"]);

        let once = normalize_list(&languages, &map);
        let twice = normalize_list(&languages, &once);

        assert_eq!(once, twice);
        assert_eq!(once["no"], Vec::<String>::new());
    }

    #[test]
    fn resolve_falls_back_in_order() {
        let mut map = LocaleText::new();
        map.insert("no".into(), "Hei".into());
        map.insert("en".into(), "  ".into());

        assert_eq!(resolve(&map, "en", "no"), "Hei");
        assert_eq!(resolve(&map, "pl", "sv"), "Hei");
        assert_eq!(resolve(&LocaleText::new(), "no", "en"), "");
    }

    #[test]
    fn languages_are_cleaned() {
        assert_eq!(sanitize_languages(&langs(&[" NO", "en", "no", ""])), langs(&["no", "en"]));
        assert_eq!(sanitize_languages(&[]), langs(&["no"]));
    }
}
