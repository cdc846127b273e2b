use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Nosso tipo de erro interno. Os handlers nunca devolvem isto diretamente:
// convertem com `to_api_error` para ganhar a mensagem traduzida.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Telefone já existe")]
    PhoneAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Empresa não encontrada")]
    CompanyNotFound,

    #[error("Cliente não encontrado")]
    CustomerNotFound,

    #[error("Cliente pai inválido")]
    InvalidParentCustomer,

    #[error("Curso não encontrado")]
    CourseNotFound,

    #[error("Módulo não encontrado")]
    ModuleNotFound,

    #[error("Pergunta inválida: {0}")]
    InvalidQuestion(String),

    #[error("Curso não concluído")]
    CourseNotCompleted,

    #[error("Modelo de diploma não encontrado")]
    TemplateNotFound,

    #[error("Código de convite inválido")]
    InvalidInviteCode,

    #[error("Código de login inválido ou expirado")]
    InvalidMagicCode,

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Falha no gateway de SMS: {0}")]
    SmsGateway(String),

    #[error("Serviço externo indisponível: {0}")]
    UpstreamUnavailable(#[from] reqwest::Error),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// O erro que efetivamente sai pela API: status + mensagem já traduzida.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl AppError {
    /// Chave de tradução e status HTTP de cada variante.
    fn status_and_key(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "email_exists"),
            AppError::PhoneAlreadyExists => (StatusCode::CONFLICT, "phone_exists"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found"),
            AppError::CompanyNotFound => (StatusCode::NOT_FOUND, "company_not_found"),
            AppError::CustomerNotFound => (StatusCode::NOT_FOUND, "customer_not_found"),
            AppError::InvalidParentCustomer => (StatusCode::BAD_REQUEST, "invalid_parent_customer"),
            AppError::CourseNotFound => (StatusCode::NOT_FOUND, "course_not_found"),
            AppError::ModuleNotFound => (StatusCode::NOT_FOUND, "module_not_found"),
            AppError::InvalidQuestion(_) => (StatusCode::BAD_REQUEST, "invalid_question"),
            AppError::CourseNotCompleted => (StatusCode::CONFLICT, "course_not_completed"),
            AppError::TemplateNotFound => (StatusCode::NOT_FOUND, "template_not_found"),
            AppError::InvalidInviteCode => (StatusCode::BAD_REQUEST, "invalid_invite_code"),
            AppError::InvalidMagicCode => (StatusCode::UNAUTHORIZED, "invalid_magic_code"),
            AppError::UniqueConstraintViolation(_) => (StatusCode::CONFLICT, "already_exists"),
            AppError::SmsGateway(_) => (StatusCode::BAD_GATEWAY, "sms_failed"),
            AppError::UpstreamUnavailable(_) => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let (status, key) = self.status_and_key();

        if status == StatusCode::INTERNAL_SERVER_ERROR || status == StatusCode::BAD_GATEWAY {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let mut message = store.translate(&locale.0, key);

        // Algumas variantes carregam um detalhe que o usuário precisa ver
        match self {
            AppError::InvalidInput(detail)
            | AppError::InvalidQuestion(detail)
            | AppError::UniqueConstraintViolation(detail) => {
                message = format!("{}: {}", message, detail);
            }
            _ => {}
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            let code = e.message.as_deref().unwrap_or(e.code.as_ref());
                            Value::String(store.translate(&locale.0, code))
                        })
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                Some(Value::Object(details))
            }
            _ => None,
        };

        ApiError { status, error: message, details }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Usado apenas onde não há Locale à mão (extratores), cai no idioma padrão.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::default())
            .into_response()
    }
}

/// Converte violações de unicidade do Postgres em erros de domínio.
pub(crate) fn map_unique_violation(e: sqlx::Error, on_unique: impl FnOnce(&str) -> AppError) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique(db_err.constraint().unwrap_or_default());
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "required"))]
        name: String,
    }

    #[test]
    fn not_found_maps_to_norwegian_message() {
        let store = I18nStore::default();
        let api = AppError::CourseNotFound.to_api_error(&Locale("nb".into()), &store);
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.error, "Kurset ble ikke funnet.");
    }

    #[test]
    fn english_locale_is_honoured() {
        let store = I18nStore::default();
        let api = AppError::Forbidden.to_api_error(&Locale("en".into()), &store);
        assert_eq!(api.status, StatusCode::FORBIDDEN);
        assert_eq!(api.error, "You do not have access to this resource.");
    }

    #[test]
    fn internal_errors_use_generic_fallback() {
        let store = I18nStore::default();
        let err = AppError::InternalServerError(anyhow::anyhow!("disk on fire"));
        let api = err.to_api_error(&Locale::default(), &store);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("disk"));
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let store = I18nStore::default();
        let errors = Payload { name: String::new() }.validate().unwrap_err();
        let api = AppError::ValidationError(errors).to_api_error(&Locale::default(), &store);

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["name"][0], "Feltet er påkrevd.");
    }

    #[test]
    fn question_detail_is_appended() {
        let store = I18nStore::default();
        let api = AppError::InvalidQuestion("q1".into()).to_api_error(&Locale::default(), &store);
        assert!(api.error.ends_with(": q1"));
    }
}
