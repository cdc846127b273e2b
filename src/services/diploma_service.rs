// src/services/diploma_service.rs

use chrono::{DateTime, Utc};
use genpdf::{elements, style, Alignment, Element};
use image::Luma;
use qrcode::QrCode;
use uuid::Uuid;

use crate::{
    common::{error::AppError, locale_map::resolve},
    db::{CourseRepository, DiplomaRepository, ProgressRepository},
    models::{
        auth::User,
        diploma::{DiplomaRequest, DiplomaTemplate, DiplomaTemplatePayload},
    },
    services::authz::AccessPolicy,
};

const DEFAULT_TITLE: &str = "Kursbevis";
const DEFAULT_BODY: &str = "{name} har fullført kurset «{course}» den {date}.";

/// Troca `{name}`, `{course}` e `{date}` no texto do modelo.
pub fn fill_placeholders(body: &str, name: &str, course: &str, date: DateTime<Utc>) -> String {
    body.replace("{name}", name)
        .replace("{course}", course)
        .replace("{date}", &date.format("%d.%m.%Y").to_string())
}

/// Conteúdo já resolvido de um diploma, independente do PDF.
#[derive(Debug, Clone, PartialEq)]
pub struct DiplomaContent {
    pub title: String,
    pub text: String,
    pub signature_name: Option<String>,
    pub issuer_name: Option<String>,
    pub verification_code: String,
}

#[derive(Clone)]
pub struct DiplomaService {
    diploma_repo: DiplomaRepository,
    course_repo: CourseRepository,
    progress_repo: ProgressRepository,
    policy: AccessPolicy,
    fonts_dir: String,
}

impl DiplomaService {
    pub fn new(
        diploma_repo: DiplomaRepository,
        course_repo: CourseRepository,
        progress_repo: ProgressRepository,
        policy: AccessPolicy,
        fonts_dir: String,
    ) -> Self {
        Self { diploma_repo, course_repo, progress_repo, policy, fonts_dir }
    }

    // =========================================================================
    //  1. MODELOS
    // =========================================================================

    pub async fn create_template(&self, actor: &User, input: &DiplomaTemplatePayload) -> Result<DiplomaTemplate, AppError> {
        self.policy.ensure_system_owner(actor)?;
        self.diploma_repo.create(input).await
    }

    pub async fn list_templates(&self, actor: &User, company_id: Uuid) -> Result<Vec<DiplomaTemplate>, AppError> {
        self.policy.ensure_system_owner(actor)?;
        self.diploma_repo.list_by_company(company_id).await
    }

    async fn editable_template(&self, actor: &User, id: Uuid) -> Result<DiplomaTemplate, AppError> {
        self.policy.ensure_system_owner(actor)?;
        let template = self
            .diploma_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::TemplateNotFound)?;
        Ok(template)
    }

    pub async fn get_template(&self, actor: &User, id: Uuid) -> Result<DiplomaTemplate, AppError> {
        self.editable_template(actor, id).await
    }

    pub async fn update_template(
        &self,
        actor: &User,
        id: Uuid,
        input: &DiplomaTemplatePayload,
    ) -> Result<DiplomaTemplate, AppError> {
        let template = self.editable_template(actor, id).await?;
        // Modelo não muda de empresa
        if template.company_id != input.company_id {
            return Err(AppError::InvalidInput("companyId".into()));
        }
        self.diploma_repo.update(id, input).await
    }

    pub async fn delete_template(&self, actor: &User, id: Uuid) -> Result<(), AppError> {
        self.editable_template(actor, id).await?;
        self.diploma_repo.delete(id).await
    }

    // =========================================================================
    //  2. GERAÇÃO DO PDF
    // =========================================================================

    /// O próprio aluno, ou um admin de um dos clientes dele, pode gerar o diploma.
    pub async fn render(&self, actor: &User, request: &DiplomaRequest) -> Result<Vec<u8>, AppError> {
        let course = self
            .course_repo
            .find_by_id(request.course_id)
            .await?
            .ok_or(AppError::CourseNotFound)?;

        let user_id = request.user_id.unwrap_or(actor.id);
        self.policy.ensure_admin_over_user(actor, user_id).await?;

        let completion = self
            .progress_repo
            .find_completion(user_id, course.id)
            .await?
            .ok_or(AppError::CourseNotCompleted)?;

        let template = match course.diploma_template_id {
            Some(id) => self.diploma_repo.find_by_id(id).await?,
            None => None,
        };

        let lang = request.lang.as_deref().unwrap_or("no");
        let course_title = resolve(&completion.course_title, lang, "no");

        let content = DiplomaContent {
            title: template.as_ref().map_or(DEFAULT_TITLE.to_string(), |t| t.title.clone()),
            text: fill_placeholders(
                template.as_ref().map_or(DEFAULT_BODY, |t| t.body.as_str()),
                &completion.user_name,
                course_title,
                completion.completed_at,
            ),
            signature_name: template.as_ref().and_then(|t| t.signature_name.clone()),
            issuer_name: template.and_then(|t| t.issuer_name),
            verification_code: completion.id.to_string(),
        };

        tracing::info!(completion_id = %completion.id, actor = %actor.id, "Gerando diploma");
        self.build_pdf(&content)
    }

    fn build_pdf(&self, content: &DiplomaContent) -> Result<Vec<u8>, AppError> {
        // Carrega a fonte da pasta configurada
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, "Roboto", None)
            .map_err(|_| AppError::FontNotFound(format!("Roboto em {}", self.fonts_dir)))?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(content.title.clone());
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(20);
        doc.set_page_decorator(decorator);

        if let Some(issuer) = &content.issuer_name {
            doc.push(centered(issuer).styled(style::Style::new().with_font_size(12)));
            doc.push(elements::Break::new(2));
        }

        doc.push(centered(&content.title).styled(style::Style::new().bold().with_font_size(28)));
        doc.push(elements::Break::new(3));
        doc.push(centered(&content.text).styled(style::Style::new().with_font_size(14)));
        doc.push(elements::Break::new(4));

        if let Some(signature) = &content.signature_name {
            doc.push(centered("______________________________"));
            doc.push(centered(signature).styled(style::Style::new().italic().with_font_size(11)));
            doc.push(elements::Break::new(2));
        }

        // QR com o id da conclusão, para verificação
        let code = QrCode::new(content.verification_code.as_bytes())
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;
        let image_buffer = code.render::<Luma<u8>>().build();
        let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);

        let mut qr = elements::Image::from_dynamic_image(dynamic_image)
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?
            .with_scale(genpdf::Scale::new(0.4, 0.4));
        qr.set_alignment(Alignment::Center);
        doc.push(qr);

        doc.push(
            centered(&format!("Verifiseringskode: {}", content.verification_code))
                .styled(style::Style::new().with_font_size(8)),
        );

        // Renderiza para buffer em memória
        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

        Ok(buffer)
    }
}

fn centered(text: &str) -> elements::Paragraph {
    let mut paragraph = elements::Paragraph::new(text);
    paragraph.set_alignment(Alignment::Center);
    paragraph
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn placeholders_are_filled() {
        let date = Utc.with_ymd_and_hms(2025, 3, 7, 12, 0, 0).unwrap();
        let text = fill_placeholders(DEFAULT_BODY, "Kari Nordmann", "Brannvern", date);
        assert_eq!(text, "Kari Nordmann har fullført kurset «Brannvern» den 07.03.2025.");
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        let date = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(fill_placeholders("{name} / {score}", "Ola", "x", date), "Ola / {score}");
    }

    #[sqlx::test]
    async fn only_admins_over_the_user_may_render_their_diploma(pool: sqlx::PgPool) {
        let fx = crate::services::testing::Fixture::new(pool).await;
        let customer_a = fx.customer("Kunde A", None).await;
        let customer_b = fx.customer("Kunde B", None).await;
        let admin_a = fx.member("mallory@kunde-a.no", customer_a.id, &["admin"]).await;
        let student_b = fx.member("nils@kunde-b.no", customer_b.id, &["user"]).await;
        let student_a = fx.member("kari@kunde-a.no", customer_a.id, &["user"]).await;
        let course = fx.course("Brannvern").await;
        let diplomas = &fx.state.diploma_service;

        let request = |user_id| DiplomaRequest { course_id: course.id, user_id: Some(user_id), lang: None };

        assert!(matches!(
            diplomas.render(&admin_a, &request(student_b.id)).await,
            Err(AppError::Forbidden)
        ));
        // Passa na autorização; só falta a conclusão
        assert!(matches!(
            diplomas.render(&admin_a, &request(student_a.id)).await,
            Err(AppError::CourseNotCompleted)
        ));
        assert!(matches!(
            diplomas.render(&student_a, &request(student_b.id)).await,
            Err(AppError::Forbidden)
        ));
    }

    #[sqlx::test]
    async fn templates_belong_to_the_system_owner(pool: sqlx::PgPool) {
        let fx = crate::services::testing::Fixture::new(pool).await;
        let customer = fx.customer("Kunde A", None).await;
        let admin = fx.member("mallory@kunde-a.no", customer.id, &["admin"]).await;
        let diplomas = &fx.state.diploma_service;

        assert!(matches!(diplomas.list_templates(&admin, fx.company.id).await, Err(AppError::Forbidden)));
        assert!(diplomas.list_templates(&fx.owner, fx.company.id).await.unwrap().is_empty());
    }
}
