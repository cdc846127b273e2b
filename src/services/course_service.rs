// src/services/course_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        locale_map::{normalize_list, normalize_text, sanitize_languages, LocaleList, LocaleText},
    },
    db::{
        course_repo::CourseRecord, module_repo::ModuleRecord, CourseRepository, DiplomaRepository,
        MembershipRepository, ModuleRepository,
    },
    models::{
        auth::User,
        course::{
            Course, CourseModule, CoursePayload, CourseQuestion, CourseStatus, ModulePayload, ModuleType,
            ReorderModulesPayload, UpdateCoursePayload,
        },
    },
    services::{authz::AccessPolicy, quiz::clamp_percentage},
};

/// Toda pergunta precisa de 2+ alternativas e de pelo menos uma resposta
/// certa que aponte para uma alternativa existente.
pub fn validate_questions(questions: &[CourseQuestion]) -> Result<(), AppError> {
    for question in questions {
        if question.id.trim().is_empty() {
            return Err(AppError::InvalidQuestion(String::new()));
        }
        if question.alternatives.len() < 2 {
            return Err(AppError::InvalidQuestion(question.id.clone()));
        }

        let correct: Vec<&str> = question
            .correct_answer_ids
            .iter()
            .map(String::as_str)
            .chain(question.correct_answer_id.as_deref())
            .collect();

        let all_known = correct
            .iter()
            .all(|id| question.alternatives.iter().any(|alt| alt.id == *id));

        if correct.is_empty() || !all_known {
            return Err(AppError::InvalidQuestion(question.id.clone()));
        }
    }
    Ok(())
}

/// Preenche os idiomas ativos em título e alternativas e migra o formato
/// antigo de resposta única para a lista.
pub fn normalize_question(languages: &[String], question: &CourseQuestion) -> CourseQuestion {
    let mut correct_answer_ids = question.correct_answer_ids.clone();
    if let Some(legacy) = &question.correct_answer_id {
        if !correct_answer_ids.contains(legacy) {
            correct_answer_ids.push(legacy.clone());
        }
    }

    CourseQuestion {
        id: question.id.clone(),
        title: normalize_text(languages, &question.title),
        alternatives: question
            .alternatives
            .iter()
            .map(|alt| {
                let mut alt = alt.clone();
                alt.text = normalize_text(languages, &alt.text);
                alt
            })
            .collect(),
        correct_answer_id: None,
        correct_answer_ids,
    }
}

/// Conteúdo normalizado de um módulo, pronto para gravar.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedModule {
    pub title: LocaleText,
    pub summary: LocaleText,
    pub body: LocaleText,
    pub video_urls: LocaleList,
    pub image_urls: LocaleList,
    pub questions: Vec<CourseQuestion>,
    pub module_type: ModuleType,
    pub exam_pass_percentage: Option<i32>,
}

impl NormalizedModule {
    pub fn from_payload(languages: &[String], payload: &ModulePayload) -> Self {
        let module_type = payload.module_type.unwrap_or(ModuleType::Normal);
        Self {
            title: normalize_text(languages, &payload.title),
            summary: normalize_text(languages, &payload.summary),
            body: normalize_text(languages, &payload.body),
            video_urls: normalize_list(languages, &payload.video_urls),
            image_urls: normalize_list(languages, &payload.image_urls),
            questions: payload.questions.iter().map(|q| normalize_question(languages, q)).collect(),
            module_type,
            // Percentual só faz sentido em prova
            exam_pass_percentage: match module_type {
                ModuleType::Exam => Some(clamp_percentage(payload.exam_pass_percentage) as i32),
                ModuleType::Normal => None,
            },
        }
    }

    /// Reaplica os idiomas sobre um módulo já gravado.
    pub fn backfill(languages: &[String], module: &CourseModule) -> Self {
        Self {
            title: normalize_text(languages, &module.title),
            summary: normalize_text(languages, &module.summary),
            body: normalize_text(languages, &module.body),
            video_urls: normalize_list(languages, &module.video_urls),
            image_urls: normalize_list(languages, &module.image_urls),
            questions: module.questions.iter().map(|q| normalize_question(languages, q)).collect(),
            module_type: module.module_type,
            exam_pass_percentage: module.exam_pass_percentage,
        }
    }

    fn record(&self) -> ModuleRecord<'_> {
        ModuleRecord {
            title: &self.title,
            summary: &self.summary,
            body: &self.body,
            video_urls: &self.video_urls,
            image_urls: &self.image_urls,
            questions: &self.questions,
            module_type: self.module_type,
            exam_pass_percentage: self.exam_pass_percentage,
        }
    }
}

/// Move um item de `from` para `to` (semântica de arrastar e soltar).
/// Índices fora da faixa devolvem a lista intacta.
pub fn move_item<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let mut moved = items.to_vec();
    if from >= moved.len() || to >= moved.len() || from == to {
        return moved;
    }
    let item = moved.remove(from);
    moved.insert(to, item);
    moved
}

/// Ordem final a gravar: ids pedidos que pertencem ao curso (sem repetir),
/// depois os que faltaram, na ordem anterior. Ids estranhos são ignorados.
pub fn reorder_plan(current: &[Uuid], requested: &[Uuid]) -> Vec<Uuid> {
    let mut plan: Vec<Uuid> = Vec::with_capacity(current.len());
    for id in requested {
        if current.contains(id) && !plan.contains(id) {
            plan.push(*id);
        }
    }
    for id in current {
        if !plan.contains(id) {
            plan.push(*id);
        }
    }
    plan
}

/// Ordem pedida: a lista completa, ou a atual com um módulo arrastado.
/// Índice de destino além do fim vai para o último lugar.
pub fn requested_order(current: &[Uuid], request: &ReorderModulesPayload) -> Result<Vec<Uuid>, AppError> {
    match &request.move_to {
        Some(step) => {
            let from = current
                .iter()
                .position(|id| *id == step.module_id)
                .ok_or(AppError::ModuleNotFound)?;
            let to = step.to_index.min(current.len().saturating_sub(1));
            Ok(move_item(current, from, to))
        }
        None if request.module_ids.is_empty() => Err(AppError::InvalidInput("moduleIds".into())),
        None => Ok(request.module_ids.clone()),
    }
}

#[derive(Clone)]
pub struct CourseService {
    course_repo: CourseRepository,
    module_repo: ModuleRepository,
    membership_repo: MembershipRepository,
    diploma_repo: DiplomaRepository,
    policy: AccessPolicy,
    pool: PgPool,
}

impl CourseService {
    pub fn new(
        course_repo: CourseRepository,
        module_repo: ModuleRepository,
        membership_repo: MembershipRepository,
        diploma_repo: DiplomaRepository,
        policy: AccessPolicy,
        pool: PgPool,
    ) -> Self {
        Self { course_repo, module_repo, membership_repo, diploma_repo, policy, pool }
    }

    async fn load_course(&self, id: Uuid) -> Result<Course, AppError> {
        self.course_repo.find_by_id(id).await?.ok_or(AppError::CourseNotFound)
    }

    /// Conteúdo de curso é do dono do sistema; admins de cliente só leem.
    async fn editable_course(&self, actor: &User, id: Uuid) -> Result<Course, AppError> {
        self.policy.ensure_system_owner(actor)?;
        let course = self.load_course(id).await?;
        Ok(course)
    }

    /// Modelo de diploma precisa ser da mesma empresa do curso.
    async fn check_template(&self, company_id: Uuid, template_id: Option<Uuid>) -> Result<(), AppError> {
        let Some(template_id) = template_id else {
            return Ok(());
        };
        match self.diploma_repo.find_by_id(template_id).await? {
            Some(t) if t.company_id == company_id => Ok(()),
            _ => Err(AppError::TemplateNotFound),
        }
    }

    // =========================================================================
    //  1. CURSOS
    // =========================================================================

    pub async fn create_course(&self, actor: &User, input: &CoursePayload) -> Result<Course, AppError> {
        self.policy.ensure_system_owner(actor)?;
        self.check_template(input.company_id, input.diploma_template_id).await?;

        let languages = sanitize_languages(&input.languages);
        let title = normalize_text(&languages, &input.title);
        let description = normalize_text(&languages, &input.description);

        let course = self
            .course_repo
            .create(
                input.company_id,
                actor.id,
                CourseRecord {
                    title: &title,
                    description: &description,
                    languages: &languages,
                    status: input.status.unwrap_or(CourseStatus::Inactive),
                    diploma_template_id: input.diploma_template_id,
                },
            )
            .await?;

        tracing::info!(course_id = %course.id, company_id = %course.company_id, "Curso criado");
        Ok(course)
    }

    pub async fn get_course(&self, actor: &User, id: Uuid) -> Result<Course, AppError> {
        let course = self.load_course(id).await?;
        self.policy.ensure_course_reader(actor, &course).await?;
        Ok(course)
    }

    pub async fn list_courses(&self, actor: &User, company_id: Uuid) -> Result<Vec<Course>, AppError> {
        self.policy.ensure_company_reader(actor, company_id).await?;
        self.course_repo.list_by_company(company_id).await
    }

    /// Atualização parcial. Idiomas novos são propagados para todos os
    /// módulos na mesma transação.
    pub async fn update_course(&self, actor: &User, id: Uuid, input: &UpdateCoursePayload) -> Result<Course, AppError> {
        let current = self.editable_course(actor, id).await?;

        let diploma_template_id = input.diploma_template_id.or(current.diploma_template_id);
        if input.diploma_template_id.is_some() {
            self.check_template(current.company_id, diploma_template_id).await?;
        }

        let languages = match &input.languages {
            Some(langs) => sanitize_languages(langs),
            None => current.languages.clone(),
        };
        let added_languages = languages.iter().any(|l| !current.languages.contains(l));

        let title = normalize_text(&languages, input.title.as_ref().unwrap_or(&current.title.0));
        let description = normalize_text(&languages, input.description.as_ref().unwrap_or(&current.description.0));

        let mut tx = self.pool.begin().await?;

        let course = self
            .course_repo
            .update(
                &mut *tx,
                id,
                CourseRecord {
                    title: &title,
                    description: &description,
                    languages: &languages,
                    status: input.status.unwrap_or(current.status),
                    diploma_template_id,
                },
            )
            .await?;

        if added_languages {
            let modules = self.module_repo.list_by_course(&mut *tx, id).await?;
            for module in &modules {
                let backfilled = NormalizedModule::backfill(&languages, module);
                self.module_repo
                    .update(&mut *tx, id, module.id, backfilled.record())
                    .await?;
            }
            tracing::info!(course_id = %id, modules = modules.len(), "Idiomas propagados aos módulos");
        }

        tx.commit().await?;
        Ok(course)
    }

    pub async fn delete_course(&self, actor: &User, id: Uuid) -> Result<(), AppError> {
        self.editable_course(actor, id).await?;
        self.course_repo.delete(id).await?;
        tracing::info!(course_id = %id, "Curso removido");
        Ok(())
    }

    /// Cursos ativos atribuídos ao usuário em qualquer cliente.
    pub async fn list_assigned_courses(&self, user: &User) -> Result<Vec<Course>, AppError> {
        let memberships = self.membership_repo.list_for_user(user.id).await?;

        let mut course_ids: Vec<Uuid> = Vec::new();
        for id in memberships.iter().flat_map(|m| m.assigned_course_ids.iter()) {
            if !course_ids.contains(id) {
                course_ids.push(*id);
            }
        }

        if course_ids.is_empty() {
            return Ok(vec![]);
        }
        self.course_repo.list_active_by_ids(&course_ids).await
    }

    // =========================================================================
    //  2. MÓDULOS
    // =========================================================================

    pub async fn create_module(&self, actor: &User, course_id: Uuid, input: &ModulePayload) -> Result<CourseModule, AppError> {
        let course = self.editable_course(actor, course_id).await?;
        validate_questions(&input.questions)?;

        let normalized = NormalizedModule::from_payload(&course.languages, input);
        let module = self.module_repo.create(course_id, normalized.record()).await?;

        tracing::debug!(course_id = %course_id, module_id = %module.id, "Módulo criado");
        Ok(module)
    }

    pub async fn get_module(&self, actor: &User, course_id: Uuid, module_id: Uuid) -> Result<CourseModule, AppError> {
        self.get_course(actor, course_id).await?;
        self.module_repo
            .find(course_id, module_id)
            .await?
            .ok_or(AppError::ModuleNotFound)
    }

    pub async fn list_modules(&self, actor: &User, course_id: Uuid) -> Result<Vec<CourseModule>, AppError> {
        self.get_course(actor, course_id).await?;
        self.module_repo.list_by_course(&self.pool, course_id).await
    }

    pub async fn update_module(
        &self,
        actor: &User,
        course_id: Uuid,
        module_id: Uuid,
        input: &ModulePayload,
    ) -> Result<CourseModule, AppError> {
        let course = self.editable_course(actor, course_id).await?;
        validate_questions(&input.questions)?;

        let normalized = NormalizedModule::from_payload(&course.languages, input);
        self.module_repo
            .update(&self.pool, course_id, module_id, normalized.record())
            .await
    }

    pub async fn delete_module(&self, actor: &User, course_id: Uuid, module_id: Uuid) -> Result<(), AppError> {
        self.editable_course(actor, course_id).await?;
        self.module_repo.delete(course_id, module_id).await
    }

    /// Regrava `order = índice` para cada módulo do curso.
    pub async fn reorder_modules(
        &self,
        actor: &User,
        course_id: Uuid,
        request: &ReorderModulesPayload,
    ) -> Result<Vec<CourseModule>, AppError> {
        self.editable_course(actor, course_id).await?;

        let current = self.module_repo.list_ids(course_id).await?;
        let plan = reorder_plan(&current, &requested_order(&current, request)?);

        let mut tx = self.pool.begin().await?;
        for (index, module_id) in plan.iter().enumerate() {
            self.module_repo
                .set_order(&mut *tx, course_id, *module_id, index as i32)
                .await?;
        }
        let modules = self.module_repo.list_by_course(&mut *tx, course_id).await?;
        tx.commit().await?;

        Ok(modules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::course::{ModuleMove, QuestionAlternative};

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn text(lang: &str, value: &str) -> LocaleText {
        let mut map = LocaleText::new();
        map.insert(lang.into(), value.into());
        map
    }

    fn question(alternatives: &[&str], correct: &[&str]) -> CourseQuestion {
        CourseQuestion {
            id: "q1".into(),
            title: text("no", "Hva gjør du ved brann?"),
            alternatives: alternatives
                .iter()
                .map(|id| QuestionAlternative { id: id.to_string(), text: text("no", id) })
                .collect(),
            correct_answer_id: None,
            correct_answer_ids: correct.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn question_needs_two_alternatives() {
        let err = validate_questions(&[question(&["a"], &["a"])]).unwrap_err();
        assert!(matches!(err, AppError::InvalidQuestion(id) if id == "q1"));
    }

    #[test]
    fn question_needs_a_known_correct_answer() {
        assert!(validate_questions(&[question(&["a", "b"], &[])]).is_err());
        assert!(validate_questions(&[question(&["a", "b"], &["x"])]).is_err());
        assert!(validate_questions(&[question(&["a", "b"], &["b"])]).is_ok());

        let mut legacy = question(&["a", "b"], &[]);
        legacy.correct_answer_id = Some("a".into());
        assert!(validate_questions(&[legacy]).is_ok());
    }

    #[test]
    fn normalized_question_folds_legacy_answer_and_fills_languages() {
        let mut q = question(&["a", "b"], &["b"]);
        q.correct_answer_id = Some("a".into());

        let normalized = normalize_question(&langs(&["no", "en"]), &q);

        assert_eq!(normalized.correct_answer_id, None);
        assert_eq!(normalized.correct_answer_ids, vec!["b", "a"]);
        assert_eq!(normalized.title["en"], "");
        assert!(normalized.alternatives.iter().all(|alt| alt.text.contains_key("en")));
    }

    #[test]
    fn exam_threshold_only_on_exams() {
        let mut payload = ModulePayload {
            title: text("no", "Rømning"),
            summary: LocaleText::new(),
            body: LocaleText::new(),
            video_urls: Default::default(),
            image_urls: Default::default(),
            questions: vec![],
            module_type: None,
            exam_pass_percentage: Some(70),
        };

        let normal = NormalizedModule::from_payload(&langs(&["no"]), &payload);
        assert_eq!(normal.module_type, ModuleType::Normal);
        assert_eq!(normal.exam_pass_percentage, None);

        payload.module_type = Some(ModuleType::Exam);
        payload.exam_pass_percentage = Some(140);
        let exam = NormalizedModule::from_payload(&langs(&["no", "en"]), &payload);
        assert_eq!(exam.exam_pass_percentage, Some(100));
        assert_eq!(exam.title["en"], "");
        assert_eq!(exam.video_urls["en"], Vec::<String>::new());
    }

    #[test]
    fn move_item_drags_forward_and_back() {
        let items = vec!["a", "b", "c", "d"];
        assert_eq!(move_item(&items, 0, 2), vec!["b", "c", "a", "d"]);
        assert_eq!(move_item(&items, 3, 1), vec!["a", "d", "b", "c"]);
        assert_eq!(move_item(&items, 1, 1), items);
        assert_eq!(move_item(&items, 9, 0), items);
    }

    #[test]
    fn single_drag_goes_through_move_item() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let drag = |module_id, to_index| ReorderModulesPayload {
            module_ids: vec![],
            move_to: Some(ModuleMove { module_id, to_index }),
        };

        assert_eq!(requested_order(&[a, b, c], &drag(a, 2)).unwrap(), vec![b, c, a]);
        assert_eq!(requested_order(&[a, b, c], &drag(c, 99)).unwrap(), vec![a, b, c]);
        assert!(matches!(
            requested_order(&[a, b], &drag(Uuid::new_v4(), 0)),
            Err(AppError::ModuleNotFound)
        ));

        let empty = ReorderModulesPayload { module_ids: vec![], move_to: None };
        assert!(matches!(requested_order(&[a], &empty), Err(AppError::InvalidInput(_))));

        let full = ReorderModulesPayload { module_ids: vec![c, a], move_to: None };
        assert_eq!(reorder_plan(&[a, b, c], &requested_order(&[a, b, c], &full).unwrap()), vec![c, a, b]);
    }

    #[test]
    fn reorder_plan_ignores_unknown_and_appends_missing() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let stranger = Uuid::new_v4();

        assert_eq!(reorder_plan(&[a, b, c], &[c, stranger, a]), vec![c, a, b]);
        assert_eq!(reorder_plan(&[a, b], &[b, b]), vec![b, a]);
        assert_eq!(reorder_plan(&[a, b], &[]), vec![a, b]);
    }

    #[sqlx::test]
    async fn customer_admin_cannot_edit_company_courses(pool: PgPool) {
        let fx = crate::services::testing::Fixture::new(pool).await;
        let customer = fx.customer("Kunde A", None).await;
        let admin = fx.member("mallory@kunde-a.no", customer.id, &["admin", "user"]).await;
        let course = fx.course("Brannvern").await;
        let courses = &fx.state.course_service;

        // Leitura continua liberada para poder atribuir o curso
        assert_eq!(courses.list_courses(&admin, fx.company.id).await.unwrap().len(), 1);
        assert!(courses.get_course(&admin, course.id).await.is_ok());

        assert!(matches!(courses.delete_course(&admin, course.id).await, Err(AppError::Forbidden)));
        let drag = ReorderModulesPayload { module_ids: vec![], move_to: None };
        assert!(matches!(
            courses.reorder_modules(&admin, course.id, &drag).await,
            Err(AppError::Forbidden)
        ));
        assert!(courses.get_course(&fx.owner, course.id).await.is_ok());

        courses.delete_course(&fx.owner, course.id).await.unwrap();
        assert!(matches!(courses.get_course(&fx.owner, course.id).await, Err(AppError::CourseNotFound)));
    }

    #[sqlx::test]
    async fn consumers_only_read_assigned_courses(pool: PgPool) {
        let fx = crate::services::testing::Fixture::new(pool).await;
        let customer = fx.customer("Kunde A", None).await;
        let consumer = fx.member("kari@kunde-a.no", customer.id, &["user"]).await;
        let course = fx.course("Førstehjelp").await;

        assert!(matches!(
            fx.state.course_service.get_course(&consumer, course.id).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            fx.state.course_service.list_courses(&consumer, fx.company.id).await,
            Err(AppError::Forbidden)
        ));
    }
}
