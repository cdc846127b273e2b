// src/services/progress_service.rs

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CourseRepository, ModuleRepository, ProgressRepository},
    models::{
        auth::User,
        course::{Course, CourseModule},
        progress::{CourseCompletion, CourseCompletionStatus, ProgressResponse, SubmitQuizResponse},
    },
    services::{
        authz::AccessPolicy,
        quiz::{course_completion_status, evaluate, ModuleKind},
    },
};

#[derive(Clone)]
pub struct ProgressService {
    course_repo: CourseRepository,
    module_repo: ModuleRepository,
    progress_repo: ProgressRepository,
    policy: AccessPolicy,
}

impl ProgressService {
    pub fn new(
        course_repo: CourseRepository,
        module_repo: ModuleRepository,
        progress_repo: ProgressRepository,
        policy: AccessPolicy,
    ) -> Self {
        Self { course_repo, module_repo, progress_repo, policy }
    }

    async fn readable_course(&self, user: &User, course_id: Uuid) -> Result<Course, AppError> {
        let course = self
            .course_repo
            .find_by_id(course_id)
            .await?
            .ok_or(AppError::CourseNotFound)?;
        self.policy.ensure_course_reader(user, &course).await?;
        Ok(course)
    }

    async fn load_module(&self, course_id: Uuid, module_id: Uuid) -> Result<CourseModule, AppError> {
        self.module_repo
            .find(course_id, module_id)
            .await?
            .ok_or(AppError::ModuleNotFound)
    }

    async fn status(&self, course_id: Uuid, completed_ids: &[Uuid]) -> Result<CourseCompletionStatus, AppError> {
        let module_ids = self.module_repo.list_ids(course_id).await?;
        Ok(course_completion_status(&module_ids, completed_ids))
    }

    /// Grava a conclusão assim que o último módulo passa.
    async fn record_if_completed(
        &self,
        user: &User,
        course: &Course,
        status: &CourseCompletionStatus,
    ) -> Result<(), AppError> {
        if status.completed {
            self.progress_repo
                .upsert_completion(user.id, course.id, &user.name, &course.title)
                .await?;
            tracing::info!(user_id = %user.id, course_id = %course.id, "Curso concluído");
        }
        Ok(())
    }

    pub async fn get_progress(&self, user: &User, course_id: Uuid) -> Result<ProgressResponse, AppError> {
        self.readable_course(user, course_id).await?;

        let completed_module_ids = self
            .progress_repo
            .find(user.id, course_id)
            .await?
            .map(|p| p.completed_module_ids)
            .unwrap_or_default();

        let course = self.status(course_id, &completed_module_ids).await?;
        Ok(ProgressResponse { completed_module_ids, course })
    }

    /// Conclusão direta, só para módulos sem perguntas (leitura/vídeo).
    pub async fn complete_module(
        &self,
        user: &User,
        course_id: Uuid,
        module_id: Uuid,
    ) -> Result<ProgressResponse, AppError> {
        let course = self.readable_course(user, course_id).await?;
        let module = self.load_module(course_id, module_id).await?;

        if !module.questions.is_empty() {
            return Err(AppError::InvalidInput("questions".into()));
        }

        let progress = self
            .progress_repo
            .add_completed_module(user.id, course_id, module_id)
            .await?;

        let status = self.status(course_id, &progress.completed_module_ids).await?;
        self.record_if_completed(user, &course, &status).await?;

        Ok(ProgressResponse { completed_module_ids: progress.completed_module_ids, course: status })
    }

    /// Corrige o quiz; módulo aprovado entra na lista de concluídos.
    pub async fn submit_quiz(
        &self,
        user: &User,
        course_id: Uuid,
        module_id: Uuid,
        answers: &HashMap<String, Vec<String>>,
    ) -> Result<SubmitQuizResponse, AppError> {
        let course = self.readable_course(user, course_id).await?;
        let module = self.load_module(course_id, module_id).await?;

        let result = evaluate(&module.questions, answers, ModuleKind::from_module(&module));
        tracing::debug!(
            user_id = %user.id, module_id = %module_id,
            score = result.score_percentage, passed = result.passed,
            "Quiz corrigido"
        );

        let completed_ids = if result.passed {
            self.progress_repo
                .add_completed_module(user.id, course_id, module_id)
                .await?
                .completed_module_ids
        } else {
            self.progress_repo
                .find(user.id, course_id)
                .await?
                .map(|p| p.completed_module_ids)
                .unwrap_or_default()
        };

        let status = self.status(course_id, &completed_ids).await?;
        if result.passed {
            self.record_if_completed(user, &course, &status).await?;
        }

        Ok(SubmitQuizResponse { result, course: status })
    }

    /// Registro explícito da conclusão (rota interna). Falha se o curso
    /// ainda tiver módulos pendentes.
    pub async fn record_completion(&self, user: &User, course_id: Uuid) -> Result<CourseCompletion, AppError> {
        let course = self.readable_course(user, course_id).await?;

        let completed_ids = self
            .progress_repo
            .find(user.id, course_id)
            .await?
            .map(|p| p.completed_module_ids)
            .unwrap_or_default();

        let status = self.status(course_id, &completed_ids).await?;
        if !status.completed {
            return Err(AppError::CourseNotCompleted);
        }

        self.progress_repo
            .upsert_completion(user.id, course.id, &user.name, &course.title)
            .await
    }

    pub async fn list_my_completions(&self, user: &User) -> Result<Vec<CourseCompletion>, AppError> {
        self.progress_repo.list_completions_for_user(user.id).await
    }
}
