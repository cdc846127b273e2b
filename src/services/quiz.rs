// src/services/quiz.rs

//! Correção de quizzes e regras de conclusão de módulo/curso.
//!
//! Uma pergunta está certa só quando o conjunto escolhido é exatamente o
//! conjunto correto (mesmo tamanho, mesmos membros).

use std::collections::{BTreeSet, HashMap};

use uuid::Uuid;

use crate::models::{
    course::{CourseModule, CourseQuestion, ModuleType},
    progress::{CourseCompletionStatus, QuizResult},
};

pub const DEFAULT_EXAM_PASS_PERCENTAGE: u8 = 80;

/// Como um módulo é aprovado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// Exige 100% (nenhuma resposta errada).
    Normal,
    /// Aprova a partir de um percentual configurável.
    Exam { pass_percentage: u8 },
}

impl ModuleKind {
    pub fn from_module(module: &CourseModule) -> Self {
        match module.module_type {
            ModuleType::Normal => ModuleKind::Normal,
            ModuleType::Exam => ModuleKind::Exam {
                pass_percentage: clamp_percentage(module.exam_pass_percentage),
            },
        }
    }

    pub fn required_percentage(&self) -> u8 {
        match self {
            ModuleKind::Normal => 100,
            ModuleKind::Exam { pass_percentage } => *pass_percentage,
        }
    }
}

/// Percentual de aprovação de prova: padrão 80, limitado a [0, 100].
pub fn clamp_percentage(value: Option<i32>) -> u8 {
    match value {
        None => DEFAULT_EXAM_PASS_PERCENTAGE,
        Some(v) => v.clamp(0, 100) as u8,
    }
}

/// Une o formato antigo (`correctAnswerId`) com a lista nova.
pub fn correct_set(question: &CourseQuestion) -> BTreeSet<&str> {
    question
        .correct_answer_ids
        .iter()
        .map(String::as_str)
        .chain(question.correct_answer_id.as_deref())
        .collect()
}

pub fn is_multi_correct(question: &CourseQuestion) -> bool {
    correct_set(question).len() > 1
}

/// Clique numa alternativa: alterna em perguntas de várias respostas,
/// substitui nas de resposta única.
pub fn toggle_selection(question: &CourseQuestion, current: &[String], alternative_id: &str) -> Vec<String> {
    if !is_multi_correct(question) {
        return vec![alternative_id.to_string()];
    }

    if current.iter().any(|id| id == alternative_id) {
        current.iter().filter(|id| *id != alternative_id).cloned().collect()
    } else {
        let mut next = current.to_vec();
        next.push(alternative_id.to_string());
        next
    }
}

/// Reaplica a resposta enviada, alternativa por alternativa, com a mesma regra
/// da tela: ids desconhecidos caem fora e pergunta de resposta única fica só
/// com a última escolha.
pub fn normalize_selection(question: &CourseQuestion, submitted: &[String]) -> Vec<String> {
    submitted
        .iter()
        .filter(|id| question.alternatives.iter().any(|alt| &alt.id == *id))
        .fold(Vec::new(), |current, id| toggle_selection(question, &current, id))
}

pub fn is_answer_correct(question: &CourseQuestion, selected: &[String]) -> bool {
    let selected: BTreeSet<&str> = selected.iter().map(String::as_str).collect();
    selected == correct_set(question)
}

/// `round((total - incorrect) / total * 100)`. Zero perguntas dá 0.
pub fn score_percentage(total: usize, incorrect: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = total.saturating_sub(incorrect) as f64;
    (correct / total as f64 * 100.0).round() as u8
}

pub fn evaluate(
    questions: &[CourseQuestion],
    answers: &HashMap<String, Vec<String>>,
    kind: ModuleKind,
) -> QuizResult {
    let incorrect_question_ids: Vec<String> = questions
        .iter()
        .filter(|q| {
            let submitted = answers.get(&q.id).map(Vec::as_slice).unwrap_or(&[]);
            !is_answer_correct(q, &normalize_selection(q, submitted))
        })
        .map(|q| q.id.clone())
        .collect();

    let total = questions.len();
    let incorrect = incorrect_question_ids.len();
    let score = score_percentage(total, incorrect);
    let required = kind.required_percentage();

    let passed = total > 0
        && match kind {
            ModuleKind::Normal => incorrect == 0,
            ModuleKind::Exam { pass_percentage } => score >= pass_percentage,
        };

    QuizResult {
        total_questions: total,
        correct: total - incorrect,
        incorrect,
        score_percentage: score,
        required_percentage: required,
        passed,
        incorrect_question_ids,
    }
}

/// Recalculado a cada leitura a partir da lista atual de módulos:
/// módulos apagados não bloqueiam, módulos novos "des-concluem" o curso.
pub fn course_completion_status(module_ids: &[Uuid], completed_ids: &[Uuid]) -> CourseCompletionStatus {
    let completed_modules = module_ids.iter().filter(|id| completed_ids.contains(id)).count();
    let total_modules = module_ids.len();

    CourseCompletionStatus {
        total_modules,
        completed_modules,
        completed: total_modules > 0 && completed_modules == total_modules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::locale_map::LocaleText;
    use crate::models::course::QuestionAlternative;

    fn question(id: &str, correct: &[&str]) -> CourseQuestion {
        CourseQuestion {
            id: id.to_string(),
            title: LocaleText::new(),
            alternatives: ["a", "b", "c"]
                .iter()
                .map(|alt| QuestionAlternative { id: alt.to_string(), text: LocaleText::new() })
                .collect(),
            correct_answer_id: None,
            correct_answer_ids: correct.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn five_questions() -> Vec<CourseQuestion> {
        (1..=5).map(|i| question(&format!("q{i}"), &["a"])).collect()
    }

    fn answers_with_correct(count: usize) -> HashMap<String, Vec<String>> {
        (1..=5)
            .map(|i| {
                let pick = if i <= count { "a" } else { "b" };
                (format!("q{i}"), vec![pick.to_string()])
            })
            .collect()
    }

    #[test]
    fn exam_with_four_of_five_passes_at_eighty() {
        let result = evaluate(
            &five_questions(),
            &answers_with_correct(4),
            ModuleKind::Exam { pass_percentage: 80 },
        );
        assert_eq!(result.score_percentage, 80);
        assert!(result.passed);
    }

    #[test]
    fn exam_with_three_of_five_fails() {
        let result = evaluate(
            &five_questions(),
            &answers_with_correct(3),
            ModuleKind::Exam { pass_percentage: 80 },
        );
        assert_eq!(result.score_percentage, 60);
        assert!(!result.passed);
        assert_eq!(result.incorrect_question_ids, vec!["q4", "q5"]);
    }

    #[test]
    fn normal_module_requires_every_answer() {
        let result = evaluate(&five_questions(), &answers_with_correct(4), ModuleKind::Normal);
        assert_eq!(result.score_percentage, 80);
        assert!(!result.passed);

        let result = evaluate(&five_questions(), &answers_with_correct(5), ModuleKind::Normal);
        assert!(result.passed);
    }

    #[test]
    fn multi_correct_needs_exact_set() {
        let q = question("q1", &["a", "c"]);
        assert!(is_answer_correct(&q, &["c".into(), "a".into()]));
        assert!(!is_answer_correct(&q, &["a".into()]));
        assert!(!is_answer_correct(&q, &["a".into(), "b".into(), "c".into()]));
    }

    #[test]
    fn legacy_single_answer_is_honoured() {
        let mut q = question("q1", &[]);
        q.correct_answer_id = Some("b".into());
        assert!(!is_multi_correct(&q));
        assert!(is_answer_correct(&q, &["b".into()]));

        // Formato misto: o id antigo soma-se à lista
        q.correct_answer_ids = vec!["c".into()];
        assert!(is_multi_correct(&q));
        assert!(is_answer_correct(&q, &["b".into(), "c".into()]));
    }

    #[test]
    fn selection_toggles_or_replaces() {
        let single = question("q1", &["a"]);
        assert_eq!(toggle_selection(&single, &["b".into()], "a"), vec!["a"]);

        let multi = question("q2", &["a", "b"]);
        let picked = toggle_selection(&multi, &["a".into()], "b");
        assert_eq!(picked, vec!["a", "b"]);
        assert_eq!(toggle_selection(&multi, &picked, "a"), vec!["b"]);
    }

    #[test]
    fn submitted_answers_follow_selection_rule() {
        let single = question("q1", &["a"]);
        // Resposta única: vale a última alternativa escolhida
        assert_eq!(normalize_selection(&single, &["b".into(), "a".into()]), vec!["a"]);
        assert_eq!(normalize_selection(&single, &["x".into()]), Vec::<String>::new());

        let multi = question("q2", &["a", "c"]);
        assert_eq!(
            normalize_selection(&multi, &["a".into(), "zz".into(), "c".into()]),
            vec!["a", "c"]
        );
    }

    #[test]
    fn unknown_alternatives_do_not_count() {
        let questions = vec![question("q1", &["a", "c"])];
        let mut answers = HashMap::new();
        answers.insert("q1".to_string(), vec!["a".to_string(), "c".to_string(), "nope".to_string()]);

        let result = evaluate(&questions, &answers, ModuleKind::Normal);
        assert!(result.passed);
    }

    #[test]
    fn score_stays_in_range_and_matches_formula() {
        for total in 0..=12usize {
            for incorrect in 0..=total {
                let score = score_percentage(total, incorrect);
                assert!(score <= 100);
                if total > 0 {
                    let expected = ((total - incorrect) as f64 / total as f64 * 100.0).round() as u8;
                    assert_eq!(score, expected);
                }
            }
        }
        // 2/3 arredonda para 67
        assert_eq!(score_percentage(3, 1), 67);
    }

    #[test]
    fn empty_quiz_never_passes() {
        let result = evaluate(&[], &HashMap::new(), ModuleKind::Exam { pass_percentage: 0 });
        assert_eq!(result.score_percentage, 0);
        assert!(!result.passed);
    }

    #[test]
    fn unanswered_questions_count_as_incorrect() {
        let result = evaluate(&five_questions(), &HashMap::new(), ModuleKind::Exam { pass_percentage: 0 });
        assert_eq!(result.incorrect, 5);
        assert!(result.passed);
    }

    #[test]
    fn threshold_defaults_and_clamps() {
        assert_eq!(clamp_percentage(None), 80);
        assert_eq!(clamp_percentage(Some(150)), 100);
        assert_eq!(clamp_percentage(Some(-5)), 0);
        assert_eq!(clamp_percentage(Some(65)), 65);
    }

    #[test]
    fn course_completion_tracks_current_modules() {
        let (m1, m2, m3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        assert!(course_completion_status(&[m1, m2], &[m1, m2]).completed);
        // Módulo apagado (m3 só no progresso) não atrapalha
        assert!(course_completion_status(&[m1], &[m1, m3]).completed);
        // Módulo novo reabre o curso
        let status = course_completion_status(&[m1, m2, m3], &[m1, m2]);
        assert!(!status.completed);
        assert_eq!(status.completed_modules, 2);
        // Curso sem módulos nunca está concluído
        assert!(!course_completion_status(&[], &[m1]).completed);
    }
}
