use std::env;
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{
    AttemptId, CurrentUser, LessonId, Question, QuestionId, Quiz, QuizAttempt, QuizHeader, QuizId,
    QuizResult, QuizSubmission, UserId, ValidatedQuestion,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::backend::{AuthoringApi, IdentityApi, LearnerApi};
use crate::dto::{
    ErrorBody, QuestionDto, QuizAttemptDto, QuizDto, QuizHeaderDto, QuizResultDto,
    QuizTitleRequest, SubmissionDto, UserDto,
};
use crate::error::ApiError;

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub admin_base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl ApiConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            admin_base_url: format!("{base_url}/admin"),
            base_url,
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read `QUIZ_API_BASE_URL`, `QUIZ_ADMIN_BASE_URL`, `QUIZ_API_TOKEN`
    /// and `QUIZ_API_TIMEOUT_SECS`, falling back to local defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("QUIZ_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let mut config = Self::new(base_url);
        if let Ok(admin) = env::var("QUIZ_ADMIN_BASE_URL") {
            if !admin.trim().is_empty() {
                config.admin_base_url = admin.trim_end_matches('/').to_owned();
            }
        }
        config.token = env::var("QUIZ_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        if let Some(secs) = env::var("QUIZ_API_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// REST adapter for the quiz backend.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    config: ApiConfig,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    fn admin_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.admin_base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = self.authorize(request).send().await?;
        check_status(response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    debug!(status = status.as_u16(), url = %response.url(), "backend rejected request");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Unauthorized {
            status: status.as_u16(),
        }),
        StatusCode::NOT_FOUND => Err(ApiError::NotFound),
        _ => {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_owned()
                });
            Err(ApiError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl LearnerApi for HttpBackend {
    async fn fetch_quiz(&self, lesson_id: LessonId) -> Result<Quiz, ApiError> {
        let request = self
            .client
            .get(self.url(&format!("/quizzes/lesson/{lesson_id}")));
        let dto: QuizDto = self.send_json(request).await?;
        Ok(dto.into_quiz())
    }

    async fn submit_quiz(
        &self,
        user_id: UserId,
        submission: &QuizSubmission,
    ) -> Result<QuizResult, ApiError> {
        let request = self
            .client
            .post(self.url(&format!("/quizzes/{user_id}/submit")))
            .json(&SubmissionDto::from_submission(submission));
        let dto: QuizResultDto = self.send_json(request).await?;
        dto.into_result()
    }

    async fn quiz_history(&self) -> Result<Vec<QuizAttempt>, ApiError> {
        let request = self.client.get(self.url("/quizzes/me/history"));
        let dtos: Vec<QuizAttemptDto> = self.send_json(request).await?;
        dtos.into_iter().map(QuizAttemptDto::into_attempt).collect()
    }

    async fn quiz_attempt(&self, attempt_id: AttemptId) -> Result<QuizAttempt, ApiError> {
        let request = self
            .client
            .get(self.url(&format!("/quizzes/attempts/{attempt_id}")));
        let dto: QuizAttemptDto = self.send_json(request).await?;
        dto.into_attempt()
    }
}

#[async_trait]
impl AuthoringApi for HttpBackend {
    async fn create_quiz(
        &self,
        lesson_id: LessonId,
        title: &str,
    ) -> Result<QuizHeader, ApiError> {
        let request = self
            .client
            .post(self.admin_url(&format!("/lessons/{lesson_id}/quiz")))
            .json(&QuizTitleRequest { title, lesson_id });
        let dto: QuizHeaderDto = self.send_json(request).await?;
        Ok(dto.into_header(lesson_id))
    }

    async fn update_quiz_title(
        &self,
        quiz_id: QuizId,
        lesson_id: LessonId,
        title: &str,
    ) -> Result<QuizHeader, ApiError> {
        let request = self
            .client
            .put(self.admin_url(&format!("/quizzes/{quiz_id}")))
            .json(&QuizTitleRequest { title, lesson_id });
        let dto: QuizHeaderDto = self.send_json(request).await?;
        Ok(dto.into_header(lesson_id))
    }

    async fn add_question(
        &self,
        quiz_id: QuizId,
        question: &ValidatedQuestion,
    ) -> Result<Question, ApiError> {
        let request = self
            .client
            .post(self.admin_url(&format!("/quizzes/{quiz_id}/questions")))
            .json(&QuestionDto::from_validated(question));
        let dto: QuestionDto = self.send_json(request).await?;
        dto.into_persisted()
    }

    async fn delete_question(&self, question_id: QuestionId) -> Result<(), ApiError> {
        let request = self
            .client
            .delete(self.admin_url(&format!("/questions/{question_id}")));
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityApi for HttpBackend {
    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        let request = self.client.get(self.url("/users/me"));
        let dto: UserDto = self.send_json(request).await?;
        Ok(dto.into_user())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_url_derives_from_base() {
        let config = ApiConfig::new("https://lms.example.com/api/");
        assert_eq!(config.base_url, "https://lms.example.com/api");
        assert_eq!(config.admin_base_url, "https://lms.example.com/api/admin");
        assert!(config.token.is_none());
    }

    #[test]
    fn urls_join_paths() {
        let backend = HttpBackend::new(ApiConfig::new("http://localhost:8080/api")).unwrap();
        assert_eq!(
            backend.url("/quizzes/lesson/3"),
            "http://localhost:8080/api/quizzes/lesson/3"
        );
        assert_eq!(
            backend.admin_url("/questions/9"),
            "http://localhost:8080/api/admin/questions/9"
        );
    }
}
